pub mod error;
pub mod implementation;

use kube::Client;
use serde::Deserialize;

#[derive(Deserialize, Clone, Debug, Default)]
pub struct KubernetesConfig {
    #[serde(default)]
    pub in_cluster: bool,
    pub config_path: Option<String>,
}

#[derive(Clone)]
pub struct Kubernetes {
    pub client: Client,
}
