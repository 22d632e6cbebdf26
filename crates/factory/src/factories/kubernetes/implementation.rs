use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::{
    Api, Client, Config,
    config::{KubeConfigOptions, Kubeconfig},
};
use tracing::{error, info};

use crate::factories::kubernetes::{Kubernetes, KubernetesConfig, error::KubernetesError};

impl Kubernetes {
    pub async fn new(config: &KubernetesConfig) -> Result<Self, KubernetesError> {
        let client = if config.in_cluster {
            let kube_config = Config::incluster()?;
            info!("✅ Connected from incluster environment!");
            Client::try_from(kube_config)?
        } else {
            let kube_config = if let Some(path) = &config.config_path {
                let kubeconfig = Kubeconfig::read_from(path)?;
                let options = KubeConfigOptions::default();
                Config::from_custom_kubeconfig(kubeconfig, &options).await?
            } else {
                Config::infer().await?
            };

            info!("✅ Connected from local environment!");
            Client::try_from(kube_config)?
        };

        Ok(Self { client })
    }

    /// Fails unless every named CRD (`<plural>.<group>`) is registered with the API server.
    pub async fn ensure_crds(&self, names: &[&str]) -> Result<(), KubernetesError> {
        let crd_api: Api<CustomResourceDefinition> = Api::all(self.client.clone());

        for name in names {
            match crd_api.get_opt(name).await? {
                Some(_) => info!("✅ CustomResourceDefinition '{}' found.", name),
                None => {
                    error!("❌ CustomResourceDefinition '{}' is missing", name);
                    return Err(KubernetesError::MissingCustomResourceDefinition(
                        name.to_string(),
                    ));
                }
            }
        }

        Ok(())
    }
}
