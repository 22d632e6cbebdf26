use std::{net::SocketAddr, path::PathBuf};

use config::{ConfigBuilder, ConfigError, Environment, File, builder::AsyncState};
use factory::factories::{kubernetes::KubernetesConfig, observability::ObservabilityConfig};
use serde::Deserialize;

#[derive(Deserialize, Clone, Debug)]
pub struct Config {
    pub server_address: SocketAddr,
    #[serde(default)]
    pub observability: ObservabilityConfig,
    #[serde(default)]
    pub kubernetes: KubernetesConfig,
    #[serde(default)]
    pub reconciler: ReconcilerConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ReconcilerConfig {
    /// Upper bound on CNBBuilds reconciled at once. One key never runs twice concurrently.
    #[serde(default = "concurrency_default")]
    pub concurrency: u16,
    /// Periodic resync of settled objects.
    #[serde(default = "requeue_after_secs_default")]
    pub requeue_after_secs: u64,
    #[serde(default = "error_requeue_secs_default")]
    pub error_requeue_secs: u64,
    #[serde(default = "conflict_requeue_secs_default")]
    pub conflict_requeue_secs: u64,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct RegistryConfig {
    #[serde(default)]
    pub insecure_registries: Vec<String>,
}

fn concurrency_default() -> u16 {
    4
}

fn requeue_after_secs_default() -> u64 {
    300
}

fn error_requeue_secs_default() -> u64 {
    15
}

fn conflict_requeue_secs_default() -> u64 {
    1
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            concurrency: concurrency_default(),
            requeue_after_secs: requeue_after_secs_default(),
            error_requeue_secs: error_requeue_secs_default(),
            conflict_requeue_secs: conflict_requeue_secs_default(),
        }
    }
}

impl Config {
    pub async fn init(path: PathBuf) -> Result<Self, ConfigError> {
        let cfg = ConfigBuilder::<AsyncState>::default()
            .add_source(File::from(path))
            .add_source(Environment::default().separator("__"))
            .build()
            .await?;

        cfg.try_deserialize()
    }
}
