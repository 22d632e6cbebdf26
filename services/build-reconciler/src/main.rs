pub mod app;
pub mod config;
pub mod error;
pub mod implementations;
pub mod services;

use std::{net::SocketAddr, path::PathBuf};

use anyhow::anyhow;
use build_core::{
    crds::{CNB_BUILD_CRD_NAME, KNATIVE_BUILD_CRD_NAME},
    registry::{
        image_factory::OciImageFactory, keychain::ServiceAccountKeychain,
        metadata::RegistryMetadataRetriever,
    },
};
use factory::factories::{kubernetes::Kubernetes, observability::Observability};
use tokio::task::JoinSet;
use tracing::{error, info};
use utility::{
    load_service_env::{config_path, load_service_env},
    shutdown_signal::shutdown_signal,
};

use crate::{
    config::Config,
    error::AppError,
    services::{
        controller::start_controller,
        reconciler::Reconciler,
        stores::{KubeBuildRequestStore, KubeDerivedBuildStore},
    },
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow!("Failed to install rustls crypto provider"))?;

    // These are baked at COMPILE time
    let cargo_manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let cargo_crate_name = env!("CARGO_CRATE_NAME");
    let cargo_pkg_name = env!("CARGO_PKG_NAME");
    let cargo_pkg_version = env!("CARGO_PKG_VERSION");

    load_service_env(&cargo_manifest_dir);

    let cfg = Config::init(config_path(&cargo_manifest_dir, "config.json")).await?;

    let _guard =
        Observability::init(cargo_crate_name, cargo_pkg_version, &cfg.observability).await?;

    let kubernetes = Kubernetes::new(&cfg.kubernetes).await?;
    kubernetes
        .ensure_crds(&[CNB_BUILD_CRD_NAME, KNATIVE_BUILD_CRD_NAME])
        .await?;

    let keychain = ServiceAccountKeychain::new(kubernetes.client.clone());
    let image_factory = OciImageFactory::new(keychain, cfg.registry.insecure_registries.clone());
    let reconciler = Reconciler::new(
        KubeBuildRequestStore::new(kubernetes.client.clone()),
        KubeDerivedBuildStore::new(kubernetes.client.clone()),
        RegistryMetadataRetriever::new(image_factory),
    );

    let mut set = JoinSet::new();

    set.spawn(start_controller(
        kubernetes.client.clone(),
        reconciler,
        cfg.reconciler.clone(),
    ));
    set.spawn(start_health_server(
        cargo_pkg_name,
        cargo_pkg_version,
        cfg.server_address,
    ));

    info!("✅ All background tasks started");

    // Unified shutdown logic
    tokio::select! {
        _ = shutdown_signal() => {
            info!("🛑 Shutdown signal received");
            set.shutdown().await;
        }
        Some(result) = set.join_next() => {
            match result {
                Ok(Ok(())) => error!("A background task exited unexpectedly!"),
                Ok(Err(e)) => error!("Task failed: {}", e),
                Err(e) => error!("Task panic: {}", e),
            }
            set.shutdown().await;
        }
    }

    info!("👋 Shutting down gracefully...");

    Ok(())
}

// Health endpoints for liveness and readiness probes
async fn start_health_server(
    cargo_pkg_name: &'static str,
    cargo_pkg_version: &'static str,
    addr: SocketAddr,
) -> Result<(), AppError> {
    let app = app::app(cargo_pkg_name, cargo_pkg_version);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("🚀 {} service running at {:#?}", cargo_pkg_name, addr);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}
