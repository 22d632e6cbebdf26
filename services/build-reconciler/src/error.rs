use build_core::registry::error::RegistryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    // API failures other than 404 and 409, which map to NotFoundError and Conflict
    #[error("Kube error, {0}")]
    KubeError(kube::Error),

    // Stale resourceVersion on write or object already exists
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("{0}")]
    NotFoundError(String),

    #[error("Invalid object: {0}")]
    InvalidObject(String),

    #[error("Registry error, {0}")]
    RegistryError(#[from] RegistryError),

    #[error("IO error, {0}")]
    IoError(#[from] std::io::Error),
}
