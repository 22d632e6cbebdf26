use crate::error::AppError;

// -------------------------------------------------------------------------------
// ---------------------------- Error implementations ----------------------------
// -------------------------------------------------------------------------------

impl From<kube::Error> for AppError {
    fn from(value: kube::Error) -> Self {
        match value {
            kube::Error::Api(ae) if ae.code == 409 => AppError::Conflict(ae.message.clone()),
            kube::Error::Api(ae) if ae.code == 404 => AppError::NotFoundError(ae.message.clone()),
            other => AppError::KubeError(other),
        }
    }
}

impl AppError {
    /// Whether re-running the same pass later can succeed without operator action.
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::Conflict(_)
            | AppError::KubeError(_)
            | AppError::NotFoundError(_)
            | AppError::RegistryError(_) => true,
            AppError::InvalidObject(_) | AppError::IoError(_) => false,
        }
    }
}
