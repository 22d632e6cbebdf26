use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("could not create remote image from ref {repo_name}: {reason}")]
    Access { repo_name: String, reason: String },

    #[error("could not decode config of image {repo_name}, {source}")]
    MalformedConfig {
        repo_name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("image {repo_name} has no '{label}' label")]
    MissingLabel { repo_name: String, label: String },

    #[error("could not decode '{label}' label of image {repo_name}, {source}")]
    MalformedMetadata {
        repo_name: String,
        label: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0} not found")]
    NotFound(String),

    #[error("service account '{namespace}/{name}' not found")]
    ServiceAccountNotFound { namespace: String, name: String },

    #[error("Kube error, {0}")]
    KubeError(#[from] kube::Error),
}

impl RegistryError {
    pub fn access(repo_name: &str, reason: impl ToString) -> Self {
        Self::Access {
            repo_name: repo_name.to_string(),
            reason: reason.to_string(),
        }
    }
}
