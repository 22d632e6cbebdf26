//! Read-only access to images in a container registry.
//!
//! [`RemoteImageFactory::open`] resolves credentials for an [`ImageRef`] through a
//! [`Keychain`] and returns a [`RemoteImage`] handle exposing the image's digest,
//! creation time, labels and environment. Nothing is cached: every `open` talks to
//! the registry again.

pub mod error;
pub mod image_factory;
pub mod keychain;
pub mod metadata;
pub mod remote_image;

use std::{collections::BTreeMap, fmt, future::Future};

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::registry::error::RegistryError;

/// Identity used when a build names no service account.
pub const DEFAULT_SERVICE_ACCOUNT: &str = "default";

/// Image reference plus the identity whose credentials should be used to read it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImageRef {
    ServiceAccount {
        repo_name: String,
        namespace: String,
        service_account: String,
    },
    /// Anonymous read, for public images.
    NoAuth { repo_name: String },
}

#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    Anonymous,
    Basic { username: String, password: String },
}

/// Handle on an image manifest and its config blob, fetched when opened.
#[derive(Clone, Debug, PartialEq)]
pub struct RemoteImage {
    repo_name: String,
    digest: String,
    config: ImageConfigFile,
}

/// Subset of the OCI image config the handle reads.
#[derive(Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ImageConfigFile {
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub config: Option<ContainerConfig>,
}

#[derive(Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerConfig {
    #[serde(default)]
    pub labels: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub env: Option<Vec<String>>,
}

pub trait Keychain: Send + Sync {
    fn resolve(
        &self,
        image_ref: &ImageRef,
    ) -> impl Future<Output = Result<Credential, RegistryError>> + Send;
}

pub trait RemoteImageFactory: Send + Sync {
    fn open(
        &self,
        image_ref: &ImageRef,
    ) -> impl Future<Output = Result<RemoteImage, RegistryError>> + Send;
}

impl ImageRef {
    /// An empty `service_account` falls back to [`DEFAULT_SERVICE_ACCOUNT`], the identity
    /// the Knative Build itself runs as.
    pub fn new(
        repo_name: impl Into<String>,
        namespace: impl Into<String>,
        service_account: impl Into<String>,
    ) -> Self {
        let mut service_account = service_account.into();
        if service_account.is_empty() {
            service_account = DEFAULT_SERVICE_ACCOUNT.to_string();
        }

        Self::ServiceAccount {
            repo_name: repo_name.into(),
            namespace: namespace.into(),
            service_account,
        }
    }

    pub fn no_auth(repo_name: impl Into<String>) -> Self {
        Self::NoAuth {
            repo_name: repo_name.into(),
        }
    }

    pub fn repo_name(&self) -> &str {
        match self {
            Self::ServiceAccount { repo_name, .. } | Self::NoAuth { repo_name } => repo_name,
        }
    }

    pub fn namespace(&self) -> Option<&str> {
        match self {
            Self::ServiceAccount { namespace, .. } => Some(namespace),
            Self::NoAuth { .. } => None,
        }
    }

    pub fn service_account(&self) -> Option<&str> {
        match self {
            Self::ServiceAccount {
                service_account, ..
            } => Some(service_account),
            Self::NoAuth { .. } => None,
        }
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.repo_name())
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anonymous => f.write_str("Anonymous"),
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"[REDACTED]")
                .finish(),
        }
    }
}

impl From<&Credential> for oci_distribution::secrets::RegistryAuth {
    fn from(credential: &Credential) -> Self {
        match credential {
            Credential::Anonymous => Self::Anonymous,
            Credential::Basic { username, password } => {
                Self::Basic(username.clone(), password.clone())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_auth_ref_has_no_identity() {
        let image_ref = ImageRef::no_auth("gcr.io/public/image");

        assert_eq!(image_ref.repo_name(), "gcr.io/public/image");
        assert_eq!(image_ref.namespace(), None);
        assert_eq!(image_ref.service_account(), None);
    }

    #[test]
    fn test_service_account_ref_exposes_identity() {
        let image_ref = ImageRef::new("someimage/name", "some-namespace", "someserviceaccount");

        assert_eq!(image_ref.repo_name(), "someimage/name");
        assert_eq!(image_ref.namespace(), Some("some-namespace"));
        assert_eq!(image_ref.service_account(), Some("someserviceaccount"));
    }

    #[test]
    fn test_empty_service_account_falls_back_to_default() {
        let image_ref = ImageRef::new("someimage/name", "some-namespace", "");

        assert_eq!(image_ref.service_account(), Some(DEFAULT_SERVICE_ACCOUNT));
    }

    #[test]
    fn test_credential_debug_redacts_password() {
        let credential = Credential::Basic {
            username: "robot".to_string(),
            password: "hunter2".to_string(),
        };

        let printed = format!("{credential:?}");
        assert!(printed.contains("robot"));
        assert!(!printed.contains("hunter2"));
    }
}
