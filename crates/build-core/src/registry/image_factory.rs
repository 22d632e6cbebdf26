use oci_distribution::{
    Reference,
    client::{Client, ClientConfig, ClientProtocol},
    secrets::RegistryAuth,
};
use tracing::{debug, info};

use crate::registry::{
    ImageConfigFile, ImageRef, Keychain, RemoteImage, RemoteImageFactory, error::RegistryError,
};

/// Opens images over the OCI distribution API using credentials from `K`.
pub struct OciImageFactory<K> {
    keychain: K,
    client: Client,
}

impl<K: Keychain> OciImageFactory<K> {
    /// Registries in `insecure_registries` are reached over plain HTTP.
    pub fn new(keychain: K, insecure_registries: Vec<String>) -> Self {
        let config = ClientConfig {
            protocol: ClientProtocol::HttpsExcept(insecure_registries),
            ..Default::default()
        };

        Self {
            keychain,
            client: Client::new(config),
        }
    }
}

impl<K: Keychain> RemoteImageFactory for OciImageFactory<K> {
    #[tracing::instrument(
        "registry.open",
        skip_all,
        fields(repo_name = %image_ref.repo_name()),
        err
    )]
    async fn open(&self, image_ref: &ImageRef) -> Result<RemoteImage, RegistryError> {
        let repo_name = image_ref.repo_name();

        let reference: Reference = repo_name
            .parse()
            .map_err(|e| RegistryError::access(repo_name, e))?;

        let credential = self
            .keychain
            .resolve(image_ref)
            .await
            .map_err(|e| RegistryError::access(repo_name, e))?;
        debug!(?credential, "🔑 Resolved registry credential");

        let auth = RegistryAuth::from(&credential);
        let (_manifest, digest, config) = self
            .client
            .pull_manifest_and_config(&reference, &auth)
            .await
            .map_err(|e| RegistryError::access(repo_name, e))?;

        let config: ImageConfigFile =
            serde_json::from_str(&config).map_err(|source| RegistryError::MalformedConfig {
                repo_name: repo_name.to_string(),
                source,
            })?;

        info!(digest = %digest, "📦 Opened remote image");

        Ok(RemoteImage::new(repo_name, digest, config))
    }
}
