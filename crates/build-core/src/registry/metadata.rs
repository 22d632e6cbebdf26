use std::future::Future;

use kube::ResourceExt;
use serde::Deserialize;
use tracing::info;

use crate::{
    crds::CnbBuild,
    models::{BuildpackMetadata, BuiltImage},
    registry::{ImageRef, RemoteImageFactory, error::RegistryError},
};

/// Label written by the buildpacks lifecycle onto every image it exports.
pub const LIFECYCLE_METADATA_LABEL: &str = "io.buildpacks.lifecycle.metadata";

pub trait MetadataRetriever: Send + Sync {
    fn get_built_image(
        &self,
        build: &CnbBuild,
    ) -> impl Future<Output = Result<BuiltImage, RegistryError>> + Send;
}

/// Reads build results from the image pushed for a CNBBuild, authenticating as
/// the build's service account.
pub struct RegistryMetadataRetriever<F> {
    factory: F,
}

#[derive(Deserialize, Debug, Default)]
struct LifecycleMetadata {
    #[serde(default)]
    buildpacks: Vec<BuildpackMetadata>,
}

impl<F: RemoteImageFactory> RegistryMetadataRetriever<F> {
    pub fn new(factory: F) -> Self {
        Self { factory }
    }
}

impl<F: RemoteImageFactory> MetadataRetriever for RegistryMetadataRetriever<F> {
    #[tracing::instrument(
        "metadata_retriever.get_built_image",
        skip_all,
        fields(image = %build.spec.image),
        err
    )]
    async fn get_built_image(&self, build: &CnbBuild) -> Result<BuiltImage, RegistryError> {
        let image_ref = ImageRef::new(
            build.spec.image.clone(),
            build.namespace().unwrap_or_default(),
            build.spec.service_account.clone(),
        );

        let image = self.factory.open(&image_ref).await?;

        let label = image
            .label(LIFECYCLE_METADATA_LABEL)
            .map_err(|_| RegistryError::MissingLabel {
                repo_name: image.repo_name().to_string(),
                label: LIFECYCLE_METADATA_LABEL.to_string(),
            })?;
        let metadata = decode_lifecycle_metadata(image.repo_name(), label)?;
        let completed_at = image.created_at()?;

        info!(
            sha = %image.digest(),
            buildpacks = metadata.buildpacks.len(),
            "📦 Retrieved built image metadata"
        );

        Ok(BuiltImage {
            sha: image.digest().to_string(),
            completed_at,
            buildpack_metadata: metadata.buildpacks,
        })
    }
}

fn decode_lifecycle_metadata(
    repo_name: &str,
    label: &str,
) -> Result<LifecycleMetadata, RegistryError> {
    serde_json::from_str(label).map_err(|source| RegistryError::MalformedMetadata {
        repo_name: repo_name.to_string(),
        label: LIFECYCLE_METADATA_LABEL.to_string(),
        source,
    })
}
