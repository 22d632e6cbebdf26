use build_core::{
    crds::{CnbBuild, CnbBuildStatus},
    determiners::determine_build_phase,
    models::{BuildPhase, ObjectKey},
    registry::metadata::MetadataRetriever,
};
use tracing::{debug, info, warn};

use crate::{
    error::AppError,
    services::stores::{BuildRequestStore, DerivedBuildStore},
};

/// Keeps a CNBBuild and its Knative Build consistent.
///
/// Holds no state of its own between passes; everything is re-read from the stores.
pub struct Reconciler<B, D, M> {
    build_requests: B,
    derived_builds: D,
    metadata_retriever: M,
}

impl<B, D, M> Reconciler<B, D, M>
where
    B: BuildRequestStore,
    D: DerivedBuildStore,
    M: MetadataRetriever,
{
    pub fn new(build_requests: B, derived_builds: D, metadata_retriever: M) -> Self {
        Self {
            build_requests,
            derived_builds,
            metadata_retriever,
        }
    }

    /// One pass over the CNBBuild at `key`.
    ///
    /// Creates the Knative Build when missing, mirrors its conditions, harvests image
    /// metadata once the build succeeded, and records the observed generation. The
    /// status is written at most once. When metadata retrieval fails the mirrored
    /// conditions are still written (without advancing the observed generation)
    /// before the error is returned.
    #[tracing::instrument(name = "reconciler.reconcile", skip_all, fields(key = %key), err)]
    pub async fn reconcile(&self, key: &ObjectKey) -> Result<(), AppError> {
        let Some(mut cnb_build) = self.build_requests.get(key).await? else {
            debug!("🗑️ CNBBuild no longer exists, nothing to reconcile");
            return Ok(());
        };

        let build = match self.derived_builds.get(key).await? {
            Some(build) => build,
            None => {
                let build = cnb_build.derived_build().ok_or_else(|| {
                    AppError::InvalidObject(format!("CNBBuild {key} has no uid"))
                })?;
                let build = self.derived_builds.create(&build).await?;
                info!("🚀 Created Knative Build");
                build
            }
        };

        let phase = determine_build_phase(Some(&build));
        let stored_status = cnb_build.status.clone();

        let mut status = stored_status.clone().unwrap_or_default();
        status.conditions = build
            .status
            .as_ref()
            .and_then(|s| s.conditions.clone())
            .unwrap_or_default();
        cnb_build.status = Some(status);

        if phase == BuildPhase::Succeeded && !cnb_build.has_build_metadata() {
            match self.metadata_retriever.get_built_image(&cnb_build).await {
                Ok(built_image) => {
                    let status = cnb_build.status.get_or_insert_default();
                    if status.sha.is_none() {
                        status.sha = Some(built_image.sha);
                    }
                    status.build_metadata = built_image
                        .buildpack_metadata
                        .iter()
                        .map(Into::into)
                        .collect();
                    info!(
                        buildpacks = status.build_metadata.len(),
                        "📦 Recorded built image metadata"
                    );
                }
                Err(e) => {
                    warn!(error = %e, "⚠️ Could not retrieve built image metadata");
                    self.write_status(&cnb_build, stored_status.as_ref())
                        .await?;
                    return Err(e.into());
                }
            }
        }

        let generation = cnb_build.metadata.generation;
        cnb_build.status.get_or_insert_default().observed_generation = generation;

        self.write_status(&cnb_build, stored_status.as_ref()).await?;

        info!(phase = %phase, "✅ Reconciled");

        Ok(())
    }

    async fn write_status(
        &self,
        cnb_build: &CnbBuild,
        stored_status: Option<&CnbBuildStatus>,
    ) -> Result<(), AppError> {
        if cnb_build.status.as_ref() == stored_status {
            debug!("Status unchanged, skipping write");
            return Ok(());
        }

        self.build_requests.update_status(cnb_build).await?;
        Ok(())
    }
}
