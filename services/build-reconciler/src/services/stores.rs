use std::future::Future;

use build_core::{
    crds::{Build, CnbBuild},
    models::ObjectKey,
};
use kube::{
    Api, Client, ResourceExt,
    api::{Patch, PatchParams, PostParams},
};
use serde_json::json;

use crate::error::AppError;

pub trait BuildRequestStore: Send + Sync {
    fn get(
        &self,
        key: &ObjectKey,
    ) -> impl Future<Output = Result<Option<CnbBuild>, AppError>> + Send;

    /// Replaces the whole status of `build`. Fails with [`AppError::Conflict`] when
    /// `build` carries a stale resourceVersion.
    fn update_status(
        &self,
        build: &CnbBuild,
    ) -> impl Future<Output = Result<CnbBuild, AppError>> + Send;
}

pub trait DerivedBuildStore: Send + Sync {
    fn get(&self, key: &ObjectKey)
    -> impl Future<Output = Result<Option<Build>, AppError>> + Send;

    fn create(&self, build: &Build) -> impl Future<Output = Result<Build, AppError>> + Send;
}

#[derive(Clone)]
pub struct KubeBuildRequestStore {
    client: Client,
}

#[derive(Clone)]
pub struct KubeDerivedBuildStore {
    client: Client,
}

impl KubeBuildRequestStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl KubeDerivedBuildStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl BuildRequestStore for KubeBuildRequestStore {
    async fn get(&self, key: &ObjectKey) -> Result<Option<CnbBuild>, AppError> {
        let api: Api<CnbBuild> = Api::namespaced(self.client.clone(), &key.namespace);
        Ok(api.get_opt(&key.name).await?)
    }

    #[tracing::instrument(
        "build_request_store.update_status",
        skip_all,
        fields(key = %build.key()),
        err
    )]
    async fn update_status(&self, build: &CnbBuild) -> Result<CnbBuild, AppError> {
        let key = build.key();
        let api: Api<CnbBuild> = Api::namespaced(self.client.clone(), &key.namespace);

        // resourceVersion turns the merge patch into a conditional write;
        // lists in a merge patch replace, they never merge
        let patch = json!({
            "metadata": { "resourceVersion": build.resource_version() },
            "status": build.status.clone().unwrap_or_default(),
        });

        Ok(api
            .patch_status(&key.name, &PatchParams::default(), &Patch::Merge(&patch))
            .await?)
    }
}

impl DerivedBuildStore for KubeDerivedBuildStore {
    async fn get(&self, key: &ObjectKey) -> Result<Option<Build>, AppError> {
        let api: Api<Build> = Api::namespaced(self.client.clone(), &key.namespace);
        Ok(api.get_opt(&key.name).await?)
    }

    #[tracing::instrument(
        "derived_build_store.create",
        skip_all,
        fields(name = %build.name_any()),
        err
    )]
    async fn create(&self, build: &Build) -> Result<Build, AppError> {
        let namespace = build.namespace().ok_or_else(|| {
            AppError::InvalidObject(format!("Build {} has no namespace", build.name_any()))
        })?;
        let api: Api<Build> = Api::namespaced(self.client.clone(), &namespace);

        Ok(api.create(&PostParams::default(), build).await?)
    }
}
