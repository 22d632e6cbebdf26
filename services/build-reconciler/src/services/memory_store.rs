//! In-memory stores and retriever used by the reconciler tests.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use build_core::{
    crds::{Build, BuildStatus, CnbBuild, CnbBuildSpec, Condition},
    models::{BuiltImage, ObjectKey},
    registry::{error::RegistryError, metadata::MetadataRetriever},
};

use crate::{
    error::AppError,
    services::stores::{BuildRequestStore, DerivedBuildStore},
};

#[derive(Default)]
struct BuildRequestState {
    objects: HashMap<ObjectKey, CnbBuild>,
    status_writes: usize,
    next_version: u64,
}

/// Behaves like the API server for the parts the reconciler relies on: generation
/// bumps on spec edits and resourceVersion checks on status writes.
#[derive(Clone, Default)]
pub struct InMemoryBuildRequestStore {
    state: Arc<Mutex<BuildRequestState>>,
}

impl InMemoryBuildRequestStore {
    pub fn create(&self, namespace: &str, name: &str, spec: CnbBuildSpec) -> CnbBuild {
        let mut state = self.state.lock().unwrap();
        state.next_version += 1;

        let mut build = CnbBuild::new(name, spec);
        build.metadata.namespace = Some(namespace.to_string());
        build.metadata.uid = Some(format!("uid-{namespace}-{name}"));
        build.metadata.generation = Some(1);
        build.metadata.resource_version = Some(state.next_version.to_string());

        state
            .objects
            .insert(ObjectKey::new(namespace, name), build.clone());
        build
    }

    pub fn update_spec(&self, key: &ObjectKey, spec: CnbBuildSpec) {
        let mut state = self.state.lock().unwrap();
        state.next_version += 1;
        let version = state.next_version.to_string();

        let build = state.objects.get_mut(key).unwrap();
        build.spec = spec;
        build.metadata.generation = Some(build.metadata.generation.unwrap_or_default() + 1);
        build.metadata.resource_version = Some(version);
    }

    pub fn set_generation(&self, key: &ObjectKey, generation: i64) {
        let mut state = self.state.lock().unwrap();
        state.next_version += 1;
        let version = state.next_version.to_string();

        let build = state.objects.get_mut(key).unwrap();
        build.metadata.generation = Some(generation);
        build.metadata.resource_version = Some(version);
    }

    pub fn delete(&self, key: &ObjectKey) {
        self.state.lock().unwrap().objects.remove(key);
    }

    pub fn stored(&self, key: &ObjectKey) -> CnbBuild {
        self.state.lock().unwrap().objects[key].clone()
    }

    pub fn status_writes(&self) -> usize {
        self.state.lock().unwrap().status_writes
    }
}

impl BuildRequestStore for InMemoryBuildRequestStore {
    async fn get(&self, key: &ObjectKey) -> Result<Option<CnbBuild>, AppError> {
        Ok(self.state.lock().unwrap().objects.get(key).cloned())
    }

    async fn update_status(&self, build: &CnbBuild) -> Result<CnbBuild, AppError> {
        let key = build.key();
        let mut state = self.state.lock().unwrap();
        state.next_version += 1;
        let version = state.next_version.to_string();

        let Some(stored) = state.objects.get_mut(&key) else {
            return Err(AppError::NotFoundError(format!("CNBBuild {key} not found")));
        };
        if stored.metadata.resource_version != build.metadata.resource_version {
            return Err(AppError::Conflict(format!(
                "CNBBuild {key} was modified concurrently"
            )));
        }

        stored.status = build.status.clone();
        stored.metadata.resource_version = Some(version);
        let updated = stored.clone();
        state.status_writes += 1;

        Ok(updated)
    }
}

#[derive(Default)]
struct DerivedBuildState {
    objects: HashMap<ObjectKey, Build>,
    creates: usize,
}

#[derive(Clone, Default)]
pub struct InMemoryDerivedBuildStore {
    state: Arc<Mutex<DerivedBuildState>>,
}

impl InMemoryDerivedBuildStore {
    /// Stands in for the build executor reporting progress.
    pub fn set_conditions(&self, key: &ObjectKey, conditions: Vec<Condition>) {
        let mut state = self.state.lock().unwrap();
        let build = state.objects.get_mut(key).unwrap();
        build.status = Some(BuildStatus {
            conditions: Some(conditions),
            ..Default::default()
        });
    }

    pub fn stored(&self, key: &ObjectKey) -> Option<Build> {
        self.state.lock().unwrap().objects.get(key).cloned()
    }

    pub fn creates(&self) -> usize {
        self.state.lock().unwrap().creates
    }
}

impl DerivedBuildStore for InMemoryDerivedBuildStore {
    async fn get(&self, key: &ObjectKey) -> Result<Option<Build>, AppError> {
        Ok(self.state.lock().unwrap().objects.get(key).cloned())
    }

    async fn create(&self, build: &Build) -> Result<Build, AppError> {
        let key = ObjectKey::new(
            build.metadata.namespace.clone().unwrap_or_default(),
            build.metadata.name.clone().unwrap_or_default(),
        );
        let mut state = self.state.lock().unwrap();

        if state.objects.contains_key(&key) {
            return Err(AppError::Conflict(format!("Build {key} already exists")));
        }

        state.objects.insert(key, build.clone());
        state.creates += 1;

        Ok(build.clone())
    }
}

#[derive(Default)]
struct RetrieverState {
    result: Option<BuiltImage>,
    failure: Option<String>,
    calls: Vec<CnbBuild>,
}

#[derive(Clone, Default)]
pub struct FakeMetadataRetriever {
    state: Arc<Mutex<RetrieverState>>,
}

impl FakeMetadataRetriever {
    pub fn returns(&self, built_image: BuiltImage) {
        let mut state = self.state.lock().unwrap();
        state.result = Some(built_image);
        state.failure = None;
    }

    pub fn fails_with(&self, reason: &str) {
        self.state.lock().unwrap().failure = Some(reason.to_string());
    }

    pub fn call_count(&self) -> usize {
        self.state.lock().unwrap().calls.len()
    }

    pub fn args_for_call(&self, i: usize) -> CnbBuild {
        self.state.lock().unwrap().calls[i].clone()
    }
}

impl MetadataRetriever for FakeMetadataRetriever {
    async fn get_built_image(&self, build: &CnbBuild) -> Result<BuiltImage, RegistryError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(build.clone());

        if let Some(reason) = &state.failure {
            return Err(RegistryError::access(&build.spec.image, reason));
        }

        state
            .result
            .clone()
            .ok_or_else(|| RegistryError::NotFound(format!("image {}", build.spec.image)))
    }
}
