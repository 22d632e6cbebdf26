use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;

pub const SUCCEEDED_CONDITION: &str = "Succeeded";
pub const CONDITION_TRUE: &str = "True";
pub const CONDITION_FALSE: &str = "False";

pub const BUILD_TEMPLATE_NAME: &str = "buildpacks-cnb";
pub const IMAGE_ARGUMENT: &str = "IMAGE";
pub const BUILDER_IMAGE_ARGUMENT: &str = "BUILDER_IMAGE";

pub const MANAGED_BY_LABEL: &str = "app.kubernetes.io/managed-by";
pub const MANAGED_BY_VALUE: &str = "build-reconciler";

/// Identity shared by a CNBBuild and the Build derived from it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ObjectKey {
    pub namespace: String,
    pub name: String,
}

/// Lifecycle of a CNBBuild, computed from the derived Build on every pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuildPhase {
    /// No derived Build exists yet
    Pending,
    /// Derived Build exists, Succeeded is Unknown or not reported
    Created,
    Succeeded,
    Failed,
}

/// Output of a finished build as read back from the registry.
#[derive(Clone, Debug, PartialEq)]
pub struct BuiltImage {
    pub sha: String,
    pub completed_at: DateTime<Utc>,
    pub buildpack_metadata: Vec<BuildpackMetadata>,
}

#[derive(Deserialize, Clone, Debug, Default, PartialEq)]
pub struct BuildpackMetadata {
    #[serde(rename = "key", alias = "id")]
    pub id: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub layers: BTreeMap<String, serde_json::Value>,
}
