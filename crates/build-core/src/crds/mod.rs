use kube::CustomResource;
use serde::{Deserialize, Serialize};

pub const CNB_BUILD_CRD_NAME: &str = "cnbbuilds.build.pivotal.io";
pub const KNATIVE_BUILD_CRD_NAME: &str = "builds.build.knative.dev";

// -----------------------------------------------------------------------------
// CNBBuild Resource (user facing build request)
// -----------------------------------------------------------------------------
#[derive(CustomResource, Deserialize, Serialize, Clone, Default, Debug, PartialEq)]
#[kube(
    group = "build.pivotal.io",
    version = "v1alpha1",
    kind = "CNBBuild",
    root = "CnbBuild",
    plural = "cnbbuilds",
    shortname = "cnbb",
    namespaced,
    schema = "disabled",
    status = "CnbBuildStatus",
    derive = "PartialEq"
)]
#[serde(rename_all = "camelCase")]
pub struct CnbBuildSpec {
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub service_account: String,
    #[serde(default)]
    pub git_url: String,
    #[serde(default)]
    pub git_revision: String,
    #[serde(default)]
    pub builder: String,
}

/// Every field is owned by the reconciler and written back as a whole.
#[derive(Deserialize, Serialize, Clone, Default, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CnbBuildStatus {
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub observed_generation: Option<i64>,
    #[serde(default)]
    pub sha: Option<String>,
    #[serde(default)]
    pub build_metadata: Vec<CnbBuildpackMetadata>,
}

#[derive(Deserialize, Serialize, Clone, Default, Debug, PartialEq, Eq)]
pub struct CnbBuildpackMetadata {
    pub id: String,
    pub version: String,
}

// -----------------------------------------------------------------------------
// Knative Build Resource (executes the build, created once per CNBBuild)
// -----------------------------------------------------------------------------
#[derive(CustomResource, Deserialize, Serialize, Clone, Default, Debug, PartialEq)]
#[kube(
    group = "build.knative.dev",
    version = "v1alpha1",
    kind = "Build",
    plural = "builds",
    namespaced,
    schema = "disabled",
    status = "BuildStatus",
    derive = "PartialEq"
)]
#[serde(rename_all = "camelCase")]
pub struct BuildSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_account_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<TemplateInstantiationSpec>,

    // steps, volumes, timeout... are never set by us but must survive a round trip
    #[serde(flatten)]
    pub extra: std::collections::BTreeMap<String, serde_json::Value>,
}

#[derive(Deserialize, Serialize, Clone, Default, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BuildStatus {
    #[serde(default)]
    pub conditions: Option<Vec<Condition>>,

    #[serde(flatten)]
    pub extra: std::collections::BTreeMap<String, serde_json::Value>,
}

// -----------------------------------------------------------------------------
// Shared Sub-Types
// -----------------------------------------------------------------------------
#[derive(Deserialize, Serialize, Clone, Default, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SourceSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git: Option<GitSourceSpec>,
}

#[derive(Deserialize, Serialize, Clone, Default, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GitSourceSpec {
    pub url: String,
    pub revision: String,
}

#[derive(Deserialize, Serialize, Clone, Default, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TemplateInstantiationSpec {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub arguments: Vec<ArgumentSpec>,
}

#[derive(Deserialize, Serialize, Clone, Default, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ArgumentSpec {
    pub name: String,
    pub value: String,
}

// Knative duck-typed condition, copied verbatim between the two resources
#[derive(Deserialize, Serialize, Clone, Default, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    pub r#type: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
