use std::{collections::BTreeMap, fmt};

use kube::{Resource, ResourceExt, api::ObjectMeta};

use crate::{
    crds::{
        ArgumentSpec, Build, BuildSpec, CnbBuild, CnbBuildSpec, CnbBuildpackMetadata,
        GitSourceSpec, SourceSpec, TemplateInstantiationSpec,
    },
    models::{
        BUILD_TEMPLATE_NAME, BUILDER_IMAGE_ARGUMENT, BuildPhase, BuildpackMetadata,
        IMAGE_ARGUMENT, MANAGED_BY_LABEL, MANAGED_BY_VALUE, ObjectKey,
    },
};

// -------------------------------------------------------------------------------
// ------------------------------- CNBBuild ---------------------------------------
// -------------------------------------------------------------------------------

impl CnbBuild {
    pub fn key(&self) -> ObjectKey {
        ObjectKey {
            namespace: self.namespace().unwrap_or_default(),
            name: self.name_any(),
        }
    }

    pub fn has_build_metadata(&self) -> bool {
        self.status
            .as_ref()
            .is_some_and(|s| !s.build_metadata.is_empty())
    }

    /// The Build executing this request: same name and namespace, controlled by `self`.
    ///
    /// Returns `None` when `self` has no uid yet (it was never persisted), because
    /// no owner reference can point at it.
    pub fn derived_build(&self) -> Option<Build> {
        let owner_reference = self.controller_owner_ref(&())?;

        let mut labels = BTreeMap::new();
        labels.insert(MANAGED_BY_LABEL.to_string(), MANAGED_BY_VALUE.to_string());

        Some(Build {
            metadata: ObjectMeta {
                name: Some(self.name_any()),
                namespace: self.namespace(),
                labels: Some(labels),
                owner_references: Some(vec![owner_reference]),
                ..Default::default()
            },
            spec: BuildSpec::from(&self.spec),
            status: None,
        })
    }
}

impl From<&CnbBuildSpec> for BuildSpec {
    fn from(spec: &CnbBuildSpec) -> Self {
        Self {
            service_account_name: Some(spec.service_account.clone()),
            source: Some(SourceSpec {
                git: Some(GitSourceSpec {
                    url: spec.git_url.clone(),
                    revision: spec.git_revision.clone(),
                }),
            }),
            template: Some(TemplateInstantiationSpec {
                name: BUILD_TEMPLATE_NAME.to_string(),
                kind: None,
                arguments: vec![
                    ArgumentSpec {
                        name: IMAGE_ARGUMENT.to_string(),
                        value: spec.image.clone(),
                    },
                    ArgumentSpec {
                        name: BUILDER_IMAGE_ARGUMENT.to_string(),
                        value: spec.builder.clone(),
                    },
                ],
            }),
            extra: BTreeMap::new(),
        }
    }
}

// Layers and any other lifecycle detail are dropped on purpose
impl From<&BuildpackMetadata> for CnbBuildpackMetadata {
    fn from(metadata: &BuildpackMetadata) -> Self {
        Self {
            id: metadata.id.clone(),
            version: metadata.version.clone(),
        }
    }
}

// -------------------------------------------------------------------------------
// ------------------------------- ObjectKey --------------------------------------
// -------------------------------------------------------------------------------

impl ObjectKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

impl fmt::Display for BuildPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let phase = match self {
            BuildPhase::Pending => "pending",
            BuildPhase::Created => "created",
            BuildPhase::Succeeded => "succeeded",
            BuildPhase::Failed => "failed",
        };
        f.write_str(phase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cnb_build() -> CnbBuild {
        let mut cnb_build = CnbBuild::new(
            "cnb-build-name",
            CnbBuildSpec {
                image: "someimage/name".to_string(),
                service_account: "someserviceaccount".to_string(),
                git_url: "giturl.com/git.git".to_string(),
                git_revision: "gitrev1234".to_string(),
                builder: "somebuilder/123".to_string(),
            },
        );
        cnb_build.metadata.namespace = Some("some-namespace".to_string());
        cnb_build.metadata.uid = Some("5d9ed9a6-5d1c-4d7c-8a43-0e0c5a0f8e11".to_string());
        cnb_build
    }

    #[test]
    fn test_derived_build_mirrors_request() {
        let cnb_build = cnb_build();
        let build = cnb_build.derived_build().unwrap();

        assert_eq!(build.metadata.name.as_deref(), Some("cnb-build-name"));
        assert_eq!(build.metadata.namespace.as_deref(), Some("some-namespace"));
        assert_eq!(
            build.spec.service_account_name.as_deref(),
            Some("someserviceaccount")
        );

        let git = build.spec.source.unwrap().git.unwrap();
        assert_eq!(git.url, "giturl.com/git.git");
        assert_eq!(git.revision, "gitrev1234");

        let template = build.spec.template.unwrap();
        assert_eq!(template.name, "buildpacks-cnb");
        assert_eq!(
            template.arguments,
            vec![
                ArgumentSpec {
                    name: "IMAGE".to_string(),
                    value: "someimage/name".to_string(),
                },
                ArgumentSpec {
                    name: "BUILDER_IMAGE".to_string(),
                    value: "somebuilder/123".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_derived_build_is_controlled_by_request() {
        let cnb_build = cnb_build();
        let build = cnb_build.derived_build().unwrap();

        let owners = build.metadata.owner_references.unwrap();
        assert_eq!(owners.len(), 1);
        assert_eq!(owners[0].kind, "CNBBuild");
        assert_eq!(owners[0].api_version, "build.pivotal.io/v1alpha1");
        assert_eq!(owners[0].name, "cnb-build-name");
        assert_eq!(owners[0].uid, "5d9ed9a6-5d1c-4d7c-8a43-0e0c5a0f8e11");
        assert_eq!(owners[0].controller, Some(true));
    }

    #[test]
    fn test_derived_build_requires_uid() {
        let mut cnb_build = cnb_build();
        cnb_build.metadata.uid = None;

        assert!(cnb_build.derived_build().is_none());
    }

    #[test]
    fn test_buildpack_projection_drops_layers() {
        let mut layers = BTreeMap::new();
        layers.insert("jdk".to_string(), serde_json::json!({ "sha": "abc" }));
        let metadata = BuildpackMetadata {
            id: "io.buildpacks.java".to_string(),
            version: "1.2.3".to_string(),
            layers,
        };

        assert_eq!(
            CnbBuildpackMetadata::from(&metadata),
            CnbBuildpackMetadata {
                id: "io.buildpacks.java".to_string(),
                version: "1.2.3".to_string(),
            }
        );
    }

    #[test]
    fn test_object_key_display() {
        let key = ObjectKey::new("some-namespace", "cnb-build-name");
        assert_eq!(key.to_string(), "some-namespace/cnb-build-name");
    }
}
