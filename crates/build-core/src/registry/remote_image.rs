use chrono::{DateTime, Utc};

use crate::registry::{ImageConfigFile, RemoteImage, error::RegistryError};

impl RemoteImage {
    pub fn new(
        repo_name: impl Into<String>,
        digest: impl Into<String>,
        config: ImageConfigFile,
    ) -> Self {
        Self {
            repo_name: repo_name.into(),
            digest: digest.into(),
            config,
        }
    }

    pub fn repo_name(&self) -> &str {
        &self.repo_name
    }

    pub fn digest(&self) -> &str {
        &self.digest
    }

    pub fn created_at(&self) -> Result<DateTime<Utc>, RegistryError> {
        self.config.created.ok_or_else(|| {
            RegistryError::NotFound(format!("creation time of image {}", self.repo_name))
        })
    }

    pub fn label(&self, name: &str) -> Result<&str, RegistryError> {
        self.config
            .config
            .as_ref()
            .and_then(|c| c.labels.as_ref())
            .and_then(|labels| labels.get(name))
            .map(String::as_str)
            .ok_or_else(|| {
                RegistryError::NotFound(format!("label '{}' on image {}", name, self.repo_name))
            })
    }

    /// First `KEY=VALUE` entry of the image environment whose key matches.
    pub fn env(&self, key: &str) -> Result<&str, RegistryError> {
        self.config
            .config
            .as_ref()
            .and_then(|c| c.env.as_ref())
            .and_then(|env| {
                env.iter()
                    .filter_map(|entry| entry.split_once('='))
                    .find(|(k, _)| *k == key)
                    .map(|(_, v)| v)
            })
            .ok_or_else(|| {
                RegistryError::NotFound(format!("env '{}' on image {}", key, self.repo_name))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"{
        "architecture": "amd64",
        "created": "2019-03-04T18:21:46.142873Z",
        "config": {
            "Env": ["PATH=/usr/bin:/bin", "CNB_STACK_ID=io.buildpacks.stacks.bionic", "EMPTY="],
            "Labels": {"io.buildpacks.stack.id": "io.buildpacks.stacks.bionic"}
        }
    }"#;

    fn image() -> RemoteImage {
        let config: ImageConfigFile = serde_json::from_str(CONFIG).unwrap();
        RemoteImage::new("someimage/name", "sha256:1234567", config)
    }

    #[test]
    fn test_reads_digest_and_creation_time() {
        let image = image();

        assert_eq!(image.digest(), "sha256:1234567");
        assert_eq!(
            image.created_at().unwrap().to_rfc3339(),
            "2019-03-04T18:21:46.142873+00:00"
        );
    }

    #[test]
    fn test_reads_labels() {
        let image = image();

        assert_eq!(
            image.label("io.buildpacks.stack.id").unwrap(),
            "io.buildpacks.stacks.bionic"
        );
        assert!(matches!(
            image.label("missing"),
            Err(RegistryError::NotFound(_))
        ));
    }

    #[test]
    fn test_reads_env() {
        let image = image();

        assert_eq!(image.env("CNB_STACK_ID").unwrap(), "io.buildpacks.stacks.bionic");
        assert_eq!(image.env("EMPTY").unwrap(), "");
        assert!(matches!(image.env("HOME"), Err(RegistryError::NotFound(_))));
    }

    #[test]
    fn test_tolerates_null_config() {
        let config: ImageConfigFile =
            serde_json::from_str(r#"{"config": {"Env": null, "Labels": null}}"#).unwrap();
        let image = RemoteImage::new("someimage/name", "sha256:1234567", config);

        assert!(image.label("anything").is_err());
        assert!(image.env("PATH").is_err());
        assert!(image.created_at().is_err());
    }
}
