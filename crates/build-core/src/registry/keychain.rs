use std::collections::BTreeMap;

use base64::{Engine, engine::general_purpose::STANDARD};
use k8s_openapi::api::core::v1::{Secret, ServiceAccount};
use kube::{Api, Client};
use oci_distribution::Reference;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::registry::{Credential, ImageRef, Keychain, error::RegistryError};

const DOCKER_CONFIG_JSON_TYPE: &str = "kubernetes.io/dockerconfigjson";
const DOCKER_CONFIG_JSON_KEY: &str = ".dockerconfigjson";
const DOCKER_CFG_TYPE: &str = "kubernetes.io/dockercfg";
const DOCKER_CFG_KEY: &str = ".dockercfg";
const BASIC_AUTH_TYPE: &str = "kubernetes.io/basic-auth";
const KNATIVE_DOCKER_ANNOTATION_PREFIX: &str = "build.knative.dev/docker-";

const DOCKER_HUB: &str = "index.docker.io";

/// Resolves credentials from the registry secrets attached to the ref's service account.
///
/// Both `imagePullSecrets` and `secrets` are searched, in that order. Docker config
/// secrets are matched on their `auths` keys, basic-auth secrets on their
/// `build.knative.dev/docker-*` annotations. When nothing matches the image's
/// registry the read is anonymous.
#[derive(Clone)]
pub struct ServiceAccountKeychain {
    client: Client,
}

#[derive(Deserialize, Debug, Default)]
struct DockerConfig {
    #[serde(default)]
    auths: BTreeMap<String, DockerAuthEntry>,
}

#[derive(Deserialize, Debug, Default)]
struct DockerAuthEntry {
    auth: Option<String>,
    username: Option<String>,
    password: Option<String>,
}

impl ServiceAccountKeychain {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl Keychain for ServiceAccountKeychain {
    #[tracing::instrument(
        name = "keychain.resolve",
        skip_all,
        fields(repo_name = %image_ref.repo_name()),
        err
    )]
    async fn resolve(&self, image_ref: &ImageRef) -> Result<Credential, RegistryError> {
        let (Some(namespace), Some(service_account)) =
            (image_ref.namespace(), image_ref.service_account())
        else {
            return Ok(Credential::Anonymous);
        };

        let registry = registry_of(image_ref.repo_name())?;

        let service_account_api: Api<ServiceAccount> =
            Api::namespaced(self.client.clone(), namespace);
        let Some(account) = service_account_api.get_opt(service_account).await? else {
            return Err(RegistryError::ServiceAccountNotFound {
                namespace: namespace.to_string(),
                name: service_account.to_string(),
            });
        };

        let secret_api: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        for name in secret_names(&account) {
            let Some(secret) = secret_api.get_opt(&name).await? else {
                warn!(secret = %name, "⚠️ Secret referenced by service account does not exist");
                continue;
            };

            if let Some(credential) = credential_from_secret(&secret, &registry) {
                debug!(secret = %name, registry = %registry, "🔑 Found registry credential");
                return Ok(credential);
            }
        }

        Ok(Credential::Anonymous)
    }
}

fn secret_names(account: &ServiceAccount) -> Vec<String> {
    let pull_secrets = account
        .image_pull_secrets
        .iter()
        .flatten()
        .map(|r| r.name.clone());
    let secrets = account
        .secrets
        .iter()
        .flatten()
        .filter_map(|r| r.name.clone());

    let mut names: Vec<String> = Vec::new();
    for name in pull_secrets.chain(secrets) {
        if !name.is_empty() && !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

fn registry_of(repo_name: &str) -> Result<String, RegistryError> {
    let reference: Reference = repo_name
        .parse()
        .map_err(|e| RegistryError::access(repo_name, e))?;

    Ok(normalize_registry(reference.registry()))
}

/// Reduces a registry key such as `https://index.docker.io/v1/` to its host.
fn normalize_registry(registry: &str) -> String {
    let host = registry
        .trim_start_matches("https://")
        .trim_start_matches("http://");
    let host = host.split('/').next().unwrap_or(host).to_lowercase();

    match host.as_str() {
        "docker.io" | "registry-1.docker.io" | "index.docker.io" => DOCKER_HUB.to_string(),
        _ => host,
    }
}

fn credential_from_secret(secret: &Secret, registry: &str) -> Option<Credential> {
    let data = secret.data.as_ref()?;

    match secret.type_.as_deref() {
        Some(DOCKER_CONFIG_JSON_TYPE) => {
            let raw = data.get(DOCKER_CONFIG_JSON_KEY)?;
            match serde_json::from_slice::<DockerConfig>(&raw.0) {
                Ok(config) => credential_from_auths(&config.auths, registry),
                Err(e) => {
                    warn!(error = %e, "⚠️ Ignoring malformed docker config secret");
                    None
                }
            }
        }
        Some(DOCKER_CFG_TYPE) => {
            let raw = data.get(DOCKER_CFG_KEY)?;
            match serde_json::from_slice::<BTreeMap<String, DockerAuthEntry>>(&raw.0) {
                Ok(auths) => credential_from_auths(&auths, registry),
                Err(e) => {
                    warn!(error = %e, "⚠️ Ignoring malformed dockercfg secret");
                    None
                }
            }
        }
        Some(BASIC_AUTH_TYPE) => {
            let annotated = secret.metadata.annotations.as_ref()?.iter().any(|(k, v)| {
                k.starts_with(KNATIVE_DOCKER_ANNOTATION_PREFIX) && normalize_registry(v) == registry
            });
            if !annotated {
                return None;
            }

            let username = String::from_utf8(data.get("username")?.0.clone()).ok()?;
            let password = String::from_utf8(data.get("password")?.0.clone()).ok()?;
            Some(Credential::Basic { username, password })
        }
        _ => None,
    }
}

fn credential_from_auths(
    auths: &BTreeMap<String, DockerAuthEntry>,
    registry: &str,
) -> Option<Credential> {
    auths
        .iter()
        .filter(|(key, _)| normalize_registry(key) == registry)
        .find_map(|(_, entry)| decode_auth_entry(entry))
}

fn decode_auth_entry(entry: &DockerAuthEntry) -> Option<Credential> {
    if let (Some(username), Some(password)) = (&entry.username, &entry.password) {
        return Some(Credential::Basic {
            username: username.clone(),
            password: password.clone(),
        });
    }

    let decoded = STANDARD.decode(entry.auth.as_ref()?.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;

    Some(Credential::Basic {
        username: username.to_string(),
        password: password.to_string(),
    })
}
