use std::path::{Path, PathBuf};

/// Loads `<manifest_dir>/.env`, then the workspace `.env` as fallback.
/// Variables already present in the process environment are never overridden.
pub fn load_service_env(cargo_manifest_dir: &Path) {
    let env_path = cargo_manifest_dir.join(".env");

    dotenvy::from_path(&env_path).ok();
    dotenvy::dotenv().ok();
}

/// Resolves the config file path from `CONFIG`, relative to the manifest dir.
pub fn config_path(cargo_manifest_dir: &Path, default_file: &str) -> PathBuf {
    let file = dotenvy::var("CONFIG").unwrap_or_else(|_| default_file.to_string());
    let path = PathBuf::from(&file);

    if path.is_absolute() {
        path
    } else {
        cargo_manifest_dir.join(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_path_keeps_absolute_paths() {
        let dir = Path::new("/srv/build-reconciler");
        let resolved = config_path(dir, "/etc/build-reconciler/config.json");

        // CONFIG may be set in the environment, in which case it wins
        if dotenvy::var("CONFIG").is_err() {
            assert_eq!(resolved, PathBuf::from("/etc/build-reconciler/config.json"));
        }
    }

    #[test]
    fn test_config_path_joins_relative_paths() {
        if dotenvy::var("CONFIG").is_err() {
            let dir = Path::new("/srv/build-reconciler");
            assert_eq!(
                config_path(dir, "config.json"),
                PathBuf::from("/srv/build-reconciler/config.json")
            );
        }
    }
}
