use neurone_core::{parse_configuration, NodeConfig};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const CONFIG_FILE: &str = "neurone.json";

/// Returns the ~/.neurone directory, creating it if needed.
/// Falls back to a local `.neurone` directory if the home directory cannot be determined.
pub fn neurone_data_dir() -> PathBuf {
    match dirs::home_dir() {
        Some(mut path) => {
            path.push(".neurone");
            if let Err(e) = fs::create_dir_all(&path) {
                warn!(error = %e, "Could not create ~/.neurone, falling back to local .neurone");
                return PathBuf::from(".neurone");
            }
            path
        }
        None => {
            warn!("Could not determine home directory, falling back to local .neurone");
            PathBuf::from(".neurone")
        }
    }
}

pub fn default_config_path() -> PathBuf {
    neurone_data_dir().join(CONFIG_FILE)
}

/// Load the node configuration, carrying on with defaults if it is unusable.
pub fn load(path: &Path) -> NodeConfig {
    let (config, result) = parse_configuration(path);
    match result {
        Ok(()) => info!(path = ?path, "Configuration loaded"),
        Err(e) => warn!(path = ?path, error = %e, "Configuration unusable, using defaults"),
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load(&dir.path().join("absent.json"));
        assert_eq!(config, NodeConfig::default());
    }

    #[test]
    fn test_load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("node.json");
        fs::write(&path, r#"{"masterNode": true, "listenAddress": ":9000"}"#).unwrap();

        let config = load(&path);
        assert!(config.master_node);
        assert_eq!(config.bind_address(), "0.0.0.0:9000");
    }
}
