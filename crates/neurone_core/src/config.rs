use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Errors raised while loading a node configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in config file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid TOML in config file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid timing {name} = {value}: must be a finite, non-negative number of seconds")]
    InvalidTiming { name: &'static str, value: f64 },
}

/// A neighbouring neurone and the energy delivered to it when notified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Peer {
    #[serde(alias = "Address")]
    pub address: String,
    #[serde(alias = "Transfer")]
    pub transfer: f32,
}

impl Peer {
    pub fn new(address: impl Into<String>, transfer: f32) -> Self {
        Self {
            address: address.into(),
            transfer,
        }
    }
}

/// Phase lengths and thresholds driving the axon.
///
/// Durations are stored as seconds (or milliseconds for the poll intervals) so
/// that they read naturally in a config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Timings {
    /// How long the master holds everyone in `Wait` before broadcasting startup.
    pub wait: f64,
    /// How long a follower waits for the master before going interactive.
    pub wait_timeout: f64,
    pub startup: f64,
    pub cooldown: f64,
    pub powerup: f64,
    /// Bounded receive used by every phase except the master's wait.
    pub drain_poll_ms: u64,
    pub master_poll_ms: u64,
    pub fire_threshold: f32,
    pub powerup_threshold: f32,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            wait: 30.0,
            wait_timeout: 400.0,
            startup: 20.0,
            cooldown: 4.0,
            powerup: 3.0,
            drain_poll_ms: 250,
            master_poll_ms: 5,
            fire_threshold: 1.0,
            powerup_threshold: 0.45,
        }
    }
}

impl Timings {
    /// Reject phase lengths that cannot be turned into a `Duration`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let lengths = [
            ("wait", self.wait),
            ("waitTimeout", self.wait_timeout),
            ("startup", self.startup),
            ("cooldown", self.cooldown),
            ("powerup", self.powerup),
        ];
        for (name, value) in lengths {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidTiming { name, value });
            }
        }
        Ok(())
    }

    pub fn wait_length(&self) -> Duration {
        seconds(self.wait)
    }

    pub fn wait_timeout(&self) -> Duration {
        seconds(self.wait_timeout)
    }

    pub fn startup_length(&self) -> Duration {
        seconds(self.startup)
    }

    pub fn cooldown_length(&self) -> Duration {
        seconds(self.cooldown)
    }

    pub fn powerup_length(&self) -> Duration {
        seconds(self.powerup)
    }

    pub fn drain_poll(&self) -> Duration {
        Duration::from_millis(self.drain_poll_ms)
    }

    pub fn master_poll(&self) -> Duration {
        Duration::from_millis(self.master_poll_ms)
    }
}

/// Timings built in code skip `validate`; an unusable length collapses to zero.
fn seconds(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(Duration::ZERO)
}

/// Static topology and tuning of one neurone. Loaded once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeConfig {
    #[serde(default = "default_optical_flow_scale", alias = "OpticalFlowScale")]
    pub optical_flow_scale: f64,
    #[serde(default = "default_movement_threshold", alias = "MovementThreshold")]
    pub movement_threshold: f64,
    #[serde(default = "default_listen_address", alias = "ListenAddress")]
    pub listen_address: String,
    #[serde(default, alias = "MasterNeurone", alias = "MasterNode")]
    pub master_node: bool,
    /// Neighbours excited when this neurone fires.
    #[serde(
        default,
        alias = "AdjacentNeurones",
        alias = "AdjacentNeurons",
        alias = "AdjacentNodes"
    )]
    pub adjacent_nodes: Vec<Peer>,
    /// Every neurone in the installation; only the master's startup broadcast uses it.
    #[serde(default, alias = "AllNeurones", alias = "AllNodes")]
    pub all_nodes: Vec<Peer>,
    #[serde(default, alias = "Timings")]
    pub timings: Timings,
}

fn default_optical_flow_scale() -> f64 {
    1000.0
}

fn default_movement_threshold() -> f64 {
    1.0
}

fn default_listen_address() -> String {
    ":8080".to_string()
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            optical_flow_scale: default_optical_flow_scale(),
            movement_threshold: default_movement_threshold(),
            listen_address: default_listen_address(),
            master_node: false,
            adjacent_nodes: Vec::new(),
            all_nodes: Vec::new(),
            timings: Timings::default(),
        }
    }
}

impl NodeConfig {
    /// Parse a config document. Files ending in `.toml` are TOML, everything else JSON.
    pub fn from_document(path: &Path, content: &str) -> Result<Self, ConfigError> {
        let is_toml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

        let config: NodeConfig = if is_toml {
            toml::from_str(content)?
        } else {
            serde_json::from_str(content)?
        };
        config.timings.validate()?;
        Ok(config)
    }

    /// Socket address suitable for binding. A bare `:port` binds every interface.
    pub fn bind_address(&self) -> String {
        if self.listen_address.starts_with(':') {
            format!("0.0.0.0{}", self.listen_address)
        } else {
            self.listen_address.clone()
        }
    }
}

/// Load the configuration at `path`.
///
/// Always hands back a usable configuration: on failure the defaults are
/// returned together with the error, and the caller decides whether to carry
/// on with them.
#[must_use]
pub fn parse_configuration(path: impl AsRef<Path>) -> (NodeConfig, Result<(), ConfigError>) {
    let path = path.as_ref();

    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(source) => {
            return (
                NodeConfig::default(),
                Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                }),
            )
        }
    };

    match NodeConfig::from_document(path, &content) {
        Ok(config) => (config, Ok(())),
        Err(e) => (NodeConfig::default(), Err(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_address_expands_bare_port() {
        let config = NodeConfig::default();
        assert_eq!(config.bind_address(), "0.0.0.0:8080");

        let config = NodeConfig {
            listen_address: "10.1.1.1:8080".to_string(),
            ..NodeConfig::default()
        };
        assert_eq!(config.bind_address(), "10.1.1.1:8080");
    }

    #[test]
    fn test_pascal_case_aliases() {
        let json = r#"{
            "OpticalFlowScale": 0.5,
            "MasterNeurone": true,
            "AdjacentNeurones": [{"Address": "http://10.1.1.2:8080/", "Transfer": 0.3}]
        }"#;
        let config = NodeConfig::from_document(Path::new("gasworks.json"), json).unwrap();
        assert_eq!(config.optical_flow_scale, 0.5);
        assert!(config.master_node);
        assert_eq!(
            config.adjacent_nodes,
            vec![Peer::new("http://10.1.1.2:8080/", 0.3)]
        );
        assert_eq!(config.movement_threshold, 1.0);
    }

    #[test]
    fn test_partial_timings_keep_defaults() {
        let toml = r#"
            masterNode = true

            [timings]
            wait = 5.0
        "#;
        let config = NodeConfig::from_document(Path::new("node.toml"), toml).unwrap();
        assert_eq!(config.timings.wait, 5.0);
        assert_eq!(config.timings.cooldown, 4.0);
        assert_eq!(config.timings.powerup_threshold, 0.45);
    }

    #[test]
    fn test_unusable_timings_never_panic() {
        let timings = Timings {
            cooldown: -1.0,
            startup: f64::NAN,
            wait: f64::INFINITY,
            ..Timings::default()
        };
        assert!(timings.validate().is_err());
        assert_eq!(timings.cooldown_length(), Duration::ZERO);
        assert_eq!(timings.startup_length(), Duration::ZERO);
        assert_eq!(timings.wait_length(), Duration::ZERO);
        assert!(Timings::default().validate().is_ok());
    }
}
