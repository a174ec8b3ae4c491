use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::queue::RunnerKind;

/// One `[[queues]]` entry: a queue name and the runner that serves it.
#[derive(Debug, Clone, Deserialize)]
pub struct QueueDefinition {
    pub name: String,
    pub runner: RunnerKind,
    #[serde(default)]
    pub parameters: Value,
}

/// Directories offered to clients as starting points.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub data: String,
    pub process_list: String,
    pub output: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data: "~/data".to_string(),
            process_list: "~/process_lists".to_string(),
            output: "~/output".to_string(),
        }
    }
}

/// File extensions (without the dot) that identify each kind of file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FilesConfig {
    pub data_extensions: Vec<String>,
    pub process_list_extensions: Vec<String>,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            data_extensions: vec!["nxs".to_string(), "h5".to_string(), "hdf5".to_string(), "hdf".to_string()],
            process_list_extensions: vec!["nxs".to_string()],
        }
    }
}

/// Server configuration read from the TOML file named by `SERVER_CONFIG`.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_heartbeat_secs")]
    pub heartbeat_secs: u64,
    #[serde(default)]
    pub plugin_catalog: Option<String>,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub files: FilesConfig,
    #[serde(default)]
    pub queues: Vec<QueueDefinition>,
}

fn default_poll_interval_secs() -> u64 {
    2
}

fn default_heartbeat_secs() -> u64 {
    30
}

impl ServerConfig {
    /// Load `path`, then apply `SAVU__*` environment overrides
    /// (e.g. `SAVU__POLL_INTERVAL_SECS=5`).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, config::ConfigError> {
        let path = path.as_ref();

        let cfg = config::Config::builder()
            .add_source(config::File::from(path).required(true))
            .add_source(config::Environment::with_prefix("SAVU").separator("__"))
            .build()?;

        let server: ServerConfig = cfg.try_deserialize()?;
        server.validate()?;

        tracing::info!(
            path = %path.display(),
            queues = server.queues.len(),
            "Server configuration loaded"
        );
        Ok(server)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(source: &str) -> Result<Self, config::ConfigError> {
        let cfg = config::Config::builder()
            .add_source(config::File::from_str(source, config::FileFormat::Toml))
            .build()?;

        let server: ServerConfig = cfg.try_deserialize()?;
        server.validate()?;
        Ok(server)
    }

    fn validate(&self) -> Result<(), config::ConfigError> {
        if self.poll_interval_secs == 0 {
            return Err(config::ConfigError::Message(
                "poll_interval_secs must be at least 1".to_string(),
            ));
        }
        if self.queues.is_empty() {
            return Err(config::ConfigError::Message(
                "at least one [[queues]] entry is required".to_string(),
            ));
        }
        Ok(())
    }
}
