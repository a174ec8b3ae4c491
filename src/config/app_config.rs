use config::{Config, ConfigError, Environment};
use serde::Deserialize;

/// Process-level settings read from the environment (and `.env`).
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub app_name: String,
    pub app_version: String,
    /// Path of the TOML file holding queues, paths and poll settings.
    pub server_config: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_environment(Environment::default())
    }

    fn from_environment(source: Environment) -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("host", "0.0.0.0")?
            .set_default("port", 3000)?
            .set_default("environment", "development")?
            .set_default("app_name", env!("CARGO_PKG_NAME"))?
            .set_default("app_version", env!("CARGO_PKG_VERSION"))?
            .set_default("server_config", "config/server.toml")?
            .add_source(source)
            .build()?
            .try_deserialize()
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
