use config::{Config, ConfigError, Environment};
use serde::Deserialize;

/// Optional MQTT mirror for job status pushes, read from `MQTT_*` variables.
#[derive(Debug, Clone, Deserialize)]
pub struct MqttConfig {
    pub enabled: bool,
    pub broker: String,
    pub client_id: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub keep_alive: u64,
    /// Status for `<queue>/<job>` is published to `<topic_prefix>/<queue>/<job>`.
    pub topic_prefix: String,
}

impl MqttConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_environment(Environment::with_prefix("MQTT").prefix_separator("_"))
    }

    fn from_environment(source: Environment) -> Result<Self, ConfigError> {
        let mut mqtt: MqttConfig = Config::builder()
            .set_default("enabled", false)?
            .set_default("broker", "mqtt://localhost:1883")?
            .set_default("client_id", "savu-job-server")?
            .set_default("keep_alive", 60)?
            .set_default("topic_prefix", "savu/jobs")?
            .add_source(source)
            .build()?
            .try_deserialize()?;

        // Blank credentials in `.env` mean "no credentials".
        mqtt.username = mqtt.username.filter(|u| !u.is_empty());
        mqtt.password = mqtt.password.filter(|p| !p.is_empty());
        mqtt.topic_prefix = mqtt.topic_prefix.trim_end_matches('/').to_string();
        Ok(mqtt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> Environment {
        let vars = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<config::Map<String, String>>();
        Environment::with_prefix("MQTT").prefix_separator("_").source(Some(vars))
    }

    #[test]
    fn disabled_by_default() {
        let mqtt = MqttConfig::from_environment(env(&[])).unwrap();

        assert!(!mqtt.enabled);
        assert_eq!(mqtt.topic_prefix, "savu/jobs");
        assert!(mqtt.username.is_none());
    }

    #[test]
    fn blank_credentials_are_dropped() {
        let mqtt = MqttConfig::from_environment(env(&[
            ("MQTT_ENABLED", "true"),
            ("MQTT_USERNAME", ""),
            ("MQTT_TOPIC_PREFIX", "beamline/i12/"),
        ]))
        .unwrap();

        assert!(mqtt.enabled);
        assert!(mqtt.username.is_none());
        assert_eq!(mqtt.topic_prefix, "beamline/i12");
    }
}
