pub mod app_config;
pub mod app_state;
pub mod mqtt_config;
pub mod server_config;

pub use app_config::AppConfig;
pub use app_state::AppState;
pub use mqtt_config::MqttConfig;
pub use server_config::{FilesConfig, PathsConfig, QueueDefinition, ServerConfig};
