pub mod file_service;
pub mod mqtt_service;
pub mod notification_hub;
pub mod plugin_service;
pub mod subscription_service;

pub use file_service::{FileKind, FileService};
pub use mqtt_service::MqttService;
pub use notification_hub::{start_heartbeat, ConnectionId, NotificationHub, Subscription};
pub use plugin_service::PluginService;
pub use subscription_service::SubscriptionService;
