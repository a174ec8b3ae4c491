pub mod plugin;

pub use plugin::{PluginInfo, PluginParameter};
