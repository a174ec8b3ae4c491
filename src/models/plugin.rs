use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One parameter of a processing plugin, with its default value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginParameter {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub default: Value,
}

/// Catalog entry for a processing plugin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginInfo {
    pub name: String,
    #[serde(default)]
    pub synopsis: Option<String>,
    #[serde(default)]
    pub info: Option<String>,
    #[serde(default)]
    pub parameters: Vec<PluginParameter>,
    /// Anything else the catalog file carries is passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
