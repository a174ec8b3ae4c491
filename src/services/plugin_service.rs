use std::collections::BTreeMap;
use std::path::Path;

use crate::interceptors::{AppError, AppResult};
use crate::models::PluginInfo;

/// Read-only catalog of the processing plugins clients can put in a process list.
#[derive(Debug, Default)]
pub struct PluginService {
    plugins: BTreeMap<String, PluginInfo>,
}

impl PluginService {
    pub fn new(plugins: impl IntoIterator<Item = PluginInfo>) -> Self {
        Self {
            plugins: plugins.into_iter().map(|p| (p.name.clone(), p)).collect(),
        }
    }

    /// Load the catalog from a JSON array file. No path means an empty catalog.
    pub fn load(path: Option<&str>) -> AppResult<Self> {
        let Some(path) = path else {
            tracing::warn!("No plugin catalog configured; plugin listing will be empty");
            return Ok(Self::default());
        };

        if !Path::new(path).exists() {
            tracing::warn!(path = %path, "Plugin catalog file not found; plugin listing will be empty");
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)?;
        let plugins: Vec<PluginInfo> = serde_json::from_str(&raw)
            .map_err(|e| AppError::ConfigError(format!("Invalid plugin catalog '{}': {}", path, e)))?;

        tracing::info!(path = %path, count = plugins.len(), "Plugin catalog loaded");
        Ok(Self::new(plugins))
    }

    /// Plugin names, filtered by a case-insensitive substring when `query` is given.
    pub fn names(&self, query: Option<&str>) -> Vec<String> {
        let query = query
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase);

        self.plugins
            .keys()
            .filter(|name| match &query {
                Some(q) => name.to_lowercase().contains(q.as_str()),
                None => true,
            })
            .cloned()
            .collect()
    }

    pub fn get(&self, name: &str) -> AppResult<&PluginInfo> {
        self.plugins
            .get(name)
            .ok_or_else(|| AppError::NotFound(format!("Plugin '{}' does not exist", name)))
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}
