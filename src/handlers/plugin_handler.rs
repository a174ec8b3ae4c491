use axum::extract::{Path, Query, State};

use crate::config::AppState;
use crate::dto::PluginQuery;
use crate::interceptors::{ApiSuccess, AppError};
use crate::models::PluginInfo;

/// Plugin names, optionally filtered
pub async fn list_plugins(
    State(state): State<AppState>,
    Query(query): Query<PluginQuery>,
) -> Result<ApiSuccess<Vec<String>>, AppError> {
    let names = state.plugins.names(query.query.as_deref());
    Ok(ApiSuccess::from_data(names))
}

/// One plugin with its parameters
pub async fn get_plugin(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<ApiSuccess<PluginInfo>, AppError> {
    let plugin = state.plugins.get(&name)?.clone();
    Ok(ApiSuccess::from_data(plugin))
}
