use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use serde_json::{json, Value};

use crate::config::AppState;
use crate::dto::{DeletedFile, FileListing, FilenameQuery, PathQuery};
use crate::interceptors::{ApiSuccess, AppError};
use crate::services::FileKind;

fn required(value: Option<String>, name: &str) -> Result<String, AppError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest(format!("Query parameter '{}' is required", name)))
}

async fn list_files(state: &AppState, path: String, kind: FileKind) -> Result<FileListing, AppError> {
    let files = state.files.clone();
    tokio::task::spawn_blocking(move || files.find_files(&path, kind))
        .await
        .map_err(|e| AppError::InternalError(format!("File search failed: {}", e)))
}

/// Find data files below a directory
pub async fn find_data(
    State(state): State<AppState>,
    Query(query): Query<PathQuery>,
) -> Result<ApiSuccess<FileListing>, AppError> {
    let path = required(query.path, "path")?;
    let listing = list_files(&state, path, FileKind::Data).await?;
    Ok(ApiSuccess::from_data(listing))
}

/// Find process list files below a directory
pub async fn list_process_lists(
    State(state): State<AppState>,
    Query(query): Query<PathQuery>,
) -> Result<ApiSuccess<FileListing>, AppError> {
    let path = required(query.path, "path")?;
    let listing = list_files(&state, path, FileKind::ProcessList).await?;
    Ok(ApiSuccess::from_data(listing))
}

/// Delete a process list file
pub async fn delete_process_list(
    State(state): State<AppState>,
    Query(query): Query<FilenameQuery>,
) -> Result<ApiSuccess<DeletedFile>, AppError> {
    let filename = required(query.filename, "filename")?;
    let deleted = state.files.delete_process_list(&filename).await?;
    Ok(ApiSuccess::new("Process list deleted successfully", deleted))
}

/// Download a process list file as-is
pub async fn download_process_list(
    State(state): State<AppState>,
    Query(query): Query<FilenameQuery>,
) -> Result<Response, AppError> {
    let filename = required(query.filename, "filename")?;
    let (path, bytes) = state.files.read_process_list(&filename).await?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "process_list.nxs".to_string());

    Ok((
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", name)),
        ],
        bytes,
    )
        .into_response())
}

/// Default data, process list and output directories
pub async fn default_paths(State(state): State<AppState>) -> Result<ApiSuccess<Value>, AppError> {
    let data = json!({
        "data": state.paths.data,
        "process_list": state.paths.process_list,
        "output": state.paths.output,
    });

    Ok(ApiSuccess::from_data(data))
}
