use axum::extract::{Path, Query, State};

use crate::config::AppState;
use crate::dto::{JobStatusPayload, QueueListResponse, SubmitJobQuery};
use crate::interceptors::{ApiSuccess, AppError};
use crate::services::FileKind;
use crate::utils::validate_request;

/// List configured queues
pub async fn list_queues(State(state): State<AppState>) -> Result<ApiSuccess<QueueListResponse>, AppError> {
    let queues = state.registry.names();
    Ok(ApiSuccess::new("Queues retrieved successfully", QueueListResponse { queues }))
}

/// Submit a job to a queue and return its first status
pub async fn submit_job(
    State(state): State<AppState>,
    Path(queue_name): Path<String>,
    Query(query): Query<SubmitJobQuery>,
) -> Result<ApiSuccess<JobStatusPayload>, AppError> {
    // Resolve first: an unknown queue must not touch the file system or a runner.
    let runner = state.registry.resolve(&queue_name)?;

    let dataset = state.files.validate(&query.dataset, FileKind::Data)?;
    let process_list = state.files.validate(&query.process_list, FileKind::ProcessList)?;
    validate_request(&query)?;

    let job_id = runner
        .start_job(
            &dataset.display().to_string(),
            &process_list.display().to_string(),
            &query.output_path,
        )
        .await?;

    tracing::info!(queue = %queue_name, job_id = %job_id, dataset = %dataset.display(), "Job submitted");

    let payload = state.subscriptions.fetch_status(&queue_name, &job_id).await?;
    Ok(ApiSuccess::new("Job submitted successfully", payload))
}

/// Current status of one job
pub async fn get_job_status(
    State(state): State<AppState>,
    Path((queue_name, job_id)): Path<(String, String)>,
) -> Result<ApiSuccess<JobStatusPayload>, AppError> {
    let payload = state.subscriptions.fetch_status(&queue_name, &job_id).await?;
    Ok(ApiSuccess::from_data(payload))
}
