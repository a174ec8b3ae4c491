use axum::{
    routing::get,
    Router,
};

use crate::config::AppState;
use crate::handlers::{
    default_paths, delete_process_list, download_process_list, find_data, get_job_status, get_plugin,
    health_check, job_status_socket, list_plugins, list_process_lists, list_queues, submit_job,
};

/// Create API router
pub fn create_router(state: AppState) -> Router {
    let health_routes = Router::new()
        .route("/health", get(health_check));

    // Job submission, status queries and the status push socket
    let job_routes = Router::new()
        .route("/jobs", get(list_queues))
        .route("/jobs/:queue/submit", get(submit_job).post(submit_job))
        .route("/jobs/:queue/:job_id", get(get_job_status))
        .route("/ws/job_status", get(job_status_socket));

    // Plugin catalog and file discovery
    let catalog_routes = Router::new()
        .route("/plugin", get(list_plugins))
        .route("/plugin/:name", get(get_plugin))
        .route("/process_list", get(list_process_lists).delete(delete_process_list))
        .route("/process_list/download", get(download_process_list))
        .route("/data/find", get(find_data))
        .route("/default_paths", get(default_paths));

    Router::new()
        .merge(health_routes)
        .merge(job_routes)
        .merge(catalog_routes)
        .with_state(state)
}
