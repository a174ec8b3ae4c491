mod common;

use axum::http::{Method, StatusCode};
use savu_job_server::config::PathsConfig;
use savu_job_server::queue::JobStatus;

use common::{default_app, get, send, test_app, touch};

#[tokio::test]
async fn health_reports_queue_count() {
    let app = default_app();

    let (status, body) = get(&app.router, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "ok");
    assert_eq!(body["data"]["queues"], 1);
    assert_eq!(body["data"]["connections"], 0);
}

#[tokio::test]
async fn lists_configured_queues() {
    let app = default_app();

    let (status, body) = get(&app.router, "/jobs").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["queues"], serde_json::json!(["default"]));
}

#[tokio::test]
async fn job_status_query_returns_queue_and_snapshot() {
    let app = default_app();
    app.runner.insert("job-1", JobStatus::Running);

    let (status, body) = get(&app.router, "/jobs/default/job-1").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["queue_id"], "default");
    assert_eq!(body["data"]["job_id"]["id"], "job-1");
    assert_eq!(body["data"]["job_id"]["status"], "RUNNING");
}

#[tokio::test]
async fn unknown_job_and_unknown_queue_are_not_found() {
    let app = default_app();
    app.runner.insert("job-1", JobStatus::Running);

    let (status, body) = get(&app.router, "/jobs/default/job-404").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    let (status, _) = get(&app.router, "/jobs/missing/job-1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn submit_to_missing_queue_never_reaches_a_runner() {
    let app = default_app();

    let (status, _) = get(
        &app.router,
        "/jobs/missing/submit?dataset=/d.nxs&process_list=/p.nxs&output_path=/out",
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(app.runner.started(), 0);
}

#[tokio::test]
async fn submit_without_dataset_or_process_list_is_not_found() {
    let app = default_app();

    let (status, body) = get(&app.router, "/jobs/default/submit?process_list=/x.nxs&output_path=/o").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    let (status, _) = get(&app.router, "/jobs/default/submit?dataset=&process_list=&output_path=/o").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(app.runner.started(), 0);
}

#[tokio::test]
async fn submit_without_output_path_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = dir.path().join("scan.nxs");
    let process_list = dir.path().join("tomo.nxs");
    touch(&dataset);
    touch(&process_list);
    let app = default_app();

    let uri = format!(
        "/jobs/default/submit?dataset={}&process_list={}",
        dataset.display(),
        process_list.display()
    );
    let (status, body) = get(&app.router, &uri).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(app.runner.started(), 0);
}

#[tokio::test]
async fn submit_with_missing_files_is_not_found() {
    let app = default_app();

    let (status, _) = get(
        &app.router,
        "/jobs/default/submit?dataset=/nonexistent/d.nxs&process_list=/nonexistent/p.nxs&output_path=/out",
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(app.runner.started(), 0);
}

#[tokio::test]
async fn submit_starts_a_job_and_returns_its_first_status() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = dir.path().join("scan.nxs");
    let process_list = dir.path().join("lists/tomo.nxs");
    touch(&dataset);
    touch(&process_list);
    let app = default_app();

    let uri = format!(
        "/jobs/default/submit?dataset={}&process_list={}&output_path={}",
        dataset.display(),
        process_list.display(),
        dir.path().join("out").display()
    );
    let (status, body) = send(&app.router, Method::POST, &uri).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["queue_id"], "default");
    assert_eq!(body["data"]["job_id"]["id"], "static-1");
    assert_eq!(body["data"]["job_id"]["status"], "QUEUED");
    assert_eq!(body["data"]["job_id"]["dataset"], dataset.display().to_string());
    assert_eq!(app.runner.started(), 1);

    let (status, body) = get(&app.router, "/jobs/default/static-1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["job_id"]["status"], "QUEUED");
}

#[tokio::test]
async fn default_paths_come_from_configuration() {
    let app = test_app(PathsConfig {
        data: "/dls/data".to_string(),
        process_list: "/dls/lists".to_string(),
        output: "/dls/out".to_string(),
    });

    let (status, body) = get(&app.router, "/default_paths").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["data"], "/dls/data");
    assert_eq!(body["data"]["process_list"], "/dls/lists");
    assert_eq!(body["data"]["output"], "/dls/out");
}

#[tokio::test]
async fn finds_data_and_process_lists() {
    let dir = tempfile::tempdir().unwrap();
    touch(&dir.path().join("a/scan.h5"));
    touch(&dir.path().join("b/tomo.nxs"));
    touch(&dir.path().join("notes.txt"));
    let app = default_app();

    let (status, body) = get(&app.router, &format!("/data/find?path={}", dir.path().display())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["files"].as_array().unwrap().len(), 2);

    let (status, body) = get(&app.router, &format!("/process_list?path={}", dir.path().display())).await;
    assert_eq!(status, StatusCode::OK);
    let files = body["data"]["files"].as_array().unwrap();
    assert_eq!(files.len(), 1);
    assert!(files[0].as_str().unwrap().ends_with("tomo.nxs"));

    let (status, _) = get(&app.router, "/data/find").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn downloads_and_deletes_process_lists() {
    let dir = tempfile::tempdir().unwrap();
    let list = dir.path().join("tomo.nxs");
    std::fs::write(&list, b"process-list-bytes").unwrap();
    let app = default_app();

    let response = {
        use axum::body::Body;
        use axum::http::Request;
        use tower::ServiceExt;

        let request = Request::builder()
            .uri(format!("/process_list/download?filename={}", list.display()))
            .body(Body::empty())
            .unwrap();
        app.router.clone().oneshot(request).await.unwrap()
    };
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-disposition"],
        "attachment; filename=\"tomo.nxs\""
    );

    let (status, body) = send(
        &app.router,
        Method::DELETE,
        &format!("/process_list?filename={}", list.display()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["filename"].as_str().unwrap().ends_with("tomo.nxs"));
    assert!(!list.exists());

    let (status, _) = send(
        &app.router,
        Method::DELETE,
        &format!("/process_list?filename={}", list.display()),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_plugin_is_not_found() {
    let app = default_app();

    let (status, body) = get(&app.router, "/plugin").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], serde_json::json!([]));

    let (status, _) = get(&app.router, "/plugin/AstraReconGpu").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
