#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use chrono::Utc;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use savu_job_server::config::{AppState, FilesConfig, PathsConfig};
use savu_job_server::queue::{JobId, JobRequest, JobRunner, JobSnapshot, JobStatus, QueueRegistry, RunnerError};
use savu_job_server::routes::create_router;
use savu_job_server::services::{FileService, NotificationHub, PluginService, SubscriptionService};

/// Runner whose jobs only change when a test says so.
#[derive(Default)]
pub struct StaticRunner {
    jobs: Mutex<HashMap<JobId, JobSnapshot>>,
    started: AtomicUsize,
}

impl StaticRunner {
    pub fn insert(&self, job_id: &str, status: JobStatus) {
        let request = JobRequest {
            dataset: "/data/scan.nxs".to_string(),
            process_list: "/lists/tomo.nxs".to_string(),
            output_path: "/out".to_string(),
        };
        let snapshot = JobSnapshot::new(job_id, status, &request, Utc::now());
        self.jobs.lock().unwrap().insert(job_id.to_string(), snapshot);
    }

    pub fn set_status(&self, job_id: &str, status: JobStatus) {
        if let Some(job) = self.jobs.lock().unwrap().get_mut(job_id) {
            job.status = status;
            job.captured_at = Utc::now();
        }
    }

    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl JobRunner for StaticRunner {
    async fn start_job(&self, dataset: &str, process_list: &str, output_path: &str) -> Result<JobId, RunnerError> {
        let n = self.started.fetch_add(1, Ordering::SeqCst) + 1;
        let job_id = format!("static-{}", n);
        let request = JobRequest {
            dataset: dataset.to_string(),
            process_list: process_list.to_string(),
            output_path: output_path.to_string(),
        };
        let snapshot = JobSnapshot::new(job_id.clone(), JobStatus::Queued, &request, Utc::now());
        self.jobs.lock().unwrap().insert(job_id.clone(), snapshot);
        Ok(job_id)
    }

    async fn get_job(&self, job_id: &str) -> Result<JobSnapshot, RunnerError> {
        self.jobs
            .lock()
            .unwrap()
            .get(job_id)
            .cloned()
            .ok_or_else(|| RunnerError::NoSuchJob(job_id.to_string()))
    }

    async fn list_job_ids(&self) -> Result<Vec<JobId>, RunnerError> {
        let mut ids: Vec<JobId> = self.jobs.lock().unwrap().keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    async fn close(&self) -> Result<(), RunnerError> {
        Ok(())
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub runner: Arc<StaticRunner>,
}

/// App with a single queue named `default` served by a [`StaticRunner`].
pub fn test_app(paths: PathsConfig) -> TestApp {
    let runner = Arc::new(StaticRunner::default());
    let as_runner: Arc<dyn JobRunner> = runner.clone();
    let registry = Arc::new(QueueRegistry::from_runners(vec![("default".to_string(), as_runner)]).unwrap());
    let subscriptions = SubscriptionService::new(registry.clone(), Arc::new(NotificationHub::new()));

    let state = AppState::new(
        registry,
        subscriptions,
        FileService::new(&FilesConfig::default()),
        PluginService::default(),
        paths,
    );

    TestApp {
        router: create_router(state.clone()),
        state,
        runner,
    }
}

pub fn default_app() -> TestApp {
    test_app(PathsConfig::default())
}

pub async fn send(router: &Router, method: Method, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

pub async fn get(router: &Router, uri: &str) -> (StatusCode, Value) {
    send(router, Method::GET, uri).await
}

pub fn touch(path: &Path) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, b"").unwrap();
}
