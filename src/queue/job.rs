use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub type JobId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Queued,
    Running,
    Complete,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub fn is_finished(&self) -> bool {
        matches!(self, JobStatus::Complete | JobStatus::Failed | JobStatus::Cancelled)
    }
}

/// What a job was asked to process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRequest {
    pub dataset: String,
    pub process_list: String,
    pub output_path: String,
}

/// Point-in-time view of a job as reported by its runner.
///
/// Snapshots are never stored by the server: every poll and every query asks
/// the runner for a fresh one. Runner specific fields go into `extra` and are
/// flattened into the serialized mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub id: JobId,
    pub status: JobStatus,
    pub dataset: String,
    pub process_list: String,
    pub output_path: String,
    pub submitted_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub captured_at: DateTime<Utc>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl JobSnapshot {
    pub fn new(id: impl Into<JobId>, status: JobStatus, request: &JobRequest, submitted_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            status,
            dataset: request.dataset.clone(),
            process_list: request.process_list.clone(),
            output_path: request.output_path.clone(),
            submitted_at,
            started_at: None,
            finished_at: None,
            exit_code: None,
            message: None,
            captured_at: Utc::now(),
            extra: Map::new(),
        }
    }

    pub fn with_started_at(mut self, at: Option<DateTime<Utc>>) -> Self {
        self.started_at = at;
        self
    }

    pub fn with_finished_at(mut self, at: Option<DateTime<Utc>>) -> Self {
        self.finished_at = at;
        self
    }

    pub fn with_exit_code(mut self, code: Option<i32>) -> Self {
        self.exit_code = code;
        self
    }

    pub fn with_message(mut self, message: Option<String>) -> Self {
        self.message = message;
        self
    }

    pub fn with_extra(mut self, key: &str, value: Value) -> Self {
        self.extra.insert(key.to_string(), value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> JobRequest {
        JobRequest {
            dataset: "/data/scan.nxs".to_string(),
            process_list: "/lists/tomo.nxs".to_string(),
            output_path: "/out".to_string(),
        }
    }

    #[test]
    fn status_serializes_in_upper_case() {
        assert_eq!(serde_json::to_value(JobStatus::Running).unwrap(), "RUNNING");
        assert_eq!(serde_json::to_value(JobStatus::Complete).unwrap(), "COMPLETE");
    }

    #[test]
    fn snapshot_flattens_extra_fields_and_skips_empty_options() {
        let snapshot = JobSnapshot::new("job-1", JobStatus::Running, &request(), Utc::now())
            .with_extra("pid", Value::from(4242));

        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(value["status"], "RUNNING");
        assert_eq!(value["pid"], 4242);
        assert!(value.get("finished_at").is_none());
        assert!(value.get("extra").is_none());
    }

    #[test]
    fn finished_statuses() {
        assert!(!JobStatus::Queued.is_finished());
        assert!(!JobStatus::Running.is_finished());
        assert!(JobStatus::Failed.is_finished());
        assert!(JobStatus::Cancelled.is_finished());
    }
}
