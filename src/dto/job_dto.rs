use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::queue::JobSnapshot;

/// Query string of a job submission.
///
/// Missing parameters deserialize as empty strings so they are reported by
/// the handler rather than by the extractor. An empty `dataset` or
/// `process_list` fails file validation (not found); only `output_path` is
/// checked here.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct SubmitJobQuery {
    pub dataset: String,

    pub process_list: String,

    #[validate(length(min = 1, message = "output_path is required"))]
    pub output_path: String,
}

/// Status of one job as sent over HTTP and pushed to subscribers.
///
/// The field names follow the wire format clients already use: `job_id`
/// carries the whole snapshot, not just the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobStatusPayload {
    pub queue_id: String,
    pub job_id: JobSnapshot,
}

impl JobStatusPayload {
    pub fn new(queue_id: impl Into<String>, snapshot: JobSnapshot) -> Self {
        Self {
            queue_id: queue_id.into(),
            job_id: snapshot,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueListResponse {
    pub queues: Vec<String>,
}
