use serde::{Deserialize, Serialize};
use validator::Validate;

use super::job_dto::JobStatusPayload;

/// Identifies the (queue, job) topic a client wants to follow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct JobTopicRequest {
    #[validate(length(min = 1, message = "queue_id is required"))]
    pub queue_id: String,

    #[validate(length(min = 1, message = "job_id is required"))]
    pub job_id: String,
}

/// Frames a client may send on the job status socket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    Join(JobTopicRequest),
    Leave(JobTopicRequest),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WsErrorPayload {
    pub code: String,
    pub message: String,
}

/// Frames the server pushes on the job status socket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    JobStatus(JobStatusPayload),
    Error(WsErrorPayload),
}

impl ServerEvent {
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        ServerEvent::Error(WsErrorPayload {
            code: code.into(),
            message: message.into(),
        })
    }
}
