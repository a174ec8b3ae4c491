use async_trait::async_trait;
use thiserror::Error;

use super::job::{JobId, JobSnapshot};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RunnerError {
    #[error("no such job: {0}")]
    NoSuchJob(JobId),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("failed to start job: {0}")]
    Start(String),

    /// A status read failed; the next poll cycle retries it.
    #[error("failed to fetch job status: {0}")]
    Fetch(String),

    #[error("runner is closed: {0}")]
    Closed(String),
}

/// Source of job status for one queue.
///
/// The server never looks inside a runner: jobs may run in-process, as local
/// subprocesses or on a remote executor. Every method may block on I/O.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait JobRunner: Send + Sync {
    /// Launch a job and return its runner-scoped id.
    async fn start_job(
        &self,
        dataset: &str,
        process_list: &str,
        output_path: &str,
    ) -> Result<JobId, RunnerError>;

    /// Current status of `job_id`, or `RunnerError::NoSuchJob`.
    async fn get_job(&self, job_id: &str) -> Result<JobSnapshot, RunnerError>;

    /// Ids of every job this runner currently knows about.
    async fn list_job_ids(&self) -> Result<Vec<JobId>, RunnerError>;

    /// Release runner resources. Calling it more than once is harmless.
    async fn close(&self) -> Result<(), RunnerError>;
}

pub(crate) fn require_path(name: &str, value: &str) -> Result<(), RunnerError> {
    if value.trim().is_empty() {
        return Err(RunnerError::InvalidInput(format!("{} must not be empty", name)));
    }
    Ok(())
}
