use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use tokio::time::{Duration, Instant};

use crate::queue::factory::parse_parameters;
use crate::queue::job::{JobId, JobRequest, JobSnapshot, JobStatus};
use crate::queue::runner::{require_path, JobRunner, RunnerError};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimulatedParameters {
    /// Seconds a job reports `QUEUED` before it starts.
    pub queued_secs: u64,
    /// Seconds a job reports `RUNNING` before it finishes.
    pub run_secs: u64,
    /// Finish every job as `FAILED` instead of `COMPLETE`.
    pub fail: bool,
}

impl Default for SimulatedParameters {
    fn default() -> Self {
        Self {
            queued_secs: 0,
            run_secs: 10,
            fail: false,
        }
    }
}

struct SimulatedJob {
    id: JobId,
    request: JobRequest,
    submitted_at: DateTime<Utc>,
    submitted: Instant,
    cancelled_after: Option<Duration>,
    final_listed: bool,
}

/// In-memory runner whose jobs progress on a fixed timeline.
///
/// Nothing is executed; it exists for development setups and demos where the
/// real pipeline is not installed.
pub struct SimulatedRunner {
    params: SimulatedParameters,
    jobs: Mutex<Vec<SimulatedJob>>,
    closed: Mutex<bool>,
}

impl SimulatedRunner {
    pub fn new(params: SimulatedParameters) -> Self {
        Self {
            params,
            jobs: Mutex::new(Vec::new()),
            closed: Mutex::new(false),
        }
    }

    pub fn from_parameters(parameters: &Value) -> Result<Self, RunnerError> {
        Ok(Self::new(parse_parameters(parameters)?))
    }

    fn snapshot(&self, job: &SimulatedJob) -> JobSnapshot {
        let queued = Duration::from_secs(self.params.queued_secs);
        let run = Duration::from_secs(self.params.run_secs);
        let elapsed = job.submitted.elapsed();

        let offset = |d: Duration| {
            job.submitted_at + chrono::Duration::from_std(d).unwrap_or_else(|_| chrono::Duration::zero())
        };

        let (status, started, finished) = match job.cancelled_after {
            Some(at) if at < queued + run => {
                let started = (at >= queued).then(|| offset(queued));
                (JobStatus::Cancelled, started, Some(offset(at)))
            }
            _ if elapsed < queued => (JobStatus::Queued, None, None),
            _ if elapsed < queued + run => (JobStatus::Running, Some(offset(queued)), None),
            _ => {
                let status = if self.params.fail { JobStatus::Failed } else { JobStatus::Complete };
                (status, Some(offset(queued)), Some(offset(queued + run)))
            }
        };

        let exit_code = match status {
            JobStatus::Complete => Some(0),
            JobStatus::Failed => Some(1),
            _ => None,
        };

        JobSnapshot::new(job.id.clone(), status, &job.request, job.submitted_at)
            .with_started_at(started)
            .with_finished_at(finished)
            .with_exit_code(exit_code)
            .with_extra("simulated", Value::Bool(true))
    }

    fn is_closed(&self) -> bool {
        self.closed.lock().map(|closed| *closed).unwrap_or(true)
    }
}

#[async_trait]
impl JobRunner for SimulatedRunner {
    async fn start_job(
        &self,
        dataset: &str,
        process_list: &str,
        output_path: &str,
    ) -> Result<JobId, RunnerError> {
        require_path("dataset", dataset)?;
        require_path("process_list", process_list)?;
        require_path("output_path", output_path)?;

        if self.is_closed() {
            return Err(RunnerError::Closed("simulated runner has been closed".to_string()));
        }

        let id = uuid::Uuid::new_v4().to_string();
        let job = SimulatedJob {
            id: id.clone(),
            request: JobRequest {
                dataset: dataset.to_string(),
                process_list: process_list.to_string(),
                output_path: output_path.to_string(),
            },
            submitted_at: Utc::now(),
            submitted: Instant::now(),
            cancelled_after: None,
            final_listed: false,
        };

        self.jobs
            .lock()
            .map_err(|_| RunnerError::Start("job table lock poisoned".to_string()))?
            .push(job);

        tracing::debug!(job_id = %id, "Simulated job submitted");
        Ok(id)
    }

    async fn get_job(&self, job_id: &str) -> Result<JobSnapshot, RunnerError> {
        let jobs = self
            .jobs
            .lock()
            .map_err(|_| RunnerError::Fetch("job table lock poisoned".to_string()))?;

        jobs.iter()
            .find(|job| job.id == job_id)
            .map(|job| self.snapshot(job))
            .ok_or_else(|| RunnerError::NoSuchJob(job_id.to_string()))
    }

    /// Active jobs, plus finished ones until they have been listed once.
    async fn list_job_ids(&self) -> Result<Vec<JobId>, RunnerError> {
        let mut jobs = self
            .jobs
            .lock()
            .map_err(|_| RunnerError::Fetch("job table lock poisoned".to_string()))?;

        let mut ids = Vec::new();
        for job in jobs.iter_mut() {
            if self.snapshot(job).status.is_finished() {
                if job.final_listed {
                    continue;
                }
                job.final_listed = true;
            }
            ids.push(job.id.clone());
        }
        Ok(ids)
    }

    async fn close(&self) -> Result<(), RunnerError> {
        {
            let mut closed = self
                .closed
                .lock()
                .map_err(|_| RunnerError::Closed("close flag lock poisoned".to_string()))?;
            if *closed {
                return Ok(());
            }
            *closed = true;
        }

        let mut jobs = self
            .jobs
            .lock()
            .map_err(|_| RunnerError::Closed("job table lock poisoned".to_string()))?;
        for job in jobs.iter_mut() {
            job.cancelled_after = Some(job.submitted.elapsed());
        }

        Ok(())
    }
}
