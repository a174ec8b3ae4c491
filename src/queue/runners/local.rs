use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use tokio::process::Command;
use tokio::sync::oneshot;

use crate::queue::factory::parse_parameters;
use crate::queue::job::{JobId, JobRequest, JobSnapshot, JobStatus};
use crate::queue::runner::{require_path, JobRunner, RunnerError};

#[derive(Debug, Clone, Deserialize)]
pub struct LocalParameters {
    /// Executable launched for every job.
    pub program: String,
    /// Arguments placed before the dataset, process list and output path.
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
}

struct LocalJob {
    id: JobId,
    request: JobRequest,
    status: JobStatus,
    submitted_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
    exit_code: Option<i32>,
    message: Option<String>,
    pid: Option<u32>,
    final_listed: bool,
}

#[derive(Default)]
struct LocalState {
    jobs: Vec<LocalJob>,
    kill_switches: HashMap<JobId, oneshot::Sender<()>>,
    closed: bool,
}

impl LocalState {
    fn job_mut(&mut self, id: &str) -> Option<&mut LocalJob> {
        self.jobs.iter_mut().find(|job| job.id == id)
    }
}

enum Outcome {
    Exited(std::io::Result<std::process::ExitStatus>),
    Killed,
}

/// Runs each job as a subprocess on this host:
/// `<program> <args..> <dataset> <process_list> <output_path>`.
pub struct LocalRunner {
    params: LocalParameters,
    state: Arc<Mutex<LocalState>>,
}

impl LocalRunner {
    pub fn new(params: LocalParameters) -> Result<Self, RunnerError> {
        if params.program.trim().is_empty() {
            return Err(RunnerError::InvalidInput("local runner needs a program".to_string()));
        }

        Ok(Self {
            params,
            state: Arc::new(Mutex::new(LocalState::default())),
        })
    }

    pub fn from_parameters(parameters: &Value) -> Result<Self, RunnerError> {
        Self::new(parse_parameters(parameters)?)
    }

    fn lock(&self) -> MutexGuard<'_, LocalState> {
        lock_state(&self.state)
    }

    fn snapshot(job: &LocalJob) -> JobSnapshot {
        let snapshot = JobSnapshot::new(job.id.clone(), job.status, &job.request, job.submitted_at)
            .with_started_at(job.started_at)
            .with_finished_at(job.finished_at)
            .with_exit_code(job.exit_code)
            .with_message(job.message.clone());

        match job.pid {
            Some(pid) => snapshot.with_extra("pid", Value::from(pid)),
            None => snapshot,
        }
    }

    /// Wait for the child to exit or for `close()` to kill it, then record the result.
    fn supervise(
        state: Arc<Mutex<LocalState>>,
        job_id: JobId,
        mut child: tokio::process::Child,
        kill: oneshot::Receiver<()>,
    ) {
        tokio::spawn(async move {
            let outcome = tokio::select! {
                result = child.wait() => Outcome::Exited(result),
                _ = kill => Outcome::Killed,
            };

            if let Outcome::Killed = outcome {
                if let Err(e) = child.kill().await {
                    tracing::warn!(job_id = %job_id, "Failed to kill job process: {}", e);
                }
            }

            let mut state = lock_state(&state);
            state.kill_switches.remove(&job_id);

            let Some(job) = state.job_mut(&job_id) else {
                return;
            };
            job.finished_at = Some(Utc::now());

            match outcome {
                Outcome::Exited(Ok(status)) => {
                    job.exit_code = status.code();
                    if status.success() {
                        job.status = JobStatus::Complete;
                    } else {
                        job.status = JobStatus::Failed;
                        job.message = Some(format!("process exited with {}", status));
                    }
                }
                Outcome::Exited(Err(e)) => {
                    job.status = JobStatus::Failed;
                    job.message = Some(format!("failed to wait for process: {}", e));
                }
                Outcome::Killed => {
                    job.status = JobStatus::Cancelled;
                    job.message = Some("runner closed".to_string());
                }
            }

            tracing::info!(job_id = %job_id, status = ?job.status, "Local job finished");
        });
    }
}

fn lock_state(state: &Mutex<LocalState>) -> MutexGuard<'_, LocalState> {
    // A panic while holding the lock leaves the table itself consistent.
    match state.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[async_trait]
impl JobRunner for LocalRunner {
    async fn start_job(
        &self,
        dataset: &str,
        process_list: &str,
        output_path: &str,
    ) -> Result<JobId, RunnerError> {
        require_path("dataset", dataset)?;
        require_path("process_list", process_list)?;
        require_path("output_path", output_path)?;

        let mut command = Command::new(&self.params.program);
        command
            .args(&self.params.args)
            .arg(dataset)
            .arg(process_list)
            .arg(output_path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        if let Some(dir) = &self.params.working_dir {
            command.current_dir(dir);
        }

        let id = uuid::Uuid::new_v4().to_string();
        let (kill_tx, kill_rx) = oneshot::channel();

        // The closed check, the spawn and the kill switch share one critical
        // section, so `close()` either refuses the job or sees its switch.
        let child = {
            let mut state = self.lock();
            if state.closed {
                return Err(RunnerError::Closed("local runner has been closed".to_string()));
            }

            let child = command.spawn().map_err(|e| {
                RunnerError::Start(format!("failed to launch '{}': {}", self.params.program, e))
            })?;

            let now = Utc::now();
            state.jobs.push(LocalJob {
                id: id.clone(),
                request: JobRequest {
                    dataset: dataset.to_string(),
                    process_list: process_list.to_string(),
                    output_path: output_path.to_string(),
                },
                status: JobStatus::Running,
                submitted_at: now,
                started_at: Some(now),
                finished_at: None,
                exit_code: None,
                message: None,
                pid: child.id(),
                final_listed: false,
            });
            state.kill_switches.insert(id.clone(), kill_tx);
            child
        };

        tracing::info!(job_id = %id, program = %self.params.program, "Local job started");
        Self::supervise(self.state.clone(), id.clone(), child, kill_rx);

        Ok(id)
    }

    async fn get_job(&self, job_id: &str) -> Result<JobSnapshot, RunnerError> {
        let state = self.lock();
        state
            .jobs
            .iter()
            .find(|job| job.id == job_id)
            .map(Self::snapshot)
            .ok_or_else(|| RunnerError::NoSuchJob(job_id.to_string()))
    }

    /// Active jobs, plus finished ones until they have been listed once.
    async fn list_job_ids(&self) -> Result<Vec<JobId>, RunnerError> {
        let mut state = self.lock();
        let mut ids = Vec::new();
        for job in state.jobs.iter_mut() {
            if job.status.is_finished() {
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
        let switches: Vec<_> = {
            let mut state = self.lock();
            state.closed = true;
            state.kill_switches.drain().collect()
        };

        if !switches.is_empty() {
            tracing::info!(count = switches.len(), "Stopping running local jobs");
        }

        for (_, switch) in switches {
            let _ = switch.send(());
        }

        Ok(())
    }
}
