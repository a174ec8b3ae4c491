use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};
use tokio_util::sync::CancellationToken;

use crate::services::SubscriptionService;

use super::registry::QueueRegistry;
use super::runner::{JobRunner, RunnerError};

/// Periodically re-reads every job of one queue and publishes its status.
pub struct StatusPoller {
    queue_name: String,
    runner: Arc<dyn JobRunner>,
    subscriptions: SubscriptionService,
    interval: Duration,
}

impl StatusPoller {
    pub fn new(
        queue_name: impl Into<String>,
        runner: Arc<dyn JobRunner>,
        subscriptions: SubscriptionService,
        interval: Duration,
    ) -> Self {
        Self {
            queue_name: queue_name.into(),
            runner,
            subscriptions,
            interval,
        }
    }

    /// One polling cycle. Returns the number of snapshots published.
    ///
    /// A job that fails to report is skipped until the next cycle; it never
    /// stops the others from being published.
    pub async fn poll_once(&self) -> usize {
        let job_ids = match self.runner.list_job_ids().await {
            Ok(ids) => ids,
            Err(e) => {
                tracing::warn!(queue = %self.queue_name, "Failed to list jobs: {}", e);
                return 0;
            }
        };

        let mut published = 0;
        for job_id in job_ids {
            let fetched = AssertUnwindSafe(self.runner.get_job(&job_id)).catch_unwind().await;

            let snapshot = match fetched {
                Ok(Ok(snapshot)) => snapshot,
                // Finished and forgotten between listing and reading.
                Ok(Err(RunnerError::NoSuchJob(_))) => continue,
                Ok(Err(e)) => {
                    tracing::warn!(queue = %self.queue_name, job_id = %job_id, "Status fetch failed: {}", e);
                    continue;
                }
                Err(_) => {
                    tracing::error!(queue = %self.queue_name, job_id = %job_id, "Runner panicked while reporting status");
                    continue;
                }
            };

            match self.subscriptions.publish(&self.queue_name, &job_id, snapshot).await {
                Ok(_) => published += 1,
                Err(e) => {
                    tracing::warn!(queue = %self.queue_name, job_id = %job_id, "Failed to publish status: {}", e)
                }
            }
        }

        published
    }

    /// Poll until `shutdown` is cancelled.
    pub async fn run(self, shutdown: CancellationToken) {
        tracing::info!(queue = %self.queue_name, interval = ?self.interval, "Status poller started");

        while !shutdown.is_cancelled() {
            let published = self.poll_once().await;
            tracing::trace!(queue = %self.queue_name, published, "Poll cycle finished");

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = sleep(self.interval) => {}
            }
        }

        tracing::info!(queue = %self.queue_name, "Status poller stopped");
    }
}

/// Start one poller task per queue.
pub fn spawn_pollers(
    registry: &QueueRegistry,
    subscriptions: &SubscriptionService,
    interval: Duration,
    shutdown: &CancellationToken,
) -> Vec<JoinHandle<()>> {
    registry
        .all_queues()
        .map(|(name, runner)| {
            let poller = StatusPoller::new(name, runner.clone(), subscriptions.clone(), interval);
            tokio::spawn(poller.run(shutdown.clone()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::ServerEvent;
    use crate::queue::runner::MockJobRunner;
    use crate::queue::{JobRequest, JobSnapshot, JobStatus};
    use crate::services::NotificationHub;
    use axum::extract::ws::Message;
    use chrono::Utc;

    fn snapshot(id: &str, status: JobStatus) -> JobSnapshot {
        let request = JobRequest {
            dataset: "/d.nxs".to_string(),
            process_list: "/p.nxs".to_string(),
            output_path: "/out".to_string(),
        };
        JobSnapshot::new(id, status, &request, Utc::now())
    }

    fn poller(runner: MockJobRunner) -> (StatusPoller, SubscriptionService) {
        let runner: Arc<dyn JobRunner> = Arc::new(runner);
        let registry = Arc::new(QueueRegistry::from_runners(vec![("default".to_string(), runner.clone())]).unwrap());
        let subscriptions = SubscriptionService::new(registry, Arc::new(NotificationHub::new()));
        let poller = StatusPoller::new("default", runner, subscriptions.clone(), Duration::from_secs(2));
        (poller, subscriptions)
    }

    #[tokio::test]
    async fn one_failing_job_does_not_stop_the_others() {
        let mut runner = MockJobRunner::new();
        runner
            .expect_list_job_ids()
            .returning(|| Ok(vec!["bad".to_string(), "gone".to_string(), "good".to_string()]));
        runner.expect_get_job().returning(|id| match id {
            "bad" => Err(RunnerError::Fetch("timeout".to_string())),
            "gone" => Err(RunnerError::NoSuchJob(id.to_string())),
            _ => Ok(snapshot(id, JobStatus::Running)),
        });

        let (poller, _) = poller(runner);
        assert_eq!(poller.poll_once().await, 1);
    }

    #[tokio::test]
    async fn listing_failure_skips_the_cycle() {
        let mut runner = MockJobRunner::new();
        runner
            .expect_list_job_ids()
            .returning(|| Err(RunnerError::Fetch("executor down".to_string())));
        runner.expect_get_job().never();

        let (poller, _) = poller(runner);
        assert_eq!(poller.poll_once().await, 0);
    }

    struct PanickingRunner;

    #[async_trait::async_trait]
    impl JobRunner for PanickingRunner {
        async fn start_job(&self, _: &str, _: &str, _: &str) -> Result<String, RunnerError> {
            Err(RunnerError::Start("read-only".to_string()))
        }

        async fn get_job(&self, job_id: &str) -> Result<JobSnapshot, RunnerError> {
            if job_id == "boom" {
                panic!("corrupt job record");
            }
            Ok(snapshot(job_id, JobStatus::Complete))
        }

        async fn list_job_ids(&self) -> Result<Vec<String>, RunnerError> {
            Ok(vec!["boom".to_string(), "ok".to_string()])
        }

        async fn close(&self) -> Result<(), RunnerError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn panicking_runner_does_not_kill_the_cycle() {
        let runner: Arc<dyn JobRunner> = Arc::new(PanickingRunner);
        let registry = Arc::new(QueueRegistry::from_runners(vec![("default".to_string(), runner.clone())]).unwrap());
        let subscriptions = SubscriptionService::new(registry, Arc::new(NotificationHub::new()));
        let poller = StatusPoller::new("default", runner, subscriptions, Duration::from_secs(2));

        assert_eq!(poller.poll_once().await, 1);
    }

    #[tokio::test]
    async fn poll_pushes_to_joined_subscribers() {
        let mut runner = MockJobRunner::new();
        runner.expect_list_job_ids().returning(|| Ok(vec!["job-1".to_string()]));
        runner
            .expect_get_job()
            .returning(|id| Ok(snapshot(id, JobStatus::Complete)));

        let (poller, subscriptions) = poller(runner);
        let mut rx = subscriptions.hub().register("conn-1".to_string()).await;
        subscriptions.join("conn-1", "default", "job-1").await.unwrap();
        let _initial = rx.recv().await;

        poller.poll_once().await;

        let Some(Message::Text(body)) = rx.recv().await else {
            panic!("expected a text frame");
        };
        match serde_json::from_str::<ServerEvent>(&body).unwrap() {
            ServerEvent::JobStatus(payload) => assert_eq!(payload.job_id.status, JobStatus::Complete),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn run_stops_when_cancelled() {
        let mut runner = MockJobRunner::new();
        runner.expect_list_job_ids().returning(|| Ok(Vec::new()));

        let (poller, _) = poller(runner);
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(poller.run(shutdown.clone()));

        tokio::time::sleep(Duration::from_secs(7)).await;
        shutdown.cancel();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("poller should stop promptly")
            .unwrap();
    }
}
