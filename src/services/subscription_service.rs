use std::sync::Arc;

use axum::extract::ws::Message;

use crate::dto::{JobStatusPayload, ServerEvent};
use crate::interceptors::{AppError, AppResult};
use crate::queue::{JobSnapshot, QueueRegistry, RunnerError, TopicKey};
use crate::services::{MqttService, NotificationHub, Subscription};

/// Join/leave protocol on top of the notification hub.
///
/// A subscriber that joins a topic is sent the job's current status straight
/// away; after that it receives whatever the status poller publishes for the
/// topic until it leaves or disconnects.
#[derive(Clone)]
pub struct SubscriptionService {
    registry: Arc<QueueRegistry>,
    hub: Arc<NotificationHub>,
    mirror: Option<MqttService>,
}

impl SubscriptionService {
    pub fn new(registry: Arc<QueueRegistry>, hub: Arc<NotificationHub>) -> Self {
        Self {
            registry,
            hub,
            mirror: None,
        }
    }

    pub fn with_mirror(mut self, mirror: Option<MqttService>) -> Self {
        self.mirror = mirror;
        self
    }

    pub fn hub(&self) -> &Arc<NotificationHub> {
        &self.hub
    }

    /// Current status of one job, straight from its runner.
    pub async fn fetch_status(&self, queue_name: &str, job_id: &str) -> AppResult<JobStatusPayload> {
        let runner = self.registry.resolve(queue_name)?;
        let snapshot = runner.get_job(job_id).await?;
        Ok(JobStatusPayload::new(queue_name, snapshot))
    }

    /// Subscribe `conn_id` to `<queue_name>/<job_id>` and send it the current status.
    pub async fn join(&self, conn_id: &str, queue_name: &str, job_id: &str) -> AppResult<()> {
        let runner = self.registry.resolve(queue_name)?;
        let topic = TopicKey::new(queue_name, job_id);

        let subscription = self.hub.subscribe(conn_id, &topic).await;
        if subscription == Subscription::UnknownConnection {
            return Err(AppError::NotFound(format!("Connection '{}' is not registered", conn_id)));
        }

        // Membership is in place before the fetch, so no poll result can fall
        // between this snapshot and the next push.
        match runner.get_job(job_id).await {
            Ok(snapshot) => {
                let event = ServerEvent::JobStatus(JobStatusPayload::new(queue_name, snapshot));
                self.hub.send_to(conn_id, encode(&event)?).await;
                tracing::debug!(conn_id = %conn_id, topic = %topic, "Subscriber joined");
                Ok(())
            }
            Err(RunnerError::NoSuchJob(_)) => {
                // An earlier successful join keeps its membership.
                if subscription == Subscription::Added {
                    self.hub.unsubscribe(conn_id, &topic).await;
                }
                Err(AppError::NotFound(format!(
                    "Job '{}' does not exist in queue '{}'",
                    job_id, queue_name
                )))
            }
            Err(e) => {
                tracing::warn!(
                    conn_id = %conn_id,
                    topic = %topic,
                    "Initial status fetch failed, waiting for the next poll: {}",
                    e
                );
                Ok(())
            }
        }
    }

    /// Unsubscribe `conn_id` from a topic. Leaving a topic never joined is fine.
    pub async fn leave(&self, conn_id: &str, queue_name: &str, job_id: &str) {
        let topic = TopicKey::new(queue_name, job_id);
        if self.hub.unsubscribe(conn_id, &topic).await {
            tracing::debug!(conn_id = %conn_id, topic = %topic, "Subscriber left");
        }
    }

    /// Push `snapshot` to every current subscriber of `<queue_name>/<job_id>`.
    ///
    /// Returns the number of WebSocket subscribers reached.
    pub async fn publish(&self, queue_name: &str, job_id: &str, snapshot: JobSnapshot) -> AppResult<usize> {
        let topic = TopicKey::new(queue_name, job_id);
        let event = ServerEvent::JobStatus(JobStatusPayload::new(queue_name, snapshot));
        let body = serde_json::to_string(&event)
            .map_err(|e| AppError::InternalError(format!("Failed to serialize job status: {}", e)))?;

        let delivered = self.hub.publish_to_topic(&topic, Message::Text(body.clone())).await;

        if let Some(mirror) = &self.mirror {
            if let Err(e) = mirror.publish_status(&topic, &body) {
                tracing::warn!(topic = %topic, "MQTT mirror publish failed: {}", e);
            }
        }

        Ok(delivered)
    }

    /// Send an `error` frame to one connection.
    pub async fn notify_error(&self, conn_id: &str, error: &AppError) {
        let event = ServerEvent::error(error.code(), error.to_string());
        match encode(&event) {
            Ok(message) => {
                self.hub.send_to(conn_id, message).await;
            }
            Err(e) => tracing::error!(conn_id = %conn_id, "Failed to encode error frame: {}", e),
        }
    }

    /// Forget a closed connection and every topic it had joined.
    pub async fn disconnect(&self, conn_id: &str) {
        let topics = self.hub.unregister(conn_id).await;
        tracing::debug!(conn_id = %conn_id, topics, "Subscriber disconnected");
    }
}

fn encode(event: &ServerEvent) -> AppResult<Message> {
    serde_json::to_string(event)
        .map(Message::Text)
        .map_err(|e| AppError::InternalError(format!("Failed to serialize event: {}", e)))
}
