use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::config::MqttConfig;
use crate::interceptors::AppError;
use crate::queue::TopicKey;

/// Mirrors job status pushes onto an MQTT broker.
#[derive(Clone)]
pub struct MqttService {
    client: AsyncClient,
    topic_prefix: String,
}

impl MqttService {
    /// Connect to the broker and drive its event loop until `shutdown` fires.
    pub fn connect(config: &MqttConfig, shutdown: CancellationToken) -> Result<Self, AppError> {
        let (host, port) = Self::parse_broker_url(&config.broker)?;

        let mut mqtt_options = MqttOptions::new(&config.client_id, host, port);
        mqtt_options.set_keep_alive(Duration::from_secs(config.keep_alive));

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            mqtt_options.set_credentials(username, password);
        }

        let (client, mut event_loop) = AsyncClient::new(mqtt_options, 64);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    notification = event_loop.poll() => match notification {
                        Ok(Event::Incoming(Packet::ConnAck(_))) => {
                            tracing::info!("MQTT broker accepted the connection");
                        }
                        Ok(_) => {}
                        Err(e) => {
                            tracing::warn!("MQTT event loop error, retrying in 5s: {}", e);
                            tokio::select! {
                                _ = shutdown.cancelled() => break,
                                _ = tokio::time::sleep(Duration::from_secs(5)) => {}
                            }
                        }
                    },
                }
            }
            tracing::debug!("MQTT event loop stopped");
        });

        tracing::info!(broker = %config.broker, prefix = %config.topic_prefix, "MQTT status mirror initialized");

        Ok(Self {
            client,
            topic_prefix: config.topic_prefix.clone(),
        })
    }

    /// `mqtt://host:port`, `host:port` or `host` (port 1883).
    fn parse_broker_url(url: &str) -> Result<(String, u16), AppError> {
        let address = url
            .split_once("://")
            .map(|(_, rest)| rest)
            .unwrap_or(url)
            .trim_end_matches('/');

        match address.rsplit_once(':') {
            Some((host, port)) => {
                let port = port
                    .parse::<u16>()
                    .map_err(|_| AppError::MqttError(format!("broker '{}' has an invalid port", url)))?;
                Ok((host.to_string(), port))
            }
            None => Ok((address.to_string(), 1883)),
        }
    }

    pub fn topic_for(&self, topic: &TopicKey) -> String {
        format!("{}/{}", self.topic_prefix, topic)
    }

    /// Queue a serialized status push for `topic`.
    ///
    /// Never waits: when the request queue is full (broker down) the push is
    /// dropped with an error, and the next poll cycle publishes again.
    pub fn publish_status(&self, topic: &TopicKey, payload: &str) -> Result<(), AppError> {
        let mqtt_topic = self.topic_for(topic);
        self.client
            .try_publish(&mqtt_topic, QoS::AtLeastOnce, false, payload.to_string())
            .map_err(|e| AppError::MqttError(format!("Failed to publish to topic '{}': {}", mqtt_topic, e)))?;

        tracing::trace!(topic = %mqtt_topic, "Published job status to MQTT");
        Ok(())
    }

    pub fn disconnect(&self) -> Result<(), AppError> {
        match self.client.try_disconnect() {
            Ok(()) => {
                tracing::info!("MQTT status mirror disconnected");
                Ok(())
            }
            Err(e) => Err(AppError::MqttError(format!("disconnect failed: {}", e))),
        }
    }
}
