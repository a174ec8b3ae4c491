use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::Message;
use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, RwLock};
use tokio_util::sync::CancellationToken;

use crate::queue::TopicKey;

/// Transport-level id of one WebSocket connection.
pub type ConnectionId = String;

/// Channel sender half for pushing messages to a WebSocket connection.
pub type WsSender = mpsc::UnboundedSender<Message>;

/// Outcome of [`NotificationHub::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subscription {
    Added,
    AlreadyMember,
    UnknownConnection,
}

struct Connection {
    sender: WsSender,
    topics: HashSet<TopicKey>,
    connected_at: DateTime<Utc>,
}

#[derive(Default)]
struct HubState {
    connections: HashMap<ConnectionId, Connection>,
    rooms: HashMap<TopicKey, HashSet<ConnectionId>>,
}

/// Publish/subscribe transport over the open WebSocket connections.
///
/// Connections and topic rooms live under one lock, so a publish always sees
/// a membership set that no concurrent join, leave or disconnect is halfway
/// through changing. Each connection gets an unbounded queue drained by its
/// own writer task, which keeps messages to one connection in publish order.
/// A room exists only while it has members.
pub struct NotificationHub {
    state: RwLock<HubState>,
}

impl NotificationHub {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(HubState::default()),
        }
    }

    /// Register a new connection and return the receiver its writer task drains.
    pub async fn register(&self, conn_id: ConnectionId) -> mpsc::UnboundedReceiver<Message> {
        let (tx, rx) = mpsc::unbounded_channel();
        let conn = Connection {
            sender: tx,
            topics: HashSet::new(),
            connected_at: Utc::now(),
        };
        self.state.write().await.connections.insert(conn_id, conn);
        rx
    }

    /// Drop a connection and its membership in every room.
    ///
    /// Returns the number of topics it was removed from.
    pub async fn unregister(&self, conn_id: &str) -> usize {
        let mut state = self.state.write().await;
        let Some(conn) = state.connections.remove(conn_id) else {
            return 0;
        };

        for topic in &conn.topics {
            Self::leave_room(&mut state.rooms, topic, conn_id);
        }

        tracing::debug!(
            conn_id = %conn_id,
            topics = conn.topics.len(),
            connected_for = %(Utc::now() - conn.connected_at),
            "Connection unregistered"
        );
        conn.topics.len()
    }

    /// Add a connection to a topic room.
    pub async fn subscribe(&self, conn_id: &str, topic: &TopicKey) -> Subscription {
        let mut state = self.state.write().await;
        let Some(conn) = state.connections.get_mut(conn_id) else {
            return Subscription::UnknownConnection;
        };

        if !conn.topics.insert(topic.clone()) {
            return Subscription::AlreadyMember;
        }
        state
            .rooms
            .entry(topic.clone())
            .or_default()
            .insert(conn_id.to_string());
        Subscription::Added
    }

    /// Remove a connection from a topic room. Returns whether it was a member.
    pub async fn unsubscribe(&self, conn_id: &str, topic: &TopicKey) -> bool {
        let mut state = self.state.write().await;
        let was_member = state
            .connections
            .get_mut(conn_id)
            .map(|conn| conn.topics.remove(topic))
            .unwrap_or(false);

        Self::leave_room(&mut state.rooms, topic, conn_id);
        was_member
    }

    /// Send `message` to every member of `topic`.
    ///
    /// Returns the number of connections it was queued for; zero when the room
    /// does not exist. Nothing is kept for later subscribers.
    pub async fn publish_to_topic(&self, topic: &TopicKey, message: Message) -> usize {
        let state = self.state.read().await;
        let Some(members) = state.rooms.get(topic) else {
            return 0;
        };

        let mut delivered = 0;
        for conn_id in members {
            if let Some(conn) = state.connections.get(conn_id) {
                // A closed channel means the reader loop is about to unregister it.
                if conn.sender.send(message.clone()).is_ok() {
                    delivered += 1;
                }
            }
        }
        delivered
    }

    /// Send `message` to one connection only.
    pub async fn send_to(&self, conn_id: &str, message: Message) -> bool {
        let state = self.state.read().await;
        state
            .connections
            .get(conn_id)
            .map(|conn| conn.sender.send(message).is_ok())
            .unwrap_or(false)
    }

    pub async fn subscriber_count(&self, topic: &TopicKey) -> usize {
        self.state
            .read()
            .await
            .rooms
            .get(topic)
            .map(HashSet::len)
            .unwrap_or(0)
    }

    pub async fn topics_of(&self, conn_id: &str) -> Vec<TopicKey> {
        let state = self.state.read().await;
        let mut topics: Vec<_> = state
            .connections
            .get(conn_id)
            .map(|conn| conn.topics.iter().cloned().collect())
            .unwrap_or_default();
        topics.sort();
        topics
    }

    pub async fn topic_count(&self) -> usize {
        self.state.read().await.rooms.len()
    }

    pub async fn connection_count(&self) -> usize {
        self.state.read().await.connections.len()
    }

    pub async fn ping_all(&self) {
        let state = self.state.read().await;
        for conn in state.connections.values() {
            let _ = conn.sender.send(Message::Ping(Vec::new()));
        }
    }

    /// Send a Close frame to every connection, then forget them all.
    pub async fn shutdown_all(&self) {
        let mut state = self.state.write().await;
        let count = state.connections.len();
        for conn in state.connections.values() {
            let _ = conn.sender.send(Message::Close(None));
        }
        state.connections.clear();
        state.rooms.clear();
        tracing::info!(count, "Closed all WebSocket connections");
    }

    fn leave_room(rooms: &mut HashMap<TopicKey, HashSet<ConnectionId>>, topic: &TopicKey, conn_id: &str) {
        if let Some(members) = rooms.get_mut(topic) {
            members.remove(conn_id);
            if members.is_empty() {
                rooms.remove(topic);
            }
        }
    }
}

impl Default for NotificationHub {
    fn default() -> Self {
        Self::new()
    }
}

/// Ping every connection on a fixed interval until `shutdown` fires.
pub fn start_heartbeat(
    hub: Arc<NotificationHub>,
    interval: Duration,
    shutdown: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    let count = hub.connection_count().await;
                    tracing::trace!(count, "WebSocket heartbeat ping");
                    hub.ping_all().await;
                }
            }
        }
    })
}
