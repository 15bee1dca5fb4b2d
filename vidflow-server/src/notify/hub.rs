//! Live notification connections
//!
//! Each WebSocket registers an unbounded channel under its user id. A user
//! may hold several connections (tabs); pushes fan out to all of them.
//! Dropping a connection's sender ends its forwarding task, which closes
//! the socket.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info};
use vidflow_common::events::ServerMessage;

pub type ConnectionId = u64;

#[derive(Debug)]
struct Connection {
    id: ConnectionId,
    tx: mpsc::UnboundedSender<ServerMessage>,
    last_seen: Instant,
}

#[derive(Debug, Clone, Default)]
pub struct NotificationHub {
    connections: Arc<RwLock<HashMap<i64, Vec<Connection>>>>,
    next_id: Arc<AtomicU64>,
}

impl NotificationHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection for `user_id` and return its receiving end
    pub async fn register(
        &self,
        user_id: i64,
    ) -> (ConnectionId, mpsc::UnboundedReceiver<ServerMessage>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let (tx, rx) = mpsc::unbounded_channel();

        let mut connections = self.connections.write().await;
        connections.entry(user_id).or_default().push(Connection {
            id,
            tx,
            last_seen: Instant::now(),
        });
        debug!(user_id, connection = id, "Notification client connected");
        (id, rx)
    }

    pub async fn unregister(&self, user_id: i64, id: ConnectionId) {
        let mut connections = self.connections.write().await;
        if let Some(list) = connections.get_mut(&user_id) {
            list.retain(|c| c.id != id);
            if list.is_empty() {
                connections.remove(&user_id);
            }
        }
        debug!(user_id, connection = id, "Notification client disconnected");
    }

    /// Record activity on a connection
    pub async fn touch(&self, user_id: i64, id: ConnectionId) {
        let mut connections = self.connections.write().await;
        if let Some(conn) = connections
            .get_mut(&user_id)
            .and_then(|list| list.iter_mut().find(|c| c.id == id))
        {
            conn.last_seen = Instant::now();
        }
    }

    /// Push to every connection of `user_id`; returns how many accepted it
    pub async fn push(&self, user_id: i64, message: ServerMessage) -> usize {
        let connections = self.connections.read().await;
        connections
            .get(&user_id)
            .map(|list| {
                list.iter()
                    .filter(|c| c.tx.send(message.clone()).is_ok())
                    .count()
            })
            .unwrap_or(0)
    }

    /// Send to one specific connection
    pub async fn send_to(&self, user_id: i64, id: ConnectionId, message: ServerMessage) -> bool {
        let connections = self.connections.read().await;
        connections
            .get(&user_id)
            .and_then(|list| list.iter().find(|c| c.id == id))
            .is_some_and(|c| c.tx.send(message).is_ok())
    }

    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.values().map(Vec::len).sum()
    }

    /// Drop connections idle longer than `idle_timeout` as of `now` and
    /// ping the rest. Returns the number dropped.
    pub async fn heartbeat(&self, now: Instant, idle_timeout: Duration) -> usize {
        let mut connections = self.connections.write().await;
        let mut dropped = 0;

        for list in connections.values_mut() {
            list.retain(|c| {
                let alive = now.saturating_duration_since(c.last_seen) <= idle_timeout
                    && c.tx.send(ServerMessage::Ping).is_ok();
                if !alive {
                    dropped += 1;
                }
                alive
            });
        }
        connections.retain(|_, list| !list.is_empty());

        if dropped > 0 {
            debug!("Heartbeat dropped {} idle notification connections", dropped);
        }
        dropped
    }

    /// Run [`heartbeat`](Self::heartbeat) every `interval` until the runtime stops
    pub fn spawn_heartbeat(&self, interval: Duration, idle_timeout: Duration) -> JoinHandle<()> {
        let hub = self.clone();
        info!(
            "Notification heartbeat every {}s, idle timeout {}s",
            interval.as_secs(),
            idle_timeout.as_secs()
        );
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                hub.heartbeat(Instant::now(), idle_timeout).await;
            }
        })
    }
}
