//! WebSocket-backed EventPusher implementation.
//!
//! The WebSocket itself is accepted in the ui layer; this implementation
//! only manages the per-connection `UnboundedSender` halves and performs the
//! actual pushes. Fan-out is an explicit loop over the target list so the
//! coordinator never depends on a framework-level broadcast primitive.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{ConnectionId, EventPusher, PushError, PusherChannel};

/// EventPusher over per-connection WebSocket channels.
pub struct WebSocketEventPusher {
    /// Outbound channels of currently connected clients
    channels: Arc<Mutex<HashMap<ConnectionId, PusherChannel>>>,
}

impl WebSocketEventPusher {
    pub fn new() -> Self {
        Self {
            channels: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl Default for WebSocketEventPusher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventPusher for WebSocketEventPusher {
    async fn register(&self, connection_id: ConnectionId, sender: PusherChannel) {
        let mut channels = self.channels.lock().await;
        channels.insert(connection_id.clone(), sender);
        tracing::debug!("connection '{}' registered to EventPusher", connection_id);
    }

    async fn unregister(&self, connection_id: &ConnectionId) {
        let mut channels = self.channels.lock().await;
        channels.remove(connection_id);
        tracing::debug!(
            "connection '{}' unregistered from EventPusher",
            connection_id
        );
    }

    async fn push_to(&self, connection_id: &ConnectionId, content: &str) -> Result<(), PushError> {
        let channels = self.channels.lock().await;

        match channels.get(connection_id) {
            Some(sender) => {
                sender
                    .send(content.to_string())
                    .map_err(|e| PushError::PushFailed(e.to_string()))?;
                tracing::debug!("pushed event to connection '{}'", connection_id);
                Ok(())
            }
            None => Err(PushError::ConnectionNotFound(
                connection_id.as_str().to_string(),
            )),
        }
    }

    async fn broadcast(
        &self,
        targets: Vec<ConnectionId>,
        content: &str,
    ) -> Result<(), PushError> {
        let channels = self.channels.lock().await;

        for target in targets {
            match channels.get(&target) {
                // Partial delivery failure is tolerated during fan-out; a
                // target disconnecting mid-broadcast is a benign race.
                Some(sender) => {
                    if let Err(e) = sender.send(content.to_string()) {
                        tracing::warn!("failed to push event to connection '{}': {}", target, e);
                    } else {
                        tracing::debug!("broadcasted event to connection '{}'", target);
                    }
                }
                None => {
                    tracing::warn!("connection '{}' not found during broadcast, skipping", target);
                }
            }
        }

        Ok(())
    }
}
