//! Event pusher trait definition.
//!
//! Abstracts delivery of serialized server events to connected clients so
//! the use case layer stays independent of the WebSocket transport. The
//! concrete implementation lives in the infrastructure layer.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use super::value_object::ConnectionId;

/// Per-connection outbound channel; the ui layer owns the receiving end and
/// pumps it into the WebSocket sink.
pub type PusherChannel = mpsc::UnboundedSender<String>;

#[derive(Debug, Error)]
pub enum PushError {
    #[error("connection '{0}' is not registered")]
    ConnectionNotFound(String),
    #[error("failed to push event: {0}")]
    PushFailed(String),
}

/// Delivery of serialized events to individual connections or fan-out targets.
#[async_trait]
pub trait EventPusher: Send + Sync {
    /// Register the outbound channel for a newly connected client.
    async fn register(&self, connection_id: ConnectionId, sender: PusherChannel);

    /// Drop the outbound channel of a disconnected client.
    async fn unregister(&self, connection_id: &ConnectionId);

    /// Push an event to a single connection.
    async fn push_to(&self, connection_id: &ConnectionId, content: &str) -> Result<(), PushError>;

    /// Push an event to every target. Partial delivery failure is tolerated;
    /// targets that vanished mid-broadcast are skipped.
    async fn broadcast(&self, targets: Vec<ConnectionId>, content: &str)
    -> Result<(), PushError>;
}
