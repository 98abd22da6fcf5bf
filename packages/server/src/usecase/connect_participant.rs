//! UseCase: 参加者接続処理
//!
//! A transport-level connect registers nothing in the room table — joining a
//! room is a separate explicit step. Connecting only wires up the outbound
//! event channel and acks the new connection.

use std::sync::Arc;

use crate::domain::{ConnectionId, EventPusher, PusherChannel};

/// 参加者接続のユースケース
pub struct ConnectParticipantUseCase {
    pusher: Arc<dyn EventPusher>,
}

impl ConnectParticipantUseCase {
    pub fn new(pusher: Arc<dyn EventPusher>) -> Self {
        Self { pusher }
    }

    /// Register the connection's outbound channel with the event pusher.
    pub async fn execute(&self, connection_id: ConnectionId, sender: PusherChannel) {
        self.pusher.register(connection_id, sender).await;
    }

    /// Push an event to the connection itself (connect ack, error replies).
    pub async fn push_to_connection(
        &self,
        connection_id: &ConnectionId,
        message: &str,
    ) -> Result<(), String> {
        self.pusher
            .push_to(connection_id, message)
            .await
            .map_err(|e| e.to_string())
    }
}
