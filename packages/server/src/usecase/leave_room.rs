//! UseCase: 参加者の Room 離脱・切断処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - LeaveRoomUseCase::execute() メソッド
//! - Room 離脱処理（残メンバーへの通知対象選定、Room の破棄）
//!
//! ### なぜこのテストが必要か
//! - ビジネスロジックの検証：離脱時に残りの参加者に通知される
//! - 最後の参加者の離脱で Room が破棄されることを保証
//! - 既に離脱済みの接続に対する二重離脱が no-op になることを確認（冪等性）
//!
//! ### どのような状況を想定しているか
//! - 正常系：参加者の離脱と通知
//! - エッジケース：最後の参加者の離脱（Room 破棄、Agent セッション終了）
//! - 異常系：Room に参加していない接続の離脱試行（良性レース）

use std::sync::Arc;

use crate::domain::{
    AgentProvisioner, ConnectionId, EventPusher, LeaveOutcome, RoomRegistry,
};

use super::end_agent_session_best_effort;

/// Room 離脱・切断のユースケース
///
/// Explicit `leave-room` requests and transport-level disconnects share this
/// teardown path; disconnect additionally discards the connection's outbound
/// channel via [`LeaveRoomUseCase::discard_connection`].
pub struct LeaveRoomUseCase {
    registry: Arc<dyn RoomRegistry>,
    pusher: Arc<dyn EventPusher>,
    provisioner: Arc<dyn AgentProvisioner>,
}

impl LeaveRoomUseCase {
    pub fn new(
        registry: Arc<dyn RoomRegistry>,
        pusher: Arc<dyn EventPusher>,
        provisioner: Arc<dyn AgentProvisioner>,
    ) -> Self {
        Self {
            registry,
            pusher,
            provisioner,
        }
    }

    /// Execute the leave transition.
    ///
    /// Returns `None` when the connection was not in any room — a benign
    /// race (e.g. a leave arriving after the disconnect already ran), never
    /// an error. If the departure destroyed the room and an agent session
    /// was still attached, the session is ended best-effort in the
    /// background; teardown never blocks on provisioner I/O.
    pub async fn execute(&self, connection_id: &ConnectionId) -> Option<LeaveOutcome> {
        let outcome = self.registry.leave(connection_id).await?;

        if let Some(agent) = outcome.removed_agent.clone() {
            tracing::info!(
                "room '{}' died with agent session '{}' attached, ending it",
                outcome.room_id,
                agent.agent_id
            );
            end_agent_session_best_effort(self.provisioner.clone(), agent);
        }

        Some(outcome)
    }

    /// Discard all per-connection state after a transport disconnect.
    pub async fn discard_connection(&self, connection_id: &ConnectionId) {
        self.pusher.unregister(connection_id).await;
    }

    /// Broadcast a serialized `user-left` event to the remaining members.
    pub async fn broadcast_user_left(
        &self,
        targets: Vec<ConnectionId>,
        message: &str,
    ) -> Result<(), String> {
        self.pusher
            .broadcast(targets, message)
            .await
            .map_err(|e| e.to_string())
    }

    /// Acknowledge an explicit leave to the requester.
    pub async fn reply_to_leaver(
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
