//! UseCase: AI 参加者へのテキストメッセージ送信処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SendToAgentUseCase::execute() メソッド
//! - AI 参加者へのメッセージ転送（Agent の存在確認、応答の取得）
//!
//! ### なぜこのテストが必要か
//! - ビジネスロジックの検証：Agent 未作成の Room へは送信できない
//! - 空メッセージがプロトコル違反として弾かれることを保証
//! - プロビジョナーの応答が Room 全体への通知データに含まれることを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：メッセージ転送と応答の取得
//! - 異常系：Agent のない Room への送信、空メッセージ
//! - 異常系：外部サービスの失敗（要求者のみにエラー）

use std::sync::Arc;

use tsunagi_shared::time::Clock;

use crate::domain::{
    AgentProvisioner, ConnectionId, EventPusher, RoomId, RoomRegistry, Timestamp,
};

use super::error::SendToAgentError;

/// Everything the ui layer needs to broadcast the agent exchange.
#[derive(Debug)]
pub struct AgentMessageOutcome {
    pub user_message: String,
    pub ai_response: String,
    pub timestamp: Timestamp,
    /// Members to notify (the whole room, sender included)
    pub members: Vec<ConnectionId>,
}

/// AI 参加者へのメッセージ送信のユースケース
pub struct SendToAgentUseCase {
    registry: Arc<dyn RoomRegistry>,
    pusher: Arc<dyn EventPusher>,
    provisioner: Arc<dyn AgentProvisioner>,
    clock: Arc<dyn Clock>,
}

impl SendToAgentUseCase {
    pub fn new(
        registry: Arc<dyn RoomRegistry>,
        pusher: Arc<dyn EventPusher>,
        provisioner: Arc<dyn AgentProvisioner>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            registry,
            pusher,
            provisioner,
            clock,
        }
    }

    pub async fn execute(
        &self,
        room_id: RoomId,
        message: &str,
    ) -> Result<AgentMessageOutcome, SendToAgentError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(SendToAgentError::EmptyMessage);
        }

        // Messaging requires an already-provisioned agent; asking first is
        // a protocol violation, not a race.
        let agent = self
            .registry
            .agent_of(&room_id)
            .await
            .ok_or_else(|| SendToAgentError::NoAgentInRoom(room_id.as_str().to_string()))?;

        // External I/O without the registry lock held.
        let ai_response = self.provisioner.send_text(&agent, message).await?;

        let members = self.registry.members_of(&room_id).await;
        Ok(AgentMessageOutcome {
            user_message: message.to_string(),
            ai_response,
            timestamp: Timestamp::new(self.clock.now_millis()),
            members,
        })
    }

    /// Broadcast a serialized `ai-message-sent` event to the room.
    pub async fn broadcast_agent_message(
        &self,
        targets: Vec<ConnectionId>,
        message: &str,
    ) -> Result<(), String> {
        self.pusher
            .broadcast(targets, message)
            .await
            .map_err(|e| e.to_string())
    }
}
