//! UseCase: AI 参加者のプロビジョニング処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - RequestAgentUseCase::execute() メソッド
//! - AI 参加者のプロビジョニング（外部サービス呼び出し、Room への保存）
//!
//! ### なぜこのテストが必要か
//! - ビジネスロジックの検証：成功時に記述子が Room に保存され全員に通知される
//! - プロビジョナー失敗時に Room の状態が変化しないことを保証
//! - プロビジョニング中に Room が消滅した場合の補償処理を確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：AI 参加者の作成と通知
//! - 異常系：外部サービスの失敗（要求者のみにエラー）
//! - エッジケース：メンバーのいない Room への要求、既存 Agent の置き換え

use std::sync::Arc;

use crate::domain::{
    AgentDescriptor, AgentProvisioner, ConnectionId, EventPusher, RegistryError, RoomId,
    RoomRegistry,
};

use super::end_agent_session_best_effort;
use super::error::RequestAgentError;

/// Everything the ui layer needs to announce the provisioned agent.
#[derive(Debug)]
pub struct AgentJoinOutcome {
    pub agent: AgentDescriptor,
    pub room_id: RoomId,
    /// Members to notify (the whole room, requester included)
    pub members: Vec<ConnectionId>,
}

/// AI 参加者プロビジョニングのユースケース
///
/// The agent is injected as a non-relaying pseudo-participant: it is stored
/// on the Room but never enters the member set, so the signal relay can
/// never see it.
pub struct RequestAgentUseCase {
    registry: Arc<dyn RoomRegistry>,
    pusher: Arc<dyn EventPusher>,
    provisioner: Arc<dyn AgentProvisioner>,
}

impl RequestAgentUseCase {
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

    pub async fn execute(&self, room_id: RoomId) -> Result<AgentJoinOutcome, RequestAgentError> {
        let members = self.registry.members_of(&room_id).await;
        if members.is_empty() {
            return Err(RequestAgentError::RoomNotFound(
                room_id.as_str().to_string(),
            ));
        }

        // The provisioner call is the subsystem's only external I/O on a
        // request path; the registry lock is not held while it is in flight,
        // so join/leave/relay traffic in other rooms is never stalled.
        let agent = self.provisioner.create_session(&room_id).await?;

        match self.registry.attach_agent(&room_id, agent.clone()).await {
            Ok(replaced) => {
                if let Some(old) = replaced {
                    tracing::info!(
                        "agent session '{}' in room '{}' replaced by '{}', ending the old one",
                        old.agent_id,
                        room_id,
                        agent.agent_id
                    );
                    end_agent_session_best_effort(self.provisioner.clone(), old);
                }
                // Re-read the membership: it may have changed while the
                // provisioner call was in flight.
                let members = self.registry.members_of(&room_id).await;
                Ok(AgentJoinOutcome {
                    agent,
                    room_id,
                    members,
                })
            }
            Err(RegistryError::RoomNotFound(_)) => {
                // Everyone left while provisioning was in flight; never store
                // a descriptor for a dead room.
                tracing::warn!(
                    "room '{}' vanished while provisioning agent '{}', ending the fresh session",
                    room_id,
                    agent.agent_id
                );
                end_agent_session_best_effort(self.provisioner.clone(), agent);
                Err(RequestAgentError::RoomNotFound(
                    room_id.as_str().to_string(),
                ))
            }
        }
    }

    /// Broadcast a serialized `ai-agent-joined` event to the room.
    pub async fn broadcast_agent_joined(
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
