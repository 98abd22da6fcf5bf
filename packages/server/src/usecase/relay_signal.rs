//! UseCase: シグナリングメッセージの中継処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - RelaySignalUseCase::execute() メソッド
//! - 中継処理（送信者の Room 解決、送信者以外へのファンアウト対象選定）
//!
//! ### なぜこのテストが必要か
//! - ビジネスロジックの検証：送信者以外の全メンバーに中継される
//! - Room 未参加の送信者がプロトコル違反として弾かれることを保証
//! - Room 間の分離（他の Room には決して届かない）を確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：Room 内の他メンバーへの中継
//! - 異常系：Room 未参加の接続からの中継要求
//! - エッジケース：送信者しかいない Room（ファンアウト対象なし）

use std::sync::Arc;

use crate::domain::{ConnectionId, EventPusher, RoomRegistry};

use super::error::RelaySignalError;

/// シグナリング中継のユースケース
///
/// The relay is stateless: it resolves the sender's room via the registry
/// and fans the already-serialized event out to every other member. Payloads
/// are never inspected and no acknowledgement is sent back to the sender.
pub struct RelaySignalUseCase {
    registry: Arc<dyn RoomRegistry>,
    pusher: Arc<dyn EventPusher>,
}

impl RelaySignalUseCase {
    pub fn new(registry: Arc<dyn RoomRegistry>, pusher: Arc<dyn EventPusher>) -> Self {
        Self { registry, pusher }
    }

    /// Relay a serialized signaling event from `sender` to the other members
    /// of its room. Returns the fan-out targets.
    pub async fn execute(
        &self,
        sender: &ConnectionId,
        message: &str,
    ) -> Result<Vec<ConnectionId>, RelaySignalError> {
        // A sender outside any room is a protocol violation, not a race.
        let room_id = self
            .registry
            .room_of(sender)
            .await
            .ok_or(RelaySignalError::NotInRoom)?;

        let targets: Vec<ConnectionId> = self
            .registry
            .members_of(&room_id)
            .await
            .into_iter()
            .filter(|member| member != sender)
            .collect();

        self.pusher
            .broadcast(targets.clone(), message)
            .await
            .map_err(|e| RelaySignalError::BroadcastFailed(e.to_string()))?;

        Ok(targets)
    }
}
