//! UseCase: 参加者の Room 参加処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - JoinRoomUseCase::execute() メソッド
//! - Room 参加処理（既存メンバーのスナップショット取得、発呼ポリシー評価）
//!
//! ### なぜこのテストが必要か
//! - ビジネスロジックの検証：参加前のメンバーが正しく返される
//! - 発呼ポリシー（2 人目以降の参加者がオファーを作成する）を保証
//! - 二重 join・別 Room 在籍中の join が安全に処理されることを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：最初の参加、2 人目以降の参加
//! - エッジケース：同じ Room への二重 join（良性レース）
//! - 異常系：別の Room に在籍したままの join（防御的処理）

use std::sync::Arc;

use crate::domain::{
    AgentProvisioner, ConnectionId, EventPusher, LeaveOutcome, RoomId, RoomRegistry, policy,
};

use super::end_agent_session_best_effort;

/// Everything the ui layer needs to run the join notification sequence.
#[derive(Debug)]
pub struct JoinOutcome {
    pub room_id: RoomId,
    /// Members that were in the room before this join
    pub existing_members: Vec<ConnectionId>,
    /// Call-initiation policy verdict for the joining connection
    pub should_create_offer: bool,
    /// A different room the connection was detached from first, if any
    pub left_room: Option<LeaveOutcome>,
    /// True for a same-room double join: only the reply is re-sent,
    /// nothing is broadcast and the policy is not re-evaluated
    pub rejoined: bool,
}

/// Room 参加のユースケース
pub struct JoinRoomUseCase {
    registry: Arc<dyn RoomRegistry>,
    pusher: Arc<dyn EventPusher>,
    provisioner: Arc<dyn AgentProvisioner>,
}

impl JoinRoomUseCase {
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

    /// Execute the join transition.
    ///
    /// Sequencing contract (the ui layer must preserve it): notify the
    /// existing members, then reply to the joiner, then deliver the
    /// call-initiation instruction.
    pub async fn execute(&self, connection_id: ConnectionId, room_id: RoomId) -> JoinOutcome {
        // Double join of the same room is a benign race: re-ack only.
        if self.registry.room_of(&connection_id).await.as_ref() == Some(&room_id) {
            let mut members = self.registry.members_of(&room_id).await;
            members.retain(|m| m != &connection_id);
            return JoinOutcome {
                room_id,
                existing_members: members,
                should_create_offer: false,
                left_room: None,
                rejoined: true,
            };
        }

        // A connection joining from another room leaves it first, with full
        // leave semantics, so the members left behind get notified.
        let left_room = self.registry.leave(&connection_id).await;
        if let Some(agent) = left_room.as_ref().and_then(|l| l.removed_agent.clone()) {
            tracing::info!(
                "prior room died with agent session '{}' attached, ending it",
                agent.agent_id
            );
            end_agent_session_best_effort(self.provisioner.clone(), agent);
        }

        let existing_members = self.registry.join(connection_id, room_id.clone()).await;
        let should_create_offer = policy::should_create_offer(existing_members.len());

        JoinOutcome {
            room_id,
            existing_members,
            should_create_offer,
            left_room,
            rejoined: false,
        }
    }

    /// Broadcast a serialized event to the given members.
    pub async fn broadcast_user_joined(
        &self,
        targets: Vec<ConnectionId>,
        message: &str,
    ) -> Result<(), String> {
        self.pusher
            .broadcast(targets, message)
            .await
            .map_err(|e| e.to_string())
    }

    /// Reply to the joining connection itself.
    pub async fn reply_to_joiner(
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AgentDescriptor, AgentStatus, MockAgentProvisioner};
    use crate::infrastructure::{InMemoryRoomRegistry, WebSocketEventPusher};
    use tsunagi_shared::time::FixedClock;

    fn conn(id: &str) -> ConnectionId {
        ConnectionId::new(id.to_string()).unwrap()
    }

    fn room(id: &str) -> RoomId {
        RoomId::new(id.to_string()).unwrap()
    }

    fn create_test_usecase() -> (JoinRoomUseCase, Arc<InMemoryRoomRegistry>) {
        create_test_usecase_with(MockAgentProvisioner::new())
    }

    fn create_test_usecase_with(
        provisioner: MockAgentProvisioner,
    ) -> (JoinRoomUseCase, Arc<InMemoryRoomRegistry>) {
        let registry = Arc::new(InMemoryRoomRegistry::new(Arc::new(FixedClock::new(1000))));
        let pusher = Arc::new(WebSocketEventPusher::new());
        (
            JoinRoomUseCase::new(registry.clone(), pusher, Arc::new(provisioner)),
            registry,
        )
    }

    #[tokio::test]
    async fn test_first_joiner_sees_empty_room_and_never_initiates() {
        // テスト項目: 最初の参加者は既存メンバーが空で、オファーを作成しない
        // given (前提条件):
        let (usecase, _registry) = create_test_usecase();

        // when (操作):
        let outcome = usecase.execute(conn("x"), room("r1")).await;

        // then (期待する結果):
        assert!(outcome.existing_members.is_empty());
        assert!(!outcome.should_create_offer);
        assert!(outcome.left_room.is_none());
        assert!(!outcome.rejoined);
    }

    #[tokio::test]
    async fn test_second_joiner_sees_first_and_initiates() {
        // テスト項目: 2 人目の参加者は既存メンバーを受け取り、オファーを作成する
        // given (前提条件):
        let (usecase, _registry) = create_test_usecase();
        usecase.execute(conn("x"), room("r1")).await;

        // when (操作):
        let outcome = usecase.execute(conn("y"), room("r1")).await;

        // then (期待する結果):
        assert_eq!(outcome.existing_members, vec![conn("x")]);
        assert!(outcome.should_create_offer);
    }

    #[tokio::test]
    async fn test_policy_resets_across_room_lifetimes() {
        // テスト項目: Room が一度破棄されると、次の最初の参加者はオファーを作成しない
        // given (前提条件):
        let (usecase, registry) = create_test_usecase();
        usecase.execute(conn("x"), room("r1")).await;
        usecase.execute(conn("y"), room("r1")).await;
        registry.leave(&conn("x")).await;
        registry.leave(&conn("y")).await;

        // when (操作): 新しい接続が同じ Room 名に join する
        let outcome = usecase.execute(conn("z"), room("r1")).await;

        // then (期待する結果):
        assert!(outcome.existing_members.is_empty());
        assert!(!outcome.should_create_offer);
    }

    #[tokio::test]
    async fn test_double_join_same_room_is_noop() {
        // テスト項目: 同じ Room への二重 join は良性レースとして再応答のみ行う
        // given (前提条件):
        let (usecase, registry) = create_test_usecase();
        usecase.execute(conn("x"), room("r1")).await;
        usecase.execute(conn("y"), room("r1")).await;

        // when (操作): y が同じ Room に再度 join する
        let outcome = usecase.execute(conn("y"), room("r1")).await;

        // then (期待する結果):
        assert!(outcome.rejoined);
        assert!(!outcome.should_create_offer);
        assert_eq!(outcome.existing_members, vec![conn("x")]);
        // メンバーは重複しない
        assert_eq!(
            registry.members_of(&room("r1")).await,
            vec![conn("x"), conn("y")]
        );
    }

    #[tokio::test]
    async fn test_join_from_another_room_leaves_it_first() {
        // テスト項目: 別の Room 在籍中の join では、先にその Room から離脱する
        // given (前提条件):
        let (usecase, registry) = create_test_usecase();
        usecase.execute(conn("x"), room("r1")).await;
        usecase.execute(conn("y"), room("r1")).await;

        // when (操作): x が r2 に直接 join する
        let outcome = usecase.execute(conn("x"), room("r2")).await;

        // then (期待する結果): r1 の残メンバーが通知対象として返される
        let left = outcome.left_room.unwrap();
        assert_eq!(left.room_id, room("r1"));
        assert_eq!(left.remaining, vec![conn("y")]);
        assert_eq!(registry.room_of(&conn("x")).await, Some(room("r2")));
    }

    #[tokio::test]
    async fn test_rejoin_that_kills_prior_room_ends_its_agent() {
        // テスト項目: 再 join で破棄された Room の Agent セッションが終了される
        // given (前提条件):
        let mut provisioner = MockAgentProvisioner::new();
        provisioner
            .expect_end_session()
            .withf(|agent| agent.agent_id == "conv-1")
            .times(1)
            .returning(|_| Ok(()));
        let (usecase, registry) = create_test_usecase_with(provisioner);
        usecase.execute(conn("x"), room("r1")).await;
        registry
            .attach_agent(
                &room("r1"),
                AgentDescriptor {
                    agent_id: "conv-1".to_string(),
                    session_url: "https://example.com/conv-1".to_string(),
                    replica_label: "Assistant".to_string(),
                    status: AgentStatus::Active,
                },
            )
            .await
            .unwrap();

        // when (操作): r1 の唯一のメンバーが r2 に直接 join する
        let outcome = usecase.execute(conn("x"), room("r2")).await;

        // then (期待する結果): r1 は Agent ごと破棄される
        assert!(outcome.left_room.unwrap().removed_agent.is_some());
        assert!(registry.agent_of(&room("r1")).await.is_none());
        // end_session はバックグラウンドで実行されるため完了を待つ
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    }
}
