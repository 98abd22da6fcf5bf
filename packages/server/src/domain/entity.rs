//! Domain entities: rooms and the per-room AI participant descriptor.

use serde::Serialize;

use super::value_object::{ConnectionId, RoomId, Timestamp};

/// Lifecycle status of a provisioned AI participant session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    Active,
    Ended,
}

/// Result of provisioning a synthetic (AI) participant for a room.
///
/// `agent_id` is the provisioner's session identifier; `session_url` is the
/// joinable endpoint the frontend embeds. The agent is NOT part of the
/// signaling mesh — it never appears in `Room::members` and the relay never
/// sees it (it has its own out-of-band media channel).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentDescriptor {
    pub agent_id: String,
    pub session_url: String,
    pub replica_label: String,
    pub status: AgentStatus,
}

/// A named set of connections currently associated for call setup.
///
/// Rooms are created lazily when the first member joins and destroyed the
/// instant the member set becomes empty; an empty room must never outlive
/// the registry transition that emptied it.
#[derive(Debug, Clone, Serialize)]
pub struct Room {
    pub id: RoomId,
    pub members: Vec<ConnectionId>,
    pub agent: Option<AgentDescriptor>,
    pub created_at: Timestamp,
}

impl Room {
    pub fn new(id: RoomId, created_at: Timestamp) -> Self {
        Self {
            id,
            members: Vec::new(),
            agent: None,
            created_at,
        }
    }

    /// Add a member. Returns false (and leaves the set unchanged) if the
    /// connection is already a member.
    pub fn add_member(&mut self, connection_id: ConnectionId) -> bool {
        if self.members.contains(&connection_id) {
            return false;
        }
        self.members.push(connection_id);
        true
    }

    /// Remove a member. Returns true if the connection was a member.
    pub fn remove_member(&mut self, connection_id: &ConnectionId) -> bool {
        let before = self.members.len();
        self.members.retain(|m| m != connection_id);
        self.members.len() != before
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_room() -> Room {
        Room::new(
            RoomId::new("r1".to_string()).unwrap(),
            Timestamp::new(1000),
        )
    }

    #[test]
    fn test_add_member_appends_in_order() {
        // テスト項目: メンバーが参加順に追加される
        // given (前提条件):
        let mut room = test_room();
        let alice = ConnectionId::new("alice".to_string()).unwrap();
        let bob = ConnectionId::new("bob".to_string()).unwrap();

        // when (操作):
        assert!(room.add_member(alice.clone()));
        assert!(room.add_member(bob.clone()));

        // then (期待する結果):
        assert_eq!(room.members, vec![alice, bob]);
    }

    #[test]
    fn test_add_member_is_idempotent() {
        // テスト項目: 同じメンバーを二重追加しても member set は変化しない
        // given (前提条件):
        let mut room = test_room();
        let alice = ConnectionId::new("alice".to_string()).unwrap();
        room.add_member(alice.clone());

        // when (操作):
        let added = room.add_member(alice.clone());

        // then (期待する結果):
        assert!(!added);
        assert_eq!(room.member_count(), 1);
    }

    #[test]
    fn test_remove_member_reports_membership() {
        // テスト項目: remove_member は実際にメンバーだった場合のみ true を返す
        // given (前提条件):
        let mut room = test_room();
        let alice = ConnectionId::new("alice".to_string()).unwrap();
        let bob = ConnectionId::new("bob".to_string()).unwrap();
        room.add_member(alice.clone());

        // when (操作) / then (期待する結果):
        assert!(room.remove_member(&alice));
        assert!(!room.remove_member(&bob));
        assert!(room.is_empty());
    }
}
