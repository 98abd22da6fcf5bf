//! In-memory RoomRegistry implementation.
//!
//! Both maps — the room table and the connection index — live inside a
//! single `tokio::sync::Mutex`, so every mutation is atomic with respect to
//! concurrent handlers and the lock-step invariant between `Room::members`
//! and the index can never be observed half-applied. Room creation and
//! destruction happen here and nowhere else: a room appears when its first
//! member joins and is removed in the same critical section that empties it.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use tsunagi_shared::time::Clock;

use crate::domain::{
    AgentDescriptor, ConnectionId, LeaveOutcome, RegistryError, Room, RoomId, RoomRegistry,
    Timestamp,
};

#[derive(Default)]
struct RegistryInner {
    /// Room table: room_id -> Room
    rooms: HashMap<RoomId, Room>,
    /// Connection index: connection_id -> room_id, lock-step with Room::members
    index: HashMap<ConnectionId, RoomId>,
}

/// In-memory registry guarding the room table and connection index with one lock.
pub struct InMemoryRoomRegistry {
    inner: Mutex<RegistryInner>,
    clock: Arc<dyn Clock>,
}

impl InMemoryRoomRegistry {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Mutex::new(RegistryInner::default()),
            clock,
        }
    }

    /// Remove the connection from whatever room the index maps it to,
    /// garbage-collecting the room if this emptied it. Must be called with
    /// the registry lock held.
    fn detach_locked(
        inner: &mut RegistryInner,
        connection_id: &ConnectionId,
    ) -> Option<LeaveOutcome> {
        let room_id = inner.index.remove(connection_id)?;

        let (room_died, remaining) = match inner.rooms.get_mut(&room_id) {
            Some(room) => {
                room.remove_member(connection_id);
                (room.is_empty(), room.members.clone())
            }
            None => {
                // Index pointed at a missing room; both maps are mutated
                // together under one lock, so this indicates a bug.
                tracing::error!(
                    "connection '{}' was indexed to nonexistent room '{}'",
                    connection_id,
                    room_id
                );
                (false, Vec::new())
            }
        };

        let removed_agent = if room_died {
            inner.rooms.remove(&room_id).and_then(|room| room.agent)
        } else {
            None
        };

        Some(LeaveOutcome {
            room_id,
            remaining,
            removed_agent,
        })
    }
}

#[async_trait]
impl RoomRegistry for InMemoryRoomRegistry {
    async fn join(&self, connection_id: ConnectionId, room_id: RoomId) -> Vec<ConnectionId> {
        let mut inner = self.inner.lock().await;

        // A connection is in at most one room; detach it from any prior one
        // first. Callers that want the prior room's members notified run a
        // full leave before joining, which makes this a no-op.
        if inner.index.contains_key(&connection_id) {
            tracing::warn!(
                "connection '{}' joined room '{}' while still registered elsewhere",
                connection_id,
                room_id
            );
            Self::detach_locked(&mut inner, &connection_id);
        }

        let created_at = Timestamp::new(self.clock.now_millis());
        let existing = {
            let room = inner
                .rooms
                .entry(room_id.clone())
                .or_insert_with(|| Room::new(room_id.clone(), created_at));
            let existing = room.members.clone();
            room.add_member(connection_id.clone());
            existing
        };
        inner.index.insert(connection_id, room_id);

        existing
    }

    async fn leave(&self, connection_id: &ConnectionId) -> Option<LeaveOutcome> {
        let mut inner = self.inner.lock().await;
        Self::detach_locked(&mut inner, connection_id)
    }

    async fn room_of(&self, connection_id: &ConnectionId) -> Option<RoomId> {
        let inner = self.inner.lock().await;
        inner.index.get(connection_id).cloned()
    }

    async fn members_of(&self, room_id: &RoomId) -> Vec<ConnectionId> {
        let inner = self.inner.lock().await;
        inner
            .rooms
            .get(room_id)
            .map(|room| room.members.clone())
            .unwrap_or_default()
    }

    async fn attach_agent(
        &self,
        room_id: &RoomId,
        agent: AgentDescriptor,
    ) -> Result<Option<AgentDescriptor>, RegistryError> {
        let mut inner = self.inner.lock().await;
        match inner.rooms.get_mut(room_id) {
            Some(room) => Ok(std::mem::replace(&mut room.agent, Some(agent))),
            None => Err(RegistryError::RoomNotFound(room_id.as_str().to_string())),
        }
    }

    async fn agent_of(&self, room_id: &RoomId) -> Option<AgentDescriptor> {
        let inner = self.inner.lock().await;
        inner.rooms.get(room_id).and_then(|room| room.agent.clone())
    }

    async fn rooms(&self) -> Vec<Room> {
        let inner = self.inner.lock().await;
        let mut rooms: Vec<Room> = inner.rooms.values().cloned().collect();
        rooms.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
        rooms
    }

    async fn room_detail(&self, room_id: &RoomId) -> Option<Room> {
        let inner = self.inner.lock().await;
        inner.rooms.get(room_id).cloned()
    }
}
