//! Registry trait definition.
//!
//! The registry owns the subsystem's only shared mutable state: the room
//! table (`room_id -> Room`) and the connection index
//! (`connection_id -> room_id`). Every connection present in some room's
//! member set has exactly one index entry pointing at that room, and vice
//! versa; both maps must be mutated as a single atomic unit. The concrete
//! implementation lives in the infrastructure layer (dependency inversion).

use async_trait::async_trait;
use thiserror::Error;

use super::entity::{AgentDescriptor, Room};
use super::value_object::{ConnectionId, RoomId};

#[derive(Debug, Error, PartialEq)]
pub enum RegistryError {
    #[error("room '{0}' not found")]
    RoomNotFound(String),
}

/// What a successful `leave` tore down, captured atomically so callers can
/// notify the remaining members without re-reading (and racing on) the maps.
#[derive(Debug, Clone, PartialEq)]
pub struct LeaveOutcome {
    /// The room the connection was removed from
    pub room_id: RoomId,
    /// Members still in the room after the removal (empty if the room died)
    pub remaining: Vec<ConnectionId>,
    /// Agent descriptor that was dropped because the room was destroyed
    pub removed_agent: Option<AgentDescriptor>,
}

/// Room table + connection index, behind one lock.
#[async_trait]
pub trait RoomRegistry: Send + Sync {
    /// Add the connection to the room, creating the room on first join and
    /// detaching the connection from any room it was previously registered
    /// to (defensive; a well-behaved client leaves first). Returns the
    /// room's membership *before* this addition, so the caller can
    /// distinguish "first in room" from "joining others".
    async fn join(&self, connection_id: ConnectionId, room_id: RoomId) -> Vec<ConnectionId>;

    /// Remove the connection from its room and the index. Destroys the room
    /// if this emptied it. Returns `None` if the connection was not in any
    /// room (idempotent no-op).
    async fn leave(&self, connection_id: &ConnectionId) -> Option<LeaveOutcome>;

    /// Pure lookup used by every relay path.
    async fn room_of(&self, connection_id: &ConnectionId) -> Option<RoomId>;

    /// Membership snapshot of a room (empty if the room does not exist).
    async fn members_of(&self, room_id: &RoomId) -> Vec<ConnectionId>;

    /// Store an agent descriptor on an existing room, returning any
    /// descriptor it replaces. Fails if the room does not exist.
    async fn attach_agent(
        &self,
        room_id: &RoomId,
        agent: AgentDescriptor,
    ) -> Result<Option<AgentDescriptor>, RegistryError>;

    /// The room's agent descriptor, if one has been provisioned.
    async fn agent_of(&self, room_id: &RoomId) -> Option<AgentDescriptor>;

    /// Snapshot of all live rooms (for the HTTP observation surface).
    async fn rooms(&self) -> Vec<Room>;

    /// Snapshot of a single room.
    async fn room_detail(&self, room_id: &RoomId) -> Option<Room>;
}
