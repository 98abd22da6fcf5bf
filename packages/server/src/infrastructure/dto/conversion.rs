//! Conversion logic between domain entities and DTOs.

use tsunagi_shared::time::timestamp_to_rfc3339;

use crate::domain::Room;
use crate::infrastructure::dto::http::{RoomDetailDto, RoomSummaryDto};

impl From<Room> for RoomSummaryDto {
    fn from(room: Room) -> Self {
        Self {
            id: room.id.as_str().to_string(),
            members: room
                .members
                .iter()
                .map(|m| m.as_str().to_string())
                .collect(),
            has_agent: room.agent.is_some(),
            created_at: timestamp_to_rfc3339(room.created_at.value()),
        }
    }
}

impl From<Room> for RoomDetailDto {
    fn from(room: Room) -> Self {
        Self {
            id: room.id.as_str().to_string(),
            members: room
                .members
                .iter()
                .map(|m| m.as_str().to_string())
                .collect(),
            agent: room.agent.map(Into::into),
            created_at: timestamp_to_rfc3339(room.created_at.value()),
        }
    }
}
