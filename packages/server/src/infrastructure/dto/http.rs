//! HTTP API response DTOs.

use serde::Serialize;

use super::websocket::AgentDescriptorDto;

/// Room summary for the rooms listing
#[derive(Debug, Serialize)]
pub struct RoomSummaryDto {
    pub id: String,
    pub members: Vec<String>,
    pub has_agent: bool,
    pub created_at: String,
}

/// Full room detail including any provisioned agent
#[derive(Debug, Serialize)]
pub struct RoomDetailDto {
    pub id: String,
    pub members: Vec<String>,
    pub agent: Option<AgentDescriptorDto>,
    pub created_at: String,
}
