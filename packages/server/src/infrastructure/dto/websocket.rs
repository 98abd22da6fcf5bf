//! WebSocket message DTOs.
//!
//! Every frame is a JSON object tagged by `type` (kebab-case). Signaling
//! payloads (offer / answer / ICE candidate) are opaque to the coordinator
//! and carried as raw JSON values.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{AgentDescriptor, AgentStatus};

/// Client-to-server events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientEvent {
    /// Join a room, creating it if this is the first member
    JoinRoom { room_id: String },
    /// Relay a WebRTC offer to the other members of the sender's room
    Offer { payload: Value },
    /// Relay a WebRTC answer
    Answer { payload: Value },
    /// Relay an ICE candidate
    IceCandidate { payload: Value },
    /// Leave the current room
    LeaveRoom,
    /// Provision an AI participant for the room
    RequestAiAgent { room_id: String },
    /// Send a text message to the room's AI participant
    SendToAi { room_id: String, message: String },
}

/// Server-to-client events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// Ack sent to a connection right after the transport is accepted
    Connected { status: String },
    /// Reply to the joiner: the room and who was already there
    RoomJoined {
        room_id: String,
        participants: Vec<String>,
    },
    /// A new participant joined, sent to the pre-existing members
    UserJoined { connection_id: String },
    /// Instruction to the newest arrival to originate the handshake
    InitiateCall { should_create_offer: bool },
    /// Relayed offer, tagged with the sending connection
    Offer { payload: Value, from: String },
    /// Relayed answer
    Answer { payload: Value, from: String },
    /// Relayed ICE candidate
    IceCandidate { payload: Value, from: String },
    /// Ack to the leaver
    LeftRoom { status: String },
    /// A participant left, sent to the remaining members
    UserLeft { connection_id: String },
    /// An AI participant was provisioned for the room
    AiAgentJoined {
        agent_descriptor: AgentDescriptorDto,
        room_id: String,
    },
    /// A text message was forwarded to the AI participant
    AiMessageSent {
        user_message: String,
        ai_response: String,
        sender: String,
        timestamp: i64,
    },
    /// Error reply to the originator of an invalid request
    Error { message: String },
}

/// Wire representation of a provisioned AI participant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentDescriptorDto {
    pub agent_id: String,
    pub session_url: String,
    pub replica_label: String,
    pub status: String,
}

impl From<AgentDescriptor> for AgentDescriptorDto {
    fn from(agent: AgentDescriptor) -> Self {
        Self {
            agent_id: agent.agent_id,
            session_url: agent.session_url,
            replica_label: agent.replica_label,
            status: match agent.status {
                AgentStatus::Active => "active".to_string(),
                AgentStatus::Ended => "ended".to_string(),
            },
        }
    }
}
