//! Error types for the use case layer.

use thiserror::Error;

use crate::domain::ProvisionError;

/// Errors surfaced by the signal relay
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RelaySignalError {
    /// The sender is not registered in any room (protocol violation)
    #[error("Not in a room")]
    NotInRoom,
    #[error("failed to relay signal: {0}")]
    BroadcastFailed(String),
}

/// Errors surfaced when provisioning an AI participant
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestAgentError {
    /// The target room has no members (nothing to join)
    #[error("room '{0}' has no participants")]
    RoomNotFound(String),
    #[error("failed to provision AI agent: {0}")]
    Provision(#[from] ProvisionError),
}

/// Errors surfaced when messaging a room's AI participant
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SendToAgentError {
    #[error("Message required")]
    EmptyMessage,
    /// No agent was ever provisioned for the room (protocol violation)
    #[error("No AI agent active in room '{0}'")]
    NoAgentInRoom(String),
    #[error("failed to send message to AI agent: {0}")]
    Provision(#[from] ProvisionError),
}

/// Errors surfaced by the room detail query
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GetRoomDetailError {
    #[error("room not found")]
    RoomNotFound,
}
