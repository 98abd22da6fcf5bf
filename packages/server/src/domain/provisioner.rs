//! Agent provisioner trait definition.
//!
//! The external service that provisions synthetic (AI) participants: given a
//! room, it returns a joinable session descriptor, accepts text messages for
//! the session, and tears the session down. The coordinator treats it as a
//! black box; the HTTP client implementation lives in the infrastructure
//! layer.

use async_trait::async_trait;
use thiserror::Error;

use super::entity::AgentDescriptor;
use super::value_object::RoomId;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProvisionError {
    #[error("agent provisioner is not configured")]
    NotConfigured,
    #[error("replica '{0}' is not available")]
    ReplicaUnavailable(String),
    #[error("provisioner API error (status {status}): {message}")]
    Api { status: u16, message: String },
    #[error("provisioner request failed: {0}")]
    Transport(String),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AgentProvisioner: Send + Sync {
    /// Provision a synthetic participant session for the room.
    async fn create_session(&self, room_id: &RoomId) -> Result<AgentDescriptor, ProvisionError>;

    /// Forward a text message to the session's messaging entry point,
    /// returning the provisioner's acknowledgement/response text.
    async fn send_text(
        &self,
        agent: &AgentDescriptor,
        message: &str,
    ) -> Result<String, ProvisionError>;

    /// End the session and release its slot on the provisioner side.
    async fn end_session(&self, agent: &AgentDescriptor) -> Result<(), ProvisionError>;
}
