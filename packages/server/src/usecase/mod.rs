//! Use case layer: one struct per coordinator operation, wired with the
//! domain's trait seams (registry, pusher, provisioner) via dependency
//! inversion.

pub mod connect_participant;
pub mod error;
pub mod join_room;
pub mod leave_room;
pub mod relay_signal;
pub mod request_agent;
pub mod room_query;
pub mod send_to_agent;

pub use connect_participant::ConnectParticipantUseCase;
pub use error::{GetRoomDetailError, RelaySignalError, RequestAgentError, SendToAgentError};
pub use join_room::{JoinOutcome, JoinRoomUseCase};
pub use leave_room::LeaveRoomUseCase;
pub use relay_signal::RelaySignalUseCase;
pub use request_agent::{AgentJoinOutcome, RequestAgentUseCase};
pub use room_query::{GetRoomDetailUseCase, GetRoomsUseCase};
pub use send_to_agent::{AgentMessageOutcome, SendToAgentUseCase};

use std::sync::Arc;

use crate::domain::{AgentDescriptor, AgentProvisioner};

/// End an agent session that no longer belongs to any live room.
///
/// Runs in the background so teardown paths never block on provisioner I/O;
/// a failure only costs a session slot on the provisioner side and is logged.
pub(crate) fn end_agent_session_best_effort(
    provisioner: Arc<dyn AgentProvisioner>,
    agent: AgentDescriptor,
) {
    tokio::spawn(async move {
        if let Err(e) = provisioner.end_session(&agent).await {
            tracing::warn!(
                "failed to end orphaned agent session '{}': {}",
                agent.agent_id,
                e
            );
        }
    });
}
