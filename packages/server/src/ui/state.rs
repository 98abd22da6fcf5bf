//! Server state shared across handlers.

use std::sync::Arc;

use crate::usecase::{
    ConnectParticipantUseCase, GetRoomDetailUseCase, GetRoomsUseCase, JoinRoomUseCase,
    LeaveRoomUseCase, RelaySignalUseCase, RequestAgentUseCase, SendToAgentUseCase,
};

/// Shared application state
pub struct AppState {
    pub connect_participant_usecase: Arc<ConnectParticipantUseCase>,
    pub join_room_usecase: Arc<JoinRoomUseCase>,
    pub leave_room_usecase: Arc<LeaveRoomUseCase>,
    pub relay_signal_usecase: Arc<RelaySignalUseCase>,
    pub request_agent_usecase: Arc<RequestAgentUseCase>,
    pub send_to_agent_usecase: Arc<SendToAgentUseCase>,
    pub get_rooms_usecase: Arc<GetRoomsUseCase>,
    pub get_room_detail_usecase: Arc<GetRoomDetailUseCase>,
}
