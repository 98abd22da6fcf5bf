//! Server execution logic.

use std::sync::Arc;

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::usecase::{
    ConnectParticipantUseCase, GetRoomDetailUseCase, GetRoomsUseCase, JoinRoomUseCase,
    LeaveRoomUseCase, RelaySignalUseCase, RequestAgentUseCase, SendToAgentUseCase,
};

use super::{
    handler::{get_room_detail, get_rooms, health_check, websocket_handler},
    signal::shutdown_signal,
    state::AppState,
};

/// WebRTC signaling server
///
/// Encapsulates the wired use cases and runs the axum application.
pub struct Server {
    connect_participant_usecase: Arc<ConnectParticipantUseCase>,
    join_room_usecase: Arc<JoinRoomUseCase>,
    leave_room_usecase: Arc<LeaveRoomUseCase>,
    relay_signal_usecase: Arc<RelaySignalUseCase>,
    request_agent_usecase: Arc<RequestAgentUseCase>,
    send_to_agent_usecase: Arc<SendToAgentUseCase>,
    get_rooms_usecase: Arc<GetRoomsUseCase>,
    get_room_detail_usecase: Arc<GetRoomDetailUseCase>,
}

impl Server {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        connect_participant_usecase: Arc<ConnectParticipantUseCase>,
        join_room_usecase: Arc<JoinRoomUseCase>,
        leave_room_usecase: Arc<LeaveRoomUseCase>,
        relay_signal_usecase: Arc<RelaySignalUseCase>,
        request_agent_usecase: Arc<RequestAgentUseCase>,
        send_to_agent_usecase: Arc<SendToAgentUseCase>,
        get_rooms_usecase: Arc<GetRoomsUseCase>,
        get_room_detail_usecase: Arc<GetRoomDetailUseCase>,
    ) -> Self {
        Self {
            connect_participant_usecase,
            join_room_usecase,
            leave_room_usecase,
            relay_signal_usecase,
            request_agent_usecase,
            send_to_agent_usecase,
            get_rooms_usecase,
            get_room_detail_usecase,
        }
    }

    /// Build the axum router for the signaling server.
    pub fn router(self) -> Router {
        let app_state = Arc::new(AppState {
            connect_participant_usecase: self.connect_participant_usecase,
            join_room_usecase: self.join_room_usecase,
            leave_room_usecase: self.leave_room_usecase,
            relay_signal_usecase: self.relay_signal_usecase,
            request_agent_usecase: self.request_agent_usecase,
            send_to_agent_usecase: self.send_to_agent_usecase,
            get_rooms_usecase: self.get_rooms_usecase,
            get_room_detail_usecase: self.get_room_detail_usecase,
        });

        Router::new()
            // WebSocket エンドポイント
            .route("/ws", get(websocket_handler))
            // HTTP エンドポイント
            .route("/api/health", get(health_check))
            .route("/api/rooms", get(get_rooms))
            .route("/api/rooms/{room_id}", get(get_room_detail))
            .layer(TraceLayer::new_for_http())
            .with_state(app_state)
    }

    /// Run the signaling server
    ///
    /// # Arguments
    ///
    /// * `host` - The host address to bind to (e.g., "127.0.0.1")
    /// * `port` - The port number to bind to (e.g., 8080)
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address
    /// or if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        let app = self.router();

        let bind_addr = format!("{}:{}", host, port);
        let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

        tracing::info!("signaling server listening on {}", listener.local_addr()?);
        tracing::info!("Connect to: ws://{}/ws", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");

        Ok(())
    }
}
