//! WebRTC signaling server.
//!
//! Coordinates room membership and relays connection-setup handshakes
//! between WebSocket clients.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin tsunagi-server
//! cargo run --bin tsunagi-server -- --host 0.0.0.0 --port 3000
//! ```

use std::sync::Arc;

use clap::Parser;
use tsunagi_server::{
    infrastructure::{
        HttpAgentProvisioner, InMemoryRoomRegistry, ProvisionerConfig, WebSocketEventPusher,
    },
    ui::Server,
    usecase::{
        ConnectParticipantUseCase, GetRoomDetailUseCase, GetRoomsUseCase, JoinRoomUseCase,
        LeaveRoomUseCase, RelaySignalUseCase, RequestAgentUseCase, SendToAgentUseCase,
    },
};
use tsunagi_shared::{logger::setup_logger, time::SystemClock};

#[derive(Parser, Debug)]
#[command(name = "server")]
#[command(about = "WebRTC signaling server with room-based relay", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,

    /// Base URL of the AI participant provisioner API
    #[arg(long, env = "AGENT_API_URL", default_value = "https://tavusapi.com")]
    agent_api_url: String,

    /// API key for the provisioner; agent requests fail gracefully without it
    #[arg(long, env = "AGENT_API_KEY")]
    agent_api_key: Option<String>,

    /// Replica (AI identity) used for provisioned sessions
    #[arg(long, env = "AGENT_REPLICA_ID", default_value = "r1a4e22fa0d9")]
    agent_replica_id: String,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let args = Args::parse();

    // Initialize dependencies in order:
    // 1. Registry
    // 2. EventPusher
    // 3. AgentProvisioner
    // 4. UseCases
    // 5. Server

    // 1. Create Registry (in-memory room table + connection index)
    let clock = Arc::new(SystemClock);
    let registry = Arc::new(InMemoryRoomRegistry::new(clock.clone()));

    // 2. Create EventPusher (WebSocket implementation)
    let pusher = Arc::new(WebSocketEventPusher::new());

    // 3. Create AgentProvisioner (HTTP client for the session API)
    if args.agent_api_key.is_none() {
        tracing::warn!("AGENT_API_KEY not set — AI agent requests will be rejected");
    }
    let provisioner = Arc::new(HttpAgentProvisioner::new(ProvisionerConfig {
        base_url: args.agent_api_url,
        api_key: args.agent_api_key,
        replica_id: args.agent_replica_id,
    }));

    // 4. Create UseCases
    let connect_participant_usecase = Arc::new(ConnectParticipantUseCase::new(pusher.clone()));
    let join_room_usecase = Arc::new(JoinRoomUseCase::new(
        registry.clone(),
        pusher.clone(),
        provisioner.clone(),
    ));
    let leave_room_usecase = Arc::new(LeaveRoomUseCase::new(
        registry.clone(),
        pusher.clone(),
        provisioner.clone(),
    ));
    let relay_signal_usecase = Arc::new(RelaySignalUseCase::new(registry.clone(), pusher.clone()));
    let request_agent_usecase = Arc::new(RequestAgentUseCase::new(
        registry.clone(),
        pusher.clone(),
        provisioner.clone(),
    ));
    let send_to_agent_usecase = Arc::new(SendToAgentUseCase::new(
        registry.clone(),
        pusher.clone(),
        provisioner,
        clock,
    ));
    let get_rooms_usecase = Arc::new(GetRoomsUseCase::new(registry.clone()));
    let get_room_detail_usecase = Arc::new(GetRoomDetailUseCase::new(registry));

    // 5. Create and run the server
    let server = Server::new(
        connect_participant_usecase,
        join_room_usecase,
        leave_room_usecase,
        relay_signal_usecase,
        request_agent_usecase,
        send_to_agent_usecase,
        get_rooms_usecase,
        get_room_detail_usecase,
    );
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
