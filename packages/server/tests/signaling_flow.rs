//! Integration tests driving the signaling server end-to-end over real
//! WebSocket connections: the axum application is served on an ephemeral
//! port in-process and exercised with tokio-tungstenite clients.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

use tsunagi_server::domain::{
    AgentDescriptor, AgentProvisioner, AgentStatus, ProvisionError, RoomId,
};
use tsunagi_server::infrastructure::{InMemoryRoomRegistry, WebSocketEventPusher};
use tsunagi_server::ui::Server;
use tsunagi_server::usecase::{
    ConnectParticipantUseCase, GetRoomDetailUseCase, GetRoomsUseCase, JoinRoomUseCase,
    LeaveRoomUseCase, RelaySignalUseCase, RequestAgentUseCase, SendToAgentUseCase,
};
use tsunagi_shared::time::SystemClock;

/// Provisioner stub: succeeds instantly without any network I/O.
struct StubAgentProvisioner;

#[async_trait]
impl AgentProvisioner for StubAgentProvisioner {
    async fn create_session(&self, room_id: &RoomId) -> Result<AgentDescriptor, ProvisionError> {
        Ok(AgentDescriptor {
            agent_id: format!("conv-{}", room_id.as_str()),
            session_url: format!("https://agent.example/{}", room_id.as_str()),
            replica_label: "Test Assistant".to_string(),
            status: AgentStatus::Active,
        })
    }

    async fn send_text(
        &self,
        _agent: &AgentDescriptor,
        _message: &str,
    ) -> Result<String, ProvisionError> {
        Ok("Acknowledged.".to_string())
    }

    async fn end_session(&self, _agent: &AgentDescriptor) -> Result<(), ProvisionError> {
        Ok(())
    }
}

/// Wire a full server with the stub provisioner and serve it on an
/// ephemeral port.
async fn start_test_server() -> SocketAddr {
    let clock = Arc::new(SystemClock);
    let registry = Arc::new(InMemoryRoomRegistry::new(clock.clone()));
    let pusher = Arc::new(WebSocketEventPusher::new());
    let provisioner = Arc::new(StubAgentProvisioner);

    let server = Server::new(
        Arc::new(ConnectParticipantUseCase::new(pusher.clone())),
        Arc::new(JoinRoomUseCase::new(
            registry.clone(),
            pusher.clone(),
            provisioner.clone(),
        )),
        Arc::new(LeaveRoomUseCase::new(
            registry.clone(),
            pusher.clone(),
            provisioner.clone(),
        )),
        Arc::new(RelaySignalUseCase::new(registry.clone(), pusher.clone())),
        Arc::new(RequestAgentUseCase::new(
            registry.clone(),
            pusher.clone(),
            provisioner.clone(),
        )),
        Arc::new(SendToAgentUseCase::new(
            registry.clone(),
            pusher.clone(),
            provisioner,
            clock,
        )),
        Arc::new(GetRoomsUseCase::new(registry.clone())),
        Arc::new(GetRoomDetailUseCase::new(registry)),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind test listener");
    let addr = listener.local_addr().expect("listener has no local addr");

    tokio::spawn(async move {
        axum::serve(listener, server.router())
            .await
            .expect("test server crashed");
    });

    addr
}

/// Thin wrapper over a client WebSocket connection.
struct TestClient {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl TestClient {
    /// Connect and consume the initial `connected` ack.
    async fn connect(addr: SocketAddr) -> Self {
        let (ws, _) = connect_async(format!("ws://{addr}/ws"))
            .await
            .expect("failed to connect test client");
        let mut client = Self { ws };

        let connected = client.recv_json().await;
        assert_eq!(connected["type"], "connected");

        client
    }

    async fn send_json(&mut self, event: Value) {
        self.ws
            .send(Message::Text(event.to_string().into()))
            .await
            .expect("failed to send test event");
    }

    /// Receive the next text frame as JSON, with a timeout.
    async fn recv_json(&mut self) -> Value {
        loop {
            let msg = tokio::time::timeout(Duration::from_secs(5), self.ws.next())
                .await
                .expect("timed out waiting for a server event")
                .expect("connection closed while waiting for a server event")
                .expect("websocket error while waiting for a server event");
            match msg {
                Message::Text(text) => {
                    return serde_json::from_str(&text).expect("server sent invalid JSON");
                }
                Message::Ping(_) | Message::Pong(_) => continue,
                other => panic!("unexpected frame: {other:?}"),
            }
        }
    }

    /// Assert that no event arrives within the given window.
    async fn assert_silent(&mut self, window: Duration) {
        let result = tokio::time::timeout(window, self.ws.next()).await;
        assert!(
            result.is_err(),
            "expected silence but received: {:?}",
            result
        );
    }

    async fn join(&mut self, room_id: &str) -> Value {
        self.send_json(json!({"type": "join-room", "room_id": room_id}))
            .await;
        let reply = self.recv_json().await;
        assert_eq!(reply["type"], "room-joined");
        reply
    }
}

async fn rooms_snapshot(addr: SocketAddr) -> Value {
    let body = reqwest::get(format!("http://{addr}/api/rooms"))
        .await
        .expect("rooms request failed")
        .text()
        .await
        .expect("rooms body unreadable");
    serde_json::from_str(&body).expect("rooms body is not JSON")
}

#[tokio::test]
async fn join_sequence_and_call_initiation() {
    let addr = start_test_server().await;

    // X joins first: empty room, no initiate-call.
    let mut x = TestClient::connect(addr).await;
    let x_reply = x.join("r1").await;
    assert_eq!(x_reply["room_id"], "r1");
    assert_eq!(x_reply["participants"], json!([]));

    // Y joins second.
    let mut y = TestClient::connect(addr).await;
    let y_reply = y.join("r1").await;
    assert_eq!(y_reply["room_id"], "r1");
    let participants = y_reply["participants"].as_array().unwrap();
    assert_eq!(participants.len(), 1);
    let x_id = participants[0].as_str().unwrap().to_string();

    // Y (the newest arrival) is instructed to originate the handshake.
    let initiate = y.recv_json().await;
    assert_eq!(initiate["type"], "initiate-call");
    assert_eq!(initiate["should_create_offer"], true);

    // X hears about Y before anything else.
    let joined = x.recv_json().await;
    assert_eq!(joined["type"], "user-joined");
    let y_id = joined["connection_id"].as_str().unwrap().to_string();
    assert_ne!(x_id, y_id);

    // X never receives initiate-call.
    x.assert_silent(Duration::from_millis(300)).await;
}

#[tokio::test]
async fn offers_are_relayed_to_other_members_only() {
    let addr = start_test_server().await;

    let mut x = TestClient::connect(addr).await;
    x.join("r1").await;
    let mut y = TestClient::connect(addr).await;
    let y_reply = y.join("r1").await;
    let x_id = y_reply["participants"][0].as_str().unwrap().to_string();
    y.recv_json().await; // initiate-call
    x.recv_json().await; // user-joined

    // X relays an offer.
    x.send_json(json!({"type": "offer", "payload": {"sdp": "v=0"}}))
        .await;

    let offer = y.recv_json().await;
    assert_eq!(offer["type"], "offer");
    assert_eq!(offer["payload"]["sdp"], "v=0");
    assert_eq!(offer["from"], x_id);

    // The sender gets no echo and no acknowledgement.
    x.assert_silent(Duration::from_millis(300)).await;
}

#[tokio::test]
async fn join_notifications_precede_relayed_traffic() {
    let addr = start_test_server().await;

    let mut x = TestClient::connect(addr).await;
    x.join("r1").await;
    let mut y = TestClient::connect(addr).await;
    y.join("r1").await;

    // X relays the moment it learns about Y.
    let joined = x.recv_json().await;
    assert_eq!(joined["type"], "user-joined");
    x.send_json(json!({"type": "answer", "payload": {"sdp": "v=0"}}))
        .await;

    // Y observes its join sequence strictly before X's relayed traffic.
    let initiate = y.recv_json().await;
    assert_eq!(initiate["type"], "initiate-call");
    let answer = y.recv_json().await;
    assert_eq!(answer["type"], "answer");
}

#[tokio::test]
async fn relay_isolation_between_rooms() {
    let addr = start_test_server().await;

    let mut x = TestClient::connect(addr).await;
    x.join("r1").await;
    let mut y = TestClient::connect(addr).await;
    y.join("r1").await;
    y.recv_json().await; // initiate-call
    x.recv_json().await; // user-joined
    let mut z = TestClient::connect(addr).await;
    z.join("r2").await;

    x.send_json(json!({"type": "ice-candidate", "payload": {"candidate": "c0"}}))
        .await;

    let candidate = y.recv_json().await;
    assert_eq!(candidate["type"], "ice-candidate");

    // Nothing crosses the room boundary.
    z.assert_silent(Duration::from_millis(300)).await;
}

#[tokio::test]
async fn relaying_outside_a_room_is_a_protocol_error() {
    let addr = start_test_server().await;

    let mut loner = TestClient::connect(addr).await;
    loner
        .send_json(json!({"type": "offer", "payload": {"sdp": "v=0"}}))
        .await;

    let error = loner.recv_json().await;
    assert_eq!(error["type"], "error");
    assert_eq!(error["message"], "Not in a room");
}

#[tokio::test]
async fn explicit_leave_notifies_remaining_members() {
    let addr = start_test_server().await;

    let mut x = TestClient::connect(addr).await;
    x.join("r1").await;
    let mut y = TestClient::connect(addr).await;
    y.join("r1").await;
    y.recv_json().await; // initiate-call
    let joined = x.recv_json().await;
    let y_id = joined["connection_id"].as_str().unwrap().to_string();

    y.send_json(json!({"type": "leave-room"})).await;

    let ack = y.recv_json().await;
    assert_eq!(ack["type"], "left-room");
    assert_eq!(ack["status"], "success");

    let left = x.recv_json().await;
    assert_eq!(left["type"], "user-left");
    assert_eq!(left["connection_id"], y_id.as_str());
}

#[tokio::test]
async fn disconnect_of_last_member_destroys_the_room() {
    let addr = start_test_server().await;

    let mut x = TestClient::connect(addr).await;
    x.join("r1").await;
    let snapshot = rooms_snapshot(addr).await;
    assert_eq!(snapshot.as_array().unwrap().len(), 1);

    drop(x);

    // Teardown is asynchronous; poll until the room is gone.
    let mut emptied = false;
    for _ in 0..50 {
        if rooms_snapshot(addr).await.as_array().unwrap().is_empty() {
            emptied = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert!(emptied, "room survived its last member's disconnect");

    // A later join of the same name is a first join again.
    let mut z = TestClient::connect(addr).await;
    let reply = z.join("r1").await;
    assert_eq!(reply["participants"], json!([]));
    z.assert_silent(Duration::from_millis(300)).await;
}

#[tokio::test]
async fn malformed_frames_get_an_error_reply() {
    let addr = start_test_server().await;

    let mut x = TestClient::connect(addr).await;
    x.send_json(json!({"type": "teleport"})).await;

    let error = x.recv_json().await;
    assert_eq!(error["type"], "error");
    assert_eq!(error["message"], "Invalid message format");

    // The connection stays usable.
    let reply = x.join("r1").await;
    assert_eq!(reply["room_id"], "r1");
}

#[tokio::test]
async fn agent_provisioning_is_announced_to_the_whole_room() {
    let addr = start_test_server().await;

    let mut x = TestClient::connect(addr).await;
    x.join("r1").await;
    let mut y = TestClient::connect(addr).await;
    y.join("r1").await;
    y.recv_json().await; // initiate-call
    x.recv_json().await; // user-joined

    y.send_json(json!({"type": "request-ai-agent", "room_id": "r1"}))
        .await;

    for client in [&mut x, &mut y] {
        let joined = client.recv_json().await;
        assert_eq!(joined["type"], "ai-agent-joined");
        assert_eq!(joined["room_id"], "r1");
        assert_eq!(joined["agent_descriptor"]["agent_id"], "conv-r1");
        assert_eq!(joined["agent_descriptor"]["status"], "active");
    }

    // Messaging the agent reaches the whole room, sender included.
    x.send_json(json!({"type": "send-to-ai", "room_id": "r1", "message": "hello"}))
        .await;

    for client in [&mut x, &mut y] {
        let sent = client.recv_json().await;
        assert_eq!(sent["type"], "ai-message-sent");
        assert_eq!(sent["user_message"], "hello");
        assert_eq!(sent["ai_response"], "Acknowledged.");
        assert!(sent["timestamp"].as_i64().unwrap() > 0);
    }
}

#[tokio::test]
async fn messaging_an_absent_agent_is_rejected() {
    let addr = start_test_server().await;

    let mut x = TestClient::connect(addr).await;
    x.join("r1").await;

    x.send_json(json!({"type": "send-to-ai", "room_id": "r1", "message": "anyone there?"}))
        .await;

    let error = x.recv_json().await;
    assert_eq!(error["type"], "error");

    // No ai-message-sent broadcast follows.
    x.assert_silent(Duration::from_millis(300)).await;
}
