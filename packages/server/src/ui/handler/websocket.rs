//! WebSocket connection handler and event dispatch.
//!
//! Each connection gets a freshly minted ConnectionId, an outbound channel
//! registered with the event pusher, and two tasks: one pumping the channel
//! into the WebSocket sink, one receiving and dispatching inbound events.
//! Every dispatch failure is converted to an `error` event at this boundary;
//! nothing a single client sends can take the process down.

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;

use crate::{
    domain::{ConnectionId, RoomId},
    infrastructure::dto::websocket::{ClientEvent, ServerEvent},
    ui::state::AppState,
    usecase::{RelaySignalError, RequestAgentError, SendToAgentError},
};

/// Serialize a server event. Coordinator-owned DTOs serialize infallibly.
fn encode(event: &ServerEvent) -> String {
    serde_json::to_string(event).unwrap()
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Spawns a task that receives events from the rx channel and pushes them to
/// the WebSocket sender.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    })
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    // The transport layer mints the opaque identifier on accept; the
    // coordinator never authenticates beyond it.
    let connection_id = ConnectionId::generate();
    let (tx, rx) = mpsc::unbounded_channel();

    state
        .connect_participant_usecase
        .execute(connection_id.clone(), tx.clone())
        .await;
    tracing::info!("connection '{}' accepted and registered", connection_id);

    let (mut sender, mut receiver) = socket.split();

    // Ack the connect before anything else can reach the channel.
    let connected_json = encode(&ServerEvent::Connected {
        status: "success".to_string(),
    });
    if let Err(e) = sender.send(Message::Text(connected_json.into())).await {
        tracing::error!("failed to ack connect for '{}': {}", connection_id, e);
        state
            .leave_room_usecase
            .discard_connection(&connection_id)
            .await;
        return;
    }

    // Outbound: channel -> WebSocket sink
    let mut send_task = pusher_loop(rx, sender);

    // Inbound: WebSocket -> event dispatch, sequential per connection so a
    // single client's events are processed in arrival order.
    let state_clone = state.clone();
    let connection_id_clone = connection_id.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::error!("WebSocket error: {}", e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    dispatch_event(&state_clone, &connection_id_clone, &tx, &text).await;
                }
                Message::Ping(_) => {
                    tracing::debug!("received ping");
                    // Ping/pong is handled automatically by the WebSocket protocol
                }
                Message::Close(_) => {
                    tracing::info!("connection '{}' requested close", connection_id_clone);
                    break;
                }
                _ => {}
            }
        }
    });

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    // Teardown is the mirror image of join: deregister, then notify the
    // members left behind.
    if let Some(outcome) = state.leave_room_usecase.execute(&connection_id).await {
        tracing::info!(
            "connection '{}' disconnected from room '{}'",
            connection_id,
            outcome.room_id
        );
        if !outcome.remaining.is_empty() {
            let left_json = encode(&ServerEvent::UserLeft {
                connection_id: connection_id.to_string(),
            });
            if let Err(e) = state
                .leave_room_usecase
                .broadcast_user_left(outcome.remaining, &left_json)
                .await
            {
                tracing::warn!("failed to broadcast user-left: {}", e);
            }
        }
    }
    state
        .leave_room_usecase
        .discard_connection(&connection_id)
        .await;
    tracing::info!("connection '{}' discarded", connection_id);
}

/// Send an error event back to the connection itself.
fn push_error(tx: &mpsc::UnboundedSender<String>, message: String) {
    let _ = tx.send(encode(&ServerEvent::Error { message }));
}

/// Single dispatch boundary for inbound events. Protocol violations and
/// collaborator failures become `error` events to the originator; benign
/// races are silent no-ops.
async fn dispatch_event(
    state: &Arc<AppState>,
    connection_id: &ConnectionId,
    tx: &mpsc::UnboundedSender<String>,
    text: &str,
) {
    let event = match serde_json::from_str::<ClientEvent>(text) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!(
                "connection '{}' sent an unparseable event: {}",
                connection_id,
                e
            );
            push_error(tx, "Invalid message format".to_string());
            return;
        }
    };

    match event {
        ClientEvent::JoinRoom { room_id } => {
            handle_join_room(state, connection_id, tx, room_id).await;
        }
        ClientEvent::Offer { payload } => {
            let relayed = ServerEvent::Offer {
                payload,
                from: connection_id.to_string(),
            };
            handle_relay(state, connection_id, tx, "offer", relayed).await;
        }
        ClientEvent::Answer { payload } => {
            let relayed = ServerEvent::Answer {
                payload,
                from: connection_id.to_string(),
            };
            handle_relay(state, connection_id, tx, "answer", relayed).await;
        }
        ClientEvent::IceCandidate { payload } => {
            let relayed = ServerEvent::IceCandidate {
                payload,
                from: connection_id.to_string(),
            };
            handle_relay(state, connection_id, tx, "ice-candidate", relayed).await;
        }
        ClientEvent::LeaveRoom => {
            handle_leave_room(state, connection_id).await;
        }
        ClientEvent::RequestAiAgent { room_id } => {
            handle_request_agent(state, connection_id, tx, room_id).await;
        }
        ClientEvent::SendToAi { room_id, message } => {
            handle_send_to_agent(state, connection_id, tx, room_id, message).await;
        }
    }
}

async fn handle_join_room(
    state: &Arc<AppState>,
    connection_id: &ConnectionId,
    tx: &mpsc::UnboundedSender<String>,
    room_id: String,
) {
    let room_id = match RoomId::new(room_id) {
        Ok(room_id) => room_id,
        Err(e) => {
            push_error(tx, e.to_string());
            return;
        }
    };

    let outcome = state
        .join_room_usecase
        .execute(connection_id.clone(), room_id)
        .await;

    // A different prior room was left first: its members get user-left.
    if let Some(left) = &outcome.left_room {
        if !left.remaining.is_empty() {
            let left_json = encode(&ServerEvent::UserLeft {
                connection_id: connection_id.to_string(),
            });
            if let Err(e) = state
                .leave_room_usecase
                .broadcast_user_left(left.remaining.clone(), &left_json)
                .await
            {
                tracing::warn!("failed to broadcast user-left: {}", e);
            }
        }
    }

    // Sequencing is load-bearing: existing members learn about the joiner
    // before the joiner can receive (or provoke) any relayed traffic.
    if !outcome.rejoined && !outcome.existing_members.is_empty() {
        let joined_json = encode(&ServerEvent::UserJoined {
            connection_id: connection_id.to_string(),
        });
        if let Err(e) = state
            .join_room_usecase
            .broadcast_user_joined(outcome.existing_members.clone(), &joined_json)
            .await
        {
            tracing::warn!("failed to broadcast user-joined: {}", e);
        }
    }

    let reply_json = encode(&ServerEvent::RoomJoined {
        room_id: outcome.room_id.as_str().to_string(),
        participants: outcome
            .existing_members
            .iter()
            .map(|m| m.as_str().to_string())
            .collect(),
    });
    if let Err(e) = state
        .join_room_usecase
        .reply_to_joiner(connection_id, &reply_json)
        .await
    {
        tracing::warn!("failed to reply room-joined to '{}': {}", connection_id, e);
        return;
    }

    tracing::info!(
        "connection '{}' joined room '{}'",
        connection_id,
        outcome.room_id
    );

    // Call-initiation policy: the newest arrival originates the offer.
    if outcome.should_create_offer {
        let initiate_json = encode(&ServerEvent::InitiateCall {
            should_create_offer: true,
        });
        if let Err(e) = state
            .join_room_usecase
            .reply_to_joiner(connection_id, &initiate_json)
            .await
        {
            tracing::warn!(
                "failed to send initiate-call to '{}': {}",
                connection_id,
                e
            );
        }
    }
}

async fn handle_relay(
    state: &Arc<AppState>,
    connection_id: &ConnectionId,
    tx: &mpsc::UnboundedSender<String>,
    kind: &str,
    relayed: ServerEvent,
) {
    let json = encode(&relayed);
    match state.relay_signal_usecase.execute(connection_id, &json).await {
        Ok(targets) => {
            tracing::info!(
                "relayed {} from '{}' to {} member(s)",
                kind,
                connection_id,
                targets.len()
            );
        }
        Err(RelaySignalError::NotInRoom) => {
            push_error(tx, RelaySignalError::NotInRoom.to_string());
        }
        Err(RelaySignalError::BroadcastFailed(e)) => {
            tracing::warn!("failed to relay {} from '{}': {}", kind, connection_id, e);
        }
    }
}

async fn handle_leave_room(state: &Arc<AppState>, connection_id: &ConnectionId) {
    // Leaving while not in a room is a benign race, not an error.
    let Some(outcome) = state.leave_room_usecase.execute(connection_id).await else {
        tracing::debug!("connection '{}' left while not in any room", connection_id);
        return;
    };

    if !outcome.remaining.is_empty() {
        let left_json = encode(&ServerEvent::UserLeft {
            connection_id: connection_id.to_string(),
        });
        if let Err(e) = state
            .leave_room_usecase
            .broadcast_user_left(outcome.remaining, &left_json)
            .await
        {
            tracing::warn!("failed to broadcast user-left: {}", e);
        }
    }

    tracing::info!(
        "connection '{}' left room '{}'",
        connection_id,
        outcome.room_id
    );

    let ack_json = encode(&ServerEvent::LeftRoom {
        status: "success".to_string(),
    });
    if let Err(e) = state
        .leave_room_usecase
        .reply_to_leaver(connection_id, &ack_json)
        .await
    {
        tracing::warn!("failed to ack leave to '{}': {}", connection_id, e);
    }
}

async fn handle_request_agent(
    state: &Arc<AppState>,
    connection_id: &ConnectionId,
    tx: &mpsc::UnboundedSender<String>,
    room_id: String,
) {
    let room_id = match RoomId::new(room_id) {
        Ok(room_id) => room_id,
        Err(e) => {
            push_error(tx, e.to_string());
            return;
        }
    };

    match state.request_agent_usecase.execute(room_id).await {
        Ok(outcome) => {
            tracing::info!(
                "agent session '{}' provisioned for room '{}'",
                outcome.agent.agent_id,
                outcome.room_id
            );
            let joined_json = encode(&ServerEvent::AiAgentJoined {
                agent_descriptor: outcome.agent.into(),
                room_id: outcome.room_id.as_str().to_string(),
            });
            if let Err(e) = state
                .request_agent_usecase
                .broadcast_agent_joined(outcome.members, &joined_json)
                .await
            {
                tracing::warn!("failed to broadcast ai-agent-joined: {}", e);
            }
        }
        Err(e @ RequestAgentError::RoomNotFound(_)) => {
            push_error(tx, e.to_string());
        }
        Err(e @ RequestAgentError::Provision(_)) => {
            // Collaborator failure goes to the requester only; the room
            // never observes a partially provisioned agent.
            tracing::error!("agent provisioning failed for '{}': {}", connection_id, e);
            push_error(tx, e.to_string());
        }
    }
}

async fn handle_send_to_agent(
    state: &Arc<AppState>,
    connection_id: &ConnectionId,
    tx: &mpsc::UnboundedSender<String>,
    room_id: String,
    message: String,
) {
    let room_id = match RoomId::new(room_id) {
        Ok(room_id) => room_id,
        Err(e) => {
            push_error(tx, e.to_string());
            return;
        }
    };

    match state.send_to_agent_usecase.execute(room_id, &message).await {
        Ok(outcome) => {
            let message_json = encode(&ServerEvent::AiMessageSent {
                user_message: outcome.user_message,
                ai_response: outcome.ai_response,
                sender: connection_id.to_string(),
                timestamp: outcome.timestamp.value(),
            });
            if let Err(e) = state
                .send_to_agent_usecase
                .broadcast_agent_message(outcome.members, &message_json)
                .await
            {
                tracing::warn!("failed to broadcast ai-message-sent: {}", e);
            }
        }
        Err(e @ (SendToAgentError::EmptyMessage | SendToAgentError::NoAgentInRoom(_))) => {
            push_error(tx, e.to_string());
        }
        Err(e @ SendToAgentError::Provision(_)) => {
            tracing::error!(
                "forwarding message to agent failed for '{}': {}",
                connection_id,
                e
            );
            push_error(tx, e.to_string());
        }
    }
}
