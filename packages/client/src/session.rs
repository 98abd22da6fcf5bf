//! WebSocket client session management.

use std::io::Write as _;

use futures_util::{SinkExt, StreamExt};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};

use tsunagi_server::infrastructure::dto::websocket::{ClientEvent, ServerEvent};

use crate::{
    command::{Command, parse_command},
    error::ClientError,
    formatter::EventFormatter,
};

const PROMPT: &str = "> ";

fn redisplay_prompt() {
    print!("{PROMPT}");
    let _ = std::io::stdout().flush();
}

fn encode(event: &ClientEvent) -> String {
    serde_json::to_string(event).expect("client events serialize infallibly")
}

/// Run the interactive signaling session.
pub async fn run_client_session(
    url: &str,
    room_id: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let (ws_stream, _response) = connect_async(url)
        .await
        .map_err(|e| ClientError::ConnectionError(e.to_string()))?;

    tracing::info!("Connected to signaling server!");
    println!(
        "\nJoining room '{room_id}'. Commands: /offer, /answer, /candidate, /agent, /join <room>, /leave, /quit.\nBare text is sent to the room's AI agent. Press Ctrl+C to exit.\n"
    );

    let (mut write, mut read) = ws_stream.split();

    // Join the requested room right away.
    write
        .send(Message::Text(
            encode(&ClientEvent::JoinRoom {
                room_id: room_id.to_string(),
            })
            .into(),
        ))
        .await
        .map_err(|e| ClientError::ConnectionError(e.to_string()))?;

    // Spawn a task to render incoming events
    let mut read_task = tokio::spawn(async move {
        let mut connection_error = false;

        while let Some(message) = read.next().await {
            match message {
                Ok(Message::Text(text)) => {
                    let formatted = match serde_json::from_str::<ServerEvent>(&text) {
                        Ok(event) => EventFormatter::format(&event),
                        Err(_) => EventFormatter::format_raw(&text),
                    };
                    print!("{formatted}");
                    redisplay_prompt();
                }
                Ok(Message::Close(_)) => {
                    tracing::info!("Server closed the connection");
                    connection_error = true;
                    break;
                }
                Err(e) => {
                    tracing::warn!("WebSocket read error: {}", e);
                    connection_error = true;
                    break;
                }
                _ => {}
            }
        }

        connection_error
    });

    // Create channel for rustyline input
    let (input_tx, mut input_rx) = mpsc::unbounded_channel::<String>();

    // Spawn a blocking thread for rustyline (synchronous readline)
    let _readline_handle = std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                eprintln!("Failed to initialize readline: {e}");
                return;
            }
        };

        loop {
            match rl.readline(PROMPT) {
                Ok(line) => {
                    let line = line.trim();
                    if !line.is_empty() {
                        rl.add_history_entry(line).ok();
                        if input_tx.send(line.to_string()).is_err() {
                            break;
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    tracing::info!("Interrupted");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    tracing::info!("EOF");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });

    // Spawn a task to translate input lines into client events
    let mut current_room = room_id.to_string();
    let mut write_task = tokio::spawn(async move {
        let mut write_error = false;

        while let Some(line) = input_rx.recv().await {
            let event = match parse_command(&line) {
                Ok(Command::Quit) => break,
                Ok(Command::Join(room)) => {
                    current_room = room.clone();
                    ClientEvent::JoinRoom { room_id: room }
                }
                Ok(Command::Leave) => ClientEvent::LeaveRoom,
                Ok(Command::Offer(payload)) => ClientEvent::Offer { payload },
                Ok(Command::Answer(payload)) => ClientEvent::Answer { payload },
                Ok(Command::Candidate(payload)) => ClientEvent::IceCandidate { payload },
                Ok(Command::RequestAgent) => ClientEvent::RequestAiAgent {
                    room_id: current_room.clone(),
                },
                Ok(Command::SendToAgent(message)) => ClientEvent::SendToAi {
                    room_id: current_room.clone(),
                    message,
                },
                Err(e) => {
                    print!("\n{e}\n");
                    redisplay_prompt();
                    continue;
                }
            };

            if let Err(e) = write.send(Message::Text(encode(&event).into())).await {
                tracing::warn!("Failed to send event: {}", e);
                write_error = true;
                break;
            }
        }

        write_error
    });

    // If any one of the tasks completes, abort the other
    tokio::select! {
        read_result = &mut read_task => {
            write_task.abort();
            if read_result.unwrap_or(false) {
                return Err(Box::new(ClientError::ConnectionError(
                    "Connection lost".to_string(),
                )));
            }
        }
        write_result = &mut write_task => {
            read_task.abort();
            if write_result.unwrap_or(false) {
                return Err(Box::new(ClientError::ConnectionError(
                    "Connection lost".to_string(),
                )));
            }
        }
    }

    Ok(())
}
