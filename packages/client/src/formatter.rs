//! Rendering of server events for the terminal.

use tsunagi_server::infrastructure::dto::websocket::ServerEvent;
use tsunagi_shared::time::timestamp_to_rfc3339;

/// Formats server events into display strings
pub struct EventFormatter;

impl EventFormatter {
    pub fn format(event: &ServerEvent) -> String {
        match event {
            ServerEvent::Connected { status } => {
                format!("\n[connected: {status}]\n")
            }
            ServerEvent::RoomJoined {
                room_id,
                participants,
            } => {
                if participants.is_empty() {
                    format!("\n[joined room '{room_id}' — you are the first one here]\n")
                } else {
                    format!(
                        "\n[joined room '{room_id}' — participants: {}]\n",
                        participants.join(", ")
                    )
                }
            }
            ServerEvent::UserJoined { connection_id } => {
                format!("\n[{connection_id} joined the room]\n")
            }
            ServerEvent::InitiateCall { .. } => {
                "\n[you should create the offer — try /offer <payload>]\n".to_string()
            }
            ServerEvent::Offer { payload, from } => {
                format!("\n[offer from {from}] {payload}\n")
            }
            ServerEvent::Answer { payload, from } => {
                format!("\n[answer from {from}] {payload}\n")
            }
            ServerEvent::IceCandidate { payload, from } => {
                format!("\n[ice-candidate from {from}] {payload}\n")
            }
            ServerEvent::LeftRoom { status } => {
                format!("\n[left room: {status}]\n")
            }
            ServerEvent::UserLeft { connection_id } => {
                format!("\n[{connection_id} left the room]\n")
            }
            ServerEvent::AiAgentJoined {
                agent_descriptor,
                room_id,
            } => {
                format!(
                    "\n[AI agent '{}' joined room '{}' — session: {}]\n",
                    agent_descriptor.replica_label, room_id, agent_descriptor.session_url
                )
            }
            ServerEvent::AiMessageSent {
                user_message,
                ai_response,
                sender,
                timestamp,
            } => {
                format!(
                    "\n[{}] {sender}: {user_message}\n[AI] {ai_response}\n",
                    timestamp_to_rfc3339(*timestamp)
                )
            }
            ServerEvent::Error { message } => {
                format!("\n[error] {message}\n")
            }
        }
    }

    /// Fallback for frames that do not parse as a known server event.
    pub fn format_raw(text: &str) -> String {
        format!("\n[raw] {text}\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_room_joined_with_participants() {
        // テスト項目: 参加者のいる room-joined が参加者一覧付きで整形される
        // given (前提条件):
        let event = ServerEvent::RoomJoined {
            room_id: "r1".to_string(),
            participants: vec!["a".to_string(), "b".to_string()],
        };

        // when (操作):
        let formatted = EventFormatter::format(&event);

        // then (期待する結果):
        assert!(formatted.contains("r1"));
        assert!(formatted.contains("a, b"));
    }

    #[test]
    fn test_format_error() {
        // テスト項目: error イベントがメッセージ付きで整形される
        // given (前提条件):
        let event = ServerEvent::Error {
            message: "Not in a room".to_string(),
        };

        // when (操作):
        let formatted = EventFormatter::format(&event);

        // then (期待する結果):
        assert!(formatted.contains("[error] Not in a room"));
    }
}
