//! Input line parsing for the interactive client.
//!
//! Slash commands drive the signaling protocol; bare text goes to the
//! room's AI participant.

use serde_json::Value;

use crate::error::ClientError;

/// A parsed input line
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// `/join <room>` — join (or switch to) a room
    Join(String),
    /// `/leave` — leave the current room
    Leave,
    /// `/offer <payload>` — relay an offer
    Offer(Value),
    /// `/answer <payload>` — relay an answer
    Answer(Value),
    /// `/candidate <payload>` — relay an ICE candidate
    Candidate(Value),
    /// `/agent` — provision an AI participant for the current room
    RequestAgent,
    /// bare text — send a message to the room's AI participant
    SendToAgent(String),
    /// `/quit` — close the client
    Quit,
}

/// Signaling payloads are opaque; accept raw JSON, or fall back to wrapping
/// the text as a JSON string.
fn parse_payload(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

/// Parse one input line into a command.
pub fn parse_command(line: &str) -> Result<Command, ClientError> {
    let line = line.trim();

    if !line.starts_with('/') {
        return Ok(Command::SendToAgent(line.to_string()));
    }

    let (name, rest) = match line.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (line, ""),
    };

    match name {
        "/join" => {
            if rest.is_empty() {
                Err(ClientError::InvalidCommand(
                    "usage: /join <room>".to_string(),
                ))
            } else {
                Ok(Command::Join(rest.to_string()))
            }
        }
        "/leave" => Ok(Command::Leave),
        "/offer" => Ok(Command::Offer(parse_payload(rest))),
        "/answer" => Ok(Command::Answer(parse_payload(rest))),
        "/candidate" => Ok(Command::Candidate(parse_payload(rest))),
        "/agent" => Ok(Command::RequestAgent),
        "/quit" => Ok(Command::Quit),
        other => Err(ClientError::InvalidCommand(format!(
            "unknown command '{other}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bare_text_goes_to_the_agent() {
        // テスト項目: スラッシュで始まらない行は AI へのメッセージになる
        // given (前提条件):
        let line = "hello there";

        // when (操作):
        let command = parse_command(line).unwrap();

        // then (期待する結果):
        assert_eq!(command, Command::SendToAgent("hello there".to_string()));
    }

    #[test]
    fn test_offer_with_json_payload() {
        // テスト項目: /offer の引数が JSON としてパースされる
        // given (前提条件):
        let line = r#"/offer {"sdp":"v=0"}"#;

        // when (操作):
        let command = parse_command(line).unwrap();

        // then (期待する結果):
        assert_eq!(command, Command::Offer(json!({"sdp": "v=0"})));
    }

    #[test]
    fn test_offer_with_plain_text_payload_is_wrapped() {
        // テスト項目: JSON でない /offer の引数は文字列としてラップされる
        // given (前提条件):
        let line = "/offer not-json";

        // when (操作):
        let command = parse_command(line).unwrap();

        // then (期待する結果):
        assert_eq!(command, Command::Offer(json!("not-json")));
    }

    #[test]
    fn test_join_requires_a_room() {
        // テスト項目: Room 名のない /join はエラーになる
        // given (前提条件):
        let line = "/join";

        // when (操作):
        let result = parse_command(line);

        // then (期待する結果):
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_command_is_rejected() {
        // テスト項目: 未知のスラッシュコマンドはエラーになる
        // given (前提条件):
        let line = "/teleport r9";

        // when (操作):
        let result = parse_command(line);

        // then (期待する結果):
        assert!(result.is_err());
    }
}
