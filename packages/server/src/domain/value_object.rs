//! Value objects for the signaling domain.

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Validation errors for value object construction
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValueObjectError {
    #[error("connection id must not be empty")]
    EmptyConnectionId,
    #[error("room id must not be empty")]
    EmptyRoomId,
    #[error("room id must be at most {max} characters (got {actual})")]
    RoomIdTooLong { max: usize, actual: usize },
}

/// Opaque identifier for a live transport connection.
///
/// Minted by the transport layer when a WebSocket connection is accepted and
/// never reused while still referenced by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ConnectionId(String);

impl ConnectionId {
    /// Create a ConnectionId from an existing identifier string
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        if value.is_empty() {
            return Err(ValueObjectError::EmptyConnectionId);
        }
        Ok(Self(value))
    }

    /// Mint a fresh identifier for a newly accepted transport connection
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Caller-supplied room identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RoomId(String);

/// Upper bound on room id length, to keep hostile inputs from bloating the table keys.
const ROOM_ID_MAX_LEN: usize = 128;

impl RoomId {
    /// Create a RoomId, validating the caller-supplied string
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        if value.is_empty() {
            return Err(ValueObjectError::EmptyRoomId);
        }
        if value.chars().count() > ROOM_ID_MAX_LEN {
            return Err(ValueObjectError::RoomIdTooLong {
                max: ROOM_ID_MAX_LEN,
                actual: value.chars().count(),
            });
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for RoomId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unix timestamp in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(millis: i64) -> Self {
        Self(millis)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}
