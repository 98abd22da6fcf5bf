//! Client error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Connection error: {0}")]
    ConnectionError(String),
    #[error("Invalid command: {0}")]
    InvalidCommand(String),
}
