//! CLI signaling client for the Tsunagi server.
//!
//! Connects to the signaling endpoint, joins a room, renders incoming
//! events, and exposes slash commands for driving the handshake and the AI
//! participant bridge by hand.

pub mod command;
pub mod error;
pub mod formatter;
pub mod session;
