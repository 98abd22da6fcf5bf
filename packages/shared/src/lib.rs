//! Shared library for the Tsunagi signaling server and client.
//!
//! Contains logging setup and time utilities used by both binaries.

pub mod logger;
pub mod time;
