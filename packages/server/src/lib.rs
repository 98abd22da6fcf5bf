//! WebRTC session signaling coordinator.
//!
//! Lets WebSocket clients discover each other inside named rooms, relays the
//! offer/answer/ICE-candidate handshake needed to establish a direct peer
//! transport, and tears state down when a participant disappears. An AI
//! participant can be provisioned into a room through an external session
//! provisioner.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
