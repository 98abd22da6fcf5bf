//! UI layer: the axum application (WebSocket endpoint, HTTP observation
//! surface) and graceful shutdown.

pub mod handler;
pub mod server;
pub mod signal;
pub mod state;

pub use server::Server;
pub use state::AppState;
