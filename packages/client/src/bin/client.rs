//! Interactive CLI client for the Tsunagi signaling server.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin tsunagi-client -- --room demo
//! cargo run --bin tsunagi-client -- --url ws://example.com:8080/ws --room demo
//! ```

use clap::Parser;
use tsunagi_client::session::run_client_session;
use tsunagi_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "client")]
#[command(about = "Interactive signaling client", long_about = None)]
struct Args {
    /// WebSocket URL of the signaling server
    #[arg(short = 'u', long, default_value = "ws://127.0.0.1:8080/ws")]
    url: String,

    /// Room to join on connect
    #[arg(short = 'r', long)]
    room: String,
}

#[tokio::main]
async fn main() {
    // Initialize tracing (quiet by default so the prompt stays readable)
    setup_logger(env!("CARGO_BIN_NAME"), "warn");

    let args = Args::parse();

    if let Err(e) = run_client_session(&args.url, &args.room).await {
        eprintln!("{e}");
        std::process::exit(1);
    }
}
