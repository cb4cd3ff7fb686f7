//! Room-based card voting server.
//!
//! Participants connect to `/ws/{room_key}/{participant_id}` and submit their
//! selections; once the room's required number of participants have submitted,
//! the aggregated result is broadcast to everyone in the room.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin tefuda-server
//! cargo run --bin tefuda-server -- --host 0.0.0.0 --port 3000 --required-count 4
//! ```

use std::sync::Arc;

use clap::Parser;
use tefuda_server::{
    config::{DuplicateIdPolicy, SessionConfig, UnknownEventPolicy},
    domain::RequiredCount,
    infrastructure::{message_pusher::WebSocketMessagePusher, repository::InMemoryRoomRepository},
    ui::Server,
    usecase::RoomSessionManager,
};
use tefuda_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "tefuda-server")]
#[command(about = "Room-based card voting server over WebSocket", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,

    /// Required submissions per round when the first connect does not specify one
    #[arg(long, default_value_t = 2)]
    required_count: usize,

    /// How to handle inbound events with an unknown event_type
    #[arg(long, value_enum, default_value_t = UnknownEventPolicy::Ignore)]
    unknown_events: UnknownEventPolicy,

    /// How to handle a participant id that is already connected to the room
    #[arg(long, value_enum, default_value_t = DuplicateIdPolicy::Replace)]
    duplicate_ids: DuplicateIdPolicy,

    /// Default log level (overridden by RUST_LOG)
    #[arg(long, default_value = "debug")]
    log_level: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), &args.log_level);

    let default_required_count = match RequiredCount::new(args.required_count) {
        Ok(count) => count,
        Err(e) => {
            tracing::error!("Invalid --required-count: {}", e);
            std::process::exit(1);
        }
    };
    let config = SessionConfig {
        default_required_count,
        unknown_event_policy: args.unknown_events,
        duplicate_id_policy: args.duplicate_ids,
    };
    tracing::info!("Session config: {:?}", config);

    // Initialize dependencies in order:
    // 1. Repository
    // 2. MessagePusher
    // 3. RoomSessionManager
    // 4. Server
    let repository = Arc::new(InMemoryRoomRepository::new());
    let message_pusher = Arc::new(WebSocketMessagePusher::new());
    let session_manager = Arc::new(RoomSessionManager::new(repository, message_pusher, config));

    let server = Server::new(session_manager);
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
