//! Server execution logic.

use std::{future::Future, sync::Arc};

use axum::{Router, routing::get};
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::usecase::RoomSessionManager;

use super::{
    handler::{get_room_detail, get_rooms, health_check, websocket_handler},
    signal::shutdown_signal,
    state::AppState,
};

/// WebSocket voting server
///
/// # Example
///
/// ```ignore
/// let server = Server::new(session_manager);
/// server.run("127.0.0.1".to_string(), 8080).await?;
/// ```
pub struct Server {
    /// RoomSessionManager（Room セッション管理）
    session_manager: Arc<RoomSessionManager>,
}

impl Server {
    /// Create a new Server instance
    pub fn new(session_manager: Arc<RoomSessionManager>) -> Self {
        Self { session_manager }
    }

    /// Build the router with every endpoint
    pub fn router(&self) -> Router {
        let app_state = Arc::new(AppState {
            session_manager: self.session_manager.clone(),
        });

        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        Router::new()
            // WebSocket エンドポイント
            .route("/ws/{room_key}/{participant_id}", get(websocket_handler))
            // HTTP エンドポイント
            .route("/api/health", get(health_check))
            .route("/api/rooms", get(get_rooms))
            .route("/api/rooms/{room_key}", get(get_room_detail))
            .layer(cors)
            .layer(TraceLayer::new_for_http())
            .with_state(app_state)
    }

    /// Run the WebSocket voting server
    ///
    /// # Arguments
    ///
    /// * `host` - The host address to bind to (e.g., "127.0.0.1")
    /// * `port` - The port number to bind to (e.g., 8080)
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        let bind_addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&bind_addr).await?;

        tracing::info!("Voting server listening on {}", listener.local_addr()?);
        tracing::info!("Connect to: ws://{}/ws/{{room_key}}/{{participant_id}}", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        self.serve(listener, shutdown_signal()).await?;

        tracing::info!("Server shutdown complete");

        Ok(())
    }

    /// Serve on an already bound listener until `shutdown` resolves
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
    }
}
