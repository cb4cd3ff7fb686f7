//! Server state shared by the handlers.

use std::sync::Arc;

use crate::usecase::RoomSessionManager;

/// Shared application state
pub struct AppState {
    /// RoomSessionManager（Room セッション管理）
    pub session_manager: Arc<RoomSessionManager>,
}
