//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    domain::RoomKey,
    infrastructure::dto::{
        conversion::room_list,
        http::{RoomDetailDto, RoomListDto},
    },
    ui::state::AppState,
    usecase::GetRoomDetailError,
};

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Get rooms with their connected participant ids
pub async fn get_rooms(State(state): State<Arc<AppState>>) -> Json<RoomListDto> {
    let rooms = state.session_manager.list_rooms().await;

    // Domain Model から DTO への変換
    Json(room_list(rooms))
}

/// Get room detail by key
pub async fn get_room_detail(
    State(state): State<Arc<AppState>>,
    Path(room_key): Path<String>,
) -> Result<Json<RoomDetailDto>, StatusCode> {
    // 不正なキーの Room は存在し得ない
    let room_key = RoomKey::try_from(room_key).map_err(|_| StatusCode::NOT_FOUND)?;

    match state.session_manager.room_detail(&room_key).await {
        Ok(room) => Ok(Json(RoomDetailDto::from(room))),
        Err(GetRoomDetailError::RoomNotFound) => Err(StatusCode::NOT_FOUND),
    }
}
