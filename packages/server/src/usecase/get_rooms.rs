//! UseCase: Room 一覧・詳細取得

use std::sync::Arc;

use crate::domain::{RoomKey, RoomRepository, RoomSnapshot};

use super::error::GetRoomDetailError;

/// Room 一覧取得のユースケース
pub struct GetRoomsUseCase {
    repository: Arc<dyn RoomRepository>,
}

impl GetRoomsUseCase {
    pub fn new(repository: Arc<dyn RoomRepository>) -> Self {
        Self { repository }
    }

    /// 参加者のいる Room のスナップショットを Room キー順に返す
    pub async fn execute(&self) -> Vec<RoomSnapshot> {
        self.repository.list_rooms().await
    }
}

/// Room 詳細取得のユースケース
pub struct GetRoomDetailUseCase {
    repository: Arc<dyn RoomRepository>,
}

impl GetRoomDetailUseCase {
    pub fn new(repository: Arc<dyn RoomRepository>) -> Self {
        Self { repository }
    }

    pub async fn execute(&self, room_key: &RoomKey) -> Result<RoomSnapshot, GetRoomDetailError> {
        let room = self
            .repository
            .get_room(room_key)
            .await
            .ok_or(GetRoomDetailError::RoomNotFound)?;
        Ok(room.snapshot())
    }
}
