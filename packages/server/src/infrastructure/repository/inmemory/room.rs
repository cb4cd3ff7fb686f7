//! InMemory Room Repository 実装
//!
//! ドメイン層が定義する RoomRepository trait の具体的な実装。
//! HashMap をインメモリ DB として使用します。
//!
//! ## ロックの構成
//!
//! - Room マップ全体のロック: 検索・追加・削除の間だけ保持する
//! - Room ごとのロック: `RoomGuard` として UseCase 層に渡す
//!
//! ロック順序は「Room → マップ」。マップのロックを保持したまま待つ Room の
//! ロックは、まだマップに公開していない新規 Room のものだけ。
//!
//! マップの変更は最後の `.await` の後にまとめて行うため、途中で Future が
//! 破棄されても空の Room がマップに残ることはない。

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    JoinError, Joined, Participant, ParticipantId, RequiredCount, Room, RoomGuard, RoomKey,
    RoomRepository, RoomSnapshot, Timestamp,
};

/// インメモリ Room Repository 実装
///
/// マップに入っている Room は常に 1 人以上の参加者を持つ。
#[derive(Default)]
pub struct InMemoryRoomRepository {
    rooms: Mutex<HashMap<RoomKey, Arc<Mutex<Room>>>>,
}

impl InMemoryRoomRepository {
    /// 空の InMemoryRoomRepository を作成
    pub fn new() -> Self {
        Self::default()
    }

    /// 既存の Room をロックする
    ///
    /// ロック待ちの間に Room が破棄された場合は、キーを引き直す。
    async fn lock_existing(&self, key: &RoomKey) -> Option<RoomGuard> {
        loop {
            let cell = self.rooms.lock().await.get(key).cloned()?;

            let guard = RoomGuard::lock(cell).await;

            let rooms = self.rooms.lock().await;
            if rooms
                .get(key)
                .is_some_and(|current| guard.is_backed_by(current))
            {
                return Some(guard);
            }
            tracing::debug!("Room '{}' was closed while waiting for its lock", key);
        }
    }
}

#[async_trait]
impl RoomRepository for InMemoryRoomRepository {
    async fn join(
        &self,
        key: &RoomKey,
        required_count: RequiredCount,
        participant: Participant,
        replace_existing: bool,
    ) -> Result<Joined, JoinError> {
        loop {
            if let Some(mut room) = self.lock_existing(key).await {
                if !replace_existing && room.contains(&participant.id) {
                    return Err(JoinError::AlreadyJoined(participant.id.into_string()));
                }
                let replaced = room.insert_participant(participant);
                return Ok(Joined { room, replaced });
            }

            let mut rooms = self.rooms.lock().await;
            if rooms.contains_key(key) {
                // 別の接続が先に作成した
                continue;
            }

            let mut room = Room::new(key.clone(), required_count, Timestamp::now());
            room.insert_participant(participant);
            let cell = Arc::new(Mutex::new(room));
            // 公開前のセルなので待たされない。マップへの追加はロック取得後に行う
            let guard = RoomGuard::lock(Arc::clone(&cell)).await;
            rooms.insert(key.clone(), cell);
            tracing::info!(
                "Room '{}' created (required_count={})",
                key,
                required_count.value()
            );

            return Ok(Joined {
                room: guard,
                replaced: None,
            });
        }
    }

    async fn get_room(&self, key: &RoomKey) -> Option<RoomGuard> {
        self.lock_existing(key).await
    }

    async fn remove_participant(
        &self,
        room: &mut RoomGuard,
        participant_id: &ParticipantId,
    ) -> Option<Participant> {
        if !room.contains(participant_id) {
            return None;
        }
        if room.len() > 1 {
            return room.remove_participant(participant_id);
        }

        // 最後の参加者の削除と Room の破棄はマップのロックを取ってからまとめて行う
        let mut rooms = self.rooms.lock().await;
        let removed = room.remove_participant(participant_id);
        if rooms
            .get(&room.key)
            .is_some_and(|current| room.is_backed_by(current))
        {
            rooms.remove(&room.key);
            tracing::info!("Room '{}' closed (no participants left)", room.key);
        }

        removed
    }

    async fn count_rooms(&self) -> usize {
        self.rooms.lock().await.len()
    }

    async fn list_rooms(&self) -> Vec<RoomSnapshot> {
        let cells: Vec<Arc<Mutex<Room>>> = self.rooms.lock().await.values().cloned().collect();

        let mut snapshots = Vec::with_capacity(cells.len());
        for cell in cells {
            let room = cell.lock().await;
            // ロック待ちの間に破棄された Room
            if !room.is_empty() {
                snapshots.push(room.snapshot());
            }
        }
        snapshots.sort_by(|a, b| a.key.cmp(&b.key));
        snapshots
    }
}
