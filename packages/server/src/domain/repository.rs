//! Repository trait 定義
//!
//! ドメイン層が必要とするデータアクセスのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。
//!
//! ## 排他制御
//!
//! Room ごとに排他ロックを持ち、`RoomGuard` を保持している間はその Room を
//! 他のタスクが変更できない。UseCase 層は 1 イベントの処理（状態変更・完了判定・
//! ブロードキャスト）の間ずっと `RoomGuard` を保持する。

use std::{
    ops::{Deref, DerefMut},
    sync::Arc,
};

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{
    entity::{Participant, Room, RoomSnapshot},
    error::JoinError,
    value_object::{ParticipantId, RequiredCount, RoomKey},
};

/// 排他ロック済みの Room
pub struct RoomGuard {
    cell: Arc<Mutex<Room>>,
    guard: OwnedMutexGuard<Room>,
}

impl RoomGuard {
    /// Room のロックを取得する
    pub async fn lock(cell: Arc<Mutex<Room>>) -> Self {
        let guard = Arc::clone(&cell).lock_owned().await;
        Self { cell, guard }
    }

    /// このガードが指定のセルのロックかどうか
    pub fn is_backed_by(&self, cell: &Arc<Mutex<Room>>) -> bool {
        Arc::ptr_eq(&self.cell, cell)
    }
}

impl Deref for RoomGuard {
    type Target = Room;

    fn deref(&self) -> &Room {
        &self.guard
    }
}

impl DerefMut for RoomGuard {
    fn deref_mut(&mut self) -> &mut Room {
        &mut self.guard
    }
}

/// `RoomRepository::join` の結果
pub struct Joined {
    pub room: RoomGuard,
    /// 同じ ID で置き換えられた参加者
    pub replaced: Option<Participant>,
}

/// Room Repository trait（Session Store）
///
/// UseCase 層はこの trait に依存し、Infrastructure 層の具体的な実装には依存しない。
#[async_trait]
pub trait RoomRepository: Send + Sync {
    /// 参加者を Room に追加し、ロックした Room を返す
    ///
    /// Room がなければ、その参加者だけを含む Room を作成してから公開する
    /// （空の Room が見えることはない）。`required_count` は新規作成時のみ使われる。
    ///
    /// 同じ ID の参加者がいる場合、`replace_existing` が true なら置き換えて
    /// `Joined::replaced` で返し、false なら何も変更せずにエラーを返す。
    async fn join(
        &self,
        key: &RoomKey,
        required_count: RequiredCount,
        participant: Participant,
        replace_existing: bool,
    ) -> Result<Joined, JoinError>;

    /// Room をロックして取得する
    async fn get_room(&self, key: &RoomKey) -> Option<RoomGuard>;

    /// 参加者を削除する。Room が空になれば Room ごと削除する
    ///
    /// 参加者が存在しなければ何もしない。
    async fn remove_participant(
        &self,
        room: &mut RoomGuard,
        participant_id: &ParticipantId,
    ) -> Option<Participant>;

    /// 存在する Room の数
    async fn count_rooms(&self) -> usize;

    /// 全 Room のスナップショット（キー順）
    async fn list_rooms(&self) -> Vec<RoomSnapshot>;
}
