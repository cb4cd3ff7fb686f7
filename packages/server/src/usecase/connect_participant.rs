//! UseCase: 参加者接続処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ConnectParticipantUseCase::execute() メソッド
//! - Room の作成、参加者の追加、ロスターのブロードキャスト
//!
//! ### なぜこのテストが必要か
//! - 接続のたびに Room の全員へロスターが届くことを保証する
//! - 重複 ID の扱い（置き換え / 拒否）が設定どおりであることを確認する
//!
//! ### どのような状況を想定しているか
//! - 正常系：新規 Room への接続、既存 Room への接続
//! - エッジケース：同じ ID での再接続（置き換え）
//! - 異常系：重複 ID を拒否する設定での再接続

use std::sync::Arc;

use crate::{
    config::{DuplicateIdPolicy, SessionConfig},
    domain::{
        ConnectionId, JoinError, Participant, ParticipantId, PusherChannel, RequiredCount, RoomKey,
        RoomRepository, Timestamp,
    },
};

use super::{broadcast::RoomBroadcaster, error::ConnectError};

/// 参加者接続のユースケース
pub struct ConnectParticipantUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn RoomRepository>,
    broadcaster: Arc<RoomBroadcaster>,
    config: SessionConfig,
}

impl ConnectParticipantUseCase {
    /// 新しい ConnectParticipantUseCase を作成
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        broadcaster: Arc<RoomBroadcaster>,
        config: SessionConfig,
    ) -> Self {
        Self {
            repository,
            broadcaster,
            config,
        }
    }

    /// 参加者接続を実行
    ///
    /// # Arguments
    ///
    /// * `channel` - 参加者へのメッセージ送信用チャンネル
    /// * `room_key` - 接続先の Room
    /// * `participant_id` - 参加者の ID
    /// * `required_count` - Room を新規作成する場合の必要提出者数（None なら設定値）
    ///
    /// # Returns
    ///
    /// * `Ok(ConnectionId)` - 接続成功（この接続を識別する ID）
    /// * `Err(ConnectError)` - 重複 ID を拒否した
    pub async fn execute(
        &self,
        channel: PusherChannel,
        room_key: RoomKey,
        participant_id: ParticipantId,
        required_count: Option<RequiredCount>,
    ) -> Result<ConnectionId, ConnectError> {
        let participant = Participant::new(
            participant_id.clone(),
            channel,
            ConnectionId::generate(),
            Timestamp::now(),
        );
        let connection_id = participant.connection_id;

        let joined = self
            .repository
            .join(
                &room_key,
                required_count.unwrap_or(self.config.default_required_count),
                participant,
                self.config.duplicate_id_policy == DuplicateIdPolicy::Replace,
            )
            .await
            .map_err(|JoinError::AlreadyJoined(id)| ConnectError::DuplicateParticipantId(id))?;
        let room = joined.room;

        if let Some(requested) = required_count
            && requested != room.required_count
        {
            tracing::debug!(
                "Room '{}' already requires {} submissions, ignoring requested {}",
                room_key,
                room.required_count.value(),
                requested.value()
            );
        }
        if let Some(previous) = joined.replaced {
            tracing::warn!(
                "Participant '{}' in room '{}' replaced (previous connection {})",
                participant_id,
                room_key,
                previous.connection_id
            );
        }
        tracing::info!(
            "Participant '{}' connected to room '{}' ({} participants)",
            participant_id,
            room_key,
            room.len()
        );

        self.broadcaster.broadcast_roster(&room).await;

        Ok(connection_id)
    }
}
