//! UseCase: 参加者切断処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - DisconnectParticipantUseCase::execute() / execute_for_connection() メソッド
//! - 参加者の削除と、残りの参加者へのロスター配信
//!
//! ### なぜこのテストが必要か
//! - 切断時に残りの参加者だけに通知されることを保証する
//! - 最後の参加者が切断した場合に Room が破棄され、何も送信されないことを確認する
//! - 重複した切断イベントで壊れないこと（冪等性）を確認する
//!
//! ### どのような状況を想定しているか
//! - 正常系：参加者の切断と通知
//! - エッジケース：最後の参加者の切断（通知対象なし）
//! - エッジケース：置き換え済みの古い接続からの切断
//! - 異常系：存在しない参加者の切断試行

use std::sync::Arc;

use crate::domain::{ConnectionId, ParticipantId, RoomKey, RoomRepository};

use super::broadcast::RoomBroadcaster;

/// 切断処理の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectOutcome {
    /// 参加者は接続していなかった（何もしていない）
    NotConnected,
    /// 参加者は別の接続に置き換えられていた（何もしていない）
    Superseded,
    /// 最後の参加者だったため Room が破棄された
    RoomClosed,
    /// 参加者を削除し、残りの参加者にロスターを送信した
    Remaining(usize),
}

/// 参加者切断のユースケース
pub struct DisconnectParticipantUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn RoomRepository>,
    broadcaster: Arc<RoomBroadcaster>,
}

impl DisconnectParticipantUseCase {
    /// 新しい DisconnectParticipantUseCase を作成
    pub fn new(repository: Arc<dyn RoomRepository>, broadcaster: Arc<RoomBroadcaster>) -> Self {
        Self {
            repository,
            broadcaster,
        }
    }

    /// 参加者切断を実行
    ///
    /// 存在しない Room・参加者の切断は何もしない（冪等）。
    pub async fn execute(
        &self,
        room_key: &RoomKey,
        participant_id: &ParticipantId,
    ) -> DisconnectOutcome {
        self.disconnect(room_key, participant_id, None).await
    }

    /// 接続 ID を指定して参加者切断を実行
    ///
    /// 参加者が既に別の接続に置き換えられていれば何もしない。
    pub async fn execute_for_connection(
        &self,
        room_key: &RoomKey,
        participant_id: &ParticipantId,
        connection_id: ConnectionId,
    ) -> DisconnectOutcome {
        self.disconnect(room_key, participant_id, Some(connection_id))
            .await
    }

    async fn disconnect(
        &self,
        room_key: &RoomKey,
        participant_id: &ParticipantId,
        connection_id: Option<ConnectionId>,
    ) -> DisconnectOutcome {
        let Some(mut room) = self.repository.get_room(room_key).await else {
            return DisconnectOutcome::NotConnected;
        };

        match room.participant(participant_id) {
            None => return DisconnectOutcome::NotConnected,
            Some(participant)
                if connection_id.is_some_and(|id| id != participant.connection_id) =>
            {
                tracing::debug!(
                    "Ignoring disconnect of replaced connection for '{}' in room '{}'",
                    participant_id,
                    room_key
                );
                return DisconnectOutcome::Superseded;
            }
            Some(_) => {}
        }

        self.repository
            .remove_participant(&mut room, participant_id)
            .await;

        if room.is_empty() {
            tracing::info!(
                "Participant '{}' disconnected, room '{}' is now empty",
                participant_id,
                room_key
            );
            return DisconnectOutcome::RoomClosed;
        }

        tracing::info!(
            "Participant '{}' disconnected from room '{}' ({} remaining)",
            participant_id,
            room_key,
            room.len()
        );
        self.broadcaster.broadcast_roster(&room).await;

        DisconnectOutcome::Remaining(room.len())
    }
}
