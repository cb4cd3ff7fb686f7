//! Room Session Manager
//!
//! 接続・切断・メッセージ処理・一覧取得のユースケースを 1 つにまとめ、
//! UI 層（WebSocket / HTTP ハンドラ）からの唯一の入口にする。

use std::sync::Arc;

use crate::{
    config::SessionConfig,
    domain::{
        ConnectionId, MessagePusher, ParticipantId, PusherChannel, RequiredCount, RoomKey,
        RoomRepository, RoomSnapshot,
    },
};

use super::{
    ConnectError, ConnectParticipantUseCase, DisconnectOutcome, DisconnectParticipantUseCase,
    GetRoomDetailError, GetRoomDetailUseCase, GetRoomsUseCase, HandleMessageError,
    HandleMessageUseCase, HandledEvent, RoomBroadcaster,
};

/// Room セッションの管理
pub struct RoomSessionManager {
    repository: Arc<dyn RoomRepository>,
    config: SessionConfig,
    connect_participant_usecase: ConnectParticipantUseCase,
    disconnect_participant_usecase: DisconnectParticipantUseCase,
    handle_message_usecase: HandleMessageUseCase,
    get_rooms_usecase: GetRoomsUseCase,
    get_room_detail_usecase: GetRoomDetailUseCase,
}

impl RoomSessionManager {
    /// 新しい RoomSessionManager を作成
    ///
    /// # Arguments
    ///
    /// * `repository` - Room の保存先
    /// * `message_pusher` - 参加者へのメッセージ送信
    /// * `config` - セッションのポリシー
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        config: SessionConfig,
    ) -> Self {
        let broadcaster = Arc::new(RoomBroadcaster::new(message_pusher));
        Self {
            connect_participant_usecase: ConnectParticipantUseCase::new(
                repository.clone(),
                broadcaster.clone(),
                config,
            ),
            disconnect_participant_usecase: DisconnectParticipantUseCase::new(
                repository.clone(),
                broadcaster.clone(),
            ),
            handle_message_usecase: HandleMessageUseCase::new(
                repository.clone(),
                broadcaster,
                config,
            ),
            get_rooms_usecase: GetRoomsUseCase::new(repository.clone()),
            get_room_detail_usecase: GetRoomDetailUseCase::new(repository.clone()),
            repository,
            config,
        }
    }

    pub fn config(&self) -> SessionConfig {
        self.config
    }

    /// 参加者を接続し、Room の全員にロスターを配信する
    pub async fn connect(
        &self,
        channel: PusherChannel,
        room_key: RoomKey,
        participant_id: ParticipantId,
        required_count: Option<RequiredCount>,
    ) -> Result<ConnectionId, ConnectError> {
        self.connect_participant_usecase
            .execute(channel, room_key, participant_id, required_count)
            .await
    }

    /// 参加者を切断する（冪等）
    pub async fn disconnect(
        &self,
        room_key: &RoomKey,
        participant_id: &ParticipantId,
    ) -> DisconnectOutcome {
        self.disconnect_participant_usecase
            .execute(room_key, participant_id)
            .await
    }

    /// 指定の接続が現在の接続である場合だけ参加者を切断する
    pub async fn disconnect_connection(
        &self,
        room_key: &RoomKey,
        participant_id: &ParticipantId,
        connection_id: ConnectionId,
    ) -> DisconnectOutcome {
        self.disconnect_participant_usecase
            .execute_for_connection(room_key, participant_id, connection_id)
            .await
    }

    /// 参加者から受信したメッセージを処理する
    pub async fn handle_message(
        &self,
        room_key: &RoomKey,
        participant_id: &ParticipantId,
        raw_message: &str,
    ) -> Result<HandledEvent, HandleMessageError> {
        self.handle_message_usecase
            .execute(room_key, participant_id, raw_message)
            .await
    }

    pub async fn list_rooms(&self) -> Vec<RoomSnapshot> {
        self.get_rooms_usecase.execute().await
    }

    pub async fn room_detail(&self, room_key: &RoomKey) -> Result<RoomSnapshot, GetRoomDetailError> {
        self.get_room_detail_usecase.execute(room_key).await
    }

    /// 参加者のいる Room の数
    pub async fn room_count(&self) -> usize {
        self.repository.count_rooms().await
    }
}
