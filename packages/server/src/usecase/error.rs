//! UseCase 層のエラー定義

use thiserror::Error;

/// 参加者接続のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectError {
    /// 同じ ID の参加者が既に接続している（重複 ID を拒否する設定の場合のみ）
    #[error("participant '{0}' is already connected to this room")]
    DuplicateParticipantId(String),
}

/// メッセージ処理のエラー
///
/// いずれも回復可能なエラーで、接続は維持される。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandleMessageError {
    /// ペイロードが不正
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// 未知のイベント種別（未知のイベントを拒否する設定の場合のみ）
    #[error("unknown event type '{0}'")]
    UnknownEventType(String),

    /// 送信者が Room に接続していない
    #[error("participant is not connected to the room")]
    ParticipantNotFound,
}

/// Room 詳細取得のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GetRoomDetailError {
    #[error("room not found")]
    RoomNotFound,
}
