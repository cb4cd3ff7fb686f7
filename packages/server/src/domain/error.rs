//! ドメイン層のエラー定義

use thiserror::Error;

/// 値オブジェクト生成時のバリデーションエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("{kind} must be at most {max} characters (got {actual})")]
    TooLong {
        kind: &'static str,
        max: usize,
        actual: usize,
    },

    #[error("{0} must not contain control characters")]
    ControlCharacter(&'static str),

    #[error("required count must be between {min} and {max} (got {actual})")]
    RequiredCountOutOfRange { min: usize, max: usize, actual: usize },
}

/// メッセージ送信（通知）のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    /// 送信先のチャンネルが既に閉じている
    #[error("channel for participant '{0}' is closed")]
    ChannelClosed(String),
}

/// Room への参加のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JoinError {
    /// 同じ ID の参加者が既にいる（置き換えない場合のみ）
    #[error("participant '{0}' is already in the room")]
    AlreadyJoined(String),
}
