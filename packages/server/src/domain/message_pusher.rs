//! MessagePusher trait 定義
//!
//! 参加者へのメッセージ送信（通知）のインターフェース。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{error::MessagePushError, value_object::ParticipantId};

/// 参加者への送信用チャンネル
pub type PusherChannel = mpsc::UnboundedSender<String>;

/// 送信先（参加者 ID と送信用チャンネルの組）
#[derive(Debug, Clone)]
pub struct Recipient {
    pub id: ParticipantId,
    pub channel: PusherChannel,
}

/// ブロードキャストの送信結果（送信先ごと）
#[derive(Debug, Default)]
pub struct DeliveryReport {
    pub delivered: Vec<ParticipantId>,
    pub failed: Vec<(ParticipantId, MessagePushError)>,
}

impl DeliveryReport {
    pub fn record(&mut self, id: ParticipantId, result: Result<(), MessagePushError>) {
        match result {
            Ok(()) => self.delivered.push(id),
            Err(e) => self.failed.push((id, e)),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// MessagePusher trait
///
/// ブロードキャストは部分的な送信失敗を許容する。
/// 失敗は `DeliveryReport` に記録されるだけで、残りの送信先への送信は継続される。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// 1 人の参加者に送信
    async fn push_to(&self, recipient: &Recipient, content: &str) -> Result<(), MessagePushError>;

    /// 複数の参加者に送信
    async fn broadcast(&self, recipients: &[Recipient], content: &str) -> DeliveryReport;
}
