//! WebSocket を使った MessagePusher 実装
//!
//! ## 責務
//!
//! - 参加者の送信用チャンネル（`UnboundedSender`）へのメッセージ送信
//!
//! ## 設計ノート
//!
//! WebSocket の生成は UI 層（`src/ui/handler/websocket.rs`）で行われます。
//! 送信用チャンネルは参加者（`Participant`）が所有し、受信側は UI 層の
//! 送信ループが WebSocket に書き出します。
//!
//! チャンネルへの送信はブロックしないため、遅いクライアントがいても
//! Room のロックを保持したまま待たされることはありません。

use async_trait::async_trait;

use crate::domain::{DeliveryReport, MessagePushError, MessagePusher, Recipient};

/// WebSocket を使った MessagePusher 実装
#[derive(Debug, Default, Clone, Copy)]
pub struct WebSocketMessagePusher;

impl WebSocketMessagePusher {
    /// 新しい WebSocketMessagePusher を作成
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MessagePusher for WebSocketMessagePusher {
    async fn push_to(&self, recipient: &Recipient, content: &str) -> Result<(), MessagePushError> {
        recipient
            .channel
            .send(content.to_string())
            .map_err(|_| MessagePushError::ChannelClosed(recipient.id.as_str().to_string()))?;
        tracing::debug!("Pushed message to participant '{}'", recipient.id);
        Ok(())
    }

    async fn broadcast(&self, recipients: &[Recipient], content: &str) -> DeliveryReport {
        let mut report = DeliveryReport::default();

        for recipient in recipients {
            // ブロードキャストでは一部の送信失敗を許容
            let result = self.push_to(recipient, content).await;
            if let Err(e) = &result {
                tracing::warn!("Failed to push message to '{}': {}", recipient.id, e);
            }
            report.record(recipient.id.clone(), result);
        }

        report
    }
}
