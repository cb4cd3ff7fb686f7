//! Room へのブロードキャスト
//!
//! 呼び出し側は Room のロック（`RoomGuard`）を保持したまま呼ぶこと。
//! 送信先は呼び出し時点の Room の参加者全員になる。

use std::sync::Arc;

use crate::{
    domain::{DeliveryReport, MessagePusher, ParticipantId, Room, RoundResult},
    infrastructure::dto::websocket::OutboundEvent,
};

/// Room 単位のブロードキャストを行う
pub struct RoomBroadcaster {
    message_pusher: Arc<dyn MessagePusher>,
}

impl RoomBroadcaster {
    pub fn new(message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self { message_pusher }
    }

    /// ロスター（参加者と提出数の一覧）を全参加者に送信
    pub async fn broadcast_roster(&self, room: &Room) -> DeliveryReport {
        let event = OutboundEvent::users_updated(room.roster());
        self.broadcast_event(room, &event).await
    }

    /// ラウンドの集計結果を全参加者に送信
    pub async fn broadcast_round_completed(
        &self,
        room: &Room,
        result: RoundResult,
    ) -> DeliveryReport {
        let event = OutboundEvent::from(result);
        self.broadcast_event(room, &event).await
    }

    /// プロトコルエラーを送信者だけに通知
    pub async fn notify_protocol_error(&self, room: &Room, to: &ParticipantId, reason: String) {
        let Some(participant) = room.participant(to) else {
            return;
        };
        let Some(content) = encode(&OutboundEvent::ProtocolError { reason }) else {
            return;
        };
        if let Err(e) = self
            .message_pusher
            .push_to(&participant.recipient(), &content)
            .await
        {
            tracing::warn!("Failed to notify protocol error: {}", e);
        }
    }

    async fn broadcast_event(&self, room: &Room, event: &OutboundEvent) -> DeliveryReport {
        let Some(content) = encode(event) else {
            return DeliveryReport::default();
        };

        let report = self
            .message_pusher
            .broadcast(&room.recipients(), &content)
            .await;
        tracing::debug!(
            "Broadcasted to room '{}': delivered={}, failed={}",
            room.key,
            report.delivered.len(),
            report.failed.len()
        );
        report
    }
}

fn encode(event: &OutboundEvent) -> Option<String> {
    match serde_json::to_string(event) {
        Ok(json) => Some(json),
        Err(e) => {
            tracing::error!("Failed to encode outbound event: {}", e);
            None
        }
    }
}
