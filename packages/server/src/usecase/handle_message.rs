//! UseCase: 受信メッセージ処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - HandleMessageUseCase::execute() メソッド
//! - イベントごとの状態変更、ラウンド完了判定、ブロードキャスト
//!
//! ### なぜこのテストが必要か
//! - ラウンド完了の結果配信が 1 ラウンドにつき 1 回だけ行われることを保証する
//! - どのイベントの後でもロスターが配信されることを確認する
//! - 不正なペイロード・未知のイベントで接続が壊れないことを確認する
//!
//! ### どのような状況を想定しているか
//! - 正常系：選択の提出、表示名の変更、ラウンドのリセット
//! - エッジケース：完了後の追加提出
//! - 異常系：不正なペイロード、未知のイベント種別、未接続の参加者

use std::sync::Arc;

use crate::{
    config::{SessionConfig, UnknownEventPolicy},
    domain::{ParticipantId, RoomGuard, RoomKey, RoomRepository},
    infrastructure::dto::websocket::InboundEvent,
};

use super::{broadcast::RoomBroadcaster, error::HandleMessageError};

/// 処理したイベント
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandledEvent {
    SelectionsSubmitted { round_completed: bool },
    UserNameUpdated,
    SelectionsReset,
    /// 未知のイベント種別を無視した
    Ignored { event_type: String },
}

/// 受信メッセージ処理のユースケース
pub struct HandleMessageUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn RoomRepository>,
    broadcaster: Arc<RoomBroadcaster>,
    config: SessionConfig,
}

impl HandleMessageUseCase {
    /// 新しい HandleMessageUseCase を作成
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

    /// 受信メッセージを処理
    ///
    /// 送信者が Room に接続していれば、処理の成否にかかわらず最後にロスターを配信する。
    ///
    /// # Arguments
    ///
    /// * `room_key` - 送信者の Room
    /// * `participant_id` - 送信者の ID
    /// * `raw_message` - 受信したテキスト（JSON）
    ///
    /// # Returns
    ///
    /// * `Ok(HandledEvent)` - 処理したイベント
    /// * `Err(HandleMessageError)` - イベントを拒否した（接続は維持される）
    pub async fn execute(
        &self,
        room_key: &RoomKey,
        participant_id: &ParticipantId,
        raw_message: &str,
    ) -> Result<HandledEvent, HandleMessageError> {
        let Some(mut room) = self.repository.get_room(room_key).await else {
            return Err(HandleMessageError::ParticipantNotFound);
        };
        if !room.contains(participant_id) {
            return Err(HandleMessageError::ParticipantNotFound);
        }

        let result = match InboundEvent::decode(raw_message) {
            Ok(event) => self.apply(&mut room, participant_id, event).await,
            Err(e) => Err(HandleMessageError::MalformedPayload(e.to_string())),
        };

        if let Err(e) = &result {
            tracing::warn!(
                "Rejected event from '{}' in room '{}': {}",
                participant_id,
                room_key,
                e
            );
            if self.config.unknown_event_policy == UnknownEventPolicy::Reject {
                self.broadcaster
                    .notify_protocol_error(&room, participant_id, e.to_string())
                    .await;
            }
        }

        self.broadcaster.broadcast_roster(&room).await;

        result
    }

    async fn apply(
        &self,
        room: &mut RoomGuard,
        participant_id: &ParticipantId,
        event: InboundEvent,
    ) -> Result<HandledEvent, HandleMessageError> {
        match event {
            InboundEvent::SubmitSelections { selections } => {
                tracing::debug!(
                    "Participant '{}' in room '{}' submitted {} selections",
                    participant_id,
                    room.key,
                    selections.len()
                );
                room.submit_selections(participant_id, selections);

                let round_completed = match room.try_complete_round() {
                    Some(result) => {
                        tracing::info!(
                            "Round completed in room '{}' ({} cards)",
                            room.key,
                            result.cards.len()
                        );
                        self.broadcaster
                            .broadcast_round_completed(room, result)
                            .await;
                        true
                    }
                    None => false,
                };
                Ok(HandledEvent::SelectionsSubmitted { round_completed })
            }
            InboundEvent::UpdateUserName { user_name } => {
                tracing::debug!(
                    "Participant '{}' in room '{}' renamed to '{}'",
                    participant_id,
                    room.key,
                    user_name
                );
                room.rename_participant(participant_id, user_name);
                Ok(HandledEvent::UserNameUpdated)
            }
            InboundEvent::ResetSelections => {
                tracing::info!(
                    "Round reset in room '{}' by '{}'",
                    room.key,
                    participant_id
                );
                room.reset_round();
                Ok(HandledEvent::SelectionsReset)
            }
            InboundEvent::Unknown { event_type } => match self.config.unknown_event_policy {
                UnknownEventPolicy::Ignore => {
                    tracing::debug!("Ignoring unknown event type '{}'", event_type);
                    Ok(HandledEvent::Ignored { event_type })
                }
                UnknownEventPolicy::Reject => {
                    Err(HandleMessageError::UnknownEventType(event_type))
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{
            ConnectionId, DeliveryReport, MessagePushError, MessagePusher, Participant,
            PusherChannel, RequiredCount, Timestamp, message_pusher::MockMessagePusher,
        },
        infrastructure::{
            message_pusher::WebSocketMessagePusher, repository::InMemoryRoomRepository,
        },
    };
    use tokio::sync::mpsc;

    fn key(value: &str) -> RoomKey {
        RoomKey::new(value.to_string()).unwrap()
    }

    fn pid(value: &str) -> ParticipantId {
        ParticipantId::new(value.to_string()).unwrap()
    }

    fn create_usecase(
        pusher: Arc<dyn MessagePusher>,
        config: SessionConfig,
    ) -> (HandleMessageUseCase, Arc<InMemoryRoomRepository>) {
        let repository = Arc::new(InMemoryRoomRepository::new());
        let usecase = HandleMessageUseCase::new(
            repository.clone(),
            Arc::new(RoomBroadcaster::new(pusher)),
            config,
        );
        (usecase, repository)
    }

    /// 参加者を直接 Repository に追加する（ブロードキャストなし）
    async fn join(
        repository: &InMemoryRoomRepository,
        required: usize,
        id: &str,
    ) -> mpsc::UnboundedReceiver<String> {
        let (tx, rx): (PusherChannel, _) = mpsc::unbounded_channel();
        let participant = Participant::new(pid(id), tx, ConnectionId::generate(), Timestamp::new(0));
        repository
            .join(
                &key("room-1"),
                RequiredCount::new(required).unwrap(),
                participant,
                true,
            )
            .await
            .unwrap();
        rx
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<String>) -> Vec<serde_json::Value> {
        let mut events = Vec::new();
        while let Ok(raw) = rx.try_recv() {
            events.push(serde_json::from_str(&raw).unwrap());
        }
        events
    }

    fn submit(selections: &[&str]) -> String {
        serde_json::json!({"event_type": "submit selections", "selections": selections})
            .to_string()
    }

    #[tokio::test]
    async fn test_submit_updates_only_sender() {
        // テスト項目: 提出すると送信者の提出数だけが更新されたロスターが届く
        // given (前提条件):
        let (usecase, repository) =
            create_usecase(Arc::new(WebSocketMessagePusher::new()), SessionConfig::default());
        let mut alice_rx = join(&repository, 3, "alice").await;
        let _bob_rx = join(&repository, 3, "bob").await;

        // when (操作):
        let result = usecase
            .execute(&key("room-1"), &pid("bob"), &submit(&["1", "2"]))
            .await;

        // then (期待する結果):
        assert_eq!(
            result,
            Ok(HandledEvent::SelectionsSubmitted {
                round_completed: false
            })
        );
        let events = drain(&mut alice_rx);
        assert_eq!(events.len(), 1);
        assert_eq!(
            events[0],
            serde_json::json!({
                "eventType": "users updated",
                "users": [
                    {"userId": "alice", "userName": "alice", "submitted": 0},
                    {"userId": "bob", "userName": "bob", "submitted": 2}
                ]
            })
        );
    }

    #[tokio::test]
    async fn test_round_completes_once() {
        // テスト項目: 必要人数が提出すると結果が 1 回だけ配信される
        // given (前提条件): 必要提出者数 2、参加者 3 人
        let (usecase, repository) =
            create_usecase(Arc::new(WebSocketMessagePusher::new()), SessionConfig::default());
        let mut alice_rx = join(&repository, 2, "alice").await;
        let _bob_rx = join(&repository, 2, "bob").await;
        let _charlie_rx = join(&repository, 2, "charlie").await;

        // when (操作): alice, bob, charlie の順に提出
        let first = usecase
            .execute(&key("room-1"), &pid("alice"), &submit(&["x", "y"]))
            .await;
        let second = usecase
            .execute(&key("room-1"), &pid("bob"), &submit(&["y", "z"]))
            .await;
        let third = usecase
            .execute(&key("room-1"), &pid("charlie"), &submit(&["w"]))
            .await;

        // then (期待する結果):
        assert_eq!(
            first,
            Ok(HandledEvent::SelectionsSubmitted {
                round_completed: false
            })
        );
        assert_eq!(
            second,
            Ok(HandledEvent::SelectionsSubmitted {
                round_completed: true
            })
        );
        assert_eq!(
            third,
            Ok(HandledEvent::SelectionsSubmitted {
                round_completed: false
            })
        );

        let events = drain(&mut alice_rx);
        let kinds: Vec<&str> = events
            .iter()
            .map(|event| event["eventType"].as_str().unwrap())
            .collect();
        assert_eq!(
            kinds,
            vec![
                "users updated",
                "voting completed",
                "users updated",
                "users updated"
            ]
        );
        assert_eq!(events[1]["cards"], serde_json::json!(["x", "y", "z"]));
        assert_eq!(
            events[1]["logs"],
            serde_json::json!([
                "aliceは「x」と「y」を指定しました。",
                "bobは「y」と「z」を指定しました。"
            ])
        );
    }

    #[tokio::test]
    async fn test_reset_allows_next_round() {
        // テスト項目: リセット後は次のラウンドが完了できる
        // given (前提条件):
        let (usecase, repository) =
            create_usecase(Arc::new(WebSocketMessagePusher::new()), SessionConfig::default());
        let mut alice_rx = join(&repository, 1, "alice").await;
        usecase
            .execute(&key("room-1"), &pid("alice"), &submit(&["1"]))
            .await
            .unwrap();

        // when (操作):
        let reset = usecase
            .execute(
                &key("room-1"),
                &pid("alice"),
                r#"{"event_type": "reset selections"}"#,
            )
            .await;
        let next = usecase
            .execute(&key("room-1"), &pid("alice"), &submit(&["2"]))
            .await;

        // then (期待する結果):
        assert_eq!(reset, Ok(HandledEvent::SelectionsReset));
        assert_eq!(
            next,
            Ok(HandledEvent::SelectionsSubmitted {
                round_completed: true
            })
        );
        let completed: Vec<serde_json::Value> = drain(&mut alice_rx)
            .into_iter()
            .filter(|event| event["eventType"] == "voting completed")
            .collect();
        assert_eq!(completed.len(), 2);
        assert_eq!(completed[1]["cards"], serde_json::json!(["2"]));
    }

    #[tokio::test]
    async fn test_update_user_name() {
        // テスト項目: 表示名の変更がロスターに反映される
        // given (前提条件):
        let (usecase, repository) =
            create_usecase(Arc::new(WebSocketMessagePusher::new()), SessionConfig::default());
        let mut alice_rx = join(&repository, 2, "alice").await;

        // when (操作):
        let result = usecase
            .execute(
                &key("room-1"),
                &pid("alice"),
                r#"{"event_type": "update user name", "user_name": "アリス"}"#,
            )
            .await;

        // then (期待する結果):
        assert_eq!(result, Ok(HandledEvent::UserNameUpdated));
        let events = drain(&mut alice_rx);
        assert_eq!(events[0]["users"][0]["userName"], "アリス");
    }

    #[tokio::test]
    async fn test_unknown_event_ignored_but_roster_sent() {
        // テスト項目: 未知のイベントは無視されるが、ロスターは配信される
        // given (前提条件):
        let mut pusher = MockMessagePusher::new();
        pusher
            .expect_broadcast()
            .withf(|recipients, content| {
                recipients.len() == 1 && content.contains("users updated")
            })
            .times(1)
            .returning(|_, _| DeliveryReport::default());
        pusher.expect_push_to().never();
        let (usecase, repository) = create_usecase(Arc::new(pusher), SessionConfig::default());
        let _alice_rx = join(&repository, 2, "alice").await;

        // when (操作):
        let result = usecase
            .execute(&key("room-1"), &pid("alice"), r#"{"event_type": "dance"}"#)
            .await;

        // then (期待する結果):
        assert_eq!(
            result,
            Ok(HandledEvent::Ignored {
                event_type: "dance".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_unknown_event_rejected() {
        // テスト項目: 未知のイベントを拒否する設定では送信者にエラーが通知される
        // given (前提条件):
        let config = SessionConfig {
            unknown_event_policy: UnknownEventPolicy::Reject,
            ..SessionConfig::default()
        };
        let (usecase, repository) =
            create_usecase(Arc::new(WebSocketMessagePusher::new()), config);
        let mut alice_rx = join(&repository, 2, "alice").await;
        let mut bob_rx = join(&repository, 2, "bob").await;

        // when (操作):
        let result = usecase
            .execute(&key("room-1"), &pid("alice"), r#"{"event_type": "dance"}"#)
            .await;

        // then (期待する結果): alice にだけエラーが届き、ロスターは全員に届く
        assert_eq!(
            result,
            Err(HandleMessageError::UnknownEventType("dance".to_string()))
        );
        let alice_events = drain(&mut alice_rx);
        assert_eq!(alice_events[0]["eventType"], "protocol error");
        assert_eq!(alice_events[1]["eventType"], "users updated");
        let bob_events = drain(&mut bob_rx);
        assert_eq!(bob_events.len(), 1);
        assert_eq!(bob_events[0]["eventType"], "users updated");
    }

    #[tokio::test]
    async fn test_malformed_payload() {
        // テスト項目: 不正なペイロードはエラーになるが、状態は変わらずロスターは配信される
        // given (前提条件):
        let (usecase, repository) =
            create_usecase(Arc::new(WebSocketMessagePusher::new()), SessionConfig::default());
        let mut alice_rx = join(&repository, 1, "alice").await;

        // when (操作):
        let result = usecase
            .execute(&key("room-1"), &pid("alice"), "{not json")
            .await;

        // then (期待する結果):
        assert!(matches!(
            result,
            Err(HandleMessageError::MalformedPayload(_))
        ));
        let events = drain(&mut alice_rx);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0]["users"][0]["submitted"], 0);
    }

    #[tokio::test]
    async fn test_completion_broadcast_tolerates_failure() {
        // テスト項目: 配信の失敗は呼び出し元に伝播しない
        // given (前提条件): 結果配信 1 回 + ロスター配信 1 回、いずれも一部失敗
        let mut pusher = MockMessagePusher::new();
        pusher.expect_broadcast().times(2).returning(|recipients, _| {
            let mut report = DeliveryReport::default();
            for recipient in recipients {
                report.record(
                    recipient.id.clone(),
                    Err(MessagePushError::ChannelClosed(
                        recipient.id.to_string(),
                    )),
                );
            }
            report
        });
        let (usecase, repository) = create_usecase(Arc::new(pusher), SessionConfig::default());
        let _alice_rx = join(&repository, 1, "alice").await;

        // when (操作):
        let result = usecase
            .execute(&key("room-1"), &pid("alice"), &submit(&["1"]))
            .await;

        // then (期待する結果):
        assert_eq!(
            result,
            Ok(HandledEvent::SelectionsSubmitted {
                round_completed: true
            })
        );
    }

    #[tokio::test]
    async fn test_message_from_unknown_participant() {
        // テスト項目: 接続していない参加者からのメッセージは何も配信せずに拒否される
        // given (前提条件):
        let mut pusher = MockMessagePusher::new();
        pusher.expect_broadcast().never();
        let (usecase, repository) = create_usecase(Arc::new(pusher), SessionConfig::default());
        let _alice_rx = join(&repository, 2, "alice").await;

        // when (操作):
        let unknown_participant = usecase
            .execute(&key("room-1"), &pid("ghost"), &submit(&["1"]))
            .await;
        let unknown_room = usecase
            .execute(&key("room-2"), &pid("alice"), &submit(&["1"]))
            .await;

        // then (期待する結果):
        assert_eq!(
            unknown_participant,
            Err(HandleMessageError::ParticipantNotFound)
        );
        assert_eq!(unknown_room, Err(HandleMessageError::ParticipantNotFound));
    }
}
