//! ドメイン層
//!
//! 手札（selections）の投票ラウンドを表すドメインモデルと、
//! ドメイン層が必要とするインターフェース（Repository, MessagePusher）を定義します。

pub mod entity;
pub mod error;
pub mod message_pusher;
pub mod repository;
pub mod value_object;

pub use entity::{Participant, ParticipantStatus, Room, RoomSnapshot, RoundResult, RoundState};
pub use error::{JoinError, MessagePushError, ValueObjectError};
pub use message_pusher::{DeliveryReport, MessagePusher, PusherChannel, Recipient};
pub use repository::{Joined, RoomGuard, RoomRepository};
pub use value_object::{ConnectionId, ParticipantId, RequiredCount, RoomKey, Timestamp};
