//! UseCase 層
//!
//! 接続・切断・メッセージ処理のユースケースと、それらをまとめた
//! `RoomSessionManager` を提供します。

mod broadcast;
mod connect_participant;
mod disconnect_participant;
mod error;
mod get_rooms;
mod handle_message;
mod room_session;

pub use broadcast::RoomBroadcaster;
pub use connect_participant::ConnectParticipantUseCase;
pub use disconnect_participant::{DisconnectOutcome, DisconnectParticipantUseCase};
pub use error::{ConnectError, GetRoomDetailError, HandleMessageError};
pub use get_rooms::{GetRoomDetailUseCase, GetRoomsUseCase};
pub use handle_message::{HandleMessageUseCase, HandledEvent};
pub use room_session::RoomSessionManager;
