//! Conversion logic between DTOs and domain entities.

use tefuda_shared::time::timestamp_to_jst_rfc3339;

use crate::domain::{ParticipantStatus, RoomSnapshot, RoundResult};
use crate::infrastructure::dto::{http, websocket as dto};

// ========================================
// Domain Entity → WebSocket DTO
// ========================================

impl From<ParticipantStatus> for dto::UserStatus {
    fn from(model: ParticipantStatus) -> Self {
        Self {
            user_id: model.id.into_string(),
            user_name: model.user_name,
            submitted: model.submitted,
        }
    }
}

impl From<RoundResult> for dto::OutboundEvent {
    fn from(model: RoundResult) -> Self {
        Self::VotingCompleted {
            cards: model.cards,
            logs: model.logs,
        }
    }
}

impl dto::OutboundEvent {
    /// Build a `users updated` event from a roster
    pub fn users_updated(roster: Vec<ParticipantStatus>) -> Self {
        Self::UsersUpdated {
            users: roster.into_iter().map(dto::UserStatus::from).collect(),
        }
    }
}

// ========================================
// Domain Entity → HTTP DTO
// ========================================

impl From<ParticipantStatus> for http::ParticipantDetailDto {
    fn from(model: ParticipantStatus) -> Self {
        Self {
            participant_id: model.id.into_string(),
            user_name: model.user_name,
            submitted: model.submitted,
            connected_at: timestamp_to_jst_rfc3339(model.connected_at.value()),
        }
    }
}

impl From<RoomSnapshot> for http::RoomDetailDto {
    fn from(model: RoomSnapshot) -> Self {
        Self {
            room_key: model.key.into_string(),
            required_count: model.required_count.value(),
            round_state: model.round_state.as_str().to_string(),
            created_at: timestamp_to_jst_rfc3339(model.created_at.value()),
            participants: model
                .participants
                .into_iter()
                .map(http::ParticipantDetailDto::from)
                .collect(),
        }
    }
}

/// Build the room listing (room key -> participant ids)
pub fn room_list(rooms: Vec<RoomSnapshot>) -> http::RoomListDto {
    rooms
        .into_iter()
        .map(|room| {
            let participant_ids = room
                .participants
                .into_iter()
                .map(|participant| participant.id.into_string())
                .collect();
            (room.key.into_string(), participant_ids)
        })
        .collect()
}
