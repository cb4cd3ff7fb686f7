//! HTTP API response DTOs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Room key -> connected participant ids
pub type RoomListDto = BTreeMap<String, Vec<String>>;

/// Room detail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomDetailDto {
    pub room_key: String,
    pub required_count: usize,
    pub round_state: String,
    /// RFC 3339 (JST)
    pub created_at: String,
    pub participants: Vec<ParticipantDetailDto>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantDetailDto {
    pub participant_id: String,
    pub user_name: String,
    pub submitted: usize,
    /// RFC 3339 (JST)
    pub connected_at: String,
}
