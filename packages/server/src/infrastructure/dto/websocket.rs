//! WebSocket message DTOs.
//!
//! Inbound events use snake_case keys (`event_type`), outbound events use
//! camelCase keys (`eventType`). Both are part of the client contract.

use serde::{Deserialize, Serialize};

pub const SUBMIT_SELECTIONS: &str = "submit selections";
pub const UPDATE_USER_NAME: &str = "update user name";
pub const RESET_SELECTIONS: &str = "reset selections";

/// Event received from a client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    SubmitSelections { selections: Vec<String> },
    UpdateUserName { user_name: String },
    ResetSelections,
    /// An `event_type` this server does not know
    Unknown { event_type: String },
}

#[derive(Deserialize)]
struct Envelope {
    event_type: String,
    #[serde(flatten)]
    body: serde_json::Map<String, serde_json::Value>,
}

#[derive(Deserialize)]
struct SubmitSelectionsBody {
    selections: Vec<String>,
}

#[derive(Deserialize)]
struct UpdateUserNameBody {
    user_name: String,
}

impl InboundEvent {
    /// Decode a raw text frame.
    ///
    /// Fails when the frame is not a JSON object with a string `event_type`, or
    /// when a known event lacks its required fields. Unknown event types decode
    /// successfully as [`InboundEvent::Unknown`].
    pub fn decode(raw: &str) -> Result<Self, serde_json::Error> {
        let envelope: Envelope = serde_json::from_str(raw)?;
        let body = serde_json::Value::Object(envelope.body);

        let event = match envelope.event_type.as_str() {
            SUBMIT_SELECTIONS => {
                let body: SubmitSelectionsBody = serde_json::from_value(body)?;
                InboundEvent::SubmitSelections {
                    selections: body.selections,
                }
            }
            UPDATE_USER_NAME => {
                let body: UpdateUserNameBody = serde_json::from_value(body)?;
                InboundEvent::UpdateUserName {
                    user_name: body.user_name,
                }
            }
            RESET_SELECTIONS => InboundEvent::ResetSelections,
            _ => InboundEvent::Unknown {
                event_type: envelope.event_type,
            },
        };
        Ok(event)
    }
}

/// Event sent to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "eventType")]
pub enum OutboundEvent {
    #[serde(rename = "users updated")]
    UsersUpdated { users: Vec<UserStatus> },

    #[serde(rename = "voting completed")]
    VotingCompleted { cards: Vec<String>, logs: Vec<String> },

    #[serde(rename = "protocol error")]
    ProtocolError { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStatus {
    pub user_id: String,
    pub user_name: String,
    pub submitted: usize,
}
