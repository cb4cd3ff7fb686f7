//! Session policies shared by the use cases.

use clap::ValueEnum;

use crate::domain::RequiredCount;

/// What to do with an inbound event whose `event_type` is not recognized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum UnknownEventPolicy {
    /// Drop the event silently (the roster refresh is still sent)
    #[default]
    Ignore,
    /// Reply to the sender with a `protocol error` event
    Reject,
}

/// What to do when a participant id connects to a room it is already in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum DuplicateIdPolicy {
    /// Replace the existing participant and close its connection
    #[default]
    Replace,
    /// Refuse the new connection
    Reject,
}

/// Session configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionConfig {
    /// Required submissions per round when the first connect does not specify one
    pub default_required_count: RequiredCount,
    pub unknown_event_policy: UnknownEventPolicy,
    pub duplicate_id_policy: DuplicateIdPolicy,
}
