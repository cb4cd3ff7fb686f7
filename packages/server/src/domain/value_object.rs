//! 値オブジェクト定義
//!
//! 生成時にバリデーションを行い、不正な値がドメインに入り込まないようにします。

use std::fmt;

use uuid::Uuid;

use super::error::ValueObjectError;

const ROOM_KEY_MAX_LEN: usize = 128;
const PARTICIPANT_ID_MAX_LEN: usize = 64;

fn validate_identifier(
    kind: &'static str,
    value: &str,
    max: usize,
) -> Result<(), ValueObjectError> {
    if value.is_empty() {
        return Err(ValueObjectError::Empty(kind));
    }
    let actual = value.chars().count();
    if actual > max {
        return Err(ValueObjectError::TooLong { kind, max, actual });
    }
    if value.chars().any(char::is_control) {
        return Err(ValueObjectError::ControlCharacter(kind));
    }
    Ok(())
}

/// Room を識別するキー（URL パスから渡される不透明な文字列）
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoomKey(String);

impl RoomKey {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        validate_identifier("room key", &value, ROOM_KEY_MAX_LEN)?;
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for RoomKey {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for RoomKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Room 内で参加者を一意に識別する ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParticipantId(String);

impl ParticipantId {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        validate_identifier("participant id", &value, PARTICIPANT_ID_MAX_LEN)?;
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for ParticipantId {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// ラウンド完了に必要な提出者数
///
/// Room 作成時に一度だけ決まり、Room が破棄されるまで変わらない。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequiredCount(usize);

impl RequiredCount {
    pub const MIN: usize = 1;
    pub const MAX: usize = 100;
    pub const DEFAULT: RequiredCount = RequiredCount(2);

    pub fn new(value: usize) -> Result<Self, ValueObjectError> {
        if !(Self::MIN..=Self::MAX).contains(&value) {
            return Err(ValueObjectError::RequiredCountOutOfRange {
                min: Self::MIN,
                max: Self::MAX,
                actual: value,
            });
        }
        Ok(Self(value))
    }

    pub fn value(self) -> usize {
        self.0
    }
}

impl Default for RequiredCount {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<usize> for RequiredCount {
    type Error = ValueObjectError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// 参加者を所有しているトランスポート接続の ID
///
/// 同じ ParticipantId で再接続された場合、古い接続からの切断通知を無視するために使う。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unix タイムスタンプ（JST, ミリ秒）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn now() -> Self {
        Self(tefuda_shared::time::get_jst_timestamp())
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}
