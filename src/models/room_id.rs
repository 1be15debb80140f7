use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use uuid::Uuid;

pub const ROOM_ID_LEN: usize = 8;
pub const ROOM_ID_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Short room code handed out to clients.
///
/// Stored without the dash; `Display` renders the `XXXX-XXXX` form users see.
/// Lowercase input is rejected rather than folded, clients uppercase before sending.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoomId(String);

impl RoomId {
    /// Generate a random room id. Collisions are handled by the caller.
    pub fn generate() -> Self {
        // The low 62 bits of a v4 uuid are all random.
        let mut bits = Uuid::new_v4().as_u128() & ((1u128 << 62) - 1);
        let base = ROOM_ID_ALPHABET.len() as u128;
        let mut code = String::with_capacity(ROOM_ID_LEN);
        for _ in 0..ROOM_ID_LEN {
            code.push(ROOM_ID_ALPHABET[(bits % base) as usize] as char);
            bits /= base;
        }
        Self(code)
    }

    /// Parse a room id in either wire (`ABCD1234`) or display (`ABCD-1234`) form.
    pub fn parse(value: &str) -> Result<Self, RoomIdError> {
        let trimmed = value.trim();
        let normalized: String = match trimmed.split_once('-') {
            Some((head, tail)) if head.len() == ROOM_ID_LEN / 2 => format!("{head}{tail}"),
            Some(_) => return Err(RoomIdError::MisplacedDash),
            None => trimmed.to_string(),
        };

        if normalized.len() != ROOM_ID_LEN {
            return Err(RoomIdError::InvalidLength {
                expected: ROOM_ID_LEN,
                found: normalized.chars().count(),
            });
        }
        for (index, ch) in normalized.chars().enumerate() {
            if !ch.is_ascii() || !ROOM_ID_ALPHABET.contains(&(ch as u8)) {
                return Err(RoomIdError::InvalidCharacter { ch, index });
            }
        }
        Ok(Self(normalized))
    }

    /// Wire form, without the dash.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (head, tail) = self.0.split_at(ROOM_ID_LEN / 2);
        write!(f, "{head}-{tail}")
    }
}

impl std::str::FromStr for RoomId {
    type Err = RoomIdError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl Serialize for RoomId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for RoomId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        RoomId::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomIdError {
    InvalidLength { expected: usize, found: usize },
    InvalidCharacter { ch: char, index: usize },
    MisplacedDash,
}

impl fmt::Display for RoomIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoomIdError::InvalidLength { expected, found } => {
                write!(f, "room id must be {expected} chars, got {found}")
            }
            RoomIdError::InvalidCharacter { ch, index } => {
                write!(f, "invalid character '{ch}' at position {index}")
            }
            RoomIdError::MisplacedDash => write!(f, "room id dash must follow the 4th character"),
        }
    }
}

impl std::error::Error for RoomIdError {}
