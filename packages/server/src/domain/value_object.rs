//! Value objects for identifiers.
//!
//! Client identifiers are opaque strings supplied by the client (or generated
//! on upgrade). Room identifiers are generated when a room is created.

use std::fmt;

use super::error::ValueObjectError;

/// Upper bound on identifier length, in bytes.
pub const MAX_ID_LEN: usize = 128;

fn validate_id(kind: &'static str, value: &str) -> Result<(), ValueObjectError> {
    if value.trim().is_empty() {
        return Err(ValueObjectError::Empty(kind));
    }
    if value.len() > MAX_ID_LEN {
        return Err(ValueObjectError::TooLong {
            kind,
            max: MAX_ID_LEN,
            actual: value.len(),
        });
    }
    Ok(())
}

/// Identifier of a client connection (and of the player it plays as).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(String);

impl ClientId {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        validate_id("client id", &value)?;
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for ClientId {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a room.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoomId(String);

impl RoomId {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        validate_id("room id", &value)?;
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for RoomId {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Generates client ids for connections that did not bring their own.
pub struct ClientIdFactory;

impl ClientIdFactory {
    pub fn generate() -> ClientId {
        // A v4 UUID is never empty and always 36 bytes.
        ClientId(uuid::Uuid::new_v4().to_string())
    }
}

/// Generates room ids.
pub struct RoomIdFactory;

impl RoomIdFactory {
    pub fn generate() -> RoomId {
        RoomId(uuid::Uuid::new_v4().to_string())
    }
}
