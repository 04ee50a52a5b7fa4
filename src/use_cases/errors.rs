use std::fmt;

// Failures a room-scoped request can run into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomError {
    /// Join targeted an id the registry does not know.
    RoomNotFound,
    /// Join targeted a custom room already at capacity.
    RoomFull,
    /// The sender is not assigned to any room.
    UnassignedConnection,
    /// The request named an asteroid, powerup or player that is already gone.
    StaleReference,
    /// A playfield resize carried a non-positive or non-finite size.
    InvalidDimensions,
}

impl RoomError {
    /// Errors that are part of normal play and are dropped without telling the client.
    pub fn is_silent(&self) -> bool {
        matches!(self, RoomError::UnassignedConnection | RoomError::StaleReference)
    }
}

impl fmt::Display for RoomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            RoomError::RoomNotFound => "room not found",
            RoomError::RoomFull => "room is full",
            RoomError::UnassignedConnection => "not in a room",
            RoomError::StaleReference => "entity no longer exists",
            RoomError::InvalidDimensions => "invalid playfield dimensions",
        };
        f.write_str(message)
    }
}

impl std::error::Error for RoomError {}
