// Use cases layer: the single-owner arena core and its room subsystems.

pub mod arena;
pub mod asteroids;
pub mod errors;
pub mod powerups;
pub mod registry;
pub mod room;
pub mod types;

pub use arena::{Arena, ArenaSettings};
pub use errors::RoomError;
pub use registry::{MAIN_ROOM_ID, RoomRegistry};
pub use types::{
    ArenaEvent, AsteroidHit, ClientRequest, Delivery, Effects, JoinResult, PlayerReport,
    RoomSnapshot, RoomSummary, SplitRequest, TimerCommand, TimerEvent, TimerKey,
};
