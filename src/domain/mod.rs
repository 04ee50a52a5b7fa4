// Domain layer: arena value types, trajectory math, and gameplay tuning.

pub mod entities;
pub mod orbit;
pub mod ports;
pub mod tuning;

pub use entities::{
    ActivePowerup, Asteroid, AsteroidSize, Bounds, BulletState, ConnectionId, OrbitParams, Point,
    Powerup, PowerupKind, RoomId, UserState, Wobble,
};
