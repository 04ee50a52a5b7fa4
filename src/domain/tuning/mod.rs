// Gameplay tuning, kept apart from runtime/server configuration.

pub mod arena;
pub mod asteroid;
pub mod powerup;

pub use arena::ArenaTuning;
pub use asteroid::AsteroidTuning;
pub use powerup::PowerupTuning;
