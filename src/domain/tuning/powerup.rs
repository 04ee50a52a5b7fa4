use std::time::Duration;

/// Gameplay tuning for collectible powerups.

#[derive(Debug, Clone)]
pub struct PowerupTuning {
    /// Delay between spawner ticks in each room.
    pub spawn_interval: Duration,

    /// Uncollected powerups per room above which the spawner skips a tick.
    pub max_live: usize,

    /// How long an uncollected powerup stays on the field.
    pub lifetime: Duration,

    /// How long a collected powerup's effect lasts on the player.
    pub effect_duration: Duration,

    /// Minimum distance from the playfield edge for spawns.
    pub spawn_margin: f32,
}

impl Default for PowerupTuning {
    fn default() -> Self {
        Self {
            spawn_interval: Duration::from_secs(10),
            max_live: 3,
            lifetime: Duration::from_secs(20),
            effect_duration: Duration::from_secs(8),
            spawn_margin: 100.0,
        }
    }
}
