use std::time::Duration;

/// Gameplay tuning for server-spawned asteroids.

#[derive(Debug, Clone)]
pub struct AsteroidTuning {
    /// Delay between spawner ticks in each room.
    pub spawn_interval: Duration,

    /// Live asteroids per room above which the spawner skips a tick.
    pub max_live: usize,

    /// Hard ceiling on tracked asteroids per room, fragments included.
    pub max_tracked: usize,

    /// Launch speed range in pixels per second.
    pub min_speed: f32,
    pub max_speed: f32,

    /// Largest absolute curvature (radians per second of heading drift).
    pub max_curvature: f32,

    /// Wobble ranges: amplitude in pixels, frequency in hertz.
    pub max_wobble_amplitude: f32,
    pub min_wobble_frequency: f32,
    pub max_wobble_frequency: f32,

    /// Age after which an off-screen asteroid is dropped from tracking.
    pub timeout: Duration,

    /// Age after which an asteroid is dropped wherever it is.
    pub max_age: Duration,

    /// How far outside the playfield an asteroid may drift before counting as off-screen.
    pub offscreen_margin: f32,
}

impl Default for AsteroidTuning {
    fn default() -> Self {
        Self {
            spawn_interval: Duration::from_secs(4),
            max_live: 12,
            max_tracked: 48,
            min_speed: 40.0,
            max_speed: 110.0,
            max_curvature: 0.25,
            max_wobble_amplitude: 25.0,
            min_wobble_frequency: 0.1,
            max_wobble_frequency: 0.8,
            timeout: Duration::from_secs(15),
            max_age: Duration::from_secs(60),
            offscreen_margin: 100.0,
        }
    }
}
