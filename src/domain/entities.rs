// Domain-level arena entities. None of these know about the wire format.

use rand::Rng;
use std::collections::BTreeMap;

pub type ConnectionId = String;
pub type RoomId = String;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Playfield size in pixels. The origin is the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    /// Picks a uniformly random point at least `margin` pixels away from every edge.
    ///
    /// Falls back to the center on an axis too small to honor the margin.
    pub fn random_point<R: Rng + ?Sized>(&self, margin: f32, rng: &mut R) -> Point {
        Point {
            x: random_axis(self.width, margin, rng),
            y: random_axis(self.height, margin, rng),
        }
    }

    /// True if the point lies inside the playfield grown by `margin` on every side.
    pub fn contains_with_margin(&self, point: Point, margin: f32) -> bool {
        point.x >= -margin
            && point.x <= self.width + margin
            && point.y >= -margin
            && point.y <= self.height + margin
    }
}

fn random_axis<R: Rng + ?Sized>(extent: f32, margin: f32, rng: &mut R) -> f32 {
    let (lo, hi) = (margin, extent - margin);
    if hi <= lo {
        return extent / 2.0;
    }
    rng.gen_range(lo..hi)
}

/// One client-authored bullet slot. The server relays these verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct BulletState {
    pub index: u32,
    pub x: f32,
    pub y: f32,
    pub angle: f32,
    pub active: bool,
    pub visible: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PowerupKind {
    Speed,
    Multi,
    Attract,
}

impl PowerupKind {
    pub const ALL: [PowerupKind; 3] = [PowerupKind::Speed, PowerupKind::Multi, PowerupKind::Attract];

    pub fn as_str(self) -> &'static str {
        match self {
            PowerupKind::Speed => "speed",
            PowerupKind::Multi => "multi",
            PowerupKind::Attract => "attract",
        }
    }
}

/// A player's running powerup effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivePowerup {
    pub active: bool,
    /// Absolute epoch milliseconds at which the effect ends.
    pub expires_at: u64,
}

/// The server's record of one connection's player inside a room.
#[derive(Debug, Clone, PartialEq)]
pub struct UserState {
    pub connection_id: ConnectionId,
    pub name: String,
    pub score: i64,
    pub coin_score: i64,
    pub asteroids_destroyed: u32,
    pub x: f32,
    pub y: f32,
    pub angle: f32,
    pub bullets: Vec<BulletState>,
    pub team: Option<String>,
    pub active_powerups: BTreeMap<PowerupKind, ActivePowerup>,
}

impl UserState {
    /// Fresh player at a spawn point: zero scores, no bullets, facing angle 0.
    pub fn spawn(
        connection_id: ConnectionId,
        name: String,
        team: Option<String>,
        at: Point,
    ) -> Self {
        Self {
            connection_id,
            name,
            score: 0,
            coin_score: 0,
            asteroids_destroyed: 0,
            x: at.x,
            y: at.y,
            angle: 0.0,
            bullets: Vec::new(),
            team,
            active_powerups: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AsteroidSize {
    Large,
    Medium,
    Small,
}

impl AsteroidSize {
    /// Size of the fragments produced when an asteroid of this size breaks.
    pub fn next_smaller(self) -> Option<AsteroidSize> {
        match self {
            AsteroidSize::Large => Some(AsteroidSize::Medium),
            AsteroidSize::Medium => Some(AsteroidSize::Small),
            AsteroidSize::Small => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Wobble {
    /// Peak sideways displacement in pixels.
    pub amplitude: f32,
    /// Oscillations per second.
    pub frequency: f32,
}

/// Closed-form description of an asteroid's path. See [`crate::domain::orbit`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitParams {
    pub start_x: f32,
    pub start_y: f32,
    pub vx: f32,
    pub vy: f32,
    pub curvature: f32,
    pub wobble: Wobble,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Asteroid {
    pub id: String,
    pub size: AsteroidSize,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub orbit: OrbitParams,
    /// Epoch milliseconds; the trajectory clock starts here.
    pub created_at: u64,
}

impl Asteroid {
    pub fn new(id: String, size: AsteroidSize, orbit: OrbitParams, created_at: u64) -> Self {
        Self {
            id,
            size,
            x: orbit.start_x,
            y: orbit.start_y,
            vx: orbit.vx,
            vy: orbit.vy,
            orbit,
            created_at,
        }
    }

    pub fn age_millis(&self, now: u64) -> u64 {
        now.saturating_sub(self.created_at)
    }

    /// Derived position at `now`.
    pub fn position_at(&self, now: u64) -> Point {
        let elapsed = self.age_millis(now) as f32 / 1000.0;
        crate::domain::orbit::position_at(&self.orbit, elapsed)
    }

    /// Copy with `x`/`y` moved to the derived position at `now`.
    pub fn materialized(&self, now: u64) -> Asteroid {
        let position = self.position_at(now);
        Asteroid {
            x: position.x,
            y: position.y,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Powerup {
    pub id: String,
    pub kind: PowerupKind,
    pub x: f32,
    pub y: f32,
    pub created_at: u64,
}
