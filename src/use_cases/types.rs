// Use-case level inputs/outputs for the arena core.

use crate::domain::{
    Asteroid, AsteroidSize, BulletState, ConnectionId, OrbitParams, Point, Powerup, PowerupKind,
    RoomId, UserState,
};
use std::collections::BTreeMap;
use std::time::Duration;

/// A decoded client request, already attributed to its connection by the caller.
#[derive(Debug, Clone)]
pub enum ClientRequest {
    CreateRoom {
        name: Option<String>,
        max_players: Option<u32>,
    },
    JoinRoom {
        room_id: String,
        name: Option<String>,
        team: Option<String>,
    },
    UpdateCoordinates(PlayerReport),
    KeystrokeState(String),
    Shot,
    UpdateCoin(Point),
    Collision {
        bullet_user_id: String,
        bullet_index: u32,
        target_id: String,
    },
    InitializeGame,
    SpawnAsteroid,
    SpawnAsteroidSplit(SplitRequest),
    AsteroidDestroyed {
        asteroid_id: String,
        new_score: i64,
        asteroids_destroyed: u32,
        coin_score: i64,
    },
    PlayerAsteroidCollision {
        asteroid_id: String,
        new_score: i64,
        new_coin_score: i64,
    },
    GetAsteroids,
    RequestSpawnPowerup,
    CollectPowerup {
        powerup_id: String,
    },
    UpdateScreenDimensions {
        width: f32,
        height: f32,
    },
}

/// Full client-reported player state from `update_coordinates`.
#[derive(Debug, Clone)]
pub struct PlayerReport {
    pub x: f32,
    pub y: f32,
    pub score: i64,
    pub name: String,
    pub angle: f32,
    pub bullets: Vec<BulletState>,
}

/// Child kinematics computed by the client that destroyed `parent_size`.
#[derive(Debug, Clone)]
pub struct SplitRequest {
    pub parent_size: AsteroidSize,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub orbit: OrbitParams,
}

/// Row of the `available_rooms` listing.
#[derive(Debug, Clone, PartialEq)]
pub struct RoomSummary {
    pub id: RoomId,
    pub name: String,
    pub player_count: usize,
    /// `None` for the unbounded main room.
    pub max_players: Option<usize>,
}

/// Everything a client needs to (re)build its scene.
#[derive(Debug, Clone)]
pub struct RoomSnapshot {
    pub connection_id: ConnectionId,
    pub coin: Point,
    pub others: BTreeMap<ConnectionId, UserState>,
    pub room_id: RoomId,
    pub room_name: String,
    pub powerups: Vec<Powerup>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum JoinResult {
    Joined { room_id: RoomId, room_name: String },
    Rejected { message: String },
}

#[derive(Debug, Clone)]
pub struct AsteroidHit {
    pub asteroid_id: String,
    pub player_id: ConnectionId,
    pub new_score: i64,
    pub asteroids_destroyed: u32,
    pub coin_score: i64,
    /// True when the player's ship, not a bullet, hit the asteroid.
    pub by_ship: bool,
}

/// State changes the arena announces to clients.
#[derive(Debug, Clone)]
pub enum ArenaEvent {
    AvailableRooms(Vec<RoomSummary>),
    NewUser(RoomSnapshot),
    RoomCreated {
        room_id: RoomId,
        name: String,
        max_players: usize,
    },
    JoinResult(JoinResult),
    InitialAsteroids(Vec<Asteroid>),
    PlayerState(UserState),
    KeystrokeUpdate {
        id: ConnectionId,
        state: String,
    },
    OtherShot,
    CoinChanged(Point),
    OtherCollision {
        bullet_user_id: String,
        bullet_index: u32,
        exploded_user_id: ConnectionId,
    },
    UserDisconnected {
        id: ConnectionId,
    },
    NewAsteroid(Asteroid),
    AsteroidHit(AsteroidHit),
    PowerupSpawned(Powerup),
    PowerupCollected {
        powerup_id: String,
        player_id: ConnectionId,
        kind: PowerupKind,
        expires_at: u64,
    },
    PowerupExpired {
        id: String,
    },
    PlayerPowerupExpired {
        player_id: ConnectionId,
        kind: PowerupKind,
    },
    TeamScores(BTreeMap<String, i64>),
}

/// One event addressed to an already-resolved set of connections.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub to: Vec<ConnectionId>,
    pub event: ArenaEvent,
}

/// Scheduled callbacks. Each one re-checks room state when it fires.
#[derive(Debug, Clone, PartialEq)]
pub enum TimerEvent {
    AsteroidSpawnerTick {
        room_id: RoomId,
    },
    PowerupSpawnerTick {
        room_id: RoomId,
    },
    PowerupExpired {
        room_id: RoomId,
        powerup_id: String,
    },
    PlayerPowerupExpired {
        room_id: RoomId,
        connection_id: ConnectionId,
        kind: PowerupKind,
        expires_at: u64,
    },
    RoomIdleCheck {
        room_id: RoomId,
    },
}

impl TimerEvent {
    /// Slot this event occupies; scheduling into an occupied slot replaces the old timer.
    pub fn key(&self) -> TimerKey {
        match self {
            TimerEvent::AsteroidSpawnerTick { room_id } => TimerKey::AsteroidSpawner(room_id.clone()),
            TimerEvent::PowerupSpawnerTick { room_id } => TimerKey::PowerupSpawner(room_id.clone()),
            TimerEvent::PowerupExpired { powerup_id, .. } => {
                TimerKey::PowerupExpiry(powerup_id.clone())
            }
            TimerEvent::PlayerPowerupExpired {
                connection_id,
                kind,
                ..
            } => TimerKey::PlayerPowerup(connection_id.clone(), *kind),
            TimerEvent::RoomIdleCheck { room_id } => TimerKey::RoomIdle(room_id.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TimerKey {
    AsteroidSpawner(RoomId),
    PowerupSpawner(RoomId),
    PowerupExpiry(String),
    PlayerPowerup(ConnectionId, PowerupKind),
    RoomIdle(RoomId),
}

#[derive(Debug, Clone, PartialEq)]
pub enum TimerCommand {
    Schedule { after: Duration, event: TimerEvent },
    Cancel(TimerKey),
}

/// Output of one run-to-completion step of the arena.
#[derive(Debug, Default)]
pub struct Effects {
    pub deliveries: Vec<Delivery>,
    pub timers: Vec<TimerCommand>,
}

impl Effects {
    pub fn send(&mut self, to: Vec<ConnectionId>, event: ArenaEvent) {
        if !to.is_empty() {
            self.deliveries.push(Delivery { to, event });
        }
    }

    pub fn send_one(&mut self, to: &str, event: ArenaEvent) {
        self.send(vec![to.to_string()], event);
    }

    pub fn schedule(&mut self, after: Duration, event: TimerEvent) {
        self.timers.push(TimerCommand::Schedule { after, event });
    }

    pub fn cancel(&mut self, key: TimerKey) {
        self.timers.push(TimerCommand::Cancel(key));
    }
}
