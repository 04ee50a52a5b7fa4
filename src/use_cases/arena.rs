// The arena core: dispatches client requests and timer callbacks against room state.
//
// Every entry point runs to completion and returns the deliveries and timer commands it
// produced. The caller (the hub task) owns the only `Arena`, so no locking is needed.

use crate::domain::ports::Clock;
use crate::domain::tuning::{ArenaTuning, AsteroidTuning, PowerupTuning};
use crate::domain::{Bounds, ConnectionId, Point, PowerupKind, UserState};
use crate::use_cases::asteroids::AsteroidSystem;
use crate::use_cases::errors::RoomError;
use crate::use_cases::powerups::PowerupSystem;
use crate::use_cases::registry::{Departure, MAIN_ROOM_ID, RoomRegistry};
use crate::use_cases::room::Room;
use crate::use_cases::types::{
    ArenaEvent, AsteroidHit, ClientRequest, Effects, JoinResult, PlayerReport, SplitRequest,
    TimerEvent, TimerKey,
};
use rand::rngs::StdRng;
use std::collections::BTreeSet;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Everything the arena needs besides a clock and an RNG.
#[derive(Debug, Clone)]
pub struct ArenaSettings {
    pub bounds: Bounds,
    pub arena: ArenaTuning,
    pub asteroids: AsteroidTuning,
    pub powerups: PowerupTuning,
    /// How long a freshly created custom room may stay empty before it is reaped.
    pub room_idle_grace: Duration,
}

pub struct Arena {
    registry: RoomRegistry,
    /// Every live connection, assigned to a room or not.
    connections: BTreeSet<ConnectionId>,
    bounds: Bounds,
    tuning: ArenaTuning,
    asteroids: AsteroidSystem,
    powerups: PowerupSystem,
    room_idle_grace: Duration,
    clock: Box<dyn Clock>,
    rng: StdRng,
    next_entity_id: u64,
}

impl Arena {
    pub fn new(settings: ArenaSettings, clock: Box<dyn Clock>, mut rng: StdRng) -> Self {
        let registry = RoomRegistry::new(settings.bounds, &settings.arena, &mut rng);
        Self {
            registry,
            connections: BTreeSet::new(),
            bounds: settings.bounds,
            tuning: settings.arena,
            asteroids: AsteroidSystem::new(settings.asteroids),
            powerups: PowerupSystem::new(settings.powerups),
            room_idle_grace: settings.room_idle_grace,
            clock,
            rng,
            next_entity_id: 0,
        }
    }

    /// Arms the main room's spawners. Call once before dispatching anything else.
    pub fn start(&mut self) -> Effects {
        let mut fx = Effects::default();
        self.schedule_spawners(MAIN_ROOM_ID, &mut fx);
        fx
    }

    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    /// Current playfield used for spawn, coin and sweep placement.
    pub fn playfield(&self) -> Bounds {
        self.bounds
    }

    /// A new connection gets the current room listing.
    pub fn connect(&mut self, conn: &str) -> Effects {
        let mut fx = Effects::default();
        self.connections.insert(conn.to_string());
        fx.send_one(conn, ArenaEvent::AvailableRooms(self.registry.list_rooms()));
        fx
    }

    /// Removes the connection from its room and republishes the room list.
    pub fn disconnect(&mut self, conn: &str) -> Effects {
        let mut fx = Effects::default();
        self.connections.remove(conn);
        if let Some(departure) = self.registry.leave(conn) {
            info!(connection_id = conn, room_id = %departure.room_id, "player left room");
            self.announce_departure(departure, &mut fx);
        }
        self.publish_rooms(&mut fx);
        fx
    }

    pub fn handle(&mut self, conn: &str, request: ClientRequest) -> Effects {
        let mut fx = Effects::default();
        let result = match request {
            ClientRequest::CreateRoom { name, max_players } => {
                self.create_room(conn, name, max_players, &mut fx)
            }
            ClientRequest::JoinRoom {
                room_id,
                name,
                team,
            } => self.join_room(conn, &room_id, name, team, &mut fx),
            ClientRequest::UpdateCoordinates(report) => {
                self.update_coordinates(conn, report, &mut fx)
            }
            ClientRequest::KeystrokeState(state) => self.keystroke_state(conn, state, &mut fx),
            ClientRequest::Shot => self.shot(conn, &mut fx),
            ClientRequest::UpdateCoin(coin) => self.update_coin(conn, coin, &mut fx),
            ClientRequest::Collision {
                bullet_user_id,
                bullet_index,
                target_id,
            } => self.collision(conn, bullet_user_id, bullet_index, &target_id, &mut fx),
            ClientRequest::InitializeGame => self.initialize_game(conn, &mut fx),
            ClientRequest::SpawnAsteroid | ClientRequest::RequestSpawnPowerup => {
                debug!(connection_id = conn, "client spawn request ignored");
                Ok(())
            }
            ClientRequest::SpawnAsteroidSplit(request) => {
                self.spawn_asteroid_split(conn, request, &mut fx)
            }
            ClientRequest::AsteroidDestroyed {
                asteroid_id,
                new_score,
                asteroids_destroyed,
                coin_score,
            } => self.asteroid_destroyed(
                conn,
                &asteroid_id,
                new_score,
                Some(asteroids_destroyed),
                coin_score,
                false,
                &mut fx,
            ),
            ClientRequest::PlayerAsteroidCollision {
                asteroid_id,
                new_score,
                new_coin_score,
            } => self.asteroid_destroyed(
                conn,
                &asteroid_id,
                new_score,
                None,
                new_coin_score,
                true,
                &mut fx,
            ),
            ClientRequest::GetAsteroids => self.get_asteroids(conn, &mut fx),
            ClientRequest::UpdateScreenDimensions { width, height } => {
                self.resize_playfield(conn, width, height)
            }
            ClientRequest::CollectPowerup { powerup_id } => {
                self.collect_powerup(conn, &powerup_id, &mut fx)
            }
        };

        if let Err(err) = result {
            if err.is_silent() {
                debug!(connection_id = conn, error = %err, "request ignored");
            } else {
                warn!(connection_id = conn, error = %err, "request failed");
            }
        }
        fx
    }

    /// Runs a scheduled callback.
    pub fn fire(&mut self, event: TimerEvent) -> Effects {
        let mut fx = Effects::default();
        let result = match event {
            TimerEvent::AsteroidSpawnerTick { room_id } => self.asteroid_tick(&room_id, &mut fx),
            TimerEvent::PowerupSpawnerTick { room_id } => self.powerup_tick(&room_id, &mut fx),
            TimerEvent::PowerupExpired {
                room_id,
                powerup_id,
            } => self.powerup_expired(&room_id, &powerup_id, &mut fx),
            TimerEvent::PlayerPowerupExpired {
                room_id,
                connection_id,
                kind,
                expires_at,
            } => self.player_powerup_expired(&room_id, connection_id, kind, expires_at, &mut fx),
            TimerEvent::RoomIdleCheck { room_id } => {
                if self.registry.remove_if_idle(&room_id) {
                    info!(room_id = %room_id, "unused room reaped");
                    cancel_spawners(&room_id, &mut fx);
                    self.publish_rooms(&mut fx);
                }
                Ok(())
            }
        };

        if let Err(err) = result {
            debug!(error = %err, "timer callback found nothing to do");
        }
        fx
    }

    fn create_room(
        &mut self,
        conn: &str,
        name: Option<String>,
        max_players: Option<u32>,
        fx: &mut Effects,
    ) -> Result<(), RoomError> {
        let name = sanitize_name(name.as_deref(), self.tuning.max_room_name_len)
            .unwrap_or_else(|| "Room".to_string());
        let max_players = max_players
            .map(|max| max as usize)
            .unwrap_or(self.tuning.default_max_players)
            .clamp(self.tuning.min_max_players, self.tuning.max_max_players);

        let room = self.registry.create_room(name, max_players, &mut self.rng);
        let room_id = room.id().to_string();
        fx.send_one(
            conn,
            ArenaEvent::RoomCreated {
                room_id: room_id.clone(),
                name: room.name().to_string(),
                max_players,
            },
        );

        self.schedule_spawners(&room_id, fx);
        fx.schedule(
            self.room_idle_grace,
            TimerEvent::RoomIdleCheck { room_id },
        );
        self.publish_rooms(fx);
        Ok(())
    }

    fn join_room(
        &mut self,
        conn: &str,
        room_id: &str,
        name: Option<String>,
        team: Option<String>,
        fx: &mut Effects,
    ) -> Result<(), RoomError> {
        let name = sanitize_name(name.as_deref(), self.tuning.max_player_name_len)
            .unwrap_or_else(|| self.tuning.default_player_name.to_string());
        let team = sanitize_name(team.as_deref(), self.tuning.max_player_name_len);
        let spawn = self
            .bounds
            .random_point(self.tuning.spawn_margin, &mut self.rng);
        let user = UserState::spawn(conn.to_string(), name, team, spawn);

        let joined = match self.registry.join_room(room_id, user) {
            Ok(joined) => joined,
            Err(err) => {
                info!(connection_id = conn, room_id, error = %err, "join rejected");
                fx.send_one(
                    conn,
                    ArenaEvent::JoinResult(JoinResult::Rejected {
                        message: err.to_string(),
                    }),
                );
                return Ok(());
            }
        };

        if let Some(previous) = joined.previous {
            self.announce_departure(previous, fx);
        }
        info!(connection_id = conn, room_id = %joined.room_id, "player joined room");

        fx.send_one(
            conn,
            ArenaEvent::JoinResult(JoinResult::Joined {
                room_id: joined.room_id.clone(),
                room_name: joined.room_name,
            }),
        );

        if !joined.rejoined {
            let room = self
                .registry
                .get_room(&joined.room_id)
                .ok_or(RoomError::RoomNotFound)?;
            fx.send_one(conn, ArenaEvent::NewUser(room.snapshot(conn, false)));
            if let Some(user) = room.user(conn) {
                fx.send(
                    room.member_ids(Some(conn)),
                    ArenaEvent::PlayerState(user.clone()),
                );
            }
            announce_team_scores(room, fx);
        }

        self.publish_rooms(fx);
        Ok(())
    }

    fn initialize_game(&mut self, conn: &str, fx: &mut Effects) -> Result<(), RoomError> {
        let room = self
            .registry
            .room_for(conn)
            .ok_or(RoomError::UnassignedConnection)?;
        fx.send_one(conn, ArenaEvent::NewUser(room.snapshot(conn, true)));
        Ok(())
    }

    fn update_coordinates(
        &mut self,
        conn: &str,
        report: PlayerReport,
        fx: &mut Effects,
    ) -> Result<(), RoomError> {
        let room = self.assigned_room(conn)?;
        let user = room
            .user_mut(conn)
            .ok_or(RoomError::UnassignedConnection)?;

        let score_changed = user.score != report.score;
        user.x = report.x;
        user.y = report.y;
        user.score = report.score;
        user.name = report.name;
        user.angle = report.angle;
        user.bullets = report.bullets;
        let state = user.clone();

        fx.send(room.member_ids(Some(conn)), ArenaEvent::PlayerState(state));
        if score_changed {
            announce_team_scores(room, fx);
        }
        Ok(())
    }

    fn keystroke_state(
        &mut self,
        conn: &str,
        state: String,
        fx: &mut Effects,
    ) -> Result<(), RoomError> {
        let room = self.assigned_room(conn)?;
        if room.set_keystrokes(conn, &state) {
            fx.send(
                room.member_ids(Some(conn)),
                ArenaEvent::KeystrokeUpdate {
                    id: conn.to_string(),
                    state,
                },
            );
        }
        Ok(())
    }

    // Resizes the shared playfield; rooms created later place their coin inside it.
    fn resize_playfield(&mut self, conn: &str, width: f32, height: f32) -> Result<(), RoomError> {
        let valid = |v: f32| v.is_finite() && v > 0.0;
        if !valid(width) || !valid(height) {
            return Err(RoomError::InvalidDimensions);
        }
        self.bounds = Bounds { width, height };
        self.registry.set_bounds(self.bounds);
        info!(connection_id = conn, width, height, "playfield resized");
        Ok(())
    }

    fn shot(&mut self, conn: &str, fx: &mut Effects) -> Result<(), RoomError> {
        let room = self.assigned_room(conn)?;
        fx.send(room.member_ids(Some(conn)), ArenaEvent::OtherShot);
        Ok(())
    }

    fn update_coin(&mut self, conn: &str, coin: Point, fx: &mut Effects) -> Result<(), RoomError> {
        let credit = self.tuning.coin_credit;
        let room = self.assigned_room(conn)?;
        let user = room
            .user_mut(conn)
            .ok_or(RoomError::UnassignedConnection)?;
        user.coin_score = user.coin_score.saturating_add(credit);
        room.coin = coin;

        fx.send(room.member_ids(Some(conn)), ArenaEvent::CoinChanged(coin));
        Ok(())
    }

    fn collision(
        &mut self,
        conn: &str,
        bullet_user_id: String,
        bullet_index: u32,
        target_id: &str,
        fx: &mut Effects,
    ) -> Result<(), RoomError> {
        let penalty = self.tuning.collision_penalty;
        let room = self.assigned_room(conn)?;
        let target = room
            .user_mut(target_id)
            .ok_or(RoomError::StaleReference)?;
        target.score = target.score.saturating_sub(penalty).max(0);

        fx.send(
            room.member_ids(None),
            ArenaEvent::OtherCollision {
                bullet_user_id,
                bullet_index,
                exploded_user_id: target_id.to_string(),
            },
        );
        announce_team_scores(room, fx);
        Ok(())
    }

    fn spawn_asteroid_split(
        &mut self,
        conn: &str,
        request: SplitRequest,
        fx: &mut Effects,
    ) -> Result<(), RoomError> {
        let now = self.clock.now_epoch_millis();
        let id = self.next_id("ast");
        let room = self
            .registry
            .room_for_mut(conn)
            .ok_or(RoomError::UnassignedConnection)?;

        match self.asteroids.split(room, id, request, now) {
            Some(asteroid) => {
                fx.send(room.member_ids(None), ArenaEvent::NewAsteroid(asteroid));
            }
            None => debug!(connection_id = conn, "split produced no fragment"),
        }
        Ok(())
    }

    // Shared by bullet kills and ship collisions; only the reported totals differ.
    #[allow(clippy::too_many_arguments)]
    fn asteroid_destroyed(
        &mut self,
        conn: &str,
        asteroid_id: &str,
        new_score: i64,
        asteroids_destroyed: Option<u32>,
        coin_score: i64,
        by_ship: bool,
        fx: &mut Effects,
    ) -> Result<(), RoomError> {
        let room = self
            .registry
            .room_for_mut(conn)
            .ok_or(RoomError::UnassignedConnection)?;
        if !room.contains(conn) {
            return Err(RoomError::UnassignedConnection);
        }
        self.asteroids.destroy(room, asteroid_id)?;

        let user = room
            .user_mut(conn)
            .ok_or(RoomError::UnassignedConnection)?;
        user.score = new_score;
        user.coin_score = coin_score;
        if let Some(count) = asteroids_destroyed {
            user.asteroids_destroyed = count;
        }
        let hit = AsteroidHit {
            asteroid_id: asteroid_id.to_string(),
            player_id: conn.to_string(),
            new_score: user.score,
            asteroids_destroyed: user.asteroids_destroyed,
            coin_score: user.coin_score,
            by_ship,
        };

        fx.send(room.member_ids(Some(conn)), ArenaEvent::AsteroidHit(hit));
        announce_team_scores(room, fx);
        Ok(())
    }

    fn get_asteroids(&mut self, conn: &str, fx: &mut Effects) -> Result<(), RoomError> {
        let now = self.clock.now_epoch_millis();
        let room = self
            .registry
            .room_for(conn)
            .ok_or(RoomError::UnassignedConnection)?;
        fx.send_one(
            conn,
            ArenaEvent::InitialAsteroids(self.asteroids.snapshot(room, now)),
        );
        Ok(())
    }

    fn collect_powerup(
        &mut self,
        conn: &str,
        powerup_id: &str,
        fx: &mut Effects,
    ) -> Result<(), RoomError> {
        let now = self.clock.now_epoch_millis();
        let effect_duration = self.powerups.tuning().effect_duration;
        let room = self
            .registry
            .room_for_mut(conn)
            .ok_or(RoomError::UnassignedConnection)?;

        let collected = self.powerups.collect(room, conn, powerup_id, now)?;
        let kind = collected.powerup.kind;
        info!(connection_id = conn, powerup_id, kind = kind.as_str(), "powerup collected");

        fx.cancel(TimerKey::PowerupExpiry(powerup_id.to_string()));
        fx.schedule(
            effect_duration,
            TimerEvent::PlayerPowerupExpired {
                room_id: room.id().to_string(),
                connection_id: conn.to_string(),
                kind,
                expires_at: collected.expires_at,
            },
        );
        fx.send(
            room.member_ids(None),
            ArenaEvent::PowerupCollected {
                powerup_id: powerup_id.to_string(),
                player_id: conn.to_string(),
                kind,
                expires_at: collected.expires_at,
            },
        );
        Ok(())
    }

    fn asteroid_tick(&mut self, room_id: &str, fx: &mut Effects) -> Result<(), RoomError> {
        let now = self.clock.now_epoch_millis();
        let id = self.next_id("ast");
        let interval = self.asteroids.tuning().spawn_interval;
        let room = self
            .registry
            .get_room_mut(room_id)
            .ok_or(RoomError::StaleReference)?;

        let swept = self.asteroids.sweep(room, self.bounds, now);
        if !swept.is_empty() {
            debug!(room_id, count = swept.len(), "swept stale asteroids");
        }
        if let Some(asteroid) =
            self.asteroids
                .spawn_from_edge(room, id, self.bounds, now, &mut self.rng)
        {
            fx.send(room.member_ids(None), ArenaEvent::NewAsteroid(asteroid));
        }

        fx.schedule(
            interval,
            TimerEvent::AsteroidSpawnerTick {
                room_id: room_id.to_string(),
            },
        );
        Ok(())
    }

    fn powerup_tick(&mut self, room_id: &str, fx: &mut Effects) -> Result<(), RoomError> {
        let now = self.clock.now_epoch_millis();
        let id = self.next_id("pow");
        let interval = self.powerups.tuning().spawn_interval;
        let lifetime = self.powerups.tuning().lifetime;
        let room = self
            .registry
            .get_room_mut(room_id)
            .ok_or(RoomError::StaleReference)?;

        if let Some(powerup) = self
            .powerups
            .spawn(room, id, self.bounds, now, &mut self.rng)
        {
            fx.schedule(
                lifetime,
                TimerEvent::PowerupExpired {
                    room_id: room_id.to_string(),
                    powerup_id: powerup.id.clone(),
                },
            );
            fx.send(room.member_ids(None), ArenaEvent::PowerupSpawned(powerup));
        }

        fx.schedule(
            interval,
            TimerEvent::PowerupSpawnerTick {
                room_id: room_id.to_string(),
            },
        );
        Ok(())
    }

    fn powerup_expired(
        &mut self,
        room_id: &str,
        powerup_id: &str,
        fx: &mut Effects,
    ) -> Result<(), RoomError> {
        let room = self
            .registry
            .get_room_mut(room_id)
            .ok_or(RoomError::StaleReference)?;
        let powerup = self.powerups.expire(room, powerup_id)?;
        fx.send(
            room.member_ids(None),
            ArenaEvent::PowerupExpired { id: powerup.id },
        );
        Ok(())
    }

    fn player_powerup_expired(
        &mut self,
        room_id: &str,
        connection_id: ConnectionId,
        kind: PowerupKind,
        expires_at: u64,
        fx: &mut Effects,
    ) -> Result<(), RoomError> {
        let room = self
            .registry
            .get_room_mut(room_id)
            .ok_or(RoomError::StaleReference)?;
        self.powerups
            .deactivate(room, &connection_id, kind, expires_at)?;
        fx.send(
            room.member_ids(None),
            ArenaEvent::PlayerPowerupExpired {
                player_id: connection_id,
                kind,
            },
        );
        Ok(())
    }

    fn assigned_room(&mut self, conn: &str) -> Result<&mut Room, RoomError> {
        self.registry
            .room_for_mut(conn)
            .ok_or(RoomError::UnassignedConnection)
    }

    fn announce_departure(&mut self, departure: Departure, fx: &mut Effects) {
        let Departure {
            room_id,
            user,
            room_destroyed,
        } = departure;

        if room_destroyed {
            cancel_spawners(&room_id, fx);
            fx.cancel(TimerKey::RoomIdle(room_id));
            return;
        }
        if let Some(room) = self.registry.get_room(&room_id) {
            fx.send(
                room.member_ids(None),
                ArenaEvent::UserDisconnected {
                    id: user.connection_id,
                },
            );
            announce_team_scores(room, fx);
        }
    }

    fn publish_rooms(&self, fx: &mut Effects) {
        fx.send(
            self.connections.iter().cloned().collect(),
            ArenaEvent::AvailableRooms(self.registry.list_rooms()),
        );
    }

    fn schedule_spawners(&self, room_id: &str, fx: &mut Effects) {
        fx.schedule(
            self.asteroids.tuning().spawn_interval,
            TimerEvent::AsteroidSpawnerTick {
                room_id: room_id.to_string(),
            },
        );
        fx.schedule(
            self.powerups.tuning().spawn_interval,
            TimerEvent::PowerupSpawnerTick {
                room_id: room_id.to_string(),
            },
        );
    }

    fn next_id(&mut self, prefix: &str) -> String {
        self.next_entity_id += 1;
        format!("{prefix}-{}", self.next_entity_id)
    }
}

fn cancel_spawners(room_id: &str, fx: &mut Effects) {
    fx.cancel(TimerKey::AsteroidSpawner(room_id.to_string()));
    fx.cancel(TimerKey::PowerupSpawner(room_id.to_string()));
}

fn announce_team_scores(room: &Room, fx: &mut Effects) {
    if room.has_teams() {
        fx.send(
            room.member_ids(None),
            ArenaEvent::TeamScores(room.team_scores()),
        );
    }
}

/// Trims and truncates a client-supplied name. Blank input yields `None`.
fn sanitize_name(raw: Option<&str>, max_len: usize) -> Option<String> {
    let trimmed = raw?.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.chars().take(max_len).collect())
}
