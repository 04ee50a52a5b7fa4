// Room registry: owns every room and the connection -> room assignment.

use crate::domain::tuning::ArenaTuning;
use crate::domain::{Bounds, ConnectionId, RoomId, UserState};
use crate::use_cases::errors::RoomError;
use crate::use_cases::room::Room;
use crate::use_cases::types::RoomSummary;
use rand::Rng;
use std::collections::HashMap;
use tracing::{debug, info};

/// Id of the persistent default room.
pub const MAIN_ROOM_ID: &str = "main";
const MAIN_ROOM_NAME: &str = "Main Arena";
const ROOM_ID_LEN: usize = 8;

/// Where a connection was before a join or disconnect removed it.
#[derive(Debug, Clone, PartialEq)]
pub struct Departure {
    pub room_id: RoomId,
    pub user: UserState,
    /// The room was a custom room and this departure emptied it.
    pub room_destroyed: bool,
}

/// Successful join outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct Joined {
    pub room_id: RoomId,
    pub room_name: String,
    /// Set when the connection switched rooms.
    pub previous: Option<Departure>,
    /// The connection was already a member of the target room.
    pub rejoined: bool,
}

/// Single-owner registry for rooms. Not shared across tasks; the hub task owns it.
#[derive(Debug)]
pub struct RoomRegistry {
    /// Playfield used for coin placement in new rooms.
    bounds: Bounds,
    /// Margin kept between the coin and the playfield edge.
    coin_margin: f32,
    /// Keystroke state every member starts with.
    idle_keystrokes: &'static str,
    /// Map of room id to room.
    rooms: HashMap<RoomId, Room>,
    /// Which room each connection currently belongs to.
    assignments: HashMap<ConnectionId, RoomId>,
    next_seq: u64,
}

impl RoomRegistry {
    /// Creates a registry holding only the main room.
    pub fn new<R: Rng + ?Sized>(bounds: Bounds, tuning: &ArenaTuning, rng: &mut R) -> Self {
        let coin_margin = tuning.spawn_margin;
        let main = Room::new(
            MAIN_ROOM_ID.to_string(),
            MAIN_ROOM_NAME.to_string(),
            None,
            0,
            bounds.random_point(coin_margin, rng),
        );
        let mut rooms = HashMap::new();
        rooms.insert(MAIN_ROOM_ID.to_string(), main);

        Self {
            bounds,
            coin_margin,
            idle_keystrokes: tuning.idle_keystrokes,
            rooms,
            assignments: HashMap::new(),
            next_seq: 1,
        }
    }

    /// Creates a custom room with a fresh short id and a random coin.
    pub fn create_room<R: Rng + ?Sized>(
        &mut self,
        name: String,
        max_players: usize,
        rng: &mut R,
    ) -> &Room {
        let room_id = loop {
            let candidate = short_room_id();
            if !self.rooms.contains_key(&candidate) {
                break candidate;
            }
        };

        let room = Room::new(
            room_id.clone(),
            name,
            Some(max_players),
            self.next_seq,
            self.bounds.random_point(self.coin_margin, rng),
        );
        self.next_seq += 1;

        info!(room_id = %room_id, name = %room.name(), max_players, "room created");
        self.rooms.entry(room_id).or_insert(room)
    }

    pub fn set_bounds(&mut self, bounds: Bounds) {
        self.bounds = bounds;
    }

    /// Looks up a room by id. The main room always resolves.
    pub fn get_room(&self, room_id: &str) -> Option<&Room> {
        self.rooms.get(room_id)
    }

    pub fn get_room_mut(&mut self, room_id: &str) -> Option<&mut Room> {
        self.rooms.get_mut(room_id)
    }

    /// Current listing, main room first, then custom rooms in creation order.
    pub fn list_rooms(&self) -> Vec<RoomSummary> {
        let mut rooms: Vec<&Room> = self.rooms.values().collect();
        rooms.sort_by_key(|room| room.seq());
        rooms
            .into_iter()
            .map(|room| RoomSummary {
                id: room.id().to_string(),
                name: room.name().to_string(),
                player_count: room.player_count(),
                max_players: room.max_players(),
            })
            .collect()
    }

    /// Room the connection is assigned to, if any.
    pub fn room_of(&self, connection_id: &str) -> Option<&RoomId> {
        self.assignments.get(connection_id)
    }

    pub fn room_for(&self, connection_id: &str) -> Option<&Room> {
        let room_id = self.assignments.get(connection_id)?;
        self.rooms.get(room_id)
    }

    pub fn room_for_mut(&mut self, connection_id: &str) -> Option<&mut Room> {
        let room_id = self.assignments.get(connection_id)?;
        self.rooms.get_mut(room_id)
    }

    /// Number of connections assigned to `room_id`.
    pub fn assigned_count(&self, room_id: &str) -> usize {
        self.assignments
            .values()
            .filter(|assigned| assigned.as_str() == room_id)
            .count()
    }

    /// Moves `user` into `room_id`, leaving whatever room it was in before.
    ///
    /// Capacity is checked before the old room is touched, so a rejected join leaves both
    /// rooms unchanged.
    pub fn join_room(&mut self, room_id: &str, user: UserState) -> Result<Joined, RoomError> {
        let connection_id = user.connection_id.clone();
        let target = self.rooms.get_mut(room_id).ok_or(RoomError::RoomNotFound)?;

        if target.contains(&connection_id) {
            // Same room: keep the slot and refresh the identity fields.
            if let Some(existing) = target.user_mut(&connection_id) {
                existing.name = user.name;
                existing.team = user.team;
            }
            return Ok(Joined {
                room_id: target.id().to_string(),
                room_name: target.name().to_string(),
                previous: None,
                rejoined: true,
            });
        }

        if target.is_full() {
            return Err(RoomError::RoomFull);
        }

        let previous = self.leave(&connection_id);

        // The target cannot have been the departed room, so it still exists.
        let target = self.rooms.get_mut(room_id).ok_or(RoomError::RoomNotFound)?;
        target.admit(user, self.idle_keystrokes);
        let joined = Joined {
            room_id: target.id().to_string(),
            room_name: target.name().to_string(),
            previous,
            rejoined: false,
        };
        self.assignments
            .insert(connection_id.clone(), joined.room_id.clone());

        debug!(connection_id = %connection_id, room_id = %joined.room_id, "connection assigned");
        Ok(joined)
    }

    /// Removes the connection from its room, destroying the room if it is now an empty
    /// custom room. Returns `None` if the connection was unassigned.
    pub fn leave(&mut self, connection_id: &str) -> Option<Departure> {
        let room_id = self.assignments.remove(connection_id)?;
        let room = self.rooms.get_mut(&room_id)?;
        let user = room.remove_user(connection_id)?;

        let room_destroyed = self.remove_if_idle(&room_id);
        Some(Departure {
            room_id,
            user,
            room_destroyed,
        })
    }

    /// Destroys `room_id` if it is an empty custom room. Safe to call repeatedly.
    pub fn remove_if_idle(&mut self, room_id: &str) -> bool {
        if room_id == MAIN_ROOM_ID {
            return false;
        }
        let idle = self.rooms.get(room_id).is_some_and(Room::is_empty);
        if idle {
            self.rooms.remove(room_id);
            info!(room_id, "room destroyed");
        }
        idle
    }

    /// Ids of all live rooms.
    pub fn room_ids(&self) -> Vec<RoomId> {
        self.rooms.keys().cloned().collect()
    }
}

fn short_room_id() -> RoomId {
    let mut id = uuid::Uuid::new_v4().simple().to_string();
    id.truncate(ROOM_ID_LEN);
    id
}
