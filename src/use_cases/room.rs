// Per-room mutable state. Rooms are owned by the registry and only touched from the hub task.

use crate::domain::{Asteroid, ConnectionId, Point, Powerup, RoomId, UserState};
use crate::use_cases::types::RoomSnapshot;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug)]
pub struct Room {
    id: RoomId,
    name: String,
    /// `None` means unbounded (the main room).
    max_players: Option<usize>,
    /// Creation order, used to keep room listings stable.
    seq: u64,
    pub coin: Point,
    users: BTreeMap<ConnectionId, UserState>,
    keystrokes: HashMap<ConnectionId, String>,
    asteroids: HashMap<String, Asteroid>,
    powerups: HashMap<String, Powerup>,
}

impl Room {
    pub fn new(id: RoomId, name: String, max_players: Option<usize>, seq: u64, coin: Point) -> Self {
        Self {
            id,
            name,
            max_players,
            seq,
            coin,
            users: BTreeMap::new(),
            keystrokes: HashMap::new(),
            asteroids: HashMap::new(),
            powerups: HashMap::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn max_players(&self) -> Option<usize> {
        self.max_players
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn player_count(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.max_players
            .is_some_and(|max| self.users.len() >= max)
    }

    pub fn contains(&self, connection_id: &str) -> bool {
        self.users.contains_key(connection_id)
    }

    pub fn users(&self) -> impl Iterator<Item = &UserState> {
        self.users.values()
    }

    pub fn user(&self, connection_id: &str) -> Option<&UserState> {
        self.users.get(connection_id)
    }

    pub fn user_mut(&mut self, connection_id: &str) -> Option<&mut UserState> {
        self.users.get_mut(connection_id)
    }

    /// Connection ids of every member, optionally leaving one out.
    pub fn member_ids(&self, except: Option<&str>) -> Vec<ConnectionId> {
        self.users
            .keys()
            .filter(|id| Some(id.as_str()) != except)
            .cloned()
            .collect()
    }

    /// Adds a player with its initial keystroke state.
    pub fn admit(&mut self, user: UserState, keystrokes: &str) {
        self.keystrokes
            .insert(user.connection_id.clone(), keystrokes.to_string());
        self.users.insert(user.connection_id.clone(), user);
    }

    /// Removes a player and its keystroke entry. Removing an absent player is a no-op.
    pub fn remove_user(&mut self, connection_id: &str) -> Option<UserState> {
        self.keystrokes.remove(connection_id);
        self.users.remove(connection_id)
    }

    pub fn keystrokes(&self, connection_id: &str) -> Option<&str> {
        self.keystrokes.get(connection_id).map(String::as_str)
    }

    /// Stores a member's keystroke state. Returns true if it differs from the stored one.
    pub fn set_keystrokes(&mut self, connection_id: &str, state: &str) -> bool {
        if !self.users.contains_key(connection_id) {
            return false;
        }
        match self.keystrokes.get_mut(connection_id) {
            Some(current) if current == state => false,
            Some(current) => {
                state.clone_into(current);
                true
            }
            None => {
                self.keystrokes
                    .insert(connection_id.to_string(), state.to_string());
                true
            }
        }
    }

    pub fn asteroid_count(&self) -> usize {
        self.asteroids.len()
    }

    pub fn asteroids(&self) -> impl Iterator<Item = &Asteroid> {
        self.asteroids.values()
    }

    pub fn asteroid(&self, asteroid_id: &str) -> Option<&Asteroid> {
        self.asteroids.get(asteroid_id)
    }

    pub fn insert_asteroid(&mut self, asteroid: Asteroid) {
        self.asteroids.insert(asteroid.id.clone(), asteroid);
    }

    pub fn remove_asteroid(&mut self, asteroid_id: &str) -> Option<Asteroid> {
        self.asteroids.remove(asteroid_id)
    }

    /// Drops every asteroid matching `expired`, returning the removed ids.
    pub fn retain_asteroids(&mut self, mut expired: impl FnMut(&Asteroid) -> bool) -> Vec<String> {
        let ids: Vec<String> = self
            .asteroids
            .values()
            .filter(|a| expired(a))
            .map(|a| a.id.clone())
            .collect();
        for id in &ids {
            self.asteroids.remove(id);
        }
        ids
    }

    pub fn powerup_count(&self) -> usize {
        self.powerups.len()
    }

    pub fn powerups(&self) -> impl Iterator<Item = &Powerup> {
        self.powerups.values()
    }

    pub fn insert_powerup(&mut self, powerup: Powerup) {
        self.powerups.insert(powerup.id.clone(), powerup);
    }

    pub fn remove_powerup(&mut self, powerup_id: &str) -> Option<Powerup> {
        self.powerups.remove(powerup_id)
    }

    /// Sum of member scores per team. Members without a team are skipped.
    pub fn team_scores(&self) -> BTreeMap<String, i64> {
        let mut scores = BTreeMap::new();
        for user in self.users.values() {
            if let Some(team) = &user.team {
                let total = scores.entry(team.clone()).or_insert(0i64);
                *total = total.saturating_add(user.score);
            }
        }
        scores
    }

    pub fn has_teams(&self) -> bool {
        self.users.values().any(|u| u.team.is_some())
    }

    /// Scene snapshot for `connection_id`. `include_self` decides whether the caller's own
    /// entry appears in `others`.
    pub fn snapshot(&self, connection_id: &str, include_self: bool) -> RoomSnapshot {
        let others = self
            .users
            .iter()
            .filter(|(id, _)| include_self || id.as_str() != connection_id)
            .map(|(id, user)| (id.clone(), user.clone()))
            .collect();

        let mut powerups: Vec<Powerup> = self.powerups.values().cloned().collect();
        powerups.sort_by_key(|p| p.created_at);

        RoomSnapshot {
            connection_id: connection_id.to_string(),
            coin: self.coin,
            others,
            room_id: self.id.clone(),
            room_name: self.name.clone(),
            powerups,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room() -> Room {
        Room::new(
            "r1".to_string(),
            "Test".to_string(),
            Some(2),
            1,
            Point::new(10.0, 10.0),
        )
    }

    fn player(id: &str, team: Option<&str>, score: i64) -> UserState {
        let mut user = UserState::spawn(
            id.to_string(),
            id.to_uppercase(),
            team.map(str::to_string),
            Point::new(100.0, 100.0),
        );
        user.score = score;
        user
    }

    #[test]
    fn when_room_reaches_capacity_then_it_reports_full() {
        let mut room = room();
        room.admit(player("a", None, 0), "00000");
        assert!(!room.is_full());

        room.admit(player("b", None, 0), "00000");

        assert!(room.is_full());
        assert_eq!(room.player_count(), 2);
    }

    #[test]
    fn when_capacity_is_unbounded_then_room_is_never_full() {
        let mut room = Room::new("main".into(), "Main".into(), None, 0, Point::default());
        for i in 0..50 {
            room.admit(player(&format!("p{i}"), None, 0), "00000");
        }
        assert!(!room.is_full());
    }

    #[test]
    fn when_user_is_removed_then_keystrokes_go_with_it() {
        let mut room = room();
        room.admit(player("a", None, 0), "00000");

        assert!(room.remove_user("a").is_some());
        assert!(room.keystrokes("a").is_none());
        // Second removal is a no-op.
        assert!(room.remove_user("a").is_none());
    }

    #[test]
    fn when_keystrokes_are_unchanged_then_no_change_is_reported() {
        let mut room = room();
        room.admit(player("a", None, 0), "00000");

        assert!(!room.set_keystrokes("a", "00000"));
        assert!(room.set_keystrokes("a", "10001"));
        assert!(!room.set_keystrokes("a", "10001"));
        assert_eq!(room.keystrokes("a"), Some("10001"));
    }

    #[test]
    fn when_sender_is_not_a_member_then_keystrokes_are_not_stored() {
        let mut room = room();
        assert!(!room.set_keystrokes("ghost", "10000"));
        assert!(room.keystrokes("ghost").is_none());
    }

    #[test]
    fn when_players_have_teams_then_scores_are_summed_per_team() {
        let mut room = Room::new("main".into(), "Main".into(), None, 0, Point::default());
        room.admit(player("a", Some("red"), 10), "00000");
        room.admit(player("b", Some("red"), 4), "00000");
        room.admit(player("c", Some("blue"), 7), "00000");
        room.admit(player("d", None, 100), "00000");

        let scores = room.team_scores();

        assert_eq!(scores.get("red"), Some(&14));
        assert_eq!(scores.get("blue"), Some(&7));
        assert_eq!(scores.len(), 2);
    }

    #[test]
    fn when_team_scores_are_extreme_then_sum_saturates() {
        let mut room = room();
        room.admit(player("a", Some("red"), i64::MAX), "00000");
        room.admit(player("b", Some("red"), i64::MAX), "00000");

        assert_eq!(room.team_scores().get("red"), Some(&i64::MAX));
    }

    #[test]
    fn when_snapshot_excludes_self_then_only_other_members_are_listed() {
        let mut room = room();
        room.admit(player("a", None, 0), "00000");
        room.admit(player("b", None, 0), "00000");

        let without = room.snapshot("a", false);
        let with = room.snapshot("a", true);

        assert_eq!(without.others.keys().collect::<Vec<_>>(), vec!["b"]);
        assert_eq!(with.others.len(), 2);
        assert_eq!(with.connection_id, "a");
    }
}
