// Asteroid lifecycle inside a room: spawned -> tracked -> destroyed | expired.

use crate::domain::orbit::random_edge_orbit;
use crate::domain::tuning::AsteroidTuning;
use crate::domain::{Asteroid, AsteroidSize, Bounds};
use crate::use_cases::errors::RoomError;
use crate::use_cases::room::Room;
use crate::use_cases::types::SplitRequest;
use rand::Rng;

#[derive(Debug, Clone)]
pub struct AsteroidSystem {
    tuning: AsteroidTuning,
}

impl AsteroidSystem {
    pub fn new(tuning: AsteroidTuning) -> Self {
        Self { tuning }
    }

    pub fn tuning(&self) -> &AsteroidTuning {
        &self.tuning
    }

    /// Spawner tick: launches a large asteroid from a random edge.
    ///
    /// Nothing spawns in an empty room or once the room holds `max_live` asteroids.
    pub fn spawn_from_edge<R: Rng + ?Sized>(
        &self,
        room: &mut Room,
        id: String,
        bounds: Bounds,
        now: u64,
        rng: &mut R,
    ) -> Option<Asteroid> {
        if room.is_empty() || room.asteroid_count() >= self.tuning.max_live {
            return None;
        }
        let orbit = random_edge_orbit(bounds, &self.tuning, rng);
        let asteroid = Asteroid::new(id, AsteroidSize::Large, orbit, now);
        room.insert_asteroid(asteroid.clone());
        Some(asteroid)
    }

    /// Registers one fragment of a destroyed asteroid. The fragment is one size below
    /// the parent; small parents leave no fragments, and nothing is added once the room
    /// tracks `max_tracked` asteroids.
    pub fn split(
        &self,
        room: &mut Room,
        id: String,
        request: SplitRequest,
        now: u64,
    ) -> Option<Asteroid> {
        let size = request.parent_size.next_smaller()?;
        if room.asteroid_count() >= self.tuning.max_tracked {
            return None;
        }
        let mut asteroid = Asteroid::new(id, size, request.orbit, now);
        asteroid.x = request.x;
        asteroid.y = request.y;
        asteroid.vx = request.vx;
        asteroid.vy = request.vy;
        room.insert_asteroid(asteroid.clone());
        Some(asteroid)
    }

    /// Stops tracking an asteroid. A second removal of the same id is a stale reference.
    pub fn destroy(&self, room: &mut Room, asteroid_id: &str) -> Result<Asteroid, RoomError> {
        room.remove_asteroid(asteroid_id)
            .ok_or(RoomError::StaleReference)
    }

    /// Drops asteroids older than the timeout whose derived position has left the playfield,
    /// and any asteroid older than `max_age`.
    pub fn sweep(&self, room: &mut Room, bounds: Bounds, now: u64) -> Vec<String> {
        let timeout = self.tuning.timeout.as_millis() as u64;
        let max_age = self.tuning.max_age.as_millis() as u64;
        let margin = self.tuning.offscreen_margin;
        room.retain_asteroids(|asteroid| {
            let age = asteroid.age_millis(now);
            age >= max_age
                || (age >= timeout
                    && !bounds.contains_with_margin(asteroid.position_at(now), margin))
        })
    }

    /// Tracked asteroids with positions derived at `now`, oldest first.
    pub fn snapshot(&self, room: &Room, now: u64) -> Vec<Asteroid> {
        let mut asteroids: Vec<Asteroid> =
            room.asteroids().map(|a| a.materialized(now)).collect();
        asteroids.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        asteroids
    }
}
