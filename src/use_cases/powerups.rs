// Powerup lifecycle inside a room: spawned -> collected | expired, plus per-player effects.

use crate::domain::tuning::PowerupTuning;
use crate::domain::{ActivePowerup, Bounds, Powerup, PowerupKind};
use crate::use_cases::errors::RoomError;
use crate::use_cases::room::Room;
use rand::Rng;
use rand::seq::SliceRandom;

/// A successful pickup.
#[derive(Debug, Clone, PartialEq)]
pub struct Collected {
    pub powerup: Powerup,
    /// Absolute epoch milliseconds at which the collector's effect ends.
    pub expires_at: u64,
}

#[derive(Debug, Clone)]
pub struct PowerupSystem {
    tuning: PowerupTuning,
}

impl PowerupSystem {
    pub fn new(tuning: PowerupTuning) -> Self {
        Self { tuning }
    }

    pub fn tuning(&self) -> &PowerupTuning {
        &self.tuning
    }

    /// Spawner tick: places a powerup of uniformly random type.
    ///
    /// Nothing spawns in an empty room or once `max_live` powerups are waiting.
    pub fn spawn<R: Rng + ?Sized>(
        &self,
        room: &mut Room,
        id: String,
        bounds: Bounds,
        now: u64,
        rng: &mut R,
    ) -> Option<Powerup> {
        if room.is_empty() || room.powerup_count() >= self.tuning.max_live {
            return None;
        }
        let kind = *PowerupKind::ALL.choose(rng)?;
        let at = bounds.random_point(self.tuning.spawn_margin, rng);
        let powerup = Powerup {
            id,
            kind,
            x: at.x,
            y: at.y,
            created_at: now,
        };
        room.insert_powerup(powerup.clone());
        Some(powerup)
    }

    /// Lifetime ran out. Stale if the powerup was already collected.
    pub fn expire(&self, room: &mut Room, powerup_id: &str) -> Result<Powerup, RoomError> {
        room.remove_powerup(powerup_id)
            .ok_or(RoomError::StaleReference)
    }

    /// First writer wins: only the request that still finds the powerup gets the effect.
    pub fn collect(
        &self,
        room: &mut Room,
        connection_id: &str,
        powerup_id: &str,
        now: u64,
    ) -> Result<Collected, RoomError> {
        if !room.contains(connection_id) {
            return Err(RoomError::UnassignedConnection);
        }
        let powerup = room
            .remove_powerup(powerup_id)
            .ok_or(RoomError::StaleReference)?;

        let expires_at = now + self.tuning.effect_duration.as_millis() as u64;
        if let Some(user) = room.user_mut(connection_id) {
            user.active_powerups.insert(
                powerup.kind,
                ActivePowerup {
                    active: true,
                    expires_at,
                },
            );
        }

        Ok(Collected {
            powerup,
            expires_at,
        })
    }

    /// Ends a player's effect if it is still the one scheduled for `expires_at`.
    ///
    /// Renewed effects and departed players make this a stale no-op.
    pub fn deactivate(
        &self,
        room: &mut Room,
        connection_id: &str,
        kind: PowerupKind,
        expires_at: u64,
    ) -> Result<(), RoomError> {
        let user = room
            .user_mut(connection_id)
            .ok_or(RoomError::StaleReference)?;
        match user.active_powerups.get(&kind) {
            Some(effect) if effect.expires_at == expires_at => {
                user.active_powerups.remove(&kind);
                Ok(())
            }
            _ => Err(RoomError::StaleReference),
        }
    }
}
