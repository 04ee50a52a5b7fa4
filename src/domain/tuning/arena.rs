/// Gameplay tuning for players, the coin and room defaults.

#[derive(Debug, Clone)]
pub struct ArenaTuning {
    /// Minimum distance from the playfield edge for spawns and the coin.
    pub spawn_margin: f32,

    /// Points added to `coin_score` per reported coin pickup.
    pub coin_credit: i64,

    /// Points removed from a player's score when a bullet hits them.
    pub collision_penalty: i64,

    /// Keystroke bit-string assigned on join (all keys released).
    pub idle_keystrokes: &'static str,

    /// Display name used when a client joins without one.
    pub default_player_name: &'static str,

    /// Longest accepted display name, in characters.
    pub max_player_name_len: usize,

    /// Longest accepted room name, in characters.
    pub max_room_name_len: usize,

    /// Capacity assigned to a custom room when the request omits it.
    pub default_max_players: usize,

    /// Smallest and largest custom room capacity accepted.
    pub min_max_players: usize,
    pub max_max_players: usize,
}

impl Default for ArenaTuning {
    fn default() -> Self {
        Self {
            spawn_margin: 50.0,
            coin_credit: 5,
            collision_penalty: 2,
            idle_keystrokes: "00000",
            default_player_name: "Pilot",
            max_player_name_len: 20,
            max_room_name_len: 24,
            default_max_players: 4,
            min_max_players: 2,
            max_max_players: 16,
        }
    }
}
