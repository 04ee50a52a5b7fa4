// Wire protocol DTOs and conversions for the arena websocket.
// Every frame is `{"event": <name>, "data": <payload>}`; `data` is absent for bare events.

use crate::domain::{
    ActivePowerup, Asteroid, AsteroidSize, BulletState, OrbitParams, Point, Powerup,
    PowerupKind, UserState, Wobble,
};
use crate::use_cases::{
    ArenaEvent, AsteroidHit, ClientRequest, JoinResult, PlayerReport, RoomSnapshot, RoomSummary,
    SplitRequest,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Messages the server sends to connected clients over the WebSocket.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerMessage {
    AvailableRooms(Vec<RoomSummaryDto>),
    ToNewUser(NewUserDto),
    RoomCreated(RoomCreatedDto),
    JoinRoomResult(JoinRoomResultDto),
    InitialAsteroids(Vec<AsteroidDto>),
    ToOthers(PlayerDto),
    KeystrokeUpdate { id: String, state: String },
    OtherShot,
    CoinChanged { coin: PointDto },
    OtherCollision {
        bullet_user_id: String,
        bullet_index: u32,
        exploded_user_id: String,
    },
    UserDisconnected { id: String },
    NewAsteroid(AsteroidDto),
    AsteroidHit(AsteroidHitDto),
    PowerupSpawned(PowerupDto),
    PowerupCollected(PowerupCollectedDto),
    PowerupExpired { id: String },
    PlayerPowerupExpired(PlayerPowerupExpiredDto),
    TeamScores { scores: BTreeMap<String, i64> },
}

/// Messages clients send, decoded from the `{event, data}` envelope.
#[derive(Debug, Clone)]
pub enum ClientMessage {
    CreateRoom(CreateRoomDto),
    JoinRoom(JoinRoomDto),
    UpdateCoordinates(CoordinatesDto),
    KeystrokeState(String),
    Shot,
    UpdateCoin(PointDto),
    Collision(CollisionDto),
    InitializeGame,
    SpawnAsteroid,
    SpawnAsteroidSplit(SplitDto),
    AsteroidDestroyed(AsteroidDestroyedDto),
    PlayerAsteroidCollision(PlayerAsteroidCollisionDto),
    GetAsteroids,
    RequestSpawnPowerup,
    CollectPowerup(CollectPowerupDto),
    UpdateScreenDimensions(ScreenDimensionsDto),
}

#[derive(Debug)]
pub enum ProtocolError {
    Json(serde_json::Error),
    UnknownEvent(String),
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::Json(e) => write!(f, "malformed message: {e}"),
            ProtocolError::UnknownEvent(name) => write!(f, "unknown event `{name}`"),
        }
    }
}

impl std::error::Error for ProtocolError {}

impl From<serde_json::Error> for ProtocolError {
    fn from(e: serde_json::Error) -> Self {
        ProtocolError::Json(e)
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    event: String,
    #[serde(default)]
    data: serde_json::Value,
}

impl ClientMessage {
    /// Decodes one text frame. Payloads of bare events (`shot`, `spawn_asteroid`, ...) are
    /// ignored.
    pub fn from_json(text: &str) -> Result<Self, ProtocolError> {
        let Envelope { event, data } = serde_json::from_str(text)?;
        let message = match event.as_str() {
            "create_room" => ClientMessage::CreateRoom(payload_or_default(data)?),
            "join_room" => ClientMessage::JoinRoom(payload(data)?),
            "update_coordinates" => ClientMessage::UpdateCoordinates(payload(data)?),
            "keystroke_state" => ClientMessage::KeystrokeState(payload(data)?),
            "shot" => ClientMessage::Shot,
            "update_coin" => ClientMessage::UpdateCoin(payload(data)?),
            "collision" => ClientMessage::Collision(payload(data)?),
            "initialize_game" => ClientMessage::InitializeGame,
            "spawn_asteroid" => ClientMessage::SpawnAsteroid,
            "spawn_asteroid_split" => ClientMessage::SpawnAsteroidSplit(payload(data)?),
            "asteroid_destroyed" => ClientMessage::AsteroidDestroyed(payload(data)?),
            "player_asteroid_collision" => {
                ClientMessage::PlayerAsteroidCollision(payload(data)?)
            }
            "get_asteroids" => ClientMessage::GetAsteroids,
            "request_spawn_powerup" => ClientMessage::RequestSpawnPowerup,
            "collect_powerup" => ClientMessage::CollectPowerup(payload(data)?),
            "update_screen_dimensions" => ClientMessage::UpdateScreenDimensions(payload(data)?),
            _ => return Err(ProtocolError::UnknownEvent(event)),
        };
        Ok(message)
    }
}

fn payload<T: DeserializeOwned>(data: serde_json::Value) -> Result<T, ProtocolError> {
    Ok(serde_json::from_value(data)?)
}

fn payload_or_default<T: DeserializeOwned + Default>(
    data: serde_json::Value,
) -> Result<T, ProtocolError> {
    if data.is_null() {
        return Ok(T::default());
    }
    payload(data)
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PointDto {
    pub x: f32,
    pub y: f32,
}

impl From<Point> for PointDto {
    fn from(p: Point) -> Self {
        Self { x: p.x, y: p.y }
    }
}

impl From<PointDto> for Point {
    fn from(p: PointDto) -> Self {
        Point::new(p.x, p.y)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomDto {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub max_players: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRoomDto {
    pub room_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub team: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulletDto {
    pub index: u32,
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub angle: f32,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub visible: bool,
}

impl From<BulletDto> for BulletState {
    fn from(b: BulletDto) -> Self {
        Self {
            index: b.index,
            x: b.x,
            y: b.y,
            angle: b.angle,
            active: b.active,
            visible: b.visible,
        }
    }
}

impl From<&BulletState> for BulletDto {
    fn from(b: &BulletState) -> Self {
        Self {
            index: b.index,
            x: b.x,
            y: b.y,
            angle: b.angle,
            active: b.active,
            visible: b.visible,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CoordinatesDto {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub angle: f32,
    #[serde(default)]
    pub bullets: Vec<BulletDto>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CollisionDto {
    pub bullet_user_id: String,
    #[serde(default)]
    pub bullet_index: u32,
    pub target_id: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AsteroidSizeDto {
    Large,
    Medium,
    Small,
}

impl From<AsteroidSize> for AsteroidSizeDto {
    fn from(size: AsteroidSize) -> Self {
        match size {
            AsteroidSize::Large => Self::Large,
            AsteroidSize::Medium => Self::Medium,
            AsteroidSize::Small => Self::Small,
        }
    }
}

impl From<AsteroidSizeDto> for AsteroidSize {
    fn from(size: AsteroidSizeDto) -> Self {
        match size {
            AsteroidSizeDto::Large => Self::Large,
            AsteroidSizeDto::Medium => Self::Medium,
            AsteroidSizeDto::Small => Self::Small,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct WobbleDto {
    pub amplitude: f32,
    pub frequency: f32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrbitParamsDto {
    pub start_x: f32,
    pub start_y: f32,
    pub vx: f32,
    pub vy: f32,
    #[serde(default)]
    pub curvature: f32,
    pub wobble: WobbleDto,
}

impl From<OrbitParams> for OrbitParamsDto {
    fn from(o: OrbitParams) -> Self {
        Self {
            start_x: o.start_x,
            start_y: o.start_y,
            vx: o.vx,
            vy: o.vy,
            curvature: o.curvature,
            wobble: WobbleDto {
                amplitude: o.wobble.amplitude,
                frequency: o.wobble.frequency,
            },
        }
    }
}

impl From<OrbitParamsDto> for OrbitParams {
    fn from(o: OrbitParamsDto) -> Self {
        Self {
            start_x: o.start_x,
            start_y: o.start_y,
            vx: o.vx,
            vy: o.vy,
            curvature: o.curvature,
            wobble: Wobble {
                amplitude: o.wobble.amplitude,
                frequency: o.wobble.frequency,
            },
        }
    }
}

/// Fragment request; `size` is the size of the asteroid that was destroyed.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitDto {
    pub size: AsteroidSizeDto,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub orbit_params: OrbitParamsDto,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AsteroidDestroyedDto {
    pub asteroid_id: String,
    pub new_score: i64,
    #[serde(default)]
    pub asteroids_destroyed: u32,
    #[serde(default)]
    pub coin_score: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerAsteroidCollisionDto {
    pub asteroid_id: String,
    pub new_score: i64,
    #[serde(default)]
    pub new_coin_score: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectPowerupDto {
    // `powerupType` is accepted but not read; the server knows each powerup's type.
    pub powerup_id: String,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ScreenDimensionsDto {
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PowerupTypeDto {
    Speed,
    Multi,
    Attract,
}

impl From<PowerupKind> for PowerupTypeDto {
    fn from(kind: PowerupKind) -> Self {
        match kind {
            PowerupKind::Speed => Self::Speed,
            PowerupKind::Multi => Self::Multi,
            PowerupKind::Attract => Self::Attract,
        }
    }
}

impl From<ClientMessage> for ClientRequest {
    fn from(message: ClientMessage) -> Self {
        match message {
            ClientMessage::CreateRoom(dto) => ClientRequest::CreateRoom {
                name: dto.name,
                max_players: dto.max_players,
            },
            ClientMessage::JoinRoom(dto) => ClientRequest::JoinRoom {
                room_id: dto.room_id,
                name: dto.name,
                team: dto.team,
            },
            ClientMessage::UpdateCoordinates(dto) => {
                ClientRequest::UpdateCoordinates(PlayerReport {
                    x: dto.x,
                    y: dto.y,
                    score: dto.score,
                    name: dto.name,
                    angle: dto.angle,
                    bullets: dto.bullets.into_iter().map(BulletState::from).collect(),
                })
            }
            ClientMessage::KeystrokeState(state) => ClientRequest::KeystrokeState(state),
            ClientMessage::Shot => ClientRequest::Shot,
            ClientMessage::UpdateCoin(coin) => ClientRequest::UpdateCoin(coin.into()),
            ClientMessage::Collision(dto) => ClientRequest::Collision {
                bullet_user_id: dto.bullet_user_id,
                bullet_index: dto.bullet_index,
                target_id: dto.target_id,
            },
            ClientMessage::InitializeGame => ClientRequest::InitializeGame,
            ClientMessage::SpawnAsteroid => ClientRequest::SpawnAsteroid,
            ClientMessage::SpawnAsteroidSplit(dto) => {
                ClientRequest::SpawnAsteroidSplit(SplitRequest {
                    parent_size: dto.size.into(),
                    x: dto.x,
                    y: dto.y,
                    vx: dto.vx,
                    vy: dto.vy,
                    orbit: dto.orbit_params.into(),
                })
            }
            ClientMessage::AsteroidDestroyed(dto) => ClientRequest::AsteroidDestroyed {
                asteroid_id: dto.asteroid_id,
                new_score: dto.new_score,
                asteroids_destroyed: dto.asteroids_destroyed,
                coin_score: dto.coin_score,
            },
            ClientMessage::PlayerAsteroidCollision(dto) => {
                ClientRequest::PlayerAsteroidCollision {
                    asteroid_id: dto.asteroid_id,
                    new_score: dto.new_score,
                    new_coin_score: dto.new_coin_score,
                }
            }
            ClientMessage::GetAsteroids => ClientRequest::GetAsteroids,
            ClientMessage::RequestSpawnPowerup => ClientRequest::RequestSpawnPowerup,
            ClientMessage::CollectPowerup(dto) => ClientRequest::CollectPowerup {
                powerup_id: dto.powerup_id,
            },
            ClientMessage::UpdateScreenDimensions(dto) => ClientRequest::UpdateScreenDimensions {
                width: dto.width,
                height: dto.height,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummaryDto {
    pub id: String,
    pub name: String,
    pub player_count: usize,
    /// `null` for the unbounded main room.
    pub max_players: Option<usize>,
}

impl From<RoomSummary> for RoomSummaryDto {
    fn from(room: RoomSummary) -> Self {
        Self {
            id: room.id,
            name: room.name,
            player_count: room.player_count,
            max_players: room.max_players,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivePowerupDto {
    pub active: bool,
    pub expires_at: u64,
}

impl From<ActivePowerup> for ActivePowerupDto {
    fn from(p: ActivePowerup) -> Self {
        Self {
            active: p.active,
            expires_at: p.expires_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerDto {
    pub id: String,
    pub name: String,
    pub score: i64,
    pub coin_score: i64,
    pub asteroids_destroyed: u32,
    pub x: f32,
    pub y: f32,
    pub angle: f32,
    pub bullets: Vec<BulletDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
    pub active_powerups: BTreeMap<&'static str, ActivePowerupDto>,
}

impl From<UserState> for PlayerDto {
    fn from(user: UserState) -> Self {
        Self {
            bullets: user.bullets.iter().map(BulletDto::from).collect(),
            active_powerups: user
                .active_powerups
                .iter()
                .map(|(kind, effect)| (kind.as_str(), ActivePowerupDto::from(*effect)))
                .collect(),
            id: user.connection_id,
            name: user.name,
            score: user.score,
            coin_score: user.coin_score,
            asteroids_destroyed: user.asteroids_destroyed,
            x: user.x,
            y: user.y,
            angle: user.angle,
            team: user.team,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PowerupDto {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: PowerupTypeDto,
    pub x: f32,
    pub y: f32,
    pub created_at: u64,
}

impl From<Powerup> for PowerupDto {
    fn from(p: Powerup) -> Self {
        Self {
            id: p.id,
            kind: p.kind.into(),
            x: p.x,
            y: p.y,
            created_at: p.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUserDto {
    /// The recipient's own connection id.
    pub id: String,
    pub coin: PointDto,
    pub others: BTreeMap<String, PlayerDto>,
    pub room_id: String,
    pub room_name: String,
    pub powerups: Vec<PowerupDto>,
}

impl From<RoomSnapshot> for NewUserDto {
    fn from(snapshot: RoomSnapshot) -> Self {
        Self {
            id: snapshot.connection_id,
            coin: snapshot.coin.into(),
            others: snapshot
                .others
                .into_iter()
                .map(|(id, user)| (id, PlayerDto::from(user)))
                .collect(),
            room_id: snapshot.room_id,
            room_name: snapshot.room_name,
            powerups: snapshot.powerups.into_iter().map(PowerupDto::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomCreatedDto {
    pub room_id: String,
    pub name: String,
    pub max_players: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRoomResultDto {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<JoinResult> for JoinRoomResultDto {
    fn from(result: JoinResult) -> Self {
        match result {
            JoinResult::Joined { room_id, room_name } => Self {
                success: true,
                room_id: Some(room_id),
                room_name: Some(room_name),
                message: None,
            },
            JoinResult::Rejected { message } => Self {
                success: false,
                room_id: None,
                room_name: None,
                message: Some(message),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AsteroidDto {
    pub id: String,
    pub size: AsteroidSizeDto,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub orbit_params: OrbitParamsDto,
    pub created_at: u64,
}

impl From<Asteroid> for AsteroidDto {
    fn from(a: Asteroid) -> Self {
        Self {
            id: a.id,
            size: a.size.into(),
            x: a.x,
            y: a.y,
            vx: a.vx,
            vy: a.vy,
            orbit_params: a.orbit.into(),
            created_at: a.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AsteroidHitDto {
    pub asteroid_id: String,
    pub player_id: String,
    pub new_score: i64,
    pub asteroids_destroyed: u32,
    pub coin_score: i64,
    pub by_ship: bool,
}

impl From<AsteroidHit> for AsteroidHitDto {
    fn from(hit: AsteroidHit) -> Self {
        Self {
            asteroid_id: hit.asteroid_id,
            player_id: hit.player_id,
            new_score: hit.new_score,
            asteroids_destroyed: hit.asteroids_destroyed,
            coin_score: hit.coin_score,
            by_ship: hit.by_ship,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PowerupCollectedDto {
    pub powerup_id: String,
    pub player_id: String,
    pub powerup_type: PowerupTypeDto,
    pub expires_at: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerPowerupExpiredDto {
    pub player_id: String,
    pub powerup_type: PowerupTypeDto,
}

impl From<ArenaEvent> for ServerMessage {
    fn from(event: ArenaEvent) -> Self {
        match event {
            ArenaEvent::AvailableRooms(rooms) => {
                ServerMessage::AvailableRooms(rooms.into_iter().map(RoomSummaryDto::from).collect())
            }
            ArenaEvent::NewUser(snapshot) => ServerMessage::ToNewUser(snapshot.into()),
            ArenaEvent::RoomCreated {
                room_id,
                name,
                max_players,
            } => ServerMessage::RoomCreated(RoomCreatedDto {
                room_id,
                name,
                max_players,
            }),
            ArenaEvent::JoinResult(result) => ServerMessage::JoinRoomResult(result.into()),
            ArenaEvent::InitialAsteroids(asteroids) => ServerMessage::InitialAsteroids(
                asteroids.into_iter().map(AsteroidDto::from).collect(),
            ),
            ArenaEvent::PlayerState(user) => ServerMessage::ToOthers(user.into()),
            ArenaEvent::KeystrokeUpdate { id, state } => {
                ServerMessage::KeystrokeUpdate { id, state }
            }
            ArenaEvent::OtherShot => ServerMessage::OtherShot,
            ArenaEvent::CoinChanged(coin) => ServerMessage::CoinChanged { coin: coin.into() },
            ArenaEvent::OtherCollision {
                bullet_user_id,
                bullet_index,
                exploded_user_id,
            } => ServerMessage::OtherCollision {
                bullet_user_id,
                bullet_index,
                exploded_user_id,
            },
            ArenaEvent::UserDisconnected { id } => ServerMessage::UserDisconnected { id },
            ArenaEvent::NewAsteroid(asteroid) => ServerMessage::NewAsteroid(asteroid.into()),
            ArenaEvent::AsteroidHit(hit) => ServerMessage::AsteroidHit(hit.into()),
            ArenaEvent::PowerupSpawned(powerup) => ServerMessage::PowerupSpawned(powerup.into()),
            ArenaEvent::PowerupCollected {
                powerup_id,
                player_id,
                kind,
                expires_at,
            } => ServerMessage::PowerupCollected(PowerupCollectedDto {
                powerup_id,
                player_id,
                powerup_type: kind.into(),
                expires_at,
            }),
            ArenaEvent::PowerupExpired { id } => ServerMessage::PowerupExpired { id },
            ArenaEvent::PlayerPowerupExpired { player_id, kind } => {
                ServerMessage::PlayerPowerupExpired(PlayerPowerupExpiredDto {
                    player_id,
                    powerup_type: kind.into(),
                })
            }
            ArenaEvent::TeamScores(scores) => ServerMessage::TeamScores { scores },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn to_value(event: ArenaEvent) -> serde_json::Value {
        serde_json::to_value(ServerMessage::from(event)).expect("serializable")
    }

    #[test]
    fn when_bare_event_is_serialized_then_data_is_omitted() {
        assert_eq!(to_value(ArenaEvent::OtherShot), json!({ "event": "other_shot" }));
    }

    #[test]
    fn when_join_succeeds_then_result_carries_room_fields_only() {
        let value = to_value(ArenaEvent::JoinResult(JoinResult::Joined {
            room_id: "main".into(),
            room_name: "Main Arena".into(),
        }));

        assert_eq!(
            value,
            json!({
                "event": "join_room_result",
                "data": { "success": true, "roomId": "main", "roomName": "Main Arena" }
            })
        );
    }

    #[test]
    fn when_join_fails_then_result_carries_message() {
        let value = to_value(ArenaEvent::JoinResult(JoinResult::Rejected {
            message: "room is full".into(),
        }));

        assert_eq!(
            value,
            json!({
                "event": "join_room_result",
                "data": { "success": false, "message": "room is full" }
            })
        );
    }

    #[test]
    fn when_main_room_is_listed_then_max_players_is_null() {
        let value = to_value(ArenaEvent::AvailableRooms(vec![RoomSummary {
            id: "main".into(),
            name: "Main Arena".into(),
            player_count: 3,
            max_players: None,
        }]));

        assert_eq!(
            value,
            json!({
                "event": "available_rooms",
                "data": [{ "id": "main", "name": "Main Arena", "playerCount": 3, "maxPlayers": null }]
            })
        );
    }

    #[test]
    fn when_player_state_is_relayed_then_it_uses_to_others_with_player_id() {
        let mut user = UserState::spawn("c1".into(), "Alice".into(), None, Point::new(10.0, 20.0));
        user.active_powerups.insert(
            PowerupKind::Speed,
            ActivePowerup {
                active: true,
                expires_at: 9_000,
            },
        );

        let value = to_value(ArenaEvent::PlayerState(user));

        assert_eq!(value["event"], "to_others");
        assert_eq!(value["data"]["id"], "c1");
        assert_eq!(value["data"]["x"], 10.0);
        assert_eq!(value["data"]["coinScore"], 0);
        assert_eq!(value["data"]["activePowerups"]["speed"]["expiresAt"], 9_000);
        assert!(value["data"].get("team").is_none());
    }

    #[test]
    fn when_powerup_expires_for_player_then_type_is_lowercase() {
        let value = to_value(ArenaEvent::PlayerPowerupExpired {
            player_id: "c1".into(),
            kind: PowerupKind::Attract,
        });

        assert_eq!(
            value,
            json!({
                "event": "player_powerup_expired",
                "data": { "playerId": "c1", "powerupType": "attract" }
            })
        );
    }

    #[test]
    fn when_join_room_is_received_then_camel_case_fields_decode() {
        let message = ClientMessage::from_json(
            r#"{"event":"join_room","data":{"roomId":"abc","name":"Bob","team":"red"}}"#,
        )
        .expect("valid join");

        let ClientMessage::JoinRoom(dto) = message else {
            panic!("expected join_room");
        };
        assert_eq!(dto.room_id, "abc");
        assert_eq!(dto.name.as_deref(), Some("Bob"));
        assert_eq!(dto.team.as_deref(), Some("red"));
    }

    #[test]
    fn when_bare_event_has_payload_then_payload_is_ignored() {
        let with_data = ClientMessage::from_json(r#"{"event":"shot","data":{"x":1,"y":2}}"#);
        let without = ClientMessage::from_json(r#"{"event":"initialize_game"}"#);

        assert!(matches!(with_data, Ok(ClientMessage::Shot)));
        assert!(matches!(without, Ok(ClientMessage::InitializeGame)));
    }

    #[test]
    fn when_create_room_has_no_data_then_defaults_apply() {
        let message = ClientMessage::from_json(r#"{"event":"create_room"}"#);

        assert!(matches!(
            message,
            Ok(ClientMessage::CreateRoom(CreateRoomDto { name: None, max_players: None }))
        ));
    }

    #[test]
    fn when_split_is_received_then_orbit_params_decode() {
        let message = ClientMessage::from_json(
            r#"{"event":"spawn_asteroid_split","data":{"size":"large","x":5,"y":6,"vx":1,"vy":2,
               "orbitParams":{"startX":5,"startY":6,"vx":1,"vy":2,"curvature":0.1,
               "wobble":{"amplitude":3,"frequency":0.5}}}}"#,
        )
        .expect("valid split");

        let ClientRequest::SpawnAsteroidSplit(request) = ClientRequest::from(message) else {
            panic!("expected split request");
        };
        assert_eq!(request.parent_size, AsteroidSize::Large);
        assert_eq!(request.orbit.wobble.amplitude, 3.0);
        assert_eq!(request.orbit.curvature, 0.1);
    }

    #[test]
    fn when_event_is_unknown_then_it_is_rejected() {
        let result = ClientMessage::from_json(r#"{"event":"teleport","data":{}}"#);

        assert!(matches!(result, Err(ProtocolError::UnknownEvent(name)) if name == "teleport"));
    }

    #[test]
    fn when_screen_dimensions_arrive_then_they_become_a_resize_request() {
        let message = ClientMessage::from_json(
            r#"{"event":"update_screen_dimensions","data":{"width":1920,"height":1080}}"#,
        )
        .expect("valid resize");

        assert!(matches!(
            ClientRequest::from(message),
            ClientRequest::UpdateScreenDimensions { width, height }
                if width == 1920.0 && height == 1080.0
        ));
    }

    #[test]
    fn when_powerup_type_is_unrecognised_then_collect_still_parses() {
        let message = ClientMessage::from_json(
            r#"{"event":"collect_powerup","data":{"powerupId":"pow-3","powerupType":"shield"}}"#,
        )
        .expect("collect_powerup parses");

        assert!(matches!(
            ClientRequest::from(message),
            ClientRequest::CollectPowerup { powerup_id } if powerup_id == "pow-3"
        ));
    }

    #[test]
    fn when_frame_is_not_json_then_json_error_is_returned() {
        assert!(matches!(
            ClientMessage::from_json("not json"),
            Err(ProtocolError::Json(_))
        ));
    }
}
