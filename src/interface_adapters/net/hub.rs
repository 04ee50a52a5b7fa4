// The hub task: sole owner of the arena core.
//
// Sockets and timers talk to it through one mpsc channel; it applies each command to
// completion, then fans serialized events out to per-connection queues.

use crate::domain::ConnectionId;
use crate::interface_adapters::protocol::ServerMessage;
use crate::use_cases::{Arena, ArenaEvent, ClientRequest, Effects, TimerCommand, TimerEvent, TimerKey};

use axum::extract::ws::Utf8Bytes;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

const LOG_THROTTLE: Duration = Duration::from_secs(2);

#[derive(Debug)]
pub enum HubCommand {
    Connect {
        conn_id: ConnectionId,
        outbound: mpsc::Sender<Utf8Bytes>,
    },
    Message {
        conn_id: ConnectionId,
        request: ClientRequest,
    },
    Disconnect {
        conn_id: ConnectionId,
    },
    // Posted by a timer task when its sleep finishes.
    Timer {
        key: TimerKey,
        generation: u64,
        event: TimerEvent,
    },
}

struct Hub {
    arena: Arena,
    outbound: HashMap<ConnectionId, mpsc::Sender<Utf8Bytes>>,
    // Live timer per slot; the generation tells a current fire from a replaced one.
    timers: HashMap<TimerKey, (u64, JoinHandle<()>)>,
    next_generation: u64,
    // Weak so pending timers never keep the hub alive after the server drops its sender.
    commands: mpsc::WeakSender<HubCommand>,
    last_full_log: Instant,
}

/// Spawns the hub task and returns the sender sockets use to reach it.
///
/// The hub exits once every strong sender is dropped.
pub fn spawn_hub(arena: Arena, capacity: usize) -> mpsc::Sender<HubCommand> {
    let (tx, rx) = mpsc::channel(capacity);
    let hub = Hub {
        arena,
        outbound: HashMap::new(),
        timers: HashMap::new(),
        next_generation: 0,
        commands: tx.downgrade(),
        last_full_log: Instant::now() - LOG_THROTTLE,
    };
    tokio::spawn(hub.run(rx));
    tx
}

impl Hub {
    async fn run(mut self, mut rx: mpsc::Receiver<HubCommand>) {
        let effects = self.arena.start();
        self.apply(effects);

        while let Some(command) = rx.recv().await {
            let effects = match command {
                HubCommand::Connect { conn_id, outbound } => {
                    self.outbound.insert(conn_id.clone(), outbound);
                    self.arena.connect(&conn_id)
                }
                HubCommand::Message { conn_id, request } => {
                    if !self.outbound.contains_key(&conn_id) {
                        debug!(conn_id = %conn_id, "message from unknown connection dropped");
                        continue;
                    }
                    self.arena.handle(&conn_id, request)
                }
                HubCommand::Disconnect { conn_id } => {
                    if self.outbound.remove(&conn_id).is_none() {
                        continue;
                    }
                    self.arena.disconnect(&conn_id)
                }
                HubCommand::Timer {
                    key,
                    generation,
                    event,
                } => {
                    let current = self
                        .timers
                        .get(&key)
                        .is_some_and(|(live, _)| *live == generation);
                    if !current {
                        continue;
                    }
                    self.timers.remove(&key);
                    self.arena.fire(event)
                }
            };
            self.apply(effects);
        }

        for (_, (_, handle)) in self.timers.drain() {
            handle.abort();
        }
        debug!("hub channel closed; hub exiting");
    }

    fn apply(&mut self, effects: Effects) {
        let Effects { deliveries, timers } = effects;
        for timer in timers {
            match timer {
                TimerCommand::Schedule { after, event } => self.schedule(after, event),
                TimerCommand::Cancel(key) => {
                    if let Some((_, handle)) = self.timers.remove(&key) {
                        handle.abort();
                    }
                }
            }
        }
        for delivery in deliveries {
            self.deliver(&delivery.to, delivery.event);
        }
    }

    fn schedule(&mut self, after: Duration, event: TimerEvent) {
        self.next_generation += 1;
        let generation = self.next_generation;
        let key = event.key();
        let commands = self.commands.clone();
        let timer_key = key.clone();

        let handle = tokio::spawn(async move {
            tokio::time::sleep(after).await;
            if let Some(tx) = commands.upgrade() {
                let _ = tx
                    .send(HubCommand::Timer {
                        key: timer_key,
                        generation,
                        event,
                    })
                    .await;
            }
        });

        if let Some((_, replaced)) = self.timers.insert(key, (generation, handle)) {
            replaced.abort();
        }
    }

    fn deliver(&mut self, recipients: &[ConnectionId], event: ArenaEvent) {
        // Serialize once and share the bytes across recipients.
        let msg = ServerMessage::from(event);
        let bytes = match serde_json::to_string(&msg) {
            Ok(txt) => Utf8Bytes::from(txt),
            Err(e) => {
                error!(error = ?e, "failed to serialize server message");
                return;
            }
        };

        for conn_id in recipients {
            let Some(outbound) = self.outbound.get(conn_id) else {
                continue;
            };
            match outbound.try_send(bytes.clone()) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    if should_log(&mut self.last_full_log) {
                        warn!(conn_id = %conn_id, "outbound queue full; dropping message");
                    }
                }
                Err(TrySendError::Closed(_)) => {
                    // The socket loop is shutting down and will post its own disconnect.
                    debug!(conn_id = %conn_id, "outbound queue closed");
                }
            }
        }
    }
}

fn should_log(last: &mut Instant) -> bool {
    if last.elapsed() >= LOG_THROTTLE {
        *last = Instant::now();
        true
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::SystemClock;
    use crate::domain::tuning::{ArenaTuning, AsteroidTuning, PowerupTuning};
    use crate::domain::Bounds;
    use crate::use_cases::{ArenaSettings, MAIN_ROOM_ID};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn hub() -> mpsc::Sender<HubCommand> {
        let settings = ArenaSettings {
            bounds: Bounds {
                width: 1280.0,
                height: 720.0,
            },
            arena: ArenaTuning::default(),
            asteroids: AsteroidTuning::default(),
            powerups: PowerupTuning::default(),
            room_idle_grace: Duration::from_secs(30),
        };
        let arena = Arena::new(settings, Box::new(SystemClock), StdRng::seed_from_u64(9));
        spawn_hub(arena, 64)
    }

    async fn connect(hub: &mpsc::Sender<HubCommand>, conn_id: &str) -> mpsc::Receiver<Utf8Bytes> {
        let (tx, rx) = mpsc::channel(32);
        hub.send(HubCommand::Connect {
            conn_id: conn_id.to_string(),
            outbound: tx,
        })
        .await
        .expect("hub running");
        rx
    }

    async fn next_event(rx: &mut mpsc::Receiver<Utf8Bytes>) -> serde_json::Value {
        let bytes = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("message before timeout")
            .expect("queue open");
        serde_json::from_str(bytes.as_str()).expect("valid json")
    }

    #[tokio::test]
    async fn when_connection_opens_then_room_list_is_sent() {
        let hub = hub();

        let mut rx = connect(&hub, "c1").await;

        let msg = next_event(&mut rx).await;
        assert_eq!(msg["event"], "available_rooms");
        assert_eq!(msg["data"][0]["id"], MAIN_ROOM_ID);
    }

    #[tokio::test]
    async fn when_shot_is_relayed_then_only_the_other_member_receives_it() {
        let hub = hub();
        let mut a = connect(&hub, "a").await;
        let mut b = connect(&hub, "b").await;
        for conn in ["a", "b"] {
            hub.send(HubCommand::Message {
                conn_id: conn.to_string(),
                request: ClientRequest::JoinRoom {
                    room_id: MAIN_ROOM_ID.into(),
                    name: Some(conn.into()),
                    team: None,
                },
            })
            .await
            .expect("hub running");
        }

        hub.send(HubCommand::Message {
            conn_id: "a".into(),
            request: ClientRequest::Shot,
        })
        .await
        .expect("hub running");

        let mut saw_shot = false;
        for _ in 0..10 {
            let msg = next_event(&mut b).await;
            if msg["event"] == "other_shot" {
                saw_shot = true;
                break;
            }
        }
        assert!(saw_shot);
        // Drain what `a` got and make sure its own shot never came back.
        while let Ok(bytes) = a.try_recv() {
            let msg: serde_json::Value = serde_json::from_str(bytes.as_str()).expect("json");
            assert_ne!(msg["event"], "other_shot");
        }
    }

    #[tokio::test]
    async fn when_stale_timer_generation_fires_then_it_is_ignored() {
        let hub = hub();
        let mut rx = connect(&hub, "c1").await;
        let _ = next_event(&mut rx).await;

        // No timer with this generation was ever scheduled.
        hub.send(HubCommand::Timer {
            key: TimerKey::RoomIdle("ghost".into()),
            generation: u64::MAX,
            event: TimerEvent::RoomIdleCheck {
                room_id: "ghost".into(),
            },
        })
        .await
        .expect("hub running");
        hub.send(HubCommand::Message {
            conn_id: "c1".into(),
            request: ClientRequest::CreateRoom {
                name: Some("Probe".into()),
                max_players: None,
            },
        })
        .await
        .expect("hub running");

        let msg = next_event(&mut rx).await;
        assert_eq!(msg["event"], "room_created");
    }
}
