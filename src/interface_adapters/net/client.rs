use crate::frameworks::config::OUTBOUND_CHANNEL_CAPACITY;
use crate::interface_adapters::net::hub::HubCommand;
use crate::interface_adapters::protocol::{ClientMessage, ProtocolError};
use crate::interface_adapters::state::AppState;
use crate::interface_adapters::utils::rng::connection_id;
use crate::use_cases::ClientRequest;

use axum::{
    Error,
    extract::{
        State,
        ws::{CloseFrame, Message, Utf8Bytes, WebSocket, WebSocketUpgrade, close_code},
    },
    response::IntoResponse,
};
use futures::SinkExt;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::mpsc;
use tracing::{Instrument, debug, info, info_span, warn};

#[derive(Debug)]
enum NetError {
    // Categorizes connection lifecycle failures so callers can decide policy.
    #[allow(dead_code)]
    Ws(axum::Error),
    HubClosed,
}

impl From<axum::Error> for NetError {
    fn from(e: axum::Error) -> Self {
        NetError::Ws(e)
    }
}

enum LoopControl {
    Continue,
    Disconnect,
}

const LOG_THROTTLE: Duration = Duration::from_secs(2);
const MAX_INVALID_JSON: u32 = 10;

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let hub_tx = state.hub_tx.clone();
    ws.on_upgrade(move |socket| {
        let conn_id = connection_id();
        let span = info_span!("conn", conn_id = %conn_id);
        handle_socket(socket, hub_tx, conn_id).instrument(span)
    })
}

struct ConnCtx {
    conn_id: String,
    hub_tx: mpsc::Sender<HubCommand>,

    msgs_in: u64,
    msgs_out: u64,
    bytes_in: u64,
    bytes_out: u64,

    invalid_json: u32,
    dropped_keystrokes: u32,

    last_invalid_input_log: Instant,

    close_frame: Option<CloseFrame>,
}

async fn handle_socket(mut socket: WebSocket, hub_tx: mpsc::Sender<HubCommand>, conn_id: String) {
    // Register the outbound queue before reading anything so no event is missed.
    let (outbound_tx, mut outbound_rx) = mpsc::channel::<Utf8Bytes>(OUTBOUND_CHANNEL_CAPACITY);
    let registered = hub_tx
        .send(HubCommand::Connect {
            conn_id: conn_id.clone(),
            outbound: outbound_tx,
        })
        .await;
    if registered.is_err() {
        warn!("hub unavailable; rejecting connection");
        let _ = socket
            .send(Message::Close(Some(CloseFrame {
                code: close_code::AGAIN,
                reason: "server unavailable".into(),
            })))
            .await;
        let _ = socket.close().await;
        return;
    }
    info!("client connected");

    let mut ctx = ConnCtx {
        conn_id,
        hub_tx,
        msgs_in: 0,
        msgs_out: 0,
        bytes_in: 0,
        bytes_out: 0,
        invalid_json: 0,
        dropped_keystrokes: 0,
        last_invalid_input_log: Instant::now() - LOG_THROTTLE,
        close_frame: None,
    };

    // Main Client Loop
    if let Err(e) = run_client_loop(&mut socket, &mut outbound_rx, &mut ctx).await {
        warn!(error = ?e, "client loop exited with error");
    }

    // Always release the room slot, whatever ended the loop.
    let _ = ctx
        .hub_tx
        .send(HubCommand::Disconnect {
            conn_id: ctx.conn_id.clone(),
        })
        .await;

    debug!(
        msgs_in = ctx.msgs_in,
        msgs_out = ctx.msgs_out,
        bytes_in = ctx.bytes_in,
        bytes_out = ctx.bytes_out,
        invalid_json = ctx.invalid_json,
        dropped_keystrokes = ctx.dropped_keystrokes,
        "connection stats"
    );
    info!("client disconnected");
}

async fn run_client_loop(
    socket: &mut WebSocket,
    outbound_rx: &mut mpsc::Receiver<Utf8Bytes>,
    ctx: &mut ConnCtx,
) -> Result<(), NetError> {
    let mut fatal: Option<NetError> = None;

    loop {
        // disconnect becomes true on error
        let disconnect: bool = tokio::select! {
            // Incoming Message from Client
            incoming = socket.recv() => {
                match handle_incoming_ws(incoming, ctx).await {
                    Ok(LoopControl::Continue) => false,
                    Ok(LoopControl::Disconnect) => true,
                    Err(e) => {
                        fatal = Some(e);
                        true
                    }
                }
            }

            // Outgoing events routed to this connection by the hub
            outgoing = outbound_rx.recv() => {
                match outgoing {
                    Some(bytes) => match forward_bytes(bytes, socket, ctx).await {
                        LoopControl::Continue => false,
                        LoopControl::Disconnect => true,
                    },
                    None => {
                        fatal = Some(NetError::HubClosed);
                        true
                    }
                }
            }
        };

        if disconnect {
            if let Some(frame) = ctx.close_frame.take() {
                let _ = socket.send(Message::Close(Some(frame))).await;
            }
            if let Err(err) = socket.close().await.map_err(NetError::Ws) {
                debug!(error = ?err, "socket close error");
            }
            break;
        }
    }

    if let Some(err) = fatal {
        Err(err)
    } else {
        Ok(())
    }
}

async fn handle_incoming_ws(
    incoming: Option<Result<Message, Error>>,
    ctx: &mut ConnCtx,
) -> Result<LoopControl, NetError> {
    match incoming {
        Some(Ok(msg)) => match msg {
            Message::Text(text) => {
                ctx.msgs_in += 1;
                ctx.bytes_in += text.len() as u64;

                match ClientMessage::from_json(&text) {
                    Ok(message) => forward_request(ClientRequest::from(message), ctx).await,
                    Err(ProtocolError::UnknownEvent(event)) => {
                        // Well-formed but unsupported; not counted against the client.
                        debug!(event = %event, "unknown client event ignored");
                        Ok(LoopControl::Continue)
                    }
                    Err(parse_err) => {
                        ctx.invalid_json += 1;
                        if should_log(&mut ctx.last_invalid_input_log) {
                            warn!(
                                bytes = text.len(),
                                error = %parse_err,
                                "failed to parse client message"
                            );
                        }

                        if ctx.invalid_json > MAX_INVALID_JSON {
                            ctx.close_frame = Some(CloseFrame {
                                code: close_code::POLICY,
                                reason: "too many invalid messages".into(),
                            });
                            return Ok(LoopControl::Disconnect);
                        }

                        Ok(LoopControl::Continue)
                    }
                }
            }
            Message::Binary(_) => {
                ctx.close_frame = Some(CloseFrame {
                    code: close_code::UNSUPPORTED,
                    reason: "binary messages not supported".into(),
                });
                Ok(LoopControl::Disconnect)
            }
            Message::Ping(_) | Message::Pong(_) => Ok(LoopControl::Continue),
            Message::Close(_) => Ok(LoopControl::Disconnect),
        },
        Some(Err(e)) => {
            warn!(error = %e, "websocket recv error");
            Ok(LoopControl::Disconnect)
        }
        None => {
            info!("websocket closed");
            Ok(LoopControl::Disconnect)
        }
    }
}

async fn forward_request(request: ClientRequest, ctx: &mut ConnCtx) -> Result<LoopControl, NetError> {
    if let ClientRequest::KeystrokeState(state) = &request {
        if !valid_keystrokes(state) {
            ctx.dropped_keystrokes += 1;
            if should_log(&mut ctx.last_invalid_input_log) {
                warn!(state = %state, "invalid keystroke state; dropping");
            }
            return Ok(LoopControl::Continue);
        }
    }

    ctx.hub_tx
        .send(HubCommand::Message {
            conn_id: ctx.conn_id.clone(),
            request,
        })
        .await
        .map_err(|_| NetError::HubClosed)?;
    Ok(LoopControl::Continue)
}

async fn forward_bytes(bytes: Utf8Bytes, socket: &mut WebSocket, ctx: &mut ConnCtx) -> LoopControl {
    let bytes_len = bytes.len();
    match socket
        .send(Message::Text(bytes))
        .await
        .map_err(NetError::Ws)
    {
        Ok(()) => {
            ctx.msgs_out += 1;
            ctx.bytes_out += bytes_len as u64;
            LoopControl::Continue
        }
        Err(err) => {
            // Log unexpected send failures; disconnect will follow immediately.
            warn!(error = ?err, "failed to send server message");
            LoopControl::Disconnect
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

/// Five or six key slots, each `0` or `1`.
fn valid_keystrokes(state: &str) -> bool {
    matches!(state.len(), 5 | 6) && state.bytes().all(|b| b == b'0' || b == b'1')
}
