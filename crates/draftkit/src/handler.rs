//! Per-connection handler: frame decoding and message routing.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Upgrade to WebSocket, split into a reader and a writer task
//!   2. Loop: receive `ClientMessage` frames → route to the hub
//!   3. A `Watch` starts a forwarding task that streams sync events out
//!
//! Every outgoing frame goes through the writer task, which stamps it
//! with the connection's sequence number and uptime.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use draftkit_engine::{DraftCommand, DraftSession, SessionConfig};
use draftkit_protocol::{ClientMessage, Codec, Envelope, JsonCodec, ServerMessage};
use draftkit_store::SessionStore;
use draftkit_sync::{Subscription, SyncError};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, trace};

use crate::DraftkitError;
use crate::server::ServerState;

/// Counter for connection ids in logs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Frames queued for the writer before senders wait.
const OUTBOUND_BUFFER: usize = 32;

type Inbound = ClientMessage<SessionConfig, DraftCommand>;
type Outbound = ServerMessage<DraftSession>;
type WsSink = SplitSink<WebSocketStream<TcpStream>, Message>;

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<St>(
    stream: TcpStream,
    addr: SocketAddr,
    state: Arc<ServerState<St>>,
) -> Result<(), DraftkitError>
where
    St: SessionStore<DraftSession>,
{
    let ws = tokio_tungstenite::accept_async(stream).await?;
    let conn_id = NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed);
    debug!(conn_id, %addr, "accepted WebSocket connection");

    let (sink, mut frames) = ws.split();
    let (out_tx, out_rx) = mpsc::channel(OUTBOUND_BUFFER);
    let writer = tokio::spawn(write_frames(sink, out_rx, state.codec));
    let mut watching: Option<JoinHandle<()>> = None;

    loop {
        let data = match tokio::time::timeout(state.idle_timeout, frames.next()).await {
            Ok(Some(Ok(Message::Text(text)))) => text.as_bytes().to_vec(),
            Ok(Some(Ok(Message::Binary(data)))) => data.to_vec(),
            Ok(Some(Ok(Message::Close(_)))) | Ok(None) => {
                info!(conn_id, "connection closed cleanly");
                break;
            }
            // Ping and pong are answered by tungstenite itself.
            Ok(Some(Ok(_))) => continue,
            Ok(Some(Err(e))) => {
                debug!(conn_id, error = %e, "recv error");
                break;
            }
            Err(_) => {
                info!(conn_id, "connection timed out");
                break;
            }
        };

        let msg: Inbound = match state.codec.decode(&data) {
            Ok(msg) => msg,
            Err(e) => {
                debug!(conn_id, error = %e, "failed to decode client message");
                let reply = ServerMessage::Rejected {
                    code: 400,
                    reason: format!("malformed message: {e}"),
                };
                if out_tx.send(reply).await.is_err() {
                    break;
                }
                continue;
            }
        };

        let reply = match msg {
            ClientMessage::Watch { key } => {
                if let Some(previous) = watching.take() {
                    previous.abort();
                }
                match state.hub.subscribe(&key).await {
                    Ok(subscription) => {
                        debug!(conn_id, %key, "spectator watching");
                        watching = Some(tokio::spawn(forward_events(
                            subscription,
                            out_tx.clone(),
                        )));
                        None
                    }
                    Err(e) => Some(rejection(&e)),
                }
            }
            ClientMessage::Create { config } => Some(match state.hub.create(config).await {
                Ok(created) => ServerMessage::Created {
                    key: created.key,
                    owner_token: created.owner_token,
                },
                Err(e) => rejection(&e),
            }),
            ClientMessage::Command {
                key,
                token,
                command,
            } => {
                let name = command.name();
                Some(match state.hub.apply(&key, &token, command).await {
                    Ok(revision) => {
                        debug!(conn_id, %key, command = name, revision, "command accepted");
                        ServerMessage::Accepted { key, revision }
                    }
                    Err(e) => {
                        debug!(conn_id, %key, command = name, error = %e, "command refused");
                        rejection(&e)
                    }
                })
            }
            ClientMessage::Heartbeat { client_time } => Some(ServerMessage::HeartbeatAck {
                client_time,
                server_time: Utc::now().timestamp_millis().max(0) as u64,
            }),
        };

        if let Some(reply) = reply {
            if out_tx.send(reply).await.is_err() {
                debug!(conn_id, "writer gone");
                break;
            }
        }
    }

    if let Some(task) = watching {
        task.abort();
    }
    drop(out_tx);
    match writer.await {
        Ok(result) => result,
        Err(e) => {
            debug!(conn_id, error = %e, "writer task failed");
            Ok(())
        }
    }
}

/// Streams a subscription's events into the connection's outbox.
async fn forward_events(mut subscription: Subscription<DraftSession>, out: mpsc::Sender<Outbound>) {
    while let Some(event) = subscription.next().await {
        if out.send(ServerMessage::Event { event }).await.is_err() {
            break;
        }
    }
}

/// Owns the write half. Wraps each message in an envelope and sends it as
/// a text frame.
async fn write_frames(
    mut sink: WsSink,
    mut outbox: mpsc::Receiver<Outbound>,
    codec: JsonCodec,
) -> Result<(), DraftkitError> {
    let start = Instant::now();
    let mut seq: u64 = 0;

    while let Some(payload) = outbox.recv().await {
        let envelope = Envelope {
            seq: next_seq(&mut seq),
            timestamp: start.elapsed().as_millis() as u64,
            payload,
        };
        let text = codec.encode_text(&envelope)?;
        trace!(seq = envelope.seq, bytes = text.len(), "sending frame");
        sink.send(Message::Text(text.into())).await?;
    }

    // Close errors just mean the peer left first.
    let _ = sink.close().await;
    Ok(())
}

/// Maps a hub error to the reply the owner sees.
fn rejection(error: &SyncError) -> Outbound {
    ServerMessage::Rejected {
        code: error.status(),
        reason: error.to_string(),
    }
}

/// Increments and returns the next sequence number.
fn next_seq(seq: &mut u64) -> u64 {
    let current = *seq;
    *seq += 1;
    current
}
