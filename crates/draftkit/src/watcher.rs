//! Reconnecting spectator client.
//!
//! A [`Watcher`] follows one session over WebSocket. When the connection
//! drops it waits with exponential backoff and connects again; the server
//! answers every new `watch` with a fresh snapshot, so nothing needs to be
//! replayed. A `not_found` event ends the watch for good.

use std::time::Duration;

use chrono::Utc;
use draftkit_protocol::{ClientMessage, Codec, Envelope, JsonCodec, ServerMessage, SessionKey, SyncEvent};
use draftkit_sync::{Backoff, BackoffConfig};
use futures_util::{SinkExt, StreamExt};
use serde::de::DeserializeOwned;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use crate::DraftkitError;

/// Connection state reported alongside events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchStatus {
    /// Connected and subscribed. A snapshot follows.
    Connected,
    /// Lost the connection; retrying after `delay`.
    Reconnecting { attempt: u32, delay: Duration },
    /// The session is gone. No further updates.
    Closed,
}

/// What a [`Watcher`] yields.
#[derive(Debug, Clone, PartialEq)]
pub enum WatchUpdate<S> {
    Status(WatchStatus),
    Event(SyncEvent<S>),
}

/// Why one connection attempt ended.
enum Ended {
    /// The session is gone; stop.
    NotFound,
    /// Nobody is reading the updates anymore; stop.
    Abandoned,
    /// The connection dropped; retry.
    Dropped,
}

/// Builder and runner for a reconnecting spectator.
///
/// ```rust,no_run
/// use draftkit::prelude::*;
///
/// # async fn demo() {
/// let mut updates = Watcher::new("ws://127.0.0.1:8080", SessionKey::new("0a1b2c3d4e5f"))
///     .spawn::<DraftSession>();
/// while let Some(update) = updates.recv().await {
///     println!("{update:?}");
/// }
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Watcher {
    url: String,
    key: SessionKey,
    backoff: BackoffConfig,
    heartbeat_interval: Duration,
}

impl Watcher {
    pub fn new(url: impl Into<String>, key: SessionKey) -> Self {
        Self {
            url: url.into(),
            key,
            backoff: BackoffConfig::default(),
            heartbeat_interval: Duration::from_secs(15),
        }
    }

    pub fn backoff(mut self, config: BackoffConfig) -> Self {
        self.backoff = config;
        self
    }

    /// How often to send heartbeats. Must stay below the server's idle
    /// timeout.
    pub fn heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval.max(Duration::from_millis(100));
        self
    }

    /// Starts watching in a background task. The task stops after
    /// [`WatchStatus::Closed`] or when the receiver is dropped.
    pub fn spawn<S>(self) -> mpsc::Receiver<WatchUpdate<S>>
    where
        S: DeserializeOwned + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(16);
        tokio::spawn(self.run(tx));
        rx
    }

    async fn run<S>(self, updates: mpsc::Sender<WatchUpdate<S>>)
    where
        S: DeserializeOwned + Send + 'static,
    {
        let mut backoff = Backoff::new(self.backoff);
        loop {
            let ended = match self.connect_once(&updates, &mut backoff).await {
                Ok(ended) => ended,
                Err(e) => {
                    debug!(key = %self.key, error = %e, "watch connection failed");
                    Ended::Dropped
                }
            };

            match ended {
                Ended::NotFound => {
                    info!(key = %self.key, "session gone, watcher closing");
                    let _ = updates.send(WatchUpdate::Status(WatchStatus::Closed)).await;
                    return;
                }
                Ended::Abandoned => return,
                Ended::Dropped => {
                    let delay = backoff.next_delay();
                    let status = WatchStatus::Reconnecting {
                        attempt: backoff.attempt(),
                        delay,
                    };
                    if updates.send(WatchUpdate::Status(status)).await.is_err() {
                        return;
                    }
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    async fn connect_once<S>(
        &self,
        updates: &mpsc::Sender<WatchUpdate<S>>,
        backoff: &mut Backoff,
    ) -> Result<Ended, DraftkitError>
    where
        S: DeserializeOwned + Send + 'static,
    {
        let codec = JsonCodec;
        let (mut ws, _) = tokio_tungstenite::connect_async(self.url.as_str()).await?;

        let watch: ClientMessage<(), ()> = ClientMessage::Watch {
            key: self.key.clone(),
        };
        ws.send(Message::Text(codec.encode_text(&watch)?.into()))
            .await?;

        backoff.reset();
        if updates
            .send(WatchUpdate::Status(WatchStatus::Connected))
            .await
            .is_err()
        {
            return Ok(Ended::Abandoned);
        }

        let mut heartbeat = tokio::time::interval(self.heartbeat_interval);
        heartbeat.tick().await;

        loop {
            tokio::select! {
                _ = heartbeat.tick() => {
                    let beat: ClientMessage<(), ()> = ClientMessage::Heartbeat {
                        client_time: Utc::now().timestamp_millis().max(0) as u64,
                    };
                    ws.send(Message::Text(codec.encode_text(&beat)?.into())).await?;
                }
                frame = ws.next() => {
                    let data = match frame {
                        Some(Ok(Message::Text(text))) => text.as_bytes().to_vec(),
                        Some(Ok(Message::Binary(data))) => data.to_vec(),
                        Some(Ok(Message::Close(_))) | None => return Ok(Ended::Dropped),
                        Some(Ok(_)) => continue,
                        Some(Err(e)) => return Err(e.into()),
                    };
                    let envelope: Envelope<ServerMessage<S>> = match codec.decode(&data) {
                        Ok(envelope) => envelope,
                        Err(e) => {
                            warn!(key = %self.key, error = %e, "undecodable frame from server");
                            continue;
                        }
                    };
                    match envelope.payload {
                        ServerMessage::Event { event } => {
                            let terminal = event.is_terminal();
                            if updates.send(WatchUpdate::Event(event)).await.is_err() {
                                return Ok(Ended::Abandoned);
                            }
                            if terminal {
                                return Ok(Ended::NotFound);
                            }
                        }
                        ServerMessage::Rejected { code, reason } => {
                            warn!(key = %self.key, code, %reason, "watch refused");
                            return Ok(Ended::Dropped);
                        }
                        _ => {}
                    }
                }
            }
        }
    }
}
