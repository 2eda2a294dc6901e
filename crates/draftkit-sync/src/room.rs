//! Room actor: the single writer of one session.
//!
//! Each live session runs in its own Tokio task that owns the stored
//! record. Owner commands arrive over an mpsc channel and are applied one
//! at a time, so there is never more than one mutation in flight. After a
//! command is applied and saved, the new state goes out on a `watch`
//! channel that any number of spectators can read from.

use std::sync::Arc;

use chrono::Utc;
use draftkit_protocol::SessionKey;
use draftkit_store::{SessionMeta, SessionStore, StoredSession};
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, trace, warn};

use crate::{SessionLogic, SyncError};

/// One published state of a session.
///
/// The state sits behind an `Arc` so publishing to many receivers never
/// copies it.
#[derive(Debug)]
pub struct Revision<S> {
    pub revision: u64,
    pub state: Arc<S>,
}

impl<S> Clone for Revision<S> {
    fn clone(&self) -> Self {
        Self {
            revision: self.revision,
            state: Arc::clone(&self.state),
        }
    }
}

/// Commands sent to a room actor.
pub(crate) enum RoomCommand<L: SessionLogic> {
    /// Apply an owner command; replies with the new revision.
    Apply {
        token: String,
        command: L::Command,
        reply: oneshot::Sender<Result<u64, SyncError>>,
    },

    /// Hand out a receiver for the published state.
    Subscribe {
        reply: oneshot::Sender<watch::Receiver<Revision<L::State>>>,
    },

    /// Report the session's metadata.
    Meta { reply: oneshot::Sender<SessionMeta> },

    /// Delete the stored record and stop. Commands queued before this
    /// one are applied first. Replies with whether a record existed.
    /// Spectators see `not_found` once the actor is gone.
    Shutdown {
        reply: oneshot::Sender<Result<bool, SyncError>>,
    },
}

/// Handle to a running room actor. Cheap to clone.
pub struct RoomHandle<L: SessionLogic> {
    key: SessionKey,
    sender: mpsc::Sender<RoomCommand<L>>,
}

impl<L: SessionLogic> Clone for RoomHandle<L> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            sender: self.sender.clone(),
        }
    }
}

impl<L: SessionLogic> RoomHandle<L> {
    pub fn key(&self) -> &SessionKey {
        &self.key
    }

    /// Whether the actor has stopped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    fn unavailable(&self) -> SyncError {
        SyncError::Unavailable(self.key.clone())
    }

    /// Applies an owner command and returns the new revision.
    pub async fn apply(&self, token: String, command: L::Command) -> Result<u64, SyncError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Apply {
                token,
                command,
                reply: reply_tx,
            })
            .await
            .map_err(|_| self.unavailable())?;
        reply_rx.await.map_err(|_| self.unavailable())?
    }

    /// A receiver positioned at the latest published state.
    pub async fn subscribe(&self) -> Result<watch::Receiver<Revision<L::State>>, SyncError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Subscribe { reply: reply_tx })
            .await
            .map_err(|_| self.unavailable())?;
        reply_rx.await.map_err(|_| self.unavailable())
    }

    pub async fn meta(&self) -> Result<SessionMeta, SyncError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Meta { reply: reply_tx })
            .await
            .map_err(|_| self.unavailable())?;
        reply_rx.await.map_err(|_| self.unavailable())
    }

    /// Deletes the session and stops the actor.
    ///
    /// Resolves after the record is gone from the store, so no save from
    /// this actor can land after it. `Unavailable` if the actor had
    /// already stopped.
    pub async fn shutdown(&self) -> Result<bool, SyncError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Shutdown { reply: reply_tx })
            .await
            .map_err(|_| self.unavailable())?;
        reply_rx.await.map_err(|_| self.unavailable())?
    }
}

/// The actor state. Lives inside the spawned task.
struct RoomActor<L: SessionLogic, St> {
    record: StoredSession<L::State>,
    logic: Arc<L>,
    store: Arc<St>,
    publisher: watch::Sender<Revision<L::State>>,
    receiver: mpsc::Receiver<RoomCommand<L>>,
}

impl<L, St> RoomActor<L, St>
where
    L: SessionLogic,
    St: SessionStore<L::State>,
{
    async fn run(mut self) {
        info!(key = %self.record.key, revision = self.record.revision, "room actor started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                RoomCommand::Apply {
                    token,
                    command,
                    reply,
                } => {
                    let result = self.handle_apply(&token, command).await;
                    let _ = reply.send(result);
                }
                RoomCommand::Subscribe { reply } => {
                    let _ = reply.send(self.publisher.subscribe());
                }
                RoomCommand::Meta { reply } => {
                    let _ = reply.send(self.record.meta());
                }
                RoomCommand::Shutdown { reply } => {
                    info!(key = %self.record.key, "room shutting down");
                    let removed = self.store.remove(&self.record.key).await;
                    let _ = reply.send(removed.map_err(SyncError::from));
                    break;
                }
            }
        }

        // Dropping `publisher` here closes every spectator's receiver.
        info!(key = %self.record.key, "room actor stopped");
    }

    async fn handle_apply(&mut self, token: &str, command: L::Command) -> Result<u64, SyncError> {
        let key = &self.record.key;
        if token != self.record.owner_token {
            debug!(%key, "command with wrong owner token");
            return Err(SyncError::Unauthorized(key.clone()));
        }

        let now = Utc::now();
        let mut next = self.record.state.clone();
        if let Err(e) = self.logic.apply(&mut next, command, now) {
            debug!(%key, error = %e, "command rejected");
            return Err(SyncError::Rejected {
                code: self.logic.rejection_code(&e),
                reason: e.to_string(),
            });
        }

        let candidate = StoredSession {
            key: key.clone(),
            owner_token: self.record.owner_token.clone(),
            revision: self.record.revision + 1,
            complete: self.logic.is_complete(&next),
            last_activity: now,
            state: next,
        };

        // Write through before publishing: a spectator must never see a
        // revision the store could lose.
        if let Err(e) = self.store.save(&candidate).await {
            warn!(%key, error = %e, "failed to save session, command dropped");
            return Err(e.into());
        }

        self.record = candidate;
        self.publish();
        Ok(self.record.revision)
    }

    fn publish(&self) {
        let revision = Revision {
            revision: self.record.revision,
            state: Arc::new(self.record.state.clone()),
        };
        self.publisher.send_replace(revision);
        trace!(
            key = %self.record.key,
            revision = self.record.revision,
            spectators = self.publisher.receiver_count(),
            "published"
        );
    }
}

/// Spawns an actor for `record` and returns its handle.
pub(crate) fn spawn_room<L, St>(
    record: StoredSession<L::State>,
    logic: Arc<L>,
    store: Arc<St>,
    channel_size: usize,
) -> RoomHandle<L>
where
    L: SessionLogic,
    St: SessionStore<L::State>,
{
    let (tx, rx) = mpsc::channel(channel_size);
    let (publisher, _) = watch::channel(Revision {
        revision: record.revision,
        state: Arc::new(record.state.clone()),
    });

    let key = record.key.clone();
    let actor = RoomActor {
        record,
        logic,
        store,
        publisher,
        receiver: rx,
    };
    tokio::spawn(actor.run());

    RoomHandle { key, sender: tx }
}
