//! The hub: creates sessions, routes commands, and hands out subscriptions.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use draftkit_protocol::SessionKey;
use draftkit_store::{SessionMeta, SessionStore, StoredSession, generate_key, generate_token, is_valid_key};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::room::spawn_room;
use crate::{HubConfig, RoomHandle, SessionLogic, Subscription, SyncError};

/// Key generation gives up after this many collisions in a row.
const MAX_KEY_ATTEMPTS: usize = 8;

/// What the creator of a session gets back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Created {
    pub key: SessionKey,
    /// Secret required for every later mutation. Never shown to spectators.
    pub owner_token: String,
    pub revision: u64,
}

/// Per-key cell holding a session's room, if one is running.
///
/// Everything that starts, looks up, or stops a room locks the cell
/// first, so a key never has two actors and a destroyed session is not
/// rehydrated behind `destroy`'s back. The map lock is only held long
/// enough to find the cell.
type Slot<L> = Arc<Mutex<Option<RoomHandle<L>>>>;

/// Registry of live sessions, one room actor each.
///
/// Rooms start on creation or, for sessions that only exist in the store
/// (after a restart, or after their actor was stopped), on first use. The
/// store is the source of truth; the actors are a cache of writers over it.
pub struct DraftHub<L: SessionLogic, St> {
    logic: Arc<L>,
    store: Arc<St>,
    config: HubConfig,
    rooms: Mutex<HashMap<SessionKey, Slot<L>>>,
}

impl<L, St> DraftHub<L, St>
where
    L: SessionLogic,
    St: SessionStore<L::State>,
{
    pub fn new(logic: Arc<L>, store: Arc<St>, config: HubConfig) -> Self {
        Self {
            logic,
            store,
            config: config.validated(),
            rooms: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    pub fn logic(&self) -> &Arc<L> {
        &self.logic
    }

    pub fn store(&self) -> &Arc<St> {
        &self.store
    }

    /// Creates a session and starts its room.
    ///
    /// The initial state is saved at revision 0 before the key is handed
    /// out.
    pub async fn create(&self, config: L::Config) -> Result<Created, SyncError> {
        let now = Utc::now();

        let mut attempts = 0;
        let (key, slot, mut guard) = loop {
            attempts += 1;
            let key = generate_key();
            let (slot, guard) = self.lock_slot(&key).await;
            let running = live(&*guard).is_some();
            let taken = match self.store.load(&key).await {
                Ok(stored) => running || stored.is_some(),
                Err(e) => {
                    if !running {
                        self.forget(&key, &slot).await;
                    }
                    return Err(e.into());
                }
            };
            if !taken {
                break (key, slot, guard);
            }
            if !running {
                self.forget(&key, &slot).await;
            }
            drop(guard);
            if attempts >= MAX_KEY_ATTEMPTS {
                warn!(attempts, "could not find a free session key");
                return Err(SyncError::Unavailable(key));
            }
            debug!(%key, "session key collision, retrying");
        };

        let state = self.logic.create(config, now);
        let record = StoredSession {
            key: key.clone(),
            owner_token: generate_token(),
            revision: 0,
            complete: self.logic.is_complete(&state),
            last_activity: now,
            state,
        };
        if let Err(e) = self.store.save(&record).await {
            self.forget(&key, &slot).await;
            return Err(e.into());
        }

        let created = Created {
            key: key.clone(),
            owner_token: record.owner_token.clone(),
            revision: record.revision,
        };
        *guard = Some(spawn_room(
            record,
            Arc::clone(&self.logic),
            Arc::clone(&self.store),
            self.config.command_channel_size,
        ));
        info!(%key, "session created");
        Ok(created)
    }

    /// Applies an owner command. Returns the new revision.
    pub async fn apply(
        &self,
        key: &SessionKey,
        token: &str,
        command: L::Command,
    ) -> Result<u64, SyncError> {
        let handle = self
            .room(key)
            .await?
            .ok_or_else(|| SyncError::NotFound(key.clone()))?;
        handle.apply(token.to_owned(), command).await
    }

    /// Subscribes to a session's state.
    ///
    /// An unknown or expired key yields a subscription whose only event is
    /// `not_found`. Only a store failure is an error.
    pub async fn subscribe(&self, key: &SessionKey) -> Result<Subscription<L::State>, SyncError> {
        let Some(handle) = self.room(key).await? else {
            debug!(%key, "subscribe to unknown session");
            return Ok(Subscription::not_found());
        };
        match handle.subscribe().await {
            Ok(receiver) => Ok(Subscription::live(receiver)),
            // The room stopped between lookup and subscribe.
            Err(_) => Ok(Subscription::not_found()),
        }
    }

    /// Metadata of a session, live or stored.
    pub async fn meta(&self, key: &SessionKey) -> Result<Option<SessionMeta>, SyncError> {
        match self.room(key).await? {
            Some(handle) => handle.meta().await.map(Some),
            None => Ok(None),
        }
    }

    /// Stops the room and deletes the stored record. Spectators get
    /// `not_found`. Returns whether the session existed.
    ///
    /// Commands the room accepted before this call are saved before the
    /// record is deleted, never after.
    pub async fn destroy(&self, key: &SessionKey) -> Result<bool, SyncError> {
        if !is_valid_key(key) {
            return Ok(false);
        }
        let (slot, mut guard) = self.lock_slot(key).await;
        let existed = match guard.take().filter(|h| !h.is_closed()) {
            Some(handle) => match handle.shutdown().await {
                Ok(_) => true,
                // The actor stopped on its own; the record may remain.
                Err(SyncError::Unavailable(_)) => self.store.remove(key).await?,
                Err(e) => return Err(e),
            },
            None => self.store.remove(key).await?,
        };
        self.forget(key, &slot).await;
        drop(guard);

        if existed {
            info!(%key, "session destroyed");
        }
        Ok(existed)
    }

    /// Destroys every session idle for longer than the retention window.
    /// Returns the removed keys.
    pub async fn expire_stale(&self, now: DateTime<Utc>) -> Result<Vec<SessionKey>, SyncError> {
        let retention = self.config.store;
        let expired: Vec<SessionKey> = self
            .store
            .list()
            .await?
            .into_iter()
            .filter(|meta| retention.is_expired(meta, now))
            .map(|meta| meta.key)
            .collect();

        let mut removed = Vec::with_capacity(expired.len());
        for key in expired {
            if self.destroy(&key).await? {
                removed.push(key);
            }
        }

        self.prune().await;

        if !removed.is_empty() {
            info!(count = removed.len(), "expired idle sessions");
        }
        Ok(removed)
    }

    /// Number of sessions with a running room actor.
    pub async fn live_sessions(&self) -> usize {
        let slots: Vec<Slot<L>> = self.rooms.lock().await.values().cloned().collect();
        let mut count = 0;
        for slot in slots {
            if live(&*slot.lock().await).is_some() {
                count += 1;
            }
        }
        count
    }

    /// Runs [`expire_stale`](Self::expire_stale) every `sweep_interval`
    /// until the hub is dropped or the task is aborted.
    pub fn spawn_sweeper(self: Arc<Self>) -> JoinHandle<()> {
        let period = self.config.sweep_interval;
        let hub = Arc::downgrade(&self);
        drop(self);

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // The first tick completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                let Some(hub) = hub.upgrade() else {
                    debug!("hub dropped, sweeper exiting");
                    break;
                };
                if let Err(e) = hub.expire_stale(Utc::now()).await {
                    warn!(error = %e, "retention sweep failed");
                }
            }
        })
    }

    /// The running room for `key`, rehydrating it from the store when
    /// needed. `None` when no live, unexpired session has this key.
    async fn room(&self, key: &SessionKey) -> Result<Option<RoomHandle<L>>, SyncError> {
        if !is_valid_key(key) {
            return Ok(None);
        }
        let (slot, mut guard) = self.lock_slot(key).await;
        if let Some(handle) = live(&*guard) {
            return Ok(Some(handle.clone()));
        }
        *guard = None;

        let record = match self.store.load(key).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                self.forget(key, &slot).await;
                return Ok(None);
            }
            Err(e) => {
                self.forget(key, &slot).await;
                return Err(e.into());
            }
        };
        if self.config.store.is_expired(&record.meta(), Utc::now()) {
            debug!(%key, "stored session expired, removing");
            self.forget(key, &slot).await;
            self.store.remove(key).await?;
            return Ok(None);
        }

        info!(%key, revision = record.revision, "rehydrating session");
        let handle = spawn_room(
            record,
            Arc::clone(&self.logic),
            Arc::clone(&self.store),
            self.config.command_channel_size,
        );
        *guard = Some(handle.clone());
        Ok(Some(handle))
    }

    /// Locks the cell for `key`, creating it if needed.
    ///
    /// A cell can be dropped from the map while a caller waits on it; the
    /// loop retries until the locked cell is the one the map holds.
    async fn lock_slot(&self, key: &SessionKey) -> (Slot<L>, OwnedMutexGuard<Option<RoomHandle<L>>>) {
        loop {
            let slot = Arc::clone(self.rooms.lock().await.entry(key.clone()).or_default());
            let guard = Arc::clone(&slot).lock_owned().await;
            if self.is_current(key, &slot).await {
                return (slot, guard);
            }
        }
    }

    async fn is_current(&self, key: &SessionKey, slot: &Slot<L>) -> bool {
        self.rooms
            .lock()
            .await
            .get(key)
            .is_some_and(|current| Arc::ptr_eq(current, slot))
    }

    /// Drops the cell for `key` from the map. Call with the cell locked and
    /// empty.
    async fn forget(&self, key: &SessionKey, slot: &Slot<L>) {
        let mut rooms = self.rooms.lock().await;
        if rooms.get(key).is_some_and(|current| Arc::ptr_eq(current, slot)) {
            rooms.remove(key);
        }
    }

    /// Removes cells whose actor stopped on its own.
    async fn prune(&self) {
        let slots: Vec<(SessionKey, Slot<L>)> = self
            .rooms
            .lock()
            .await
            .iter()
            .map(|(key, slot)| (key.clone(), Arc::clone(slot)))
            .collect();
        for (key, slot) in slots {
            // A busy cell is in use; the next sweep gets it.
            let Ok(mut guard) = slot.try_lock() else {
                continue;
            };
            if live(&*guard).is_none() {
                *guard = None;
                self.forget(&key, &slot).await;
            }
        }
    }
}

/// The handle in a cell, if its actor is still running.
fn live<L: SessionLogic>(cell: &Option<RoomHandle<L>>) -> Option<&RoomHandle<L>> {
    cell.as_ref().filter(|h| !h.is_closed())
}
