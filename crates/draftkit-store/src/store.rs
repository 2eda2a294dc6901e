//! The persistence boundary.

use std::future::Future;

use draftkit_protocol::SessionKey;

use crate::{SessionMeta, StoreError, StoredSession};

/// Loads and saves sessions by key.
///
/// The sync layer calls [`save`](Self::save) after every accepted
/// mutation, before publishing it, so a spectator never sees a state the
/// store does not have. Implementations only need last-writer-wins
/// semantics: each session has exactly one writer.
///
/// # Example
///
/// ```rust
/// use draftkit_store::{MemoryStore, SessionStore, StoredSession};
/// use draftkit_protocol::SessionKey;
///
/// # async fn demo() -> Result<(), draftkit_store::StoreError> {
/// let store = MemoryStore::<String>::new();
/// let record = StoredSession {
///     key: SessionKey::new("abc"),
///     owner_token: "secret".into(),
///     revision: 0,
///     complete: false,
///     last_activity: chrono::Utc::now(),
///     state: "hello".to_string(),
/// };
/// store.save(&record).await?;
/// assert_eq!(store.load(&record.key).await?, Some(record));
/// # Ok(())
/// # }
/// ```
pub trait SessionStore<S>: Send + Sync + 'static {
    /// The session stored under `key`, if any.
    fn load(
        &self,
        key: &SessionKey,
    ) -> impl Future<Output = Result<Option<StoredSession<S>>, StoreError>> + Send;

    /// Inserts or replaces the record under its key.
    fn save(&self, record: &StoredSession<S>)
    -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Deletes the record. Returns whether one existed.
    fn remove(&self, key: &SessionKey) -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// Metadata of every stored session, in no particular order.
    fn list(&self) -> impl Future<Output = Result<Vec<SessionMeta>, StoreError>> + Send;
}
