//! Directory-backed store: one JSON file per session.

use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use draftkit_protocol::SessionKey;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::fs;
use tracing::{debug, warn};

use crate::token::is_valid_key;
use crate::{SessionMeta, SessionStore, StoreError, StoredSession};

/// Stores each session as `<dir>/<key>.json`.
///
/// Writes go to a temporary file that is then renamed over the old one,
/// so a crash mid-write leaves the previous revision intact.
#[derive(Debug)]
pub struct FileStore<S> {
    dir: PathBuf,
    _state: PhantomData<fn() -> S>,
}

impl<S> FileStore<S> {
    /// Opens (and creates if needed) the store directory.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await?;
        Ok(Self {
            dir,
            _state: PhantomData,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &SessionKey) -> Result<PathBuf, StoreError> {
        if !is_valid_key(key) {
            return Err(StoreError::InvalidKey(key.clone()));
        }
        Ok(self.dir.join(format!("{}.json", key.as_str())))
    }
}

impl<S> SessionStore<S> for FileStore<S>
where
    S: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    async fn load(&self, key: &SessionKey) -> Result<Option<StoredSession<S>>, StoreError> {
        let path = self.path_for(key)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, record: &StoredSession<S>) -> Result<(), StoreError> {
        let path = self.path_for(&record.key)?;
        let tmp = path.with_extension("json.tmp");
        let bytes = serde_json::to_vec(record)?;
        fs::write(&tmp, bytes).await?;
        fs::rename(&tmp, &path).await?;
        debug!(key = %record.key, revision = record.revision, "session saved");
        Ok(())
    }

    async fn remove(&self, key: &SessionKey) -> Result<bool, StoreError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn list(&self) -> Result<Vec<SessionMeta>, StoreError> {
        let mut metas = Vec::new();
        let mut entries = fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }
            let bytes = fs::read(&path).await?;
            match serde_json::from_slice::<StoredSession<serde_json::Value>>(&bytes) {
                Ok(record) => metas.push(record.meta()),
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable session file"),
            }
        }
        Ok(metas)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};

    use super::*;

    fn record(key: &str) -> StoredSession<Vec<u8>> {
        StoredSession {
            key: SessionKey::new(key),
            owner_token: "t".into(),
            revision: 1,
            complete: true,
            last_activity: DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap(),
            state: vec![1, 2, 3],
        }
    }

    #[tokio::test]
    async fn test_save_load_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();

        store.save(&record("abc")).await.unwrap();
        let loaded = store.load(&SessionKey::new("abc")).await.unwrap();
        assert_eq!(loaded, Some(record("abc")));

        assert!(store.remove(&SessionKey::new("abc")).await.unwrap());
        assert_eq!(store.load(&SessionKey::new("abc")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_list_skips_foreign_and_corrupt_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();
        store.save(&record("one")).await.unwrap();
        fs::write(dir.path().join("notes.txt"), "hi").await.unwrap();
        fs::write(dir.path().join("broken.json"), "{").await.unwrap();

        let metas = store.list().await.unwrap();
        assert_eq!(metas.len(), 1);
        assert!(metas[0].complete);
    }

    #[tokio::test]
    async fn test_invalid_key_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::<Vec<u8>>::open(dir.path()).await.unwrap();
        let err = store.load(&SessionKey::new("../x")).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidKey(_)));
    }
}
