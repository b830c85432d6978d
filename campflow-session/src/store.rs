//! Durable storage for in-progress booking drafts, keyed by session.

use async_trait::async_trait;
use campflow_checkout::flow::FlowSnapshot;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("draft storage io: {0}")]
    Io(#[from] std::io::Error),
    #[error("draft could not be decoded: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Persistence backend for flow snapshots. Implementations must tolerate
/// concurrent sessions with distinct keys.
#[async_trait]
pub trait DraftStore: Send + Sync {
    async fn save(&self, key: &str, snapshot: &FlowSnapshot) -> Result<(), StoreError>;
    async fn load(&self, key: &str) -> Result<Option<FlowSnapshot>, StoreError>;
    async fn clear(&self, key: &str) -> Result<(), StoreError>;
}

/// In-memory store for tests and short-lived staff sessions.
#[derive(Default)]
pub struct MemoryDraftStore {
    drafts: Mutex<HashMap<String, String>>,
}

impl MemoryDraftStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DraftStore for MemoryDraftStore {
    async fn save(&self, key: &str, snapshot: &FlowSnapshot) -> Result<(), StoreError> {
        let json = serde_json::to_string(snapshot)?;
        self.drafts
            .lock()
            .expect("draft map poisoned")
            .insert(key.to_string(), json);
        Ok(())
    }

    async fn load(&self, key: &str) -> Result<Option<FlowSnapshot>, StoreError> {
        let json = self
            .drafts
            .lock()
            .expect("draft map poisoned")
            .get(key)
            .cloned();
        match json {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn clear(&self, key: &str) -> Result<(), StoreError> {
        self.drafts.lock().expect("draft map poisoned").remove(key);
        Ok(())
    }
}

/// One JSON file per session key under a configured directory.
pub struct FileDraftStore {
    dir: PathBuf,
}

impl FileDraftStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let safe: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '-' })
            .collect();
        self.dir.join(format!("{safe}.json"))
    }
}

#[async_trait]
impl DraftStore for FileDraftStore {
    async fn save(&self, key: &str, snapshot: &FlowSnapshot) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let json = serde_json::to_vec_pretty(snapshot)?;
        tokio::fs::write(self.path_for(key), json).await?;
        Ok(())
    }

    async fn load(&self, key: &str) -> Result<Option<FlowSnapshot>, StoreError> {
        let path = self.path_for(key);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::Io(e)),
        };
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    async fn clear(&self, key: &str) -> Result<(), StoreError> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Io(e)),
        }
    }
}

/// Wraps a [`DraftStore`] with per-session debouncing: rapid edits collapse
/// into one write, and a corrupt saved draft degrades to a fresh session
/// instead of an error.
pub struct SessionState {
    store: Arc<dyn DraftStore>,
    key: String,
    debounce: Duration,
    last_save: Option<Instant>,
    pending: Option<FlowSnapshot>,
}

impl SessionState {
    pub fn new(store: Arc<dyn DraftStore>, key: impl Into<String>, debounce_ms: u64) -> Self {
        Self {
            store,
            key: key.into(),
            debounce: Duration::from_millis(debounce_ms),
            last_save: None,
            pending: None,
        }
    }

    /// Load a previously saved draft worth offering a resume for. Missing,
    /// corrupt, or trivially empty drafts all read as "nothing to resume";
    /// corrupt ones are cleared so they cannot re-fail next visit.
    pub async fn load_resumable(&self) -> Option<FlowSnapshot> {
        match self.store.load(&self.key).await {
            Ok(Some(snapshot)) if snapshot.has_progress() => Some(snapshot),
            Ok(_) => None,
            Err(error) => {
                tracing::warn!(%error, key = %self.key, "discarding unreadable draft");
                let _ = self.store.clear(&self.key).await;
                None
            }
        }
    }

    /// Record a changed snapshot. Writes through immediately when the
    /// debounce window has elapsed since the last write; otherwise the
    /// snapshot is held as pending until [`flush`](Self::flush).
    pub async fn touch(&mut self, snapshot: FlowSnapshot) -> Result<(), StoreError> {
        let due = match self.last_save {
            Some(at) => at.elapsed() >= self.debounce,
            None => true,
        };
        if due {
            self.store.save(&self.key, &snapshot).await?;
            self.last_save = Some(Instant::now());
            self.pending = None;
        } else {
            self.pending = Some(snapshot);
        }
        Ok(())
    }

    /// Write any snapshot held back by the debounce window.
    pub async fn flush(&mut self) -> Result<(), StoreError> {
        if let Some(snapshot) = self.pending.take() {
            self.store.save(&self.key, &snapshot).await?;
            self.last_save = Some(Instant::now());
        }
        Ok(())
    }

    /// Drop the draft entirely (completed booking or explicit discard).
    pub async fn discard(&mut self) -> Result<(), StoreError> {
        self.pending = None;
        self.store.clear(&self.key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campflow_checkout::steps::BookingStep;
    use campflow_core::guest::GuestDraft;

    fn snapshot_with_name(name: &str) -> FlowSnapshot {
        let mut guest = GuestDraft::default();
        guest.first_name = name.to_string();
        FlowSnapshot {
            guest,
            stay: None,
            site_id: None,
            site_class_id: None,
            step: BookingStep::Details,
        }
    }

    #[tokio::test]
    async fn memory_store_round_trips() {
        let store = MemoryDraftStore::new();
        let snap = snapshot_with_name("Ada");
        store.save("s1", &snap).await.unwrap();
        assert_eq!(store.load("s1").await.unwrap(), Some(snap));
        store.clear("s1").await.unwrap();
        assert_eq!(store.load("s1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn file_store_round_trips_and_tolerates_missing() {
        let dir = std::env::temp_dir().join(format!("campflow-drafts-{}", uuid::Uuid::new_v4()));
        let store = FileDraftStore::new(&dir);
        assert_eq!(store.load("s1").await.unwrap(), None);
        let snap = snapshot_with_name("Grace");
        store.save("s1", &snap).await.unwrap();
        assert_eq!(store.load("s1").await.unwrap(), Some(snap));
        store.clear("s1").await.unwrap();
        store.clear("s1").await.unwrap();
        assert_eq!(store.load("s1").await.unwrap(), None);
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn empty_draft_is_not_resumable() {
        let store = Arc::new(MemoryDraftStore::new());
        let empty = FlowSnapshot {
            guest: GuestDraft::default(),
            stay: None,
            site_id: None,
            site_class_id: None,
            step: BookingStep::Dates,
        };
        store.save("s1", &empty).await.unwrap();
        let session = SessionState::new(store, "s1", 0);
        assert!(session.load_resumable().await.is_none());
    }

    #[tokio::test]
    async fn corrupt_draft_is_cleared_and_reads_fresh() {
        let dir = std::env::temp_dir().join(format!("campflow-drafts-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("s1.json"), b"{not json").unwrap();
        let store = Arc::new(FileDraftStore::new(&dir));
        let session = SessionState::new(store.clone(), "s1", 0);
        assert!(session.load_resumable().await.is_none());
        // cleared, so a raw load no longer errors
        assert_eq!(store.load("s1").await.unwrap(), None);
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn touch_debounces_then_flush_writes_pending() {
        let store = Arc::new(MemoryDraftStore::new());
        let mut session = SessionState::new(store.clone(), "s1", 60_000);

        session.touch(snapshot_with_name("first")).await.unwrap();
        let saved = store.load("s1").await.unwrap().unwrap();
        assert_eq!(saved.guest.first_name, "first");

        // Inside the debounce window the write is held back.
        session.touch(snapshot_with_name("second")).await.unwrap();
        let saved = store.load("s1").await.unwrap().unwrap();
        assert_eq!(saved.guest.first_name, "first");

        session.flush().await.unwrap();
        let saved = store.load("s1").await.unwrap().unwrap();
        assert_eq!(saved.guest.first_name, "second");
    }

    #[tokio::test]
    async fn discard_drops_pending_and_stored() {
        let store = Arc::new(MemoryDraftStore::new());
        let mut session = SessionState::new(store.clone(), "s1", 60_000);
        session.touch(snapshot_with_name("first")).await.unwrap();
        session.touch(snapshot_with_name("second")).await.unwrap();
        session.discard().await.unwrap();
        session.flush().await.unwrap();
        assert_eq!(store.load("s1").await.unwrap(), None);
    }
}
