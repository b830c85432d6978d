//! Session persistence and abandonment for the booking flow: durable draft
//! snapshots with debounced saves, resume-or-discard on return, an idle
//! abandoned-cart timer, and layered configuration loading.

pub mod abandonment;
pub mod app_config;
pub mod store;

pub use abandonment::AbandonmentTimer;
pub use app_config::{Config, StorageConfig};
pub use store::{DraftStore, FileDraftStore, MemoryDraftStore, SessionState, StoreError};
