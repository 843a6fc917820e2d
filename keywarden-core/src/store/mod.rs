//! Durable keyed storage for credential metadata.
//!
//! A [`CredentialStore`] handle starts uninitialized and must be opened
//! with [`CredentialStore::init`] before use; lifecycle is owned by the
//! process holding the handle, not by module state. Two backends:
//!
//! - **SQLite** (durable): records survive process restarts.
//! - **Memory** (development and tests): records are lost on exit.

mod sqlite;

pub use sqlite::SqliteCredentialStore;

use std::path::PathBuf;

use dashmap::DashMap;
use tokio::sync::RwLock;

use crate::record::CredentialRecord;

/// Storage errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// An operation other than `init` was attempted before `init`.
    #[error("credential store has not been initialized")]
    NotInitialized,

    /// The store was closed by its owner.
    #[error("credential store is closed")]
    Closed,

    /// The backing medium could not be opened.
    #[error("failed to open credential store: {0}")]
    Open(String),

    /// A write against the backing medium failed.
    #[error("credential write failed: {0}")]
    Write(String),

    /// A read against the backing medium failed.
    #[error("credential read failed: {0}")]
    Read(String),
}

/// Where an open store keeps its records.
enum Backend {
    /// SQLite file storage (durable).
    Sqlite(SqliteCredentialStore),
    /// In-memory storage (development and tests).
    Memory(DashMap<String, CredentialRecord>),
}

/// What `init` opens.
#[derive(Debug, Clone)]
enum Medium {
    Sqlite(PathBuf),
    Memory,
}

enum State {
    Uninitialized(Medium),
    Open(Backend),
    Closed,
}

/// Keyed credential-metadata store with an explicit open/close lifecycle.
///
/// All operations are `async`; per-key upsert/delete are atomic in the
/// backing medium, so concurrent writers to the same `id` cannot lose
/// updates within one process.
pub struct CredentialStore {
    state: RwLock<State>,
}

impl CredentialStore {
    /// A store backed by the SQLite database at `path`, created if absent.
    pub fn sqlite(path: impl Into<PathBuf>) -> Self {
        Self {
            state: RwLock::new(State::Uninitialized(Medium::Sqlite(path.into()))),
        }
    }

    /// A store that keeps records in memory only.
    pub fn in_memory() -> Self {
        tracing::warn!("using in-memory credential storage - records will be lost on exit");
        Self {
            state: RwLock::new(State::Uninitialized(Medium::Memory)),
        }
    }

    /// Open the backing medium, creating it if absent.
    ///
    /// A no-op when the store is already open. Fails with
    /// [`StoreError::Open`] when the medium cannot be opened and with
    /// [`StoreError::Closed`] on a handle that was closed.
    pub async fn init(&self) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        match &*state {
            State::Open(_) => Ok(()),
            State::Closed => Err(StoreError::Closed),
            State::Uninitialized(medium) => {
                let backend = match medium {
                    Medium::Sqlite(path) => {
                        Backend::Sqlite(SqliteCredentialStore::open(path).await?)
                    }
                    Medium::Memory => Backend::Memory(DashMap::new()),
                };
                *state = State::Open(backend);
                Ok(())
            }
        }
    }

    /// Close the store. Subsequent operations fail with
    /// [`StoreError::Closed`]; the handle cannot be reopened.
    pub async fn close(&self) {
        let mut state = self.state.write().await;
        if let State::Open(Backend::Sqlite(store)) = &*state {
            store.close().await;
        }
        *state = State::Closed;
    }

    /// Whether records survive a process restart.
    pub async fn is_persistent(&self) -> bool {
        matches!(
            &*self.state.read().await,
            State::Uninitialized(Medium::Sqlite(_)) | State::Open(Backend::Sqlite(_))
        )
    }

    /// Upsert `record` by its `id`.
    ///
    /// The record is durably visible to subsequent reads once this
    /// resolves.
    pub async fn put(&self, record: &CredentialRecord) -> Result<(), StoreError> {
        let state = self.state.read().await;
        match backend(&state)? {
            Backend::Sqlite(store) => store.put(record).await,
            Backend::Memory(map) => {
                map.insert(record.id.clone(), record.clone());
                Ok(())
            }
        }
    }

    /// Every stored record; ordering is unspecified. An empty store yields
    /// an empty vector, never an error.
    pub async fn get_all(&self) -> Result<Vec<CredentialRecord>, StoreError> {
        let state = self.state.read().await;
        match backend(&state)? {
            Backend::Sqlite(store) => store.get_all().await,
            Backend::Memory(map) => Ok(map.iter().map(|entry| entry.value().clone()).collect()),
        }
    }

    /// The record stored under `id`, or `None`. A missing key is not an
    /// error.
    pub async fn get_by_id(&self, id: &str) -> Result<Option<CredentialRecord>, StoreError> {
        let state = self.state.read().await;
        match backend(&state)? {
            Backend::Sqlite(store) => store.get_by_id(id).await,
            Backend::Memory(map) => Ok(map.get(id).map(|entry| entry.value().clone())),
        }
    }

    /// Remove the record under `id`, reporting whether one existed.
    /// Deleting a missing id is not an error.
    pub async fn delete_by_id(&self, id: &str) -> Result<bool, StoreError> {
        let state = self.state.read().await;
        match backend(&state)? {
            Backend::Sqlite(store) => store.delete_by_id(id).await,
            Backend::Memory(map) => Ok(map.remove(id).is_some()),
        }
    }

    /// Number of stored records.
    pub async fn count(&self) -> Result<usize, StoreError> {
        let state = self.state.read().await;
        match backend(&state)? {
            Backend::Sqlite(store) => store.count().await,
            Backend::Memory(map) => Ok(map.len()),
        }
    }
}

fn backend(state: &State) -> Result<&Backend, StoreError> {
    match state {
        State::Open(backend) => Ok(backend),
        State::Uninitialized(_) => Err(StoreError::NotInitialized),
        State::Closed => Err(StoreError::Closed),
    }
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match self.state.try_read() {
            Ok(guard) => match &*guard {
                State::Uninitialized(Medium::Sqlite(path)) => {
                    format!("Uninitialized(sqlite {})", path.display())
                }
                State::Uninitialized(Medium::Memory) => "Uninitialized(memory)".to_string(),
                State::Open(Backend::Sqlite(_)) => "Open(sqlite)".to_string(),
                State::Open(Backend::Memory(map)) => format!("Open(memory, {} records)", map.len()),
                State::Closed => "Closed".to_string(),
            },
            Err(_) => "<locked>".to_string(),
        };
        f.debug_struct("CredentialStore").field("state", &state).finish()
    }
}
