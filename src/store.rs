//! Persistence layer for the synchronization state slot
//!
//! The store holds exactly one logical row: the latest `BlockchainState`
//! snapshot pushed by the sync engine. It offers three read paths:
//! - `load_sync` for one-shot synchronous reads
//! - `get` for one-shot reads off the caller's thread
//! - `subscribe` for a live view that emits on every save
//!
//! Writes go through `save`, which applies the replay-flag correction before
//! the upsert. A single writer (the sync engine) is assumed; readers never
//! mutate.

use crate::config::Config;
use crate::error::{Result, StateError};
use crate::state::BlockchainState;
use rusqlite::{params, Connection};
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tracing::{info, warn};

/// Abstraction for state-slot backends. Implementations must replace, not
/// accumulate: after any `save`, reads see exactly the latest value.
pub trait StateStore: Send + Sync {
    /// Normalize the snapshot, upsert the single row, and publish the
    /// corrected value to subscribers. Returns the value actually persisted.
    fn save(&self, state: BlockchainState) -> Result<BlockchainState>;

    /// One-shot read of the current row, `None` if nothing was ever saved.
    fn load_sync(&self) -> Result<Option<BlockchainState>>;

    /// Live view of the slot, seeded with the current value. Emits after
    /// every completed `save`; never closes while the store is alive.
    fn subscribe(&self) -> watch::Receiver<Option<BlockchainState>>;
}

/// SQLite-backed state slot.
pub struct SqliteStateStore {
    conn: Arc<Mutex<Connection>>,
    publisher: watch::Sender<Option<BlockchainState>>,
}

impl SqliteStateStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path.as_ref())
            .map_err(|e| StateError::DatabaseError(format!("Failed to open database: {}", e)))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS blockchain_state (
                id INTEGER PRIMARY KEY CHECK (id = 0),
                best_chain_date INTEGER NOT NULL,
                best_chain_height INTEGER NOT NULL,
                replaying INTEGER NOT NULL,
                impediments TEXT NOT NULL,
                chainlock_height INTEGER NOT NULL,
                mnlist_height INTEGER NOT NULL,
                percentage_sync INTEGER NOT NULL
            )",
            [],
        )
        .map_err(|e| {
            StateError::DatabaseError(format!("Failed to create blockchain_state table: {}", e))
        })?;

        // Seed subscribers with whatever survived the last run
        let current = read_row(&conn)?;
        let (publisher, _) = watch::channel(current);

        Ok(SqliteStateStore {
            conn: Arc::new(Mutex::new(conn)),
            publisher,
        })
    }

    /// One-shot read performed on the blocking pool, so async callers (UI
    /// tasks) never touch the connection mutex directly.
    pub async fn get(&self) -> Result<Option<BlockchainState>> {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|_| StateError::DatabaseError("Mutex poisoned".to_string()))?;
            read_row(&conn)
        })
        .await
        .map_err(|e| StateError::TaskJoinError(e.to_string()))?
    }
}

impl StateStore for SqliteStateStore {
    fn save(&self, state: BlockchainState) -> Result<BlockchainState> {
        let state = state.normalize();

        let impediments_json = serde_json::to_string(&state.impediments).map_err(|e| {
            StateError::SerializationError(format!("Failed to serialize impediments: {}", e))
        })?;

        let conn = self
            .conn
            .lock()
            .map_err(|_| StateError::DatabaseError("Mutex poisoned".to_string()))?;
        conn.execute(
            "INSERT OR REPLACE INTO blockchain_state
                (id, best_chain_date, best_chain_height, replaying, impediments,
                 chainlock_height, mnlist_height, percentage_sync)
             VALUES (0, ?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                state.best_chain_date.timestamp_millis(),
                state.best_chain_height as i64,
                state.replaying,
                impediments_json,
                state.chainlock_height as i64,
                state.mnlist_height as i64,
                state.percentage_sync as i64,
            ],
        )
        .map_err(|e| StateError::DatabaseError(format!("Failed to save state: {}", e)))?;
        drop(conn);

        // Publish only after the row is durable
        self.publisher.send_replace(Some(state.clone()));
        Ok(state)
    }

    fn load_sync(&self) -> Result<Option<BlockchainState>> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| StateError::DatabaseError("Mutex poisoned".to_string()))?;
        read_row(&conn)
    }

    fn subscribe(&self) -> watch::Receiver<Option<BlockchainState>> {
        self.publisher.subscribe()
    }
}

fn read_row(conn: &Connection) -> Result<Option<BlockchainState>> {
    let mut stmt = conn
        .prepare(
            "SELECT best_chain_date, best_chain_height, replaying, impediments,
                    chainlock_height, mnlist_height, percentage_sync
             FROM blockchain_state LIMIT 1",
        )
        .map_err(|e| StateError::DatabaseError(format!("Failed to prepare query: {}", e)))?;

    let mut rows = stmt
        .query([])
        .map_err(|e| StateError::DatabaseError(format!("Failed to query state: {}", e)))?;

    let row = match rows
        .next()
        .map_err(|e| StateError::DatabaseError(format!("Failed to read row: {}", e)))?
    {
        Some(row) => row,
        None => return Ok(None),
    };

    let best_chain_millis: i64 = row
        .get(0)
        .map_err(|e| StateError::DatabaseError(format!("Failed to read column: {}", e)))?;
    let best_chain_height: i64 = row
        .get(1)
        .map_err(|e| StateError::DatabaseError(format!("Failed to read column: {}", e)))?;
    let replaying: bool = row
        .get(2)
        .map_err(|e| StateError::DatabaseError(format!("Failed to read column: {}", e)))?;
    let impediments_json: String = row
        .get(3)
        .map_err(|e| StateError::DatabaseError(format!("Failed to read column: {}", e)))?;
    let chainlock_height: i64 = row
        .get(4)
        .map_err(|e| StateError::DatabaseError(format!("Failed to read column: {}", e)))?;
    let mnlist_height: i64 = row
        .get(5)
        .map_err(|e| StateError::DatabaseError(format!("Failed to read column: {}", e)))?;
    let percentage_sync: i64 = row
        .get(6)
        .map_err(|e| StateError::DatabaseError(format!("Failed to read column: {}", e)))?;

    let best_chain_date = chrono::DateTime::from_timestamp_millis(best_chain_millis)
        .ok_or_else(|| {
            StateError::DatabaseError(format!(
                "Invalid best_chain_date timestamp: {}",
                best_chain_millis
            ))
        })?;
    let impediments = serde_json::from_str(&impediments_json).map_err(|e| {
        StateError::SerializationError(format!("Failed to deserialize impediments: {}", e))
    })?;

    Ok(Some(BlockchainState {
        best_chain_date,
        best_chain_height: best_chain_height as u32,
        replaying,
        impediments,
        chainlock_height: chainlock_height as u32,
        mnlist_height: mnlist_height as u32,
        percentage_sync: percentage_sync as u32,
    }))
}

/// In-memory state slot, used by tests and as a fallback when the database
/// cannot be opened. The watch channel itself is the storage.
pub struct MemoryStateStore {
    publisher: watch::Sender<Option<BlockchainState>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        let (publisher, _) = watch::channel(None);
        MemoryStateStore { publisher }
    }

    pub async fn get(&self) -> Result<Option<BlockchainState>> {
        Ok(self.publisher.borrow().clone())
    }
}

impl Default for MemoryStateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StateStore for MemoryStateStore {
    fn save(&self, state: BlockchainState) -> Result<BlockchainState> {
        let state = state.normalize();
        self.publisher.send_replace(Some(state.clone()));
        Ok(state)
    }

    fn load_sync(&self) -> Result<Option<BlockchainState>> {
        Ok(self.publisher.borrow().clone())
    }

    fn subscribe(&self) -> watch::Receiver<Option<BlockchainState>> {
        self.publisher.subscribe()
    }
}

/// Open the store described by `config`, falling back to the in-memory slot
/// when the database is unusable. The sync engine re-derives and re-saves
/// state on its own, so a fallback store loses nothing permanent.
pub fn open_store(config: &Config) -> Box<dyn StateStore> {
    if config.database.in_memory {
        info!("Using in-memory state store");
        return Box::new(MemoryStateStore::new());
    }

    let db_path = Path::new(&config.database.path);
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            if let Err(e) = fs::create_dir_all(parent) {
                warn!(
                    "Failed to create data dir {:?}: {}. Falling back to in-memory store.",
                    parent, e
                );
                return Box::new(MemoryStateStore::new());
            }
        }
    }

    match SqliteStateStore::open(db_path) {
        Ok(db) => {
            info!("Opened state store at {}", config.database.path);
            Box::new(db)
        }
        Err(e) => {
            warn!(
                "Failed to open state store at {}: {}. Falling back to in-memory store.",
                config.database.path, e
            );
            Box::new(MemoryStateStore::new())
        }
    }
}
