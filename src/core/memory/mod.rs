mod history;
mod tasks;
pub mod types;

use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("could not prepare database directory {path}: {source}")]
    Directory {
        path: PathBuf,
        source: std::io::Error,
    },
}

pub type StoreResult<T> = Result<T, StoreError>;

const TASKS_SCHEMA: &[&str] = &["CREATE TABLE IF NOT EXISTS tasks (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        task TEXT NOT NULL,
        status TEXT NOT NULL
    )"];

// Millisecond timestamps so messages written in the same second still sort.
const HISTORY_SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS threads (
        id TEXT PRIMARY KEY,
        created_at TIMESTAMP DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now'))
    )",
    "CREATE TABLE IF NOT EXISTS messages (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        thread_id TEXT NOT NULL,
        role TEXT NOT NULL,
        content TEXT NOT NULL,
        created_at TIMESTAMP DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now')),
        FOREIGN KEY (thread_id) REFERENCES threads (id)
    )",
    "CREATE INDEX IF NOT EXISTS idx_messages_thread_created ON messages(thread_id, created_at, id)",
];

/// One SQLite connection shared behind an async mutex.
///
/// Every operation locks it for the duration of its statements; the guard is
/// dropped on every return path.
#[derive(Clone)]
struct Store {
    db: Arc<Mutex<Connection>>,
}

impl Store {
    fn open(path: &Path, schema: &[&str]) -> StoreResult<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::Directory {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        Self::with_schema(Connection::open(path)?, schema)
    }

    fn with_schema(db: Connection, schema: &[&str]) -> StoreResult<Self> {
        db.execute_batch("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;")?;
        for stmt in schema {
            db.execute(stmt, [])?;
        }
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
        })
    }
}

/// The `tasks` table backing the to-do tools.
#[derive(Clone)]
pub struct TaskStore {
    store: Store,
}

impl TaskStore {
    /// Open (or create) the task database.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let path = path.as_ref();
        let store = Store::open(path, TASKS_SCHEMA)?;
        info!("Task store ready at {}", path.display());
        Ok(Self { store })
    }

    pub fn in_memory() -> StoreResult<Self> {
        Ok(Self {
            store: Store::with_schema(Connection::open_in_memory()?, TASKS_SCHEMA)?,
        })
    }
}

/// The `threads` and `messages` tables holding conversation turns.
#[derive(Clone)]
pub struct HistoryStore {
    store: Store,
}

impl HistoryStore {
    /// Open (or create) the conversation history database.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let path = path.as_ref();
        let store = Store::open(path, HISTORY_SCHEMA)?;
        info!("History store ready at {}", path.display());
        Ok(Self { store })
    }

    pub fn in_memory() -> StoreResult<Self> {
        Ok(Self {
            store: Store::with_schema(Connection::open_in_memory()?, HISTORY_SCHEMA)?,
        })
    }
}
