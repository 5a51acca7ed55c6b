//! SQLite-backed persistence.
//!
//! # Data Flow
//! ```text
//! async caller
//!     → Database::execute(closure)
//!     → mpsc channel → dedicated worker thread (owns the Connection)
//!     → oneshot reply → caller
//! ```
//!
//! # Design Decisions
//! - One connection for the process lifetime, owned by a single worker
//!   thread; the thread serializes all access, so no locking in callers
//! - Schema is created on open; `created_at` is written by the capture
//!   pipeline, not by the store
//! - No retries anywhere: a failed statement surfaces to the caller as-is

use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc, Mutex};
use std::thread::{self, JoinHandle};

use rusqlite::Connection;
use thiserror::Error;
use tokio::sync::oneshot;

pub mod repository;

pub use repository::{CaptureRecord, NewCapture, RequestRepository};

/// Errors from the persistence layer.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to create storage directory {path}: {source}")]
    CreateDir {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to start database worker: {0}")]
    WorkerSpawn(std::io::Error),

    #[error("database worker is no longer running")]
    WorkerGone,

    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("failed to encode {column} column as JSON: {source}")]
    EncodeColumn {
        column: &'static str,
        source: serde_json::Error,
    },
}

type DbTask = Box<dyn FnOnce(&mut Connection) + Send + 'static>;

enum DbCommand {
    Execute(DbTask),
    Shutdown,
}

struct DatabaseInner {
    sender: mpsc::Sender<DbCommand>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for DatabaseInner {
    fn drop(&mut self) {
        let mut guard = match self.worker.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(handle) = guard.take() {
            if self.sender.send(DbCommand::Shutdown).is_err() {
                tracing::error!("database worker exited before shutdown command");
            }
            if let Err(join_err) = handle.join() {
                tracing::error!(?join_err, "failed to join database worker");
            }
        }
    }
}

/// Handle to the SQLite worker thread. Cheap to clone.
#[derive(Clone)]
pub struct Database {
    inner: Arc<DatabaseInner>,
    db_path: Arc<PathBuf>,
}

impl Database {
    /// Open (creating if needed) the database at `db_path` and spawn the
    /// worker thread that owns the connection.
    pub fn open(db_path: PathBuf) -> Result<Self, StorageError> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|source| StorageError::CreateDir {
                    path: parent.display().to_string(),
                    source,
                })?;
            }
        }

        let (command_tx, command_rx) = mpsc::channel::<DbCommand>();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<(), StorageError>>();
        let path_for_thread = db_path.clone();

        let worker = thread::Builder::new()
            .name("httpcapture-db".into())
            .spawn(move || {
                let mut conn = match Connection::open(&path_for_thread) {
                    Ok(connection) => connection,
                    Err(err) => {
                        let _ = ready_tx.send(Err(StorageError::Sqlite(err)));
                        return;
                    }
                };

                if let Err(err) = conn.pragma_update(None, "journal_mode", "WAL") {
                    tracing::error!(error = %err, "failed to enable WAL mode");
                }
                if let Err(err) = conn.pragma_update(None, "foreign_keys", "ON") {
                    tracing::error!(error = %err, "failed to enable foreign keys");
                }

                let init_result = init_schema(&conn).map_err(StorageError::Sqlite);
                if ready_tx.send(init_result).is_err() {
                    tracing::error!("database opener dropped before ready signal");
                    return;
                }

                while let Ok(command) = command_rx.recv() {
                    match command {
                        DbCommand::Execute(task) => task(&mut conn),
                        DbCommand::Shutdown => break,
                    }
                }

                tracing::debug!("database worker shutting down");
            })
            .map_err(StorageError::WorkerSpawn)?;

        ready_rx.recv().map_err(|_| StorageError::WorkerGone)??;

        tracing::info!(path = %db_path.display(), "database opened");

        Ok(Self {
            inner: Arc::new(DatabaseInner {
                sender: command_tx,
                worker: Mutex::new(Some(worker)),
            }),
            db_path: Arc::new(db_path),
        })
    }

    pub fn path(&self) -> &Path {
        self.db_path.as_path()
    }

    /// Run `task` on the worker thread and await its result.
    pub async fn execute<F, T>(&self, task: F) -> Result<T, StorageError>
    where
        F: FnOnce(&mut Connection) -> Result<T, StorageError> + Send + 'static,
        T: Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();

        let command = DbCommand::Execute(Box::new(move |conn| {
            let result = task(conn);
            if reply_tx.send(result).is_err() {
                tracing::error!("database caller dropped before receiving result");
            }
        }));

        self.inner
            .sender
            .send(command)
            .map_err(|_| StorageError::WorkerGone)?;

        reply_rx.await.map_err(|_| StorageError::WorkerGone)?
    }
}

fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS requests (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            method TEXT NOT NULL,
            path TEXT NOT NULL,
            full_url TEXT NOT NULL,
            query_params TEXT NOT NULL,
            headers TEXT NOT NULL,
            body TEXT NOT NULL DEFAULT '',
            form_data TEXT NOT NULL,
            files TEXT NOT NULL,
            client_ip TEXT NOT NULL,
            created_at TEXT NOT NULL
        );",
    )
}
