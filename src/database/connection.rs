/*!
 * Database connection management.
 *
 * This module owns a bounded pool of SQLite connections and provides
 * async-safe access using tokio's spawn_blocking. A connection is checked
 * out for exactly one call and returned by an RAII guard, so it goes back
 * to the pool on success, failure, panic, or when the caller gives up.
 */

use log::{debug, info, warn};
use parking_lot::Mutex;
use rusqlite::functions::FunctionFlags;
use rusqlite::{Connection, OpenFlags};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::app_config::DatabaseConfig;
use crate::errors::QueryError;

use super::schema;

/// Install the scalar functions the rendered queries rely on
///
/// `fold(text)` lower-cases with full Unicode case mapping, which SQLite's
/// built-in `lower()` only does for ASCII. NULL stays NULL.
fn register_functions(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        "fold",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let text: Option<String> = ctx.get(0)?;
            Ok(text.map(|text| text.to_lowercase()))
        },
    )
}

/// Pool state shared by every clone of a `Database`
struct PoolInner {
    /// Path or URI handed to SQLite when a connection is opened
    target: String,
    /// Flags used for every connection
    flags: OpenFlags,
    /// Path to the database file (":memory:" for in-memory stores)
    db_path: PathBuf,
    /// Connections not currently checked out
    idle: Mutex<Vec<Connection>>,
    /// Bounds the number of concurrent checkouts
    permits: Arc<Semaphore>,
    /// Pool size
    size: usize,
    /// Keeps a shared-cache in-memory store alive between calls
    anchor: Mutex<Option<Connection>>,
    closed: AtomicBool,
}

impl PoolInner {
    fn connect(&self) -> Result<Connection, QueryError> {
        let conn = Connection::open_with_flags(&self.target, self.flags).map_err(|e| {
            QueryError::store_unavailable(format!(
                "Failed to open database {:?}: {}",
                self.db_path, e
            ))
        })?;
        register_functions(&conn).map_err(|e| {
            QueryError::store_unavailable(format!("Failed to register SQL functions: {}", e))
        })?;
        debug!("Opened new connection to {:?}", self.db_path);
        Ok(conn)
    }

    fn checkout(
        pool: &Arc<PoolInner>,
        permit: OwnedSemaphorePermit,
    ) -> Result<PooledConnection, QueryError> {
        if pool.closed.load(Ordering::Acquire) {
            return Err(QueryError::store_unavailable("Database has been closed"));
        }

        let reused = pool.idle.lock().pop();
        let conn = match reused {
            Some(conn) => conn,
            None => pool.connect()?,
        };

        Ok(PooledConnection {
            conn: Some(conn),
            pool: Arc::clone(pool),
            _permit: permit,
        })
    }
}

/// A connection checked out of the pool for the duration of one call
pub struct PooledConnection {
    conn: Option<Connection>,
    pool: Arc<PoolInner>,
    // Dropped after the connection is back in the idle list
    _permit: OwnedSemaphorePermit,
}

impl Deref for PooledConnection {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        self.conn
            .as_ref()
            .expect("connection is present until the guard is dropped")
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            // close() flips the flag under this same lock
            let mut idle = self.pool.idle.lock();
            if !self.pool.closed.load(Ordering::Acquire) {
                idle.push(conn);
            }
        }
    }
}

/// Handle to the content store, cheap to clone and shared by the repositories
#[derive(Clone)]
pub struct Database {
    inner: Arc<PoolInner>,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("path", &self.inner.db_path)
            .field("pool_size", &self.inner.size)
            .finish()
    }
}

impl Database {
    /// Open an existing SQLite store described by `config`
    ///
    /// One connection is opened up front so a missing or corrupt file is
    /// reported here rather than on the first query.
    pub fn open(config: &DatabaseConfig) -> Result<Self, QueryError> {
        let db_path = config
            .resolved_path()
            .map_err(|e| QueryError::store_unavailable(e.to_string()))?;

        let mut flags = OpenFlags::SQLITE_OPEN_NO_MUTEX;
        if config.read_only {
            flags |= OpenFlags::SQLITE_OPEN_READ_ONLY;
        } else {
            flags |= OpenFlags::SQLITE_OPEN_READ_WRITE;
        }

        info!(
            "Opening database at: {:?} (pool size {}, {})",
            db_path,
            config.pool_size,
            if config.read_only { "read-only" } else { "read-write" }
        );

        let db = Self::with_target(
            db_path.to_string_lossy().into_owned(),
            flags,
            db_path,
            config.pool_size,
            None,
        );

        let first = db.inner.connect()?;
        let missing = schema::missing_tables(&first).map_err(|e| {
            QueryError::store_unavailable(format!("Failed to read database schema: {}", e))
        })?;
        if !missing.is_empty() {
            warn!("Database is missing tables: {}", missing.join(", "));
        }
        db.inner.idle.lock().push(first);

        Ok(db)
    }

    /// Create a private in-memory store with empty `grammar` and
    /// `dictionary` tables (for testing and demos)
    pub fn open_in_memory() -> Result<Self, QueryError> {
        Self::open_in_memory_with_pool(4)
    }

    /// In-memory store with an explicit pool size
    pub fn open_in_memory_with_pool(pool_size: usize) -> Result<Self, QueryError> {
        debug!("Creating in-memory database");

        let target = format!("file:cefr-{}?mode=memory&cache=shared", uuid::Uuid::new_v4());
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;

        let anchor = Connection::open_with_flags(&target, flags).map_err(|e| {
            QueryError::store_unavailable(format!("Failed to create in-memory database: {}", e))
        })?;
        schema::create_tables(&anchor).map_err(|e| {
            QueryError::store_unavailable(format!("Failed to create tables: {}", e))
        })?;

        Ok(Self::with_target(
            target,
            flags,
            PathBuf::from(":memory:"),
            pool_size,
            Some(anchor),
        ))
    }

    fn with_target(
        target: String,
        flags: OpenFlags,
        db_path: PathBuf,
        size: usize,
        anchor: Option<Connection>,
    ) -> Self {
        let size = size.max(1);
        Self {
            inner: Arc::new(PoolInner {
                target,
                flags,
                db_path,
                idle: Mutex::new(Vec::with_capacity(size)),
                permits: Arc::new(Semaphore::new(size)),
                size,
                anchor: Mutex::new(anchor),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Get the database file path
    pub fn path(&self) -> &Path {
        &self.inner.db_path
    }

    /// Maximum number of connections checked out at once
    pub fn pool_size(&self) -> usize {
        self.inner.size
    }

    /// Number of checkouts that could start right now
    pub fn available_connections(&self) -> usize {
        self.inner.permits.available_permits()
    }

    /// Number of opened connections waiting in the pool
    pub fn idle_connections(&self) -> usize {
        self.inner.idle.lock().len()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Execute a database operation asynchronously using spawn_blocking
    ///
    /// The permit is awaited on the async side; the connection itself is
    /// only touched on the blocking thread.
    pub async fn execute_async<F, T>(&self, f: F) -> Result<T, QueryError>
    where
        F: FnOnce(&Connection) -> Result<T, QueryError> + Send + 'static,
        T: Send + 'static,
    {
        let permit = Arc::clone(&self.inner.permits)
            .acquire_owned()
            .await
            .map_err(|_| QueryError::store_unavailable("Database has been closed"))?;
        let pool = Arc::clone(&self.inner);

        tokio::task::spawn_blocking(move || {
            let conn = PoolInner::checkout(&pool, permit)?;
            f(&conn)
        })
        .await
        .map_err(|e| QueryError::store_unavailable(format!("Database task failed: {}", e)))?
    }

    /// Stop handing out connections and drop the idle ones
    ///
    /// Calls already running finish normally; their connections are closed
    /// instead of being returned.
    pub fn close(&self) {
        let released = {
            let mut idle = self.inner.idle.lock();
            if self.inner.closed.swap(true, Ordering::AcqRel) {
                return;
            }
            std::mem::take(&mut *idle)
        };

        self.inner.permits.close();
        let dropped = released.len();
        drop(released);
        self.inner.anchor.lock().take();

        info!(
            "Closed database {:?} ({} idle connections released)",
            self.inner.db_path, dropped
        );
    }

    /// Get database statistics
    pub async fn stats(&self) -> Result<DatabaseStats, QueryError> {
        let db_path = self.inner.db_path.clone();

        self.execute_async(move |conn| {
            let grammar_rules: i64 = conn
                .query_row("SELECT COUNT(*) FROM grammar", [], |row| row.get(0))
                .map_err(|e| QueryError::from_sqlite("grammar", e))?;

            let dictionary_entries: i64 = conn
                .query_row("SELECT COUNT(*) FROM dictionary", [], |row| row.get(0))
                .map_err(|e| QueryError::from_sqlite("dictionary", e))?;

            // Get file size if not in-memory
            let file_size = if db_path.to_string_lossy() != ":memory:" {
                std::fs::metadata(&db_path).map(|m| m.len()).unwrap_or(0)
            } else {
                0
            };

            Ok(DatabaseStats {
                grammar_rules,
                dictionary_entries,
                file_size_bytes: file_size,
            })
        })
        .await
    }
}

/// Database statistics
#[derive(Debug, Clone, serde::Serialize)]
pub struct DatabaseStats {
    /// Rows in the grammar table
    pub grammar_rules: i64,
    /// Rows in the dictionary table
    pub dictionary_entries: i64,
    /// Database file size in bytes
    pub file_size_bytes: u64,
}

impl std::fmt::Display for DatabaseStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Grammar rules: {}, Dictionary entries: {}, Size: {} KB",
            self.grammar_rules,
            self.dictionary_entries,
            self.file_size_bytes / 1024
        )
    }
}
