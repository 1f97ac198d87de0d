/*!
 * Database connection management.
 *
 * One SQLite connection guarded by a mutex. Blocking work is moved off the
 * async runtime with tokio's spawn_blocking; imports borrow the connection
 * mutably so they can run inside their own transaction.
 */

use anyhow::{Context, Result};
use log::{debug, info};
use parking_lot::Mutex;
use rusqlite::{Connection, Transaction};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::schema;

/// Default database filename
const DEFAULT_DB_FILENAME: &str = "termbase.db";

/// Default database directory name under user's data directory
const DEFAULT_DB_DIRNAME: &str = "termbase";

/// Path reported by in-memory databases
const IN_MEMORY_PATH: &str = ":memory:";

/// Tables counted by `stats`
const COUNTED_TABLES: [&str; 6] = [
    "languages",
    "glossaries",
    "concepts",
    "translations",
    "definitions",
    "external_resources",
];

/// Shared handle on the terminology database
#[derive(Clone)]
pub struct DatabaseConnection {
    db_path: PathBuf,
    connection: Arc<Mutex<Connection>>,
}

impl DatabaseConnection {
    /// Open the database at the default location
    pub fn new_default() -> Result<Self> {
        Self::new(Self::default_database_path()?)
    }

    /// Open (or create) the database file at `db_path`
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref().to_path_buf();

        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create database directory: {:?}", parent))?;
        }

        info!("Opening terminology database at {:?}", db_path);
        let conn = Connection::open(&db_path)
            .with_context(|| format!("Failed to open database: {:?}", db_path))?;
        conn.pragma_update(None, "journal_mode", "WAL")
            .context("Failed to enable WAL journal")?;

        Self::prepared(db_path, conn)
    }

    /// Create an in-memory database (for testing)
    pub fn new_in_memory() -> Result<Self> {
        debug!("Creating in-memory terminology database");
        let conn = Connection::open_in_memory().context("Failed to create in-memory database")?;
        Self::prepared(PathBuf::from(IN_MEMORY_PATH), conn)
    }

    fn prepared(db_path: PathBuf, conn: Connection) -> Result<Self> {
        schema::initialize_schema(&conn)
            .with_context(|| format!("Failed to prepare schema of {:?}", db_path))?;

        Ok(Self {
            db_path,
            connection: Arc::new(Mutex::new(conn)),
        })
    }

    /// Default database path under the user's data directory
    pub fn default_database_path() -> Result<PathBuf> {
        let base_dir = dirs::data_local_dir()
            .or_else(dirs::data_dir)
            .or_else(|| dirs::home_dir().map(|h| h.join(".local").join("share")))
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;

        Ok(base_dir.join(DEFAULT_DB_DIRNAME).join(DEFAULT_DB_FILENAME))
    }

    /// Get the database file path
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    /// Whether the database lives in memory only
    pub fn is_in_memory(&self) -> bool {
        self.db_path.as_os_str() == IN_MEMORY_PATH
    }

    /// Run a closure with the locked connection on the current thread
    pub fn execute<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.connection.lock();
        f(&conn)
    }

    /// Run a closure with the locked connection on the blocking pool
    pub async fn execute_async<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.connection.clone();

        tokio::task::spawn_blocking(move || f(&conn.lock()))
            .await
            .context("Database task panicked")?
    }

    /// Like `execute_async`, with a mutable borrow for callers that manage
    /// their own transaction
    pub async fn execute_mut_async<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.connection.clone();

        tokio::task::spawn_blocking(move || f(&mut conn.lock()))
            .await
            .context("Database task panicked")?
    }

    /// Run a closure inside a transaction on the blocking pool
    ///
    /// The transaction is committed when the closure succeeds and rolled
    /// back when it fails.
    pub async fn transaction_async<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Transaction) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.connection.clone();

        tokio::task::spawn_blocking(move || {
            let mut conn = conn.lock();
            let tx = conn.transaction()?;
            let result = f(&tx)?;
            tx.commit()?;
            Ok(result)
        })
        .await
        .context("Database transaction task panicked")?
    }

    /// Row counts of the terminology tables
    pub fn stats(&self) -> Result<DatabaseStats> {
        let counts = self.execute(|conn| {
            COUNTED_TABLES
                .iter()
                .map(|table| {
                    conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                        row.get::<_, i64>(0)
                    })
                    .with_context(|| format!("Failed to count rows of {}", table))
                })
                .collect::<Result<Vec<i64>>>()
        })?;

        let file_size_bytes = if self.is_in_memory() {
            0
        } else {
            std::fs::metadata(&self.db_path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(DatabaseStats {
            language_count: counts[0],
            glossary_count: counts[1],
            concept_count: counts[2],
            translation_count: counts[3],
            definition_count: counts[4],
            resource_count: counts[5],
            file_size_bytes,
        })
    }

    /// `stats` on the blocking pool
    pub async fn stats_async(&self) -> Result<DatabaseStats> {
        let db = self.clone();
        tokio::task::spawn_blocking(move || db.stats())
            .await
            .context("Statistics task panicked")?
    }
}

/// Row counts of the terminology store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatabaseStats {
    /// Number of registered languages
    pub language_count: i64,
    /// Number of glossaries
    pub glossary_count: i64,
    /// Number of concepts across all glossaries
    pub concept_count: i64,
    /// Number of translations
    pub translation_count: i64,
    /// Number of definitions
    pub definition_count: i64,
    /// Number of external resources
    pub resource_count: i64,
    /// Database file size in bytes
    pub file_size_bytes: u64,
}

impl std::fmt::Display for DatabaseStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Languages: {}, Glossaries: {}, Concepts: {}, Translations: {}, Definitions: {}, Resources: {}, Size: {} KB",
            self.language_count,
            self.glossary_count,
            self.concept_count,
            self.translation_count,
            self.definition_count,
            self.resource_count,
            self.file_size_bytes / 1024
        )
    }
}
