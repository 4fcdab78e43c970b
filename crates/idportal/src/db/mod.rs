//! SQLite persistence for application records and uploaded document
//! metadata.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::config::StorageConfig;

pub mod application_repo;
pub mod document_repo;
pub mod error;
pub mod migrations;

pub use error::DatabaseError;

/// File name of the portal database inside the data directory.
pub const DATABASE_FILE_NAME: &str = "idportal.db";

/// Handle to the portal database.
///
/// Every clone points at the same rusqlite connection; callers take turns
/// through [`Database::with_conn`].
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Opens the database file the storage section points at.
    pub fn open_configured(storage: &StorageConfig) -> Result<Self, DatabaseError> {
        Self::open(&storage.database_path())
    }

    /// Opens `path`, creating the file and its directory on first use, and
    /// brings the schema up to date.
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
        if let Some(dir) = dir {
            std::fs::create_dir_all(dir).map_err(|source| DatabaseError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
        }

        let db = Self::prepare(Connection::open(path)?, true)?;
        log::info!("Application database ready at {}", path.display());
        Ok(db)
    }

    /// A throwaway database living only as long as the handle.
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        Self::prepare(Connection::open_in_memory()?, false)
    }

    fn prepare(conn: Connection, journal: bool) -> Result<Self, DatabaseError> {
        if journal {
            let mode: String =
                conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
            log::debug!("SQLite journal mode: {mode}");
        }
        conn.pragma_update(None, "foreign_keys", true)?;
        migrations::run_all(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Runs `f` while holding the connection lock.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, DatabaseError>
    where
        F: FnOnce(&Connection) -> Result<T, DatabaseError>,
    {
        let guard = self.conn.lock().map_err(|_| DatabaseError::LockPoisoned)?;
        f(&guard)
    }
}

/// `~/.idportal/data/idportal.db`, or `None` without a home directory.
pub fn default_database_path() -> Option<PathBuf> {
    crate::config::schema::default_data_directory().map(|dir| dir.join(DATABASE_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn version(db: &Database) -> u32 {
        db.with_conn(migrations::schema_version).unwrap()
    }

    #[test]
    fn test_in_memory_database_is_migrated() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(version(&db), migrations::LATEST_VERSION);
    }

    #[test]
    fn test_open_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("portal.db");

        let db = Database::open(&path).unwrap();
        assert!(path.exists());
        assert_eq!(version(&db), migrations::LATEST_VERSION);

        drop(db);
        let db = Database::open(&path).unwrap();
        assert_eq!(version(&db), migrations::LATEST_VERSION);
    }

    #[test]
    fn test_default_path_points_into_home() {
        let path = default_database_path().unwrap();
        assert!(path.ends_with(DATABASE_FILE_NAME));
        assert!(path.to_string_lossy().contains(".idportal"));
    }

    #[test]
    fn test_clones_share_one_connection() {
        let db = Database::open_in_memory().unwrap();
        let other = db.clone();

        db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO applications (id, applicant_type, date_of_birth, record, created_at, updated_at)
                 VALUES ('t1', 'gazetted', '1980-01-01', '{}', '2026-01-01', '2026-01-01')",
                [],
            )?;
            Ok(())
        })
        .unwrap();

        let rows: u32 = other
            .with_conn(|conn| {
                Ok(conn.query_row("SELECT COUNT(*) FROM applications", [], |r| r.get(0))?)
            })
            .unwrap();
        assert_eq!(rows, 1);
    }
}
