//! Isolated portal instances for integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;

use idportal::{
    Application, ApplicationBackend, Database, DocumentStore, Portal, PortalConfig, RawRecord,
    SqliteBackend,
};

/// A portal wired to a fresh in-memory database. Documents land in a temp
/// directory that is removed on drop.
pub struct TestHarness {
    temp_dir: TempDir,
    pub documents_dir: PathBuf,
    pub backend: Arc<SqliteBackend>,
    pub portal: Portal,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_config(PortalConfig::default())
    }

    pub fn with_config(config: PortalConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let documents_dir = temp_dir.path().join("documents");

        let db = Database::open_in_memory().expect("Failed to open database");
        let store = DocumentStore::new(&documents_dir, db.clone());
        let backend = Arc::new(SqliteBackend::new(db));
        let portal =
            Portal::new(backend.clone(), store, config).expect("Failed to build portal");

        Self {
            temp_dir,
            documents_dir,
            backend,
            portal,
        }
    }

    pub fn temp_path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Number of files in the document directory.
    pub fn stored_document_count(&self) -> usize {
        std::fs::read_dir(&self.documents_dir)
            .map(|entries| entries.count())
            .unwrap_or(0)
    }

    /// Inserts a record directly, bypassing form validation. Used for
    /// records shaped like older portal versions wrote them.
    pub fn insert_record(&self, record: RawRecord) -> Application {
        let stored = self
            .backend
            .create_application(record)
            .expect("Failed to insert record");
        idportal::model::map_record(&stored)
    }

    pub fn write_file(&self, name: &str, content: &[u8]) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        std::fs::write(&path, content).expect("Failed to write file");
        path
    }
}
