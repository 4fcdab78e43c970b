use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use uuid::Uuid;

use crate::db::{document_repo, document_repo::DocumentRow, Database};
use crate::error::{PortalError, Result, StorageError};
use crate::model::Upload;

/// A document read back from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredDocument {
    pub id: String,
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Uploaded documents: bytes under one directory, metadata in the database.
#[derive(Clone)]
pub struct DocumentStore {
    root: PathBuf,
    db: Database,
}

impl DocumentStore {
    pub fn new<P: AsRef<Path>>(root: P, db: Database) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            db,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Stores an upload under a fresh id and returns the id.
    pub fn put(&self, upload: &Upload) -> Result<String> {
        self.ensure_directory(&self.root)?;

        let id = Uuid::new_v4().to_string();
        let content_type = upload.effective_content_type();
        let stored_name = format!("{}.{}", id, extension_for(&content_type));
        let path = self.root.join(&stored_name);

        write_new_file(&path, &upload.bytes)?;

        let row = DocumentRow {
            id: id.clone(),
            filename: upload.filename.clone(),
            content_type,
            size_bytes: upload.bytes.len() as u64,
            stored_name,
            created_at: Utc::now().to_rfc3339(),
        };
        if let Err(e) = document_repo::insert(&self.db, &row) {
            let _ = std::fs::remove_file(&path);
            return Err(e.into());
        }

        Ok(id)
    }

    pub fn get(&self, id: &str) -> Result<StoredDocument> {
        validate_id(id)?;

        let row = document_repo::find_by_id(&self.db, id)?
            .ok_or_else(|| StorageError::DocumentNotFound(id.to_string()))?;
        let path = self.root.join(&row.stored_name);
        let bytes = std::fs::read(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => StorageError::DocumentNotFound(id.to_string()),
            _ => StorageError::ReadFile { path, source: e },
        })?;

        Ok(StoredDocument {
            id: row.id,
            filename: row.filename,
            content_type: row.content_type,
            bytes,
        })
    }

    /// Removes a document. Unknown ids are ignored.
    pub fn delete(&self, id: &str) -> Result<()> {
        validate_id(id)?;

        let Some(row) = document_repo::find_by_id(&self.db, id)? else {
            return Ok(());
        };
        let path = self.root.join(&row.stored_name);
        match std::fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(StorageError::RemoveFile { path, source: e }.into()),
        }
        document_repo::delete(&self.db, id)?;
        Ok(())
    }

    fn ensure_directory(&self, path: &Path) -> std::result::Result<(), StorageError> {
        if !path.exists() {
            std::fs::create_dir_all(path).map_err(|e| StorageError::CreateDirectory {
                path: path.to_path_buf(),
                source: e,
            })?;
        }
        Ok(())
    }
}

/// Creates the file exclusively (`O_CREAT | O_EXCL`) and writes it.
fn write_new_file(path: &Path, content: &[u8]) -> std::result::Result<(), StorageError> {
    let file = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| StorageError::WriteFile {
            path: path.to_path_buf(),
            source: e,
        })?;
    fill_or_discard(file, path, content)
}

/// Writes `content` to the freshly created `path`. On failure the partial
/// file is removed.
fn fill_or_discard<W: Write>(
    mut out: W,
    path: &Path,
    content: &[u8],
) -> std::result::Result<(), StorageError> {
    let written = out.write_all(content).and_then(|()| out.flush());
    drop(out);

    written.map_err(|source| {
        if let Err(e) = std::fs::remove_file(path) {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "Could not discard partial document"
            );
        }
        StorageError::WriteFile {
            path: path.to_path_buf(),
            source,
        }
    })
}

fn validate_id(id: &str) -> std::result::Result<(), PortalError> {
    Uuid::parse_str(id)
        .map(|_| ())
        .map_err(|_| StorageError::InvalidDocumentId(id.to_string()).into())
}

fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/png" => "png",
        "image/jpeg" | "image/jpg" => "jpg",
        other => mime_guess::get_mime_extensions_str(other)
            .and_then(|exts| exts.first().copied())
            .unwrap_or("bin"),
    }
}
