//! Error types shared across the portal.
//!
//! [`PortalError`] is what every service operation returns. The HTTP layer
//! maps its variants to status codes, so new variants need a mapping there
//! too.

use std::path::PathBuf;
use thiserror::Error;

use crate::validation::ValidationErrors;

#[derive(Error, Debug)]
pub enum PortalError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// One or more form fields failed validation. Carries every issue, not
    /// just the first.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Document storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Export failed: {0}")]
    Render(#[from] RenderError),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),

    #[error("Application not found")]
    NotFound { id: String },

    /// Status lookup with a date of birth that does not match the record.
    #[error("Invalid date of birth")]
    DateOfBirthMismatch,

    /// Approved and rejected applications cannot be decided again.
    #[error("Cannot change status from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Background task failed: {0}")]
    Task(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read portal config '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Portal config is not valid JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Invalid portal config: {message}")]
    Validation { message: String },

    #[error("Portal config does not match schema: {errors}")]
    SchemaValidation { errors: String },

    #[error("Cannot load card font '{path}': {reason}")]
    Font { path: PathBuf, reason: String },
}

/// Failures of the on-disk document store.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Cannot create document directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot store document at '{path}': {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot read document at '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot discard document at '{path}': {source}")]
    RemoveFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    #[error("Invalid document id: {0}")]
    InvalidDocumentId(String),
}

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Cannot encode card image: {0}")]
    ImageEncoding(String),

    #[error("Cannot assemble PDF: {0}")]
    PdfAssembly(String),

    #[error("QR code unavailable: {0}")]
    QrCode(String),
}

pub type Result<T> = std::result::Result<T, PortalError>;
