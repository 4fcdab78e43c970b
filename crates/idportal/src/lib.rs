pub mod backend;
pub mod card;
pub mod config;
pub mod db;
pub mod error;
pub mod model;
pub mod service;
pub mod storage;
pub mod summary;
pub mod validation;

pub use backend::{ApplicationBackend, ApplicationQuery, DashboardStats, SqliteBackend};
pub use card::{CardExport, CardSide, QrPayload};
pub use config::{load_config, load_config_from_env, PortalConfig};
pub use db::{Database, DatabaseError};
pub use error::{ConfigError, PortalError, RenderError, Result, StorageError};
pub use model::{
    AdminAction, Application, ApplicantType, ApplicationForm, ApplicationStatus, FamilyMember,
    RawRecord, Upload,
};
pub use service::{Portal, StatusLookup, StatusUpdateOutcome};
pub use storage::{DocumentStore, StoredDocument};
pub use summary::SummaryExport;
pub use validation::{FieldIssue, ValidationErrors};
