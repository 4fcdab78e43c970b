//! The record store behind the portal.
//!
//! The service layer talks to [`ApplicationBackend`] only, so the SQLite
//! store can be swapped for a remote one or a test double.

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::db::application_repo::{self, ApplicationFilter, ApplicationRow};
use crate::db::Database;
use crate::error::Result;
use crate::model::{ApplicantType, ApplicationStatus, RawRecord};

/// Listing filter. `None` means no restriction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicationQuery {
    pub applicant_type: Option<ApplicantType>,
    pub status: Option<ApplicationStatus>,
    pub limit: Option<u64>,
}

/// Application counts per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total: u64,
    pub pending: u64,
    pub approved: u64,
    pub rejected: u64,
}

pub trait ApplicationBackend: Send + Sync {
    /// Persists a new record and returns it as stored, with its id and
    /// timestamps filled in.
    fn create_application(&self, record: RawRecord) -> Result<RawRecord>;

    fn get_application(&self, id: &str) -> Result<Option<RawRecord>>;

    /// Newest first.
    fn list_applications(&self, query: &ApplicationQuery) -> Result<Vec<RawRecord>>;

    /// Moves a record from `from` to `to`. Returns `false` when the record is
    /// no longer in `from`; nothing is written in that case.
    fn update_status(
        &self,
        id: &str,
        from: ApplicationStatus,
        to: ApplicationStatus,
        remark: Option<&str>,
    ) -> Result<bool>;

    fn status_counts(&self) -> Result<DashboardStats>;
}

/// [`ApplicationBackend`] over the local SQLite database.
#[derive(Clone)]
pub struct SqliteBackend {
    db: Database,
}

impl SqliteBackend {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

fn text_field(record: &RawRecord, key: &str) -> Option<String> {
    match record.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

impl ApplicationBackend for SqliteBackend {
    fn create_application(&self, mut record: RawRecord) -> Result<RawRecord> {
        let id = text_field(&record, "id").unwrap_or_else(|| Uuid::new_v4().to_string());
        let now = Utc::now().to_rfc3339();

        let applicant_type = text_field(&record, "applicantType")
            .and_then(|t| ApplicantType::parse(&t))
            .unwrap_or_default();
        let status = text_field(&record, "status")
            .and_then(|s| ApplicationStatus::parse(&s))
            .unwrap_or_default();

        record.remove("id");
        record
            .entry("applicationDate")
            .or_insert_with(|| Value::String(now.clone()));

        let row = ApplicationRow {
            id,
            applicant_type: applicant_type.as_str().to_string(),
            status: status.label().to_string(),
            date_of_birth: text_field(&record, "dateOfBirth").unwrap_or_default(),
            remark: text_field(&record, "remark"),
            record: serde_json::to_string(&record).map_err(crate::db::DatabaseError::from)?,
            created_at: now.clone(),
            updated_at: now,
        };
        application_repo::insert(&self.db, &row)?;

        Ok(row.to_raw()?)
    }

    fn get_application(&self, id: &str) -> Result<Option<RawRecord>> {
        match application_repo::find_by_id(&self.db, id)? {
            Some(row) => Ok(Some(row.to_raw()?)),
            None => Ok(None),
        }
    }

    fn list_applications(&self, query: &ApplicationQuery) -> Result<Vec<RawRecord>> {
        let filter = ApplicationFilter {
            applicant_type: query.applicant_type.map(|t| t.as_str().to_string()),
            status: query.status.map(|s| s.label().to_string()),
            limit: query.limit,
        };
        let rows = application_repo::query(&self.db, &filter)?;
        let records = rows
            .iter()
            .map(ApplicationRow::to_raw)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(records)
    }

    fn update_status(
        &self,
        id: &str,
        from: ApplicationStatus,
        to: ApplicationStatus,
        remark: Option<&str>,
    ) -> Result<bool> {
        let updated_at = Utc::now().to_rfc3339();
        Ok(application_repo::update_status(
            &self.db,
            id,
            from.label(),
            to.label(),
            remark,
            &updated_at,
        )?)
    }

    fn status_counts(&self) -> Result<DashboardStats> {
        let mut stats = DashboardStats::default();
        for (status, count) in application_repo::count_by_status(&self.db)? {
            stats.total += count;
            match ApplicationStatus::parse(&status).unwrap_or_default() {
                ApplicationStatus::Pending => stats.pending += count,
                ApplicationStatus::Approved => stats.approved += count,
                ApplicationStatus::Rejected => stats.rejected += count,
            }
        }
        Ok(stats)
    }
}
