//! Rows of the `applications` table.
//!
//! The full submitted record lives in the `record` JSON column. Columns that
//! are filtered on or mutated (type, status, remark, timestamps) are kept
//! alongside it and win over the JSON copy when a row is read back.

use rusqlite::{params, Row};
use serde_json::Value;

use super::{Database, DatabaseError};
use crate::model::RawRecord;

/// A raw application row from the database.
#[derive(Debug, Clone)]
pub struct ApplicationRow {
    pub id: String,
    pub applicant_type: String,
    pub status: String,
    pub date_of_birth: String,
    pub remark: Option<String>,
    pub record: String,
    pub created_at: String,
    pub updated_at: String,
}

impl ApplicationRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            applicant_type: row.get("applicant_type")?,
            status: row.get("status")?,
            date_of_birth: row.get("date_of_birth")?,
            remark: row.get("remark")?,
            record: row.get("record")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// The stored document with the column values overlaid.
    pub fn to_raw(&self) -> Result<RawRecord, DatabaseError> {
        let mut raw: RawRecord = match serde_json::from_str(&self.record)? {
            Value::Object(map) => map,
            _ => RawRecord::new(),
        };

        raw.insert("id".to_string(), Value::String(self.id.clone()));
        raw.insert(
            "applicantType".to_string(),
            Value::String(self.applicant_type.clone()),
        );
        raw.insert("status".to_string(), Value::String(self.status.clone()));
        match &self.remark {
            Some(remark) => {
                raw.insert("remark".to_string(), Value::String(remark.clone()));
            }
            None => {
                raw.remove("remark");
            }
        }
        raw.insert(
            "createdAt".to_string(),
            Value::String(self.created_at.clone()),
        );
        raw.insert(
            "updatedAt".to_string(),
            Value::String(self.updated_at.clone()),
        );
        Ok(raw)
    }
}

/// Query filter parameters for application listing.
#[derive(Debug, Default, Clone)]
pub struct ApplicationFilter {
    pub applicant_type: Option<String>,
    pub status: Option<String>,
    pub limit: Option<u64>,
}

/// Inserts a new application row.
pub fn insert(db: &Database, row: &ApplicationRow) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO applications (id, applicant_type, status, date_of_birth, remark,
             record, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                row.id,
                row.applicant_type,
                row.status,
                row.date_of_birth,
                row.remark,
                row.record,
                row.created_at,
                row.updated_at,
            ],
        )?;
        Ok(())
    })
}

/// Finds an application by its ID.
pub fn find_by_id(db: &Database, id: &str) -> Result<Option<ApplicationRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM applications WHERE id = ?1")?;
        let mut rows = stmt.query_map(params![id], ApplicationRow::from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}

/// Applications matching `filter`, newest first.
pub fn query(
    db: &Database,
    filter: &ApplicationFilter,
) -> Result<Vec<ApplicationRow>, DatabaseError> {
    // SQLite treats a negative LIMIT as no limit.
    let limit = filter.limit.map_or(-1, |l| i64::try_from(l).unwrap_or(i64::MAX));
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT * FROM applications
             WHERE (?1 IS NULL OR applicant_type = ?1)
               AND (?2 IS NULL OR LOWER(status) = LOWER(?2))
             ORDER BY created_at DESC, rowid DESC
             LIMIT ?3",
        )?;
        let rows = stmt
            .query_map(
                params![filter.applicant_type, filter.status, limit],
                ApplicationRow::from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Moves an application from `expected_status` to `status`.
///
/// Returns `false` when no row with that id is in `expected_status`, which
/// leaves the table untouched.
pub fn update_status(
    db: &Database,
    id: &str,
    expected_status: &str,
    status: &str,
    remark: Option<&str>,
    updated_at: &str,
) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let changed = conn.execute(
            "UPDATE applications SET status = ?3, remark = ?4, updated_at = ?5
             WHERE id = ?1 AND LOWER(status) = LOWER(?2)",
            params![id, expected_status, status, remark, updated_at],
        )?;
        if changed > 0 {
            log::info!("Application {} moved to {}", id, status);
        }
        Ok(changed > 0)
    })
}

/// Row counts grouped by stored status text.
pub fn count_by_status(db: &Database) -> Result<Vec<(String, u64)>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt =
            conn.prepare("SELECT status, COUNT(*) FROM applications GROUP BY status")?;
        let rows = stmt
            .query_map([], |r| Ok((r.get::<_, String>(0)?, r.get::<_, u64>(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}
