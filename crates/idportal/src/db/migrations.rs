//! Versioned schema upgrades, recorded in `_migrations`.

use rusqlite::{params, Connection};

use super::error::DatabaseError;

/// When a step's SQL is executed.
enum Guard {
    Always,
    /// Skipped when the table already has this column. Databases created by
    /// early portal builds carry `remark` from the start.
    MissingColumn(&'static str, &'static str),
}

struct Step {
    version: u32,
    name: &'static str,
    guard: Guard,
    sql: &'static str,
}

const STEPS: [Step; 3] = [
    Step {
        version: 1,
        name: "create_applications_table",
        guard: Guard::Always,
        sql: include_str!("sql/001_create_applications.sql"),
    },
    Step {
        version: 2,
        name: "create_documents_table",
        guard: Guard::Always,
        sql: include_str!("sql/002_create_documents.sql"),
    },
    Step {
        version: 3,
        name: "add_remark_to_applications",
        guard: Guard::MissingColumn("applications", "remark"),
        sql: include_str!("sql/003_add_remark.sql"),
    },
];

/// Version the schema reaches once every step is applied.
pub const LATEST_VERSION: u32 = STEPS[STEPS.len() - 1].version;

/// Highest applied step, 0 for a fresh database.
pub fn schema_version(conn: &Connection) -> Result<u32, DatabaseError> {
    Ok(conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM _migrations",
        [],
        |row| row.get(0),
    )?)
}

/// Applies every step newer than the recorded schema version.
pub fn run_all(conn: &Connection) -> Result<(), DatabaseError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _migrations (
            version INTEGER PRIMARY KEY,
            description TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )?;

    let applied = schema_version(conn)?;
    for step in STEPS.iter().filter(|s| s.version > applied) {
        let needed = match step.guard {
            Guard::Always => true,
            Guard::MissingColumn(table, column) => !has_column(conn, table, column)?,
        };

        if needed {
            log::info!("Applying schema step {} ({})", step.version, step.name);
            conn.execute_batch(step.sql)
                .map_err(|e| DatabaseError::Migration {
                    version: step.version,
                    reason: e.to_string(),
                })?;
        } else {
            log::debug!("Schema step {} already satisfied", step.version);
        }

        conn.execute(
            "INSERT INTO _migrations (version, description) VALUES (?1, ?2)",
            params![step.version, step.name],
        )?;
    }

    Ok(())
}

fn has_column(conn: &Connection, table: &str, column: &str) -> Result<bool, DatabaseError> {
    let mut stmt = conn.prepare("SELECT 1 FROM pragma_table_info(?1) WHERE name = ?2")?;
    Ok(stmt.exists(params![table, column])?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        run_all(&conn).unwrap();
        conn
    }

    #[test]
    fn test_fresh_database_reaches_latest_version() {
        let conn = fresh();
        assert_eq!(schema_version(&conn).unwrap(), LATEST_VERSION);
    }

    #[test]
    fn test_second_run_records_nothing_new() {
        let conn = fresh();
        run_all(&conn).unwrap();

        let rows: u32 = conn
            .query_row("SELECT COUNT(*) FROM _migrations", [], |r| r.get(0))
            .unwrap();
        assert_eq!(rows, STEPS.len() as u32);
    }

    #[test]
    fn test_has_column() {
        let conn = fresh();
        assert!(has_column(&conn, "applications", "record").unwrap());
        assert!(has_column(&conn, "applications", "remark").unwrap());
        assert!(!has_column(&conn, "applications", "photo").unwrap());
        assert!(!has_column(&conn, "no_such_table", "id").unwrap());
    }

    #[test]
    fn test_remark_step_tolerates_existing_column() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(include_str!("sql/001_create_applications.sql"))
            .unwrap();
        conn.execute_batch("ALTER TABLE applications ADD COLUMN remark TEXT;")
            .unwrap();

        run_all(&conn).unwrap();
        assert_eq!(schema_version(&conn).unwrap(), LATEST_VERSION);
    }

    #[test]
    fn test_documents_table_accepts_metadata() {
        let conn = fresh();
        conn.execute(
            "INSERT INTO documents (id, filename, content_type, size_bytes, stored_name, created_at)
             VALUES ('d1', 'photo.png', 'image/png', 3, 'd1.png', '2026-01-01')",
            [],
        )
        .unwrap();
    }
}
