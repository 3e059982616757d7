//! SQLite handle for the registry file

use std::path::{Path, PathBuf};
use std::time::Duration;
use rusqlite::Connection;
use crate::error::{AttpError, Result};
use super::schema;

/// How long a write waits on a lock held by another process
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Registry database file and its connection
pub struct Database {
    path: PathBuf,
    /// `None` once closed
    conn: Option<Connection>,
}

impl Database {
    /// Open an existing registry file
    ///
    /// Foreign keys are enforced so deleting a facility cannot orphan
    /// inspections.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "foreign_keys", true)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(Self {
            path: path.to_path_buf(),
            conn: Some(conn),
        })
    }

    /// Create the file and every registry table
    pub fn create(path: &Path) -> Result<Self> {
        let db = Self::open(path)?;
        let conn = db.connection()?;
        for statement in schema::CREATE_ALL_TABLES {
            conn.execute_batch(statement)?;
        }
        Ok(db)
    }

    /// Live connection, or an error after [`Database::close`]
    pub fn connection(&self) -> Result<&Connection> {
        self.conn.as_ref()
            .ok_or_else(|| AttpError::DatabaseError("Registry database is closed".to_string()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Drop the connection; later calls to [`Database::connection`] fail
    pub fn close(&mut self) {
        self.conn = None;
    }

    pub fn is_open(&self) -> bool {
        self.conn.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_create_has_all_tables() {
        let temp_dir = TempDir::new().unwrap();
        let db = Database::create(&temp_dir.path().join("test.db")).unwrap();

        let conn = db.connection().unwrap();
        for table in ["attp_properties", "facility_types", "facilities", "inspections", "profiles", "site_config"] {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?",
                [table],
                |row| row.get(0),
            ).unwrap();
            assert_eq!(count, 1, "missing table {}", table);
        }
    }

    #[test]
    fn test_close() {
        let temp_dir = TempDir::new().unwrap();
        let mut db = Database::create(&temp_dir.path().join("test.db")).unwrap();
        assert!(db.is_open());
        db.close();
        assert!(!db.is_open());
        assert!(db.connection().is_err());
    }

    #[test]
    fn test_foreign_keys_enforced() {
        let temp_dir = TempDir::new().unwrap();
        let db = Database::create(&temp_dir.path().join("test.db")).unwrap();
        assert_eq!(db.path(), temp_dir.path().join("test.db"));

        let result = db.connection().unwrap().execute(
            "INSERT INTO inspections (id, facility_id, inspection_date, year, team_type, result)
             VALUES ('i1', 'missing', '2024-01-01', 2024, 'lien_nganh', 'dat')",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_unknown_enum_values() {
        let temp_dir = TempDir::new().unwrap();
        let db = Database::create(&temp_dir.path().join("test.db")).unwrap();

        let result = db.connection().unwrap().execute(
            "INSERT INTO facilities (id, name, type, province_code, status) VALUES ('f1', 'A', 'X', 'xa', 'active')",
            [],
        );
        assert!(result.is_err());
    }
}
