//! Schema upgrades between registry versions
//!
//! v1 stored inspection results as `passed|failed|pending` and had no
//! site configuration table. v2 rewrites results to the canonical values.

use rusqlite::{Connection, OptionalExtension};
use tracing::info;
use crate::error::Result;
use super::schema;

/// Version written by this library
pub const CURRENT_VERSION: &str = "2";

/// Stored versions are small integers kept as text
fn version_number(version: &str) -> Option<u32> {
    version.trim().parse().ok()
}

/// Run every upgrade step newer than `from_version`
///
/// An unreadable version is treated as v1.
pub fn upgrade_database(conn: &Connection, from_version: &str) -> Result<()> {
    let from = version_number(from_version).unwrap_or(1);

    if from < 2 {
        upgrade_to_v2(conn)?;
    }

    Ok(())
}

fn upgrade_to_v2(conn: &Connection) -> Result<()> {
    let rewritten = conn.execute(
        "UPDATE inspections SET result = CASE result
            WHEN 'passed' THEN 'dat'
            WHEN 'failed' THEN 'khong_dat'
            WHEN 'pending' THEN 'cho_khac_phuc'
            ELSE result END
         WHERE result IN ('passed', 'failed', 'pending')",
        [],
    )?;
    if rewritten > 0 {
        info!(rewritten, "normalized legacy inspection results");
    }

    conn.execute_batch(schema::CREATE_SITE_CONFIG_TABLE)?;
    conn.execute_batch(schema::CREATE_INSPECTIONS_FACILITY_INDEX)?;
    Ok(())
}

/// Whether this library can open a file at `version`
///
/// Files written by a newer library are refused; unreadable versions are
/// upgraded from v1.
pub fn is_version_compatible(version: &str) -> bool {
    match (version_number(version), version_number(CURRENT_VERSION)) {
        (Some(found), Some(current)) => found <= current,
        _ => true,
    }
}

/// Stored version, `"1"` when the properties table or row is missing
pub fn get_database_version(conn: &Connection) -> Result<String> {
    let stored = conn
        .query_row("SELECT version FROM attp_properties LIMIT 1", [], |row| row.get::<_, Option<String>>(0))
        .optional();

    Ok(match stored {
        Ok(Some(Some(version))) => version,
        _ => "1".to_string(),
    })
}

pub fn set_database_version(conn: &Connection, version: &str) -> Result<()> {
    conn.execute("UPDATE attp_properties SET version = ?1", [version])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v1_schema(conn: &Connection) {
        conn.execute_batch(r#"
            CREATE TABLE attp_properties (
                database_id TEXT PRIMARY KEY,
                version TEXT
            );
            INSERT INTO attp_properties (database_id, version) VALUES ('test', '1');

            CREATE TABLE facilities (
                id TEXT PRIMARY KEY,
                name TEXT
            );
            CREATE TABLE inspections (
                id TEXT PRIMARY KEY,
                facility_id TEXT,
                result TEXT
            );
            INSERT INTO facilities (id, name) VALUES ('f1', 'A');
            INSERT INTO inspections VALUES ('i1', 'f1', 'passed');
            INSERT INTO inspections VALUES ('i2', 'f1', 'failed');
            INSERT INTO inspections VALUES ('i3', 'f1', 'pending');
            INSERT INTO inspections VALUES ('i4', 'f1', 'da_khac_phuc');
        "#).unwrap();
    }

    fn result_of(conn: &Connection, id: &str) -> String {
        conn.query_row("SELECT result FROM inspections WHERE id = ?", [id], |row| row.get(0)).unwrap()
    }

    #[test]
    fn test_is_version_compatible() {
        assert!(is_version_compatible("1"));
        assert!(is_version_compatible("2"));
        assert!(!is_version_compatible("3"));
        assert!(is_version_compatible("invalid"));
    }

    #[test]
    fn test_upgrade_from_v1_rewrites_legacy_results() {
        let conn = Connection::open_in_memory().unwrap();
        v1_schema(&conn);

        upgrade_database(&conn, "1").unwrap();

        assert_eq!(result_of(&conn, "i1"), "dat");
        assert_eq!(result_of(&conn, "i2"), "khong_dat");
        assert_eq!(result_of(&conn, "i3"), "cho_khac_phuc");
        assert_eq!(result_of(&conn, "i4"), "da_khac_phuc");

        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'site_config'",
            [],
            |row| row.get(0),
        ).unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_upgrade_is_noop_at_current_version() {
        let conn = Connection::open_in_memory().unwrap();
        v1_schema(&conn);

        upgrade_database(&conn, CURRENT_VERSION).unwrap();
        assert_eq!(result_of(&conn, "i1"), "passed");
    }

    #[test]
    fn test_get_set_database_version() {
        let conn = Connection::open_in_memory().unwrap();
        v1_schema(&conn);

        assert_eq!(get_database_version(&conn).unwrap(), "1");
        set_database_version(&conn, "2").unwrap();
        assert_eq!(get_database_version(&conn).unwrap(), "2");
    }

    #[test]
    fn test_get_database_version_missing_table() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(get_database_version(&conn).unwrap(), "1");
    }
}
