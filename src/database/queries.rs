//! SQL query operations for database access
//!
//! Row-level CRUD in the shape of the hosted table API: filter, order,
//! insert, update, delete. For business-level operations, use the Registry API.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};
use rusqlite::types::Value;
use crate::error::{AttpError, Result};
use crate::utils::{now_timestamp, parse_datetime};
use super::models::*;

fn timestamp_or_now(raw: Option<String>) -> DateTime<Utc> {
    raw.as_deref().and_then(parse_datetime).unwrap_or_else(Utc::now)
}

// ============================================================================
// Properties queries
// ============================================================================

/// Check if properties table has any rows
pub fn has_properties(conn: &Connection) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM attp_properties",
        [],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Set properties (insert new row)
pub fn set_properties(conn: &Connection, database_id: &str, version: &str) -> Result<()> {
    let now = now_timestamp();
    conn.execute(
        "INSERT INTO attp_properties (database_id, version, create_timestamp, update_timestamp)
         VALUES (?, ?, ?, ?)",
        params![database_id, version, now, now],
    )?;
    Ok(())
}

// ============================================================================
// Facility queries
// ============================================================================

const FACILITY_COLUMNS: &str = "id, name, owner_name, address, type, province_code, status, is_certified,
    certificate_number, certificate_date, certificate_expiry, latitude, longitude, created_at, updated_at";

fn map_facility(row: &Row<'_>) -> rusqlite::Result<Facility> {
    Ok(Facility {
        id: row.get(0)?,
        name: row.get(1)?,
        owner_name: row.get(2)?,
        address: row.get(3)?,
        facility_type: row.get(4)?,
        province_code: row.get(5)?,
        status: row.get(6)?,
        is_certified: row.get::<_, i32>(7)? != 0,
        certificate_number: row.get(8)?,
        certificate_date: row.get(9)?,
        certificate_expiry: row.get(10)?,
        latitude: row.get(11)?,
        longitude: row.get(12)?,
        created_at: timestamp_or_now(row.get(13)?),
        updated_at: timestamp_or_now(row.get(14)?),
    })
}

/// Ordering of facility listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FacilityOrder {
    /// Alphabetical by name
    #[default]
    Name,
    /// Newest first
    Newest,
}

/// Declarative facility query
///
/// Each set field adds an equality condition. Name search is applied by the
/// business layer since it must be case-insensitive beyond ASCII.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FacilityFilter {
    pub search: Option<String>,
    pub status: Option<FacilityStatus>,
    pub province_code: Option<ManagementLevel>,
    pub facility_type: Option<String>,
    pub order: FacilityOrder,
}

/// Get facilities matching the equality conditions of a filter
pub fn get_facilities(conn: &Connection, filter: &FacilityFilter) -> Result<Vec<Facility>> {
    let mut clauses: Vec<&str> = Vec::new();
    let mut values: Vec<Value> = Vec::new();

    if let Some(status) = filter.status {
        clauses.push("status = ?");
        values.push(Value::Text(status.as_str().to_string()));
    }
    if let Some(level) = filter.province_code {
        clauses.push("province_code = ?");
        values.push(Value::Text(level.as_str().to_string()));
    }
    if let Some(facility_type) = &filter.facility_type {
        clauses.push("type = ?");
        values.push(Value::Text(facility_type.clone()));
    }

    let mut sql = format!("SELECT {} FROM facilities", FACILITY_COLUMNS);
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(match filter.order {
        FacilityOrder::Name => " ORDER BY name COLLATE NOCASE, id",
        FacilityOrder::Newest => " ORDER BY created_at DESC, rowid DESC",
    });

    let mut stmt = conn.prepare(&sql)?;
    let facilities = stmt.query_map(params_from_iter(values.iter()), map_facility)?;
    facilities.collect::<std::result::Result<Vec<_>, _>>().map_err(Into::into)
}

/// Get all facilities ordered by name
pub fn get_all_facilities(conn: &Connection) -> Result<Vec<Facility>> {
    get_facilities(conn, &FacilityFilter::default())
}

/// Get a facility by id
pub fn get_facility(conn: &Connection, id: &str) -> Result<Option<Facility>> {
    let sql = format!("SELECT {} FROM facilities WHERE id = ?", FACILITY_COLUMNS);
    conn.query_row(&sql, [id], map_facility)
        .optional()
        .map_err(Into::into)
}

/// Create a new facility
pub fn create_facility(conn: &Connection, id: &str, input: &FacilityInput) -> Result<()> {
    let now = now_timestamp();
    conn.execute(
        "INSERT INTO facilities (id, name, owner_name, address, type, province_code, status, is_certified,
            certificate_number, certificate_date, certificate_expiry, latitude, longitude, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        params![
            id, input.name, input.owner_name, input.address, input.facility_type,
            input.province_code, input.status, input.is_certified as i32,
            input.certificate_number, input.certificate_date, input.certificate_expiry,
            input.latitude, input.longitude, now, now
        ],
    )?;
    Ok(())
}

/// Update all editable facility fields
pub fn update_facility(conn: &Connection, id: &str, input: &FacilityInput) -> Result<()> {
    let rows = conn.execute(
        "UPDATE facilities SET name = ?, owner_name = ?, address = ?, type = ?, province_code = ?,
            status = ?, is_certified = ?, certificate_number = ?, certificate_date = ?,
            certificate_expiry = ?, latitude = ?, longitude = ?, updated_at = ?
         WHERE id = ?",
        params![
            input.name, input.owner_name, input.address, input.facility_type,
            input.province_code, input.status, input.is_certified as i32,
            input.certificate_number, input.certificate_date, input.certificate_expiry,
            input.latitude, input.longitude, now_timestamp(), id
        ],
    )?;
    if rows == 0 {
        return Err(AttpError::FacilityNotFound(id.to_string()));
    }
    Ok(())
}

/// Update certificate fields only
pub fn update_certificate(conn: &Connection, id: &str, update: &CertificateUpdate) -> Result<()> {
    let rows = conn.execute(
        "UPDATE facilities SET is_certified = ?, certificate_number = ?, certificate_date = ?,
            certificate_expiry = ?, updated_at = ?
         WHERE id = ?",
        params![
            update.is_certified as i32, update.certificate_number, update.certificate_date,
            update.certificate_expiry, now_timestamp(), id
        ],
    )?;
    if rows == 0 {
        return Err(AttpError::FacilityNotFound(id.to_string()));
    }
    Ok(())
}

/// Update coordinates only
pub fn update_location(conn: &Connection, id: &str, latitude: Option<f64>, longitude: Option<f64>) -> Result<()> {
    let rows = conn.execute(
        "UPDATE facilities SET latitude = ?, longitude = ?, updated_at = ? WHERE id = ?",
        params![latitude, longitude, now_timestamp(), id],
    )?;
    if rows == 0 {
        return Err(AttpError::FacilityNotFound(id.to_string()));
    }
    Ok(())
}

/// Delete a facility and its inspections
pub fn delete_facility(conn: &Connection, id: &str) -> Result<()> {
    conn.execute("DELETE FROM inspections WHERE facility_id = ?", [id])?;
    let rows = conn.execute("DELETE FROM facilities WHERE id = ?", [id])?;
    if rows == 0 {
        return Err(AttpError::FacilityNotFound(id.to_string()));
    }
    Ok(())
}

// ============================================================================
// Facility type queries
// ============================================================================

fn map_facility_type(row: &Row<'_>) -> rusqlite::Result<FacilityType> {
    Ok(FacilityType {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        is_active: row.get::<_, i32>(3)? != 0,
        created_at: timestamp_or_now(row.get(4)?),
    })
}

/// Get all facility types, newest first
pub fn get_all_facility_types(conn: &Connection) -> Result<Vec<FacilityType>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, description, is_active, created_at
         FROM facility_types ORDER BY created_at DESC, rowid DESC"
    )?;
    let types = stmt.query_map([], map_facility_type)?;
    types.collect::<std::result::Result<Vec<_>, _>>().map_err(Into::into)
}

/// Get names of active facility types, alphabetical
pub fn get_active_facility_type_names(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT name FROM facility_types WHERE is_active = 1 ORDER BY name"
    )?;
    let names = stmt.query_map([], |row| row.get(0))?;
    names.collect::<std::result::Result<Vec<_>, _>>().map_err(Into::into)
}

/// Get a facility type by id
pub fn get_facility_type(conn: &Connection, id: &str) -> Result<Option<FacilityType>> {
    conn.query_row(
        "SELECT id, name, description, is_active, created_at FROM facility_types WHERE id = ?",
        [id],
        map_facility_type,
    ).optional().map_err(Into::into)
}

/// Check whether a type name is taken, optionally ignoring one row
pub fn facility_type_name_exists(conn: &Connection, name: &str, except_id: Option<&str>) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM facility_types WHERE name = ? AND id != COALESCE(?, '')",
        params![name, except_id],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Create a new facility type
pub fn create_facility_type(conn: &Connection, id: &str, input: &FacilityTypeInput) -> Result<()> {
    conn.execute(
        "INSERT INTO facility_types (id, name, description, is_active, created_at) VALUES (?, ?, ?, ?, ?)",
        params![id, input.name, input.description, input.is_active as i32, now_timestamp()],
    )?;
    Ok(())
}

/// Update a facility type
pub fn update_facility_type(conn: &Connection, id: &str, input: &FacilityTypeInput) -> Result<()> {
    let rows = conn.execute(
        "UPDATE facility_types SET name = ?, description = ?, is_active = ? WHERE id = ?",
        params![input.name, input.description, input.is_active as i32, id],
    )?;
    if rows == 0 {
        return Err(AttpError::FacilityTypeNotFound(id.to_string()));
    }
    Ok(())
}

/// Delete a facility type
pub fn delete_facility_type(conn: &Connection, id: &str) -> Result<()> {
    let rows = conn.execute("DELETE FROM facility_types WHERE id = ?", [id])?;
    if rows == 0 {
        return Err(AttpError::FacilityTypeNotFound(id.to_string()));
    }
    Ok(())
}

// ============================================================================
// Inspection queries
// ============================================================================

const INSPECTION_COLUMNS: &str = "id, facility_id, inspection_date, year, team_type, result,
    remediation_deadline, has_penalty, penalty_amount, penalty_agency, sanction_type, notes, created_at";

fn map_inspection(row: &Row<'_>) -> rusqlite::Result<Inspection> {
    Ok(Inspection {
        id: row.get(0)?,
        facility_id: row.get(1)?,
        inspection_date: row.get(2)?,
        year: row.get(3)?,
        team_type: row.get(4)?,
        result: row.get(5)?,
        remediation_deadline: row.get(6)?,
        has_penalty: row.get::<_, i32>(7)? != 0,
        penalty_amount: row.get(8)?,
        penalty_agency: row.get(9)?,
        sanction_type: row.get(10)?,
        notes: row.get(11)?,
        created_at: timestamp_or_now(row.get(12)?),
    })
}

/// Get all inspections
pub fn get_all_inspections(conn: &Connection) -> Result<Vec<Inspection>> {
    let sql = format!(
        "SELECT {} FROM inspections ORDER BY inspection_date DESC, rowid DESC",
        INSPECTION_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let inspections = stmt.query_map([], map_inspection)?;
    inspections.collect::<std::result::Result<Vec<_>, _>>().map_err(Into::into)
}

/// Get inspections of one facility, newest first
pub fn get_inspections_by_facility(conn: &Connection, facility_id: &str) -> Result<Vec<Inspection>> {
    let sql = format!(
        "SELECT {} FROM inspections WHERE facility_id = ? ORDER BY inspection_date DESC, rowid DESC",
        INSPECTION_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let inspections = stmt.query_map([facility_id], map_inspection)?;
    inspections.collect::<std::result::Result<Vec<_>, _>>().map_err(Into::into)
}

/// Get an inspection by id
pub fn get_inspection(conn: &Connection, id: &str) -> Result<Option<Inspection>> {
    let sql = format!("SELECT {} FROM inspections WHERE id = ?", INSPECTION_COLUMNS);
    conn.query_row(&sql, [id], map_inspection)
        .optional()
        .map_err(Into::into)
}

/// Create a new inspection
pub fn create_inspection(
    conn: &Connection,
    id: &str,
    facility_id: &str,
    year: i32,
    input: &InspectionInput,
) -> Result<()> {
    conn.execute(
        "INSERT INTO inspections (id, facility_id, inspection_date, year, team_type, result,
            remediation_deadline, has_penalty, penalty_amount, penalty_agency, sanction_type, notes, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        params![
            id, facility_id, input.inspection_date, year, input.team_type, input.result,
            input.remediation_deadline, input.has_penalty as i32, input.penalty_amount,
            input.penalty_agency, input.sanction_type, input.notes, now_timestamp()
        ],
    )?;
    Ok(())
}

/// Set the result of one inspection
pub fn update_inspection_result(conn: &Connection, id: &str, result: InspectionResult) -> Result<()> {
    let rows = conn.execute(
        "UPDATE inspections SET result = ? WHERE id = ?",
        params![result, id],
    )?;
    if rows == 0 {
        return Err(AttpError::InspectionNotFound(id.to_string()));
    }
    Ok(())
}

// ============================================================================
// Profile queries
// ============================================================================

const PROFILE_COLUMNS: &str = "id, username, full_name, role, managed_area, created_by, created_at, updated_at";

fn map_profile(row: &Row<'_>) -> rusqlite::Result<Profile> {
    Ok(Profile {
        id: row.get(0)?,
        username: row.get(1)?,
        full_name: row.get(2)?,
        role: row.get(3)?,
        managed_area: row.get(4)?,
        created_by: row.get(5)?,
        created_at: timestamp_or_now(row.get(6)?),
        updated_at: timestamp_or_now(row.get(7)?),
    })
}

/// Count all profiles
pub fn count_profiles(conn: &Connection) -> Result<i64> {
    let count = conn.query_row("SELECT COUNT(*) FROM profiles", [], |row| row.get(0))?;
    Ok(count)
}

/// Get a profile by id
pub fn get_profile(conn: &Connection, id: &str) -> Result<Option<Profile>> {
    let sql = format!("SELECT {} FROM profiles WHERE id = ?", PROFILE_COLUMNS);
    conn.query_row(&sql, [id], map_profile)
        .optional()
        .map_err(Into::into)
}

/// Get a profile by username
pub fn get_profile_by_username(conn: &Connection, username: &str) -> Result<Option<Profile>> {
    let sql = format!("SELECT {} FROM profiles WHERE username = ?", PROFILE_COLUMNS);
    conn.query_row(&sql, [username], map_profile)
        .optional()
        .map_err(Into::into)
}

/// Get all profiles, newest first
pub fn get_all_profiles(conn: &Connection) -> Result<Vec<Profile>> {
    let sql = format!("SELECT {} FROM profiles ORDER BY created_at DESC, rowid DESC", PROFILE_COLUMNS);
    let mut stmt = conn.prepare(&sql)?;
    let profiles = stmt.query_map([], map_profile)?;
    profiles.collect::<std::result::Result<Vec<_>, _>>().map_err(Into::into)
}

/// Get profiles created by a given profile, newest first
pub fn get_profiles_by_creator(conn: &Connection, creator_id: &str) -> Result<Vec<Profile>> {
    let sql = format!(
        "SELECT {} FROM profiles WHERE created_by = ? ORDER BY created_at DESC, rowid DESC",
        PROFILE_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let profiles = stmt.query_map([creator_id], map_profile)?;
    profiles.collect::<std::result::Result<Vec<_>, _>>().map_err(Into::into)
}

/// Create a new profile
pub fn create_profile(conn: &Connection, id: &str, input: &AccountInput, created_by: Option<&str>) -> Result<()> {
    let now = now_timestamp();
    conn.execute(
        "INSERT INTO profiles (id, username, full_name, role, managed_area, created_by, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        params![id, input.username, input.full_name, input.role, input.managed_area, created_by, now, now],
    )?;
    Ok(())
}

/// Update the self-editable profile fields
pub fn update_profile(conn: &Connection, id: &str, full_name: Option<&str>, managed_area: Option<&str>) -> Result<()> {
    let rows = conn.execute(
        "UPDATE profiles SET full_name = ?, managed_area = ?, updated_at = ? WHERE id = ?",
        params![full_name, managed_area, now_timestamp(), id],
    )?;
    if rows == 0 {
        return Err(AttpError::ProfileNotFound(id.to_string()));
    }
    Ok(())
}

/// Delete a profile
pub fn delete_profile(conn: &Connection, id: &str) -> Result<()> {
    let rows = conn.execute("DELETE FROM profiles WHERE id = ?", [id])?;
    if rows == 0 {
        return Err(AttpError::ProfileNotFound(id.to_string()));
    }
    Ok(())
}

// ============================================================================
// Site config queries
// ============================================================================

/// Get the singleton site configuration row
pub fn get_site_config(conn: &Connection) -> Result<Option<SiteConfig>> {
    conn.query_row(
        "SELECT logo_url, logo_height, login_background_url FROM site_config WHERE id = ?",
        [crate::SITE_CONFIG_ID],
        |row| {
            let defaults = SiteConfig::default();
            Ok(SiteConfig {
                logo_url: row.get::<_, Option<String>>(0)?
                    .filter(|s| !s.is_empty())
                    .unwrap_or(defaults.logo_url),
                logo_height: row.get::<_, Option<u32>>(1)?
                    .filter(|h| *h > 0)
                    .unwrap_or(defaults.logo_height),
                login_background_url: row.get::<_, Option<String>>(2)?
                    .unwrap_or(defaults.login_background_url),
            })
        },
    ).optional().map_err(Into::into)
}

/// Insert or replace the singleton site configuration row
pub fn upsert_site_config(conn: &Connection, config: &SiteConfig) -> Result<()> {
    conn.execute(
        "INSERT INTO site_config (id, logo_url, logo_height, login_background_url, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(id) DO UPDATE SET
            logo_url = excluded.logo_url,
            logo_height = excluded.logo_height,
            login_background_url = excluded.login_background_url,
            updated_at = excluded.updated_at",
        params![
            crate::SITE_CONFIG_ID, config.logo_url, config.logo_height,
            config.login_background_url, now_timestamp()
        ],
    )?;
    Ok(())
}
