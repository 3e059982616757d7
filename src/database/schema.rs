//! Database schema definitions
//!
//! Column names and enumeration values mirror the hosted backend's tables.

/// SQL to create the properties table (schema version bookkeeping)
pub const CREATE_PROPERTIES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS attp_properties (
    database_id     CHAR(36) NOT NULL PRIMARY KEY,
    version         CHAR(10),
    create_timestamp TEXT,
    update_timestamp TEXT
)
"#;

/// SQL to create the facility types table
pub const CREATE_FACILITY_TYPES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS facility_types (
    id              CHAR(36) NOT NULL PRIMARY KEY,
    name            TEXT NOT NULL UNIQUE,
    description     TEXT,
    is_active       INTEGER NOT NULL DEFAULT 1,
    created_at      TEXT
)
"#;

/// SQL to create the facilities table
///
/// `type` refers to `facility_types.name` by value, without a foreign key.
pub const CREATE_FACILITIES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS facilities (
    id                  CHAR(36) NOT NULL PRIMARY KEY,
    name                TEXT NOT NULL,
    owner_name          TEXT,
    address             TEXT,
    type                TEXT NOT NULL,
    province_code       TEXT NOT NULL CHECK (province_code IN ('tinh', 'huyen')),
    status              TEXT NOT NULL DEFAULT 'active'
                        CHECK (status IN ('active', 'inactive', 'suspended')),
    is_certified        INTEGER NOT NULL DEFAULT 0,
    certificate_number  TEXT,
    certificate_date    TEXT,
    certificate_expiry  TEXT,
    latitude            REAL,
    longitude           REAL,
    created_at          TEXT,
    updated_at          TEXT
)
"#;

/// SQL to create the inspections table
pub const CREATE_INSPECTIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS inspections (
    id                   CHAR(36) NOT NULL PRIMARY KEY,
    facility_id          CHAR(36) NOT NULL REFERENCES facilities(id) ON DELETE CASCADE,
    inspection_date      TEXT NOT NULL,
    year                 INTEGER NOT NULL,
    team_type            TEXT NOT NULL,
    result               TEXT NOT NULL DEFAULT 'dat',
    remediation_deadline TEXT,
    has_penalty          INTEGER NOT NULL DEFAULT 0,
    penalty_amount       INTEGER,
    penalty_agency       TEXT,
    sanction_type        TEXT,
    notes                TEXT,
    created_at           TEXT
)
"#;

/// SQL to index inspections by owning facility
pub const CREATE_INSPECTIONS_FACILITY_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_inspections_facility_id ON inspections (facility_id)
"#;

/// SQL to create the profiles table
pub const CREATE_PROFILES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS profiles (
    id              CHAR(36) NOT NULL PRIMARY KEY,
    username        TEXT NOT NULL UNIQUE,
    full_name       TEXT,
    role            TEXT NOT NULL DEFAULT 'staff' CHECK (role IN ('admin', 'staff')),
    managed_area    TEXT,
    created_by      CHAR(36),
    created_at      TEXT,
    updated_at      TEXT
)
"#;

/// SQL to create the singleton site configuration table
pub const CREATE_SITE_CONFIG_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS site_config (
    id                   TEXT NOT NULL PRIMARY KEY,
    logo_url             TEXT,
    logo_height          INTEGER,
    login_background_url TEXT,
    updated_at           TEXT
)
"#;

/// All table creation statements in order
pub const CREATE_ALL_TABLES: &[&str] = &[
    CREATE_PROPERTIES_TABLE,
    CREATE_FACILITY_TYPES_TABLE,
    CREATE_FACILITIES_TABLE,
    CREATE_INSPECTIONS_TABLE,
    CREATE_INSPECTIONS_FACILITY_INDEX,
    CREATE_PROFILES_TABLE,
    CREATE_SITE_CONFIG_TABLE,
];
