//! Main Registry API
//!
//! This module provides the primary interface for interacting with
//! an ATTP registry database.

use std::path::{Path, PathBuf};
use chrono::NaiveDate;
use rusqlite::Connection;
use tracing::{debug, info, warn};
use crate::config::Config;
use crate::error::{AttpError, Result};
use crate::database::{Database, Facility, FacilityType, Inspection, Profile, Role, AccountInput, SiteConfig, FacilityTypeInput};
use crate::database::{migrations, queries};
use crate::utils::generate_id;
use crate::DB_VERSION;
use super::dashboard::DashboardStats;

/// Facility types every new registry starts with
const DEFAULT_FACILITY_TYPES: &[&str] = &[
    "Dịch vụ ăn uống",
    "Sản xuất thực phẩm",
    "Kinh doanh thực phẩm",
    "Bếp ăn tập thể",
];

/// Main registry interface
pub struct Registry {
    /// Runtime configuration
    pub(crate) config: Config,
    /// Database connection
    pub(crate) db: Option<Database>,
    /// Signed-in profile
    pub(crate) session: Option<Profile>,
    /// Cached facilities, ordered by name
    pub(crate) facilities_cache: Option<Vec<Facility>>,
    /// Cached inspections
    pub(crate) inspections_cache: Option<Vec<Inspection>>,
    /// Cached facility types
    pub(crate) types_cache: Option<Vec<FacilityType>>,
    /// Dashboard computed from the cached collections, keyed by day
    pub(crate) dashboard_cache: Option<(NaiveDate, DashboardStats)>,
}

impl Registry {
    /// Open a registry from a folder
    ///
    /// The folder should contain an `attp.db` file.
    pub fn open(folder: &Path) -> Result<Self> {
        Self::open_with_config(&Config::new(folder))
    }

    /// Open a registry described by a configuration
    pub fn open_with_config(config: &Config) -> Result<Self> {
        let db_path = config.database_path();

        if !db_path.exists() {
            return Err(AttpError::DatabaseNotFound(
                db_path.to_string_lossy().to_string()
            ));
        }

        let db = Database::open(&db_path)?;
        let conn = db.connection()?;

        let version = migrations::get_database_version(conn)?;
        if !migrations::is_version_compatible(&version) {
            return Err(AttpError::InvalidVersion(version));
        }
        if version != migrations::CURRENT_VERSION {
            info!(from = %version, to = migrations::CURRENT_VERSION, "upgrading registry database");
            migrations::upgrade_database(conn, &version)?;
            migrations::set_database_version(conn, migrations::CURRENT_VERSION)?;
        }

        info!(path = %db_path.display(), "opened registry");
        Ok(Self::with_database(config, db))
    }

    /// Create a new registry in the specified folder
    pub fn create(folder: &Path) -> Result<Self> {
        Self::create_with_config(&Config::new(folder))
    }

    /// Create a new registry described by a configuration
    pub fn create_with_config(config: &Config) -> Result<Self> {
        std::fs::create_dir_all(&config.data_dir)?;

        let db_path = config.database_path();
        let db = Database::create(&db_path)?;

        let registry = Self::with_database(config, db);
        registry.init_new_database()?;

        info!(path = %db_path.display(), "created registry");
        Ok(registry)
    }

    fn with_database(config: &Config, db: Database) -> Self {
        Self {
            config: config.clone(),
            db: Some(db),
            session: None,
            facilities_cache: None,
            inspections_cache: None,
            types_cache: None,
            dashboard_cache: None,
        }
    }

    /// Initialize a new database with properties, seed types and site config
    fn init_new_database(&self) -> Result<()> {
        let conn = self.conn()?;

        queries::set_properties(conn, &generate_id(), DB_VERSION)?;

        for name in DEFAULT_FACILITY_TYPES {
            let input = FacilityTypeInput {
                name: name.to_string(),
                description: None,
                is_active: true,
            };
            queries::create_facility_type(conn, &generate_id(), &input)?;
        }

        queries::upsert_site_config(conn, &SiteConfig::default())?;
        Ok(())
    }

    /// Sign in as an existing profile
    ///
    /// Credentials are verified by the external auth service; this only
    /// binds the session to the profile row.
    pub fn sign_in(&mut self, username: &str) -> Result<Profile> {
        let profile = queries::get_profile_by_username(self.conn()?, username.trim())?
            .ok_or_else(|| AttpError::ProfileNotFound(username.to_string()))?;

        info!(username = %profile.username, role = %profile.role, "signed in");
        self.session = Some(profile.clone());
        self.clear_caches();
        Ok(profile)
    }

    /// End the current session
    pub fn sign_out(&mut self) {
        if let Some(profile) = self.session.take() {
            info!(username = %profile.username, "signed out");
        }
        self.clear_caches();
    }

    /// Create the first admin profile and sign in as it
    ///
    /// Fails once any profile exists.
    pub fn bootstrap_admin(&mut self, username: &str, full_name: Option<&str>) -> Result<Profile> {
        let conn = self.conn()?;
        if queries::count_profiles(conn)? > 0 {
            return Err(AttpError::InvalidOperation(
                "Registry already has accounts".to_string()
            ));
        }

        let input = AccountInput {
            username: username.trim().to_string(),
            full_name: full_name.map(str::to_string),
            role: Role::Admin,
            managed_area: None,
        };
        input.validate()?;

        let id = generate_id();
        queries::create_profile(conn, &id, &input, None)?;
        info!(username = %input.username, "bootstrapped admin account");

        self.sign_in(&input.username)
    }

    /// Currently signed-in profile
    pub fn current_profile(&self) -> Option<&Profile> {
        self.session.as_ref()
    }

    /// Check if a profile is signed in
    pub fn is_signed_in(&self) -> bool {
        self.session.is_some()
    }

    /// Check if the signed-in profile is an admin
    pub fn is_admin(&self) -> bool {
        self.session.as_ref().is_some_and(Profile::is_admin)
    }

    /// Close the registry
    pub fn close(&mut self) {
        self.sign_out();
        if let Some(mut db) = self.db.take() {
            db.close();
        }
    }

    /// Clear all caches
    pub(crate) fn clear_caches(&mut self) {
        self.facilities_cache = None;
        self.inspections_cache = None;
        self.types_cache = None;
        self.dashboard_cache = None;
    }

    /// Drop cached facilities and everything derived from them
    pub(crate) fn invalidate_facilities(&mut self) {
        debug!("invalidating facility cache");
        self.facilities_cache = None;
        self.dashboard_cache = None;
    }

    /// Drop cached inspections and everything derived from them
    pub(crate) fn invalidate_inspections(&mut self) {
        debug!("invalidating inspection cache");
        self.inspections_cache = None;
        self.dashboard_cache = None;
    }

    /// Ensure a profile is signed in
    pub(crate) fn ensure_signed_in(&self) -> Result<&Profile> {
        self.session.as_ref().ok_or(AttpError::NotSignedIn)
    }

    /// Ensure the signed-in profile is an admin
    pub(crate) fn ensure_admin(&self) -> Result<&Profile> {
        let profile = self.ensure_signed_in()?;
        if !profile.is_admin() {
            warn!(username = %profile.username, "admin operation refused");
            return Err(AttpError::PermissionDenied(
                "admin role required".to_string()
            ));
        }
        Ok(profile)
    }

    /// Open connection
    pub(crate) fn conn(&self) -> Result<&Connection> {
        self.db.as_ref()
            .ok_or_else(|| AttpError::DatabaseError("Database not open".to_string()))?
            .connection()
    }

    /// Get the registry folder path
    pub fn folder(&self) -> &Path {
        &self.config.data_dir
    }

    /// Get the active configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the database path
    pub fn database_path(&self) -> PathBuf {
        self.config.database_path()
    }

    /// Get a reference to the database
    pub fn database(&self) -> Result<&Database> {
        self.db.as_ref().ok_or_else(|| AttpError::DatabaseError("Database not open".to_string()))
    }
}

impl Drop for Registry {
    fn drop(&mut self) {
        self.close();
    }
}
