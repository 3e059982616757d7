//! # ATTP Core
//!
//! Registry library for a municipal food-safety (ATTP) authority.
//!
//! ## Features
//!
//! - SQLite storage for facilities, facility types, inspections, profiles
//!   and the site configuration
//! - Certificate (GCN) lifecycle classification
//! - Remediation sweep for overdue inspections
//! - Dashboard aggregation
//! - Excel import with per-row validation, template generation and export
//! - Role checks (admin / staff) at the data-access boundary
//!
//! ## Example
//!
//! ```no_run
//! use attpcore::Registry;
//! use std::path::Path;
//!
//! let mut registry = Registry::open(Path::new("/path/to/data")).unwrap();
//! registry.sign_in("admin").unwrap();
//!
//! let stats = registry.dashboard_stats().unwrap();
//! println!("{} facilities, {} valid certificates",
//!     stats.summary.total_facilities, stats.summary.active_gcn_count);
//! ```

pub mod database;
pub mod business;
pub mod spreadsheet;
pub mod config;
pub mod logging;
pub mod utils;
pub mod error;

// Re-export main types
pub use error::{AttpError, Result, FieldError, ValidationErrors};
pub use config::Config;
pub use database::models::{
    Facility, FacilityInput, FacilityType, FacilityTypeInput, FacilityStatus, ManagementLevel,
    Inspection, InspectionInput, InspectionResult, TeamType, Profile, Role, AccountInput,
    SiteConfig, SiteConfigUpdate, CertificateUpdate,
};
pub use database::queries::{FacilityFilter, FacilityOrder};
pub use business::Registry;
pub use business::certificates::{CertificateStatus, classify};
pub use business::dashboard::{DashboardStats, aggregate};
pub use business::inspections::{SweepReport, InspectionHistory, sweep_overdue};
pub use spreadsheet::{ParseResult, ParsedFacility, ImportReport, RowError};

/// Database schema version
pub const DB_VERSION: &str = "2";

/// Database filename
pub const DATABASE_FILENAME: &str = "attp.db";

/// Local site configuration cache filename
pub const SITE_CONFIG_CACHE_FILENAME: &str = "site_config.json";

/// Fixed id of the singleton site configuration row
pub const SITE_CONFIG_ID: &str = "main";

/// Days before expiry at which a certificate counts as expiring soon
pub const EXPIRING_WINDOW_DAYS: i64 = 30;

/// Largest accepted expiring-soon window (about a century)
pub const MAX_EXPIRING_WINDOW_DAYS: i64 = 36_500;

/// Number of expiring certificates listed on the dashboard
pub const EXPIRING_SOON_LIMIT: usize = 5;

/// Default logo shown until an admin uploads one
pub const DEFAULT_LOGO_URL: &str = "https://placehold.co/140x40/6366f1/white?text=ATTP+Logo";

/// Default logo display height in pixels
pub const DEFAULT_LOGO_HEIGHT: u32 = 40;

/// Earliest inspection year accepted by the inspection form
pub const MIN_INSPECTION_YEAR: i32 = 2000;

/// Latest inspection year accepted by the inspection form
pub const MAX_INSPECTION_YEAR: i32 = 2100;
