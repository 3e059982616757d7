//! Business logic layer for ATTP Core
//!
//! This module provides the high-level Registry API: session and role
//! checks, facility and inspection management, certificate lifecycle,
//! dashboard aggregation, accounts, site configuration and spreadsheet import.

pub mod registry;
pub mod facilities;
pub mod facility_types;
pub mod inspections;
pub mod certificates;
pub mod dashboard;
pub mod accounts;
pub mod site_config;
pub mod import;

pub use registry::Registry;
