//! Database layer for ATTP Core
//!
//! Handles SQLite database operations including:
//! - Schema creation and migrations
//! - Row-level CRUD for facilities, facility types, inspections,
//!   profiles and the site configuration

pub mod models;
pub mod schema;
pub mod connection;
pub mod migrations;
pub mod queries;

pub use connection::Database;
pub use models::*;
