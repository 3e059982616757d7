//! Error types for ATTP Core

use std::fmt;
use thiserror::Error;

/// A single field-level validation failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Field key (wire name, e.g. "remediation_deadline")
    pub field: &'static str,
    /// User-facing message
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self { field, message: message.into() }
    }
}

/// Collected field errors of one form submission
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldError::new(field, message));
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True if any error is attached to `field`
    pub fn has_field(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }

    /// Ok if nothing was collected, otherwise the errors themselves
    pub fn into_result(self) -> std::result::Result<(), ValidationErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

/// Main error type for registry operations
#[derive(Error, Debug)]
pub enum AttpError {
    /// Database file not found at the specified path
    #[error("Database not found: {0}")]
    DatabaseNotFound(String),

    /// Database operation failed
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// No profile is signed in
    #[error("Not signed in")]
    NotSignedIn,

    /// Signed-in profile lacks the role required for the operation
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Facility not found
    #[error("Facility not found: {0}")]
    FacilityNotFound(String),

    /// Facility type not found
    #[error("Facility type not found: {0}")]
    FacilityTypeNotFound(String),

    /// Inspection not found
    #[error("Inspection not found: {0}")]
    InspectionNotFound(String),

    /// Profile not found
    #[error("Profile not found: {0}")]
    ProfileNotFound(String),

    /// Form input failed validation
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    /// Spreadsheet could not be read or written
    #[error("Spreadsheet error: {0}")]
    SpreadsheetError(String),

    /// Configuration is missing or malformed
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Local cache could not be read or written
    #[error("Cache error: {0}")]
    CacheError(String),

    /// Invalid database version
    #[error("Invalid database version: {0}")]
    InvalidVersion(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Invalid operation
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

impl From<rusqlite::Error> for AttpError {
    fn from(err: rusqlite::Error) -> Self {
        AttpError::DatabaseError(err.to_string())
    }
}

impl From<calamine::Error> for AttpError {
    fn from(err: calamine::Error) -> Self {
        AttpError::SpreadsheetError(err.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for AttpError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        AttpError::SpreadsheetError(err.to_string())
    }
}

impl From<serde_json::Error> for AttpError {
    fn from(err: serde_json::Error) -> Self {
        AttpError::CacheError(err.to_string())
    }
}

impl From<ValidationErrors> for AttpError {
    fn from(err: ValidationErrors) -> Self {
        AttpError::Validation(err)
    }
}

/// Result type alias for registry operations
pub type Result<T> = std::result::Result<T, AttpError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AttpError::DatabaseNotFound("/path/to/db".to_string());
        assert!(err.to_string().contains("/path/to/db"));

        let err = AttpError::NotSignedIn;
        assert_eq!(err.to_string(), "Not signed in");

        let err = AttpError::FacilityNotFound("fac-1".to_string());
        assert!(err.to_string().contains("fac-1"));

        let err = AttpError::PermissionDenied("admin role required".to_string());
        assert!(err.to_string().contains("admin role required"));
    }

    #[test]
    fn test_validation_errors_display() {
        let mut errors = ValidationErrors::new();
        errors.push("name", "required");
        errors.push("type", "unknown");
        let err: AttpError = errors.into();
        assert_eq!(err.to_string(), "Validation failed: name: required; type: unknown");
    }

    #[test]
    fn test_validation_errors_has_field() {
        let mut errors = ValidationErrors::new();
        assert!(errors.clone().into_result().is_ok());
        errors.push("remediation_deadline", "required");
        assert!(errors.has_field("remediation_deadline"));
        assert!(!errors.has_field("name"));
        assert!(errors.into_result().is_err());
    }

    #[test]
    fn test_error_from_rusqlite() {
        let sqlite_err = rusqlite::Error::QueryReturnedNoRows;
        let err: AttpError = sqlite_err.into();
        match err {
            AttpError::DatabaseError(msg) => assert!(!msg.is_empty()),
            _ => panic!("Expected DatabaseError"),
        }
    }

    #[test]
    fn test_error_from_serde_json() {
        let json_err = serde_json::from_str::<u32>("not json").unwrap_err();
        let err: AttpError = json_err.into();
        assert!(matches!(err, AttpError::CacheError(_)));
    }
}
