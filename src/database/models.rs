//! Data models for ATTP database entities
//!
//! Enumerations serialize to the exact wire values used by the hosted
//! backend (`active`, `cho_khac_phuc`, `tinh`, ...).

use std::fmt;
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

/// Implements text-column conversions through `as_str` and a parser
macro_rules! sql_text_enum {
    ($ty:ty, $parse:path, $what:expr) => {
        impl ToSql for $ty {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $ty {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                let s = value.as_str()?;
                $parse(s).ok_or_else(|| FromSqlError::Other(format!("unknown {}: {}", $what, s).into()))
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

/// Operational status of a facility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacilityStatus {
    #[default]
    Active,
    Inactive,
    Suspended,
}

impl FacilityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FacilityStatus::Active => "active",
            FacilityStatus::Inactive => "inactive",
            FacilityStatus::Suspended => "suspended",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(FacilityStatus::Active),
            "inactive" => Some(FacilityStatus::Inactive),
            "suspended" => Some(FacilityStatus::Suspended),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FacilityStatus::Active => "Hoạt động",
            FacilityStatus::Inactive => "Ngừng hoạt động",
            FacilityStatus::Suspended => "Tạm đình chỉ",
        }
    }
}

sql_text_enum!(FacilityStatus, FacilityStatus::parse, "facility status");

/// Administrative tier overseeing a facility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManagementLevel {
    /// Province
    Tinh,
    /// District
    Huyen,
}

impl ManagementLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ManagementLevel::Tinh => "tinh",
            ManagementLevel::Huyen => "huyen",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "tinh" => Some(ManagementLevel::Tinh),
            "huyen" => Some(ManagementLevel::Huyen),
            _ => None,
        }
    }

    /// Lenient parse for user input: case-insensitive, accepts `tỉnh`/`huyện`
    pub fn normalize(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "tinh" | "tỉnh" => Some(ManagementLevel::Tinh),
            "huyen" | "huyện" => Some(ManagementLevel::Huyen),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ManagementLevel::Tinh => "Cấp Tỉnh",
            ManagementLevel::Huyen => "Cấp Huyện",
        }
    }
}

sql_text_enum!(ManagementLevel, ManagementLevel::parse, "management level");

/// Outcome of an inspection visit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InspectionResult {
    /// Passed
    #[default]
    Dat,
    /// Pending remediation
    ChoKhacPhuc,
    /// Remediated
    DaKhacPhuc,
    /// Failed
    KhongDat,
}

impl InspectionResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            InspectionResult::Dat => "dat",
            InspectionResult::ChoKhacPhuc => "cho_khac_phuc",
            InspectionResult::DaKhacPhuc => "da_khac_phuc",
            InspectionResult::KhongDat => "khong_dat",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "dat" => Some(InspectionResult::Dat),
            "cho_khac_phuc" => Some(InspectionResult::ChoKhacPhuc),
            "da_khac_phuc" => Some(InspectionResult::DaKhacPhuc),
            "khong_dat" => Some(InspectionResult::KhongDat),
            _ => None,
        }
    }

    /// Parse canonical values and the legacy `passed|failed|pending` ones
    pub fn from_legacy(s: &str) -> Option<Self> {
        match s {
            "passed" => Some(InspectionResult::Dat),
            "failed" => Some(InspectionResult::KhongDat),
            "pending" => Some(InspectionResult::ChoKhacPhuc),
            other => Self::parse(other),
        }
    }

    /// Counted as a pass on the yearly chart
    pub fn is_passed_like(&self) -> bool {
        matches!(self, InspectionResult::Dat | InspectionResult::DaKhacPhuc)
    }

    /// Counted as a failure on the yearly chart
    pub fn is_failed_like(&self) -> bool {
        matches!(self, InspectionResult::KhongDat)
    }

    pub fn label(&self) -> &'static str {
        match self {
            InspectionResult::Dat => "Đạt",
            InspectionResult::ChoKhacPhuc => "Chờ khắc phục",
            InspectionResult::DaKhacPhuc => "Đã khắc phục",
            InspectionResult::KhongDat => "Không đạt",
        }
    }
}

sql_text_enum!(InspectionResult, InspectionResult::from_legacy, "inspection result");

/// Kind of inspection team
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamType {
    /// Specialized team
    ChuyenNganh,
    /// Inter-agency team
    LienNganh,
}

impl TeamType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TeamType::ChuyenNganh => "chuyen_nganh",
            TeamType::LienNganh => "lien_nganh",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "chuyen_nganh" => Some(TeamType::ChuyenNganh),
            "lien_nganh" => Some(TeamType::LienNganh),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TeamType::ChuyenNganh => "Chuyên ngành",
            TeamType::LienNganh => "Liên ngành",
        }
    }
}

sql_text_enum!(TeamType, TeamType::parse, "team type");

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    #[default]
    Staff,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Staff => "staff",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Role::Admin),
            "staff" => Some(Role::Staff),
            _ => None,
        }
    }
}

sql_text_enum!(Role, Role::parse, "role");

/// Food-service facility
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Facility {
    pub id: String,
    pub name: String,
    pub owner_name: Option<String>,
    pub address: Option<String>,
    /// Facility type name (soft reference to `FacilityType::name`)
    #[serde(rename = "type")]
    pub facility_type: String,
    /// Management level
    pub province_code: ManagementLevel,
    pub status: FacilityStatus,
    /// Certificate (GCN) issued
    pub is_certified: bool,
    pub certificate_number: Option<String>,
    pub certificate_date: Option<NaiveDate>,
    pub certificate_expiry: Option<NaiveDate>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Facility {
    /// Expiry date that actually counts: void unless certified
    pub fn effective_expiry(&self) -> Option<NaiveDate> {
        if self.is_certified { self.certificate_expiry } else { None }
    }

    pub fn has_location(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }
}

/// Insert/update record for a facility
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacilityInput {
    pub name: String,
    pub owner_name: Option<String>,
    pub address: Option<String>,
    #[serde(rename = "type")]
    pub facility_type: String,
    pub province_code: ManagementLevel,
    #[serde(default)]
    pub status: FacilityStatus,
    #[serde(default)]
    pub is_certified: bool,
    pub certificate_number: Option<String>,
    pub certificate_date: Option<NaiveDate>,
    pub certificate_expiry: Option<NaiveDate>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl FacilityInput {
    /// Minimal record with the required fields; everything else defaulted
    pub fn new(name: &str, facility_type: &str, province_code: ManagementLevel) -> Self {
        Self {
            name: name.to_string(),
            owner_name: None,
            address: None,
            facility_type: facility_type.to_string(),
            province_code,
            status: FacilityStatus::Active,
            is_certified: false,
            certificate_number: None,
            certificate_date: None,
            certificate_expiry: None,
            latitude: None,
            longitude: None,
        }
    }
}

/// Certificate-update form
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CertificateUpdate {
    pub is_certified: bool,
    pub certificate_number: Option<String>,
    pub certificate_date: Option<NaiveDate>,
    pub certificate_expiry: Option<NaiveDate>,
}

/// Controlled vocabulary entry for `Facility::facility_type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacilityType {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Insert/update record for a facility type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacilityTypeInput {
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
}

/// Inspection visit, owned by exactly one facility
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inspection {
    pub id: String,
    pub facility_id: String,
    pub inspection_date: NaiveDate,
    /// Denormalized from `inspection_date`
    pub year: i32,
    pub team_type: TeamType,
    pub result: InspectionResult,
    pub remediation_deadline: Option<NaiveDate>,
    pub has_penalty: bool,
    /// Amount in VND, meaningful only with `has_penalty`
    pub penalty_amount: Option<i64>,
    pub penalty_agency: Option<String>,
    pub sanction_type: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Inspection {
    /// Pending remediation with a deadline strictly before `today`
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.result == InspectionResult::ChoKhacPhuc
            && self.remediation_deadline.is_some_and(|deadline| deadline < today)
    }
}

/// Inspection form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InspectionInput {
    pub inspection_date: NaiveDate,
    pub team_type: TeamType,
    #[serde(default)]
    pub result: InspectionResult,
    pub remediation_deadline: Option<NaiveDate>,
    #[serde(default)]
    pub has_penalty: bool,
    pub penalty_amount: Option<i64>,
    pub penalty_agency: Option<String>,
    pub sanction_type: Option<String>,
    pub notes: Option<String>,
}

impl InspectionInput {
    pub fn new(inspection_date: NaiveDate, team_type: TeamType, result: InspectionResult) -> Self {
        Self {
            inspection_date,
            team_type,
            result,
            remediation_deadline: None,
            has_penalty: false,
            penalty_amount: None,
            penalty_agency: None,
            sanction_type: None,
            notes: None,
        }
    }
}

/// Staff or admin account profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Shared with the auth identity
    pub id: String,
    pub username: String,
    pub full_name: Option<String>,
    pub role: Role,
    /// Optional scoping label
    pub managed_area: Option<String>,
    /// Profile that created this sub-account
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Account creation form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountInput {
    pub username: String,
    pub full_name: Option<String>,
    #[serde(default)]
    pub role: Role,
    pub managed_area: Option<String>,
}

/// Singleton branding configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteConfig {
    pub logo_url: String,
    /// Logo display height in pixels
    pub logo_height: u32,
    pub login_background_url: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            logo_url: crate::DEFAULT_LOGO_URL.to_string(),
            logo_height: crate::DEFAULT_LOGO_HEIGHT,
            login_background_url: String::new(),
        }
    }
}

impl SiteConfig {
    /// Apply a partial update
    pub fn merged(&self, update: &SiteConfigUpdate) -> Self {
        Self {
            logo_url: update.logo_url.clone().unwrap_or_else(|| self.logo_url.clone()),
            logo_height: update.logo_height.unwrap_or(self.logo_height),
            login_background_url: update.login_background_url.clone()
                .unwrap_or_else(|| self.login_background_url.clone()),
        }
    }
}

/// Partial site configuration update
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SiteConfigUpdate {
    pub logo_url: Option<String>,
    pub logo_height: Option<u32>,
    pub login_background_url: Option<String>,
}
