//! Spreadsheet import and export of facilities
//!
//! Import is two-phase: [`parse`] validates every row without touching the
//! database, then the registry inserts the valid rows one at a time.

pub mod cells;
pub mod reader;
pub mod writer;

use std::fmt;
use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info, warn};
use crate::database::{FacilityInput, FacilityStatus, ManagementLevel};
use crate::error::Result;
use cells::{parse_bool, parse_date, parse_number};

pub use cells::CellValue;
pub use reader::{SheetRow, read_first_sheet};
pub use writer::{export_facilities, generate_template, template_filename, export_filename};

/// Column of the import sheet
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnSpec {
    /// Facility field the column feeds
    pub key: &'static str,
    pub header: &'static str,
    pub required: bool,
    /// Column width in characters
    pub width: f64,
}

const fn column(key: &'static str, header: &'static str, required: bool, width: f64) -> ColumnSpec {
    ColumnSpec { key, header, required, width }
}

/// Import sheet columns, in template order
pub const FACILITY_COLUMNS: &[ColumnSpec] = &[
    column("name", "Tên cơ sở (*)", true, 30.0),
    column("owner_name", "Chủ cơ sở", false, 20.0),
    column("address", "Địa chỉ", false, 40.0),
    column("type", "Loại hình (*)", true, 25.0),
    column("province_code", "Cấp quản lý (*)", true, 15.0),
    column("status", "Trạng thái", false, 15.0),
    column("is_certified", "Đã cấp GCN", false, 12.0),
    column("certificate_number", "Số GCN", false, 15.0),
    column("certificate_date", "Ngày cấp GCN", false, 15.0),
    column("certificate_expiry", "Ngày hết hạn GCN", false, 18.0),
    column("latitude", "Vĩ độ", false, 12.0),
    column("longitude", "Kinh độ", false, 12.0),
];

const NAME_HEADERS: &[&str] = &["Tên cơ sở (*)", "Tên cơ sở"];
const OWNER_HEADER: &str = "Chủ cơ sở";
const ADDRESS_HEADER: &str = "Địa chỉ";
const TYPE_HEADERS: &[&str] = &["Loại hình (*)", "Loại hình"];
const LEVEL_HEADERS: &[&str] = &["Cấp quản lý (*)", "Cấp quản lý"];
const STATUS_HEADER: &str = "Trạng thái";
const CERTIFIED_HEADER: &str = "Đã cấp GCN";
const CERT_NUMBER_HEADER: &str = "Số GCN";
const CERT_DATE_HEADER: &str = "Ngày cấp GCN";
const CERT_EXPIRY_HEADER: &str = "Ngày hết hạn GCN";
const LATITUDE_HEADER: &str = "Vĩ độ";
const LONGITUDE_HEADER: &str = "Kinh độ";

/// Map a free-text status to its canonical value
///
/// Accepts the wire values and their Vietnamese names, case-insensitive.
pub fn map_status(text: &str) -> Option<FacilityStatus> {
    match text.trim().to_lowercase().as_str() {
        "active" | "hoạt động" => Some(FacilityStatus::Active),
        "inactive" | "ngừng hoạt động" | "ngừng" => Some(FacilityStatus::Inactive),
        "suspended" | "tạm đình chỉ" | "đình chỉ" => Some(FacilityStatus::Suspended),
        _ => None,
    }
}

/// Validation failure of one field in one row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowError {
    pub field: &'static str,
    pub message: String,
}

impl RowError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self { field, message: message.into() }
    }
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Fields recovered from a row, whether or not the row is valid
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FacilityDraft {
    pub name: Option<String>,
    pub owner_name: Option<String>,
    pub address: Option<String>,
    #[serde(rename = "type")]
    pub facility_type: Option<String>,
    pub province_code: Option<ManagementLevel>,
    pub status: FacilityStatus,
    pub is_certified: bool,
    pub certificate_number: Option<String>,
    pub certificate_date: Option<NaiveDate>,
    pub certificate_expiry: Option<NaiveDate>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// One validated row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedFacility {
    /// Spreadsheet row number (first data row is 2)
    pub row_index: u32,
    pub data: FacilityDraft,
    pub errors: Vec<RowError>,
}

impl ParsedFacility {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Insert record for a valid row
    pub fn to_input(&self) -> Option<FacilityInput> {
        if !self.is_valid() {
            return None;
        }
        let data = &self.data;
        Some(FacilityInput {
            name: data.name.clone()?,
            owner_name: data.owner_name.clone(),
            address: data.address.clone(),
            facility_type: data.facility_type.clone()?,
            province_code: data.province_code?,
            status: data.status,
            is_certified: data.is_certified,
            certificate_number: data.certificate_number.clone(),
            certificate_date: data.certificate_date,
            certificate_expiry: data.certificate_expiry,
            latitude: data.latitude,
            longitude: data.longitude,
        })
    }
}

/// Every row of a sheet with aggregate counts
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParseResult {
    pub rows: Vec<ParsedFacility>,
    pub total_rows: usize,
    pub valid_rows: usize,
    pub invalid_rows: usize,
}

impl ParseResult {
    pub fn from_rows(rows: Vec<ParsedFacility>) -> Self {
        let valid_rows = rows.iter().filter(|r| r.is_valid()).count();
        Self {
            total_rows: rows.len(),
            valid_rows,
            invalid_rows: rows.len() - valid_rows,
            rows,
        }
    }

    pub fn valid(&self) -> impl Iterator<Item = &ParsedFacility> {
        self.rows.iter().filter(|r| r.is_valid())
    }

    pub fn invalid(&self) -> impl Iterator<Item = &ParsedFacility> {
        self.rows.iter().filter(|r| !r.is_valid())
    }
}

/// Outcome of inserting the valid rows
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub success: usize,
    pub failed: usize,
    /// `Dòng <row>: <reason>` per failed insert
    pub errors: Vec<String>,
}

fn optional_text(row: &SheetRow, header: &str) -> Option<String> {
    row.get(header).as_text()
}

fn optional_date(row: &SheetRow, header: &str, errors: &mut Vec<RowError>, field: &'static str) -> Option<NaiveDate> {
    let cell = row.get(header);
    if cell.is_blank() {
        return None;
    }
    let parsed = parse_date(cell);
    if parsed.is_none() {
        errors.push(RowError::new(field, format!("{} không đúng định dạng (sử dụng DD/MM/YYYY)", header)));
    }
    parsed
}

fn optional_coordinate(
    row: &SheetRow,
    header: &str,
    limit: f64,
    errors: &mut Vec<RowError>,
    field: &'static str,
) -> Option<f64> {
    // Non-numeric text is ignored rather than rejected
    let value = parse_number(row.get(header))?;
    if (-limit..=limit).contains(&value) {
        Some(value)
    } else {
        errors.push(RowError::new(field, format!("{} phải trong khoảng -{} đến {}", header, limit, limit)));
        None
    }
}

/// Validate one sheet row
///
/// An empty `valid_types` list accepts any type name.
pub fn validate_row(row: &SheetRow, valid_types: &[String]) -> ParsedFacility {
    let mut errors = Vec::new();
    let mut data = FacilityDraft::default();

    data.name = row.first_of(NAME_HEADERS).as_text();
    if data.name.is_none() {
        errors.push(RowError::new("name", "Tên cơ sở là bắt buộc"));
    }

    data.owner_name = optional_text(row, OWNER_HEADER);
    data.address = optional_text(row, ADDRESS_HEADER);

    match row.first_of(TYPE_HEADERS).as_text() {
        None => errors.push(RowError::new("type", "Loại hình là bắt buộc")),
        Some(t) if !valid_types.is_empty() && !valid_types.contains(&t) => {
            errors.push(RowError::new("type", format!(
                "Loại hình \"{}\" không hợp lệ. Các giá trị hợp lệ: {}",
                t,
                valid_types.join(", ")
            )));
        }
        Some(t) => data.facility_type = Some(t),
    }

    match row.first_of(LEVEL_HEADERS).as_text() {
        None => errors.push(RowError::new("province_code", "Cấp quản lý là bắt buộc")),
        Some(level) => match ManagementLevel::normalize(&level) {
            Some(level) => data.province_code = Some(level),
            None => errors.push(RowError::new("province_code", "Cấp quản lý phải là \"tinh\" hoặc \"huyen\"")),
        },
    }

    if let Some(status) = optional_text(row, STATUS_HEADER) {
        data.status = map_status(&status).unwrap_or_else(|| {
            warn!(row = row.row_number, status = %status, "unrecognized status, defaulting to active");
            FacilityStatus::Active
        });
    }

    data.is_certified = parse_bool(row.get(CERTIFIED_HEADER));
    data.certificate_number = optional_text(row, CERT_NUMBER_HEADER);
    data.certificate_date = optional_date(row, CERT_DATE_HEADER, &mut errors, "certificate_date");
    data.certificate_expiry = optional_date(row, CERT_EXPIRY_HEADER, &mut errors, "certificate_expiry");
    data.latitude = optional_coordinate(row, LATITUDE_HEADER, 90.0, &mut errors, "latitude");
    data.longitude = optional_coordinate(row, LONGITUDE_HEADER, 180.0, &mut errors, "longitude");

    if !errors.is_empty() {
        debug!(row = row.row_number, errors = errors.len(), "invalid import row");
    }

    ParsedFacility {
        row_index: row.row_number,
        data,
        errors,
    }
}

/// Validate every row
pub fn validate_rows(rows: &[SheetRow], valid_types: &[String]) -> ParseResult {
    ParseResult::from_rows(rows.iter().map(|row| validate_row(row, valid_types)).collect())
}

/// Read and validate a facility workbook
pub fn parse(bytes: &[u8], valid_types: &[String]) -> Result<ParseResult> {
    let rows = read_first_sheet(bytes)?;
    let result = validate_rows(&rows, valid_types);
    info!(
        total = result.total_rows,
        valid = result.valid_rows,
        invalid = result.invalid_rows,
        "parsed facility workbook"
    );
    Ok(result)
}
