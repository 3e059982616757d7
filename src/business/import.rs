//! Spreadsheet import, template and export operations

use tracing::{info, warn};
use crate::error::Result;
use crate::database::queries::{self, FacilityFilter};
use crate::spreadsheet::{self, ImportReport, ParseResult};
use crate::utils::generate_id;
use super::registry::Registry;

impl Registry {
    /// Validate a workbook against the active facility types
    pub fn parse_import(&self, bytes: &[u8]) -> Result<ParseResult> {
        self.ensure_signed_in()?;
        let valid_types = queries::get_active_facility_type_names(self.conn()?)?;
        spreadsheet::parse(bytes, &valid_types)
    }

    /// Insert the valid rows of a parsed workbook, one at a time
    ///
    /// Rows that fail to insert are reported and do not undo earlier rows.
    pub fn import_parsed(&mut self, parsed: &ParseResult) -> Result<ImportReport> {
        self.ensure_signed_in()?;

        let conn = self.conn()?;
        let mut report = ImportReport::default();

        for row in parsed.valid() {
            let outcome = match row.to_input() {
                Some(input) => queries::create_facility(conn, &generate_id(), &input),
                None => continue,
            };
            match outcome {
                Ok(()) => report.success += 1,
                Err(e) => {
                    warn!(row = row.row_index, error = %e, "import row failed");
                    report.failed += 1;
                    report.errors.push(format!("Dòng {}: {}", row.row_index, e));
                }
            }
        }

        info!(success = report.success, failed = report.failed, "imported facilities");
        if report.success > 0 {
            self.invalidate_facilities();
        }
        Ok(report)
    }

    /// Parse a workbook and insert its valid rows
    pub fn import_facilities(&mut self, bytes: &[u8]) -> Result<(ParseResult, ImportReport)> {
        let parsed = self.parse_import(bytes)?;
        let report = self.import_parsed(&parsed)?;
        Ok((parsed, report))
    }

    /// Import template listing the active facility types
    pub fn facility_template(&self) -> Result<Vec<u8>> {
        self.ensure_signed_in()?;
        let type_names = queries::get_active_facility_type_names(self.conn()?)?;
        spreadsheet::generate_template(&type_names)
    }

    /// Export facilities matching a filter as a re-importable workbook
    pub fn export_facilities(&self, filter: &FacilityFilter) -> Result<Vec<u8>> {
        let facilities = self.list_facilities(filter)?;
        info!(count = facilities.len(), "exporting facilities");
        spreadsheet::export_facilities(&facilities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::business::registry::tests::create_test_registry;
    use crate::database::{FacilityInput, ManagementLevel};
    use crate::error::AttpError;
    use crate::spreadsheet::{CellValue, SheetRow, validate_rows};
    use rust_xlsxwriter::Workbook;

    fn workbook(rows: &[&[&str]]) -> Vec<u8> {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        for (r, row) in rows.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                if !value.is_empty() {
                    sheet.write_string(r as u32, c as u16, *value).unwrap();
                }
            }
        }
        workbook.save_to_buffer().unwrap()
    }

    #[test]
    fn test_import_inserts_only_valid_rows() {
        let (mut registry, _temp) = create_test_registry();
        let bytes = workbook(&[
            &["Tên cơ sở (*)", "Loại hình (*)", "Cấp quản lý (*)", "Đã cấp GCN", "Ngày hết hạn GCN"],
            &["Quán A", "Dịch vụ ăn uống", "huyen", "x", "31/12/2030"],
            &["", "Dịch vụ ăn uống", "huyen", "", ""],
            &["Quán C", "Không hợp lệ", "tinh", "", ""],
            &["Bếp D", "Bếp ăn tập thể", "Tỉnh", "", ""],
        ]);

        let (parsed, report) = registry.import_facilities(&bytes).unwrap();
        assert_eq!(parsed.total_rows, 4);
        assert_eq!(parsed.valid_rows, 2);
        assert_eq!(parsed.invalid_rows, 2);
        let invalid_rows: Vec<u32> = parsed.invalid().map(|r| r.row_index).collect();
        assert_eq!(invalid_rows, vec![3, 4]);

        assert_eq!(report, ImportReport { success: 2, failed: 0, errors: vec![] });

        let facilities = registry.facilities().unwrap();
        assert_eq!(facilities.len(), 2);
        assert!(facilities.iter().any(|f| f.name == "Quán A" && f.is_certified));
        assert!(facilities.iter().any(|f| f.name == "Bếp D" && f.province_code == ManagementLevel::Tinh));
    }

    #[test]
    fn test_import_continues_after_failed_insert() {
        let (mut registry, _temp) = create_test_registry();
        let rows = vec![
            SheetRow::new(2)
                .with("Tên cơ sở (*)", CellValue::Text("Quán A".to_string()))
                .with("Loại hình (*)", CellValue::Text("Dịch vụ ăn uống".to_string()))
                .with("Cấp quản lý (*)", CellValue::Text("huyen".to_string())),
            SheetRow::new(3)
                .with("Tên cơ sở (*)", CellValue::Text("Quán B".to_string()))
                .with("Loại hình (*)", CellValue::Text("Dịch vụ ăn uống".to_string()))
                .with("Cấp quản lý (*)", CellValue::Text("tinh".to_string())),
        ];
        let parsed = validate_rows(&rows, &[]);

        // Make the second insert violate a constraint
        registry.conn().unwrap().execute_batch(
            "CREATE TRIGGER reject_b BEFORE INSERT ON facilities
             WHEN NEW.name = 'Quán B'
             BEGIN SELECT RAISE(ABORT, 'rejected'); END;"
        ).unwrap();

        let report = registry.import_parsed(&parsed).unwrap();
        assert_eq!(report.success, 1);
        assert_eq!(report.failed, 1);
        assert!(report.errors[0].starts_with("Dòng 3: "));
        assert_eq!(registry.facilities().unwrap().len(), 1);
    }

    #[test]
    fn test_template_round_trips_sample_row() {
        let (registry, _temp) = create_test_registry();
        let bytes = registry.facility_template().unwrap();

        let parsed = registry.parse_import(&bytes).unwrap();
        assert_eq!(parsed.total_rows, 1);
        assert_eq!(parsed.valid_rows, 1, "{:?}", parsed.rows[0].errors);
    }

    #[test]
    fn test_export_reimports() {
        let (mut registry, _temp) = create_test_registry();
        let mut input = FacilityInput::new("Quán A", "Dịch vụ ăn uống", ManagementLevel::Huyen);
        input.latitude = Some(10.5);
        input.longitude = Some(106.25);
        registry.add_facility(input).unwrap();

        let bytes = registry.export_facilities(&FacilityFilter::default()).unwrap();
        let parsed = registry.parse_import(&bytes).unwrap();
        assert_eq!(parsed.valid_rows, 1);
        let data = &parsed.rows[0].data;
        assert_eq!(data.name.as_deref(), Some("Quán A"));
        assert_eq!(data.latitude, Some(10.5));
        assert_eq!(data.longitude, Some(106.25));
    }

    #[test]
    fn test_import_requires_session() {
        let (mut registry, _temp) = create_test_registry();
        registry.sign_out();
        assert!(matches!(registry.parse_import(&[]), Err(AttpError::NotSignedIn)));
    }
}
