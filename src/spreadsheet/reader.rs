//! Workbook reading
//!
//! Reads the first worksheet of an `.xlsx`/`.xls`/`.ods` file into rows keyed
//! by the header text of the first row.

use std::collections::HashMap;
use std::io::Cursor;
use calamine::{Reader, open_workbook_auto_from_rs};
use tracing::debug;
use crate::error::{AttpError, Result};
use super::cells::CellValue;

static BLANK: CellValue = CellValue::Empty;

/// One data row of a sheet
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetRow {
    /// 1-based row number as shown by spreadsheet programs
    pub row_number: u32,
    cells: HashMap<String, CellValue>,
}

impl SheetRow {
    pub fn new(row_number: u32) -> Self {
        Self { row_number, cells: HashMap::new() }
    }

    /// Builder used by callers that assemble rows themselves
    pub fn with(mut self, header: &str, value: CellValue) -> Self {
        self.cells.insert(header.to_string(), value);
        self
    }

    /// Cell under a header, Empty if the column is absent
    pub fn get(&self, header: &str) -> &CellValue {
        self.cells.get(header).unwrap_or(&BLANK)
    }

    /// First non-blank cell among alternative headers
    pub fn first_of(&self, headers: &[&str]) -> &CellValue {
        headers.iter()
            .map(|h| self.get(h))
            .find(|c| !c.is_blank())
            .unwrap_or(&BLANK)
    }

    pub fn is_blank(&self) -> bool {
        self.cells.values().all(CellValue::is_blank)
    }
}

/// Read the first worksheet of a workbook
///
/// Blank rows are skipped; row numbers still count them.
pub fn read_first_sheet(bytes: &[u8]) -> Result<Vec<SheetRow>> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| AttpError::SpreadsheetError(format!("Không thể đọc file Excel: {}", e)))?;

    let range = workbook.worksheet_range_at(0)
        .ok_or_else(|| AttpError::SpreadsheetError("Workbook has no worksheets".to_string()))??;

    let (start_row, _) = range.start().unwrap_or((0, 0));
    let mut rows = range.rows();

    let Some(header_row) = rows.next() else {
        return Ok(Vec::new());
    };
    let headers: Vec<Option<String>> = header_row.iter()
        .map(|cell| CellValue::from(cell).as_text())
        .collect();

    let mut result = Vec::new();
    for (offset, row) in rows.enumerate() {
        // Header sits on start_row + 1 (1-based); data follows it
        let mut sheet_row = SheetRow::new(start_row + offset as u32 + 2);

        for (header, cell) in headers.iter().zip(row.iter()) {
            let Some(header) = header else { continue };
            sheet_row.cells.entry(header.clone()).or_insert_with(|| CellValue::from(cell));
        }

        if sheet_row.is_blank() {
            continue;
        }
        result.push(sheet_row);
    }

    debug!(rows = result.len(), "read worksheet");
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;

    fn workbook_bytes(rows: &[&[&str]]) -> Vec<u8> {
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
    fn test_reads_rows_by_header() {
        let bytes = workbook_bytes(&[
            &["Tên cơ sở (*)", "Địa chỉ"],
            &["Quán A", "1 Lê Lợi"],
            &["", ""],
            &["Quán B", ""],
        ]);

        let rows = read_first_sheet(&bytes).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].row_number, 2);
        assert_eq!(rows[0].get("Địa chỉ"), &CellValue::Text("1 Lê Lợi".to_string()));
        assert_eq!(rows[1].row_number, 4);
        assert!(rows[1].get("Địa chỉ").is_blank());
        assert!(rows[1].get("Không có").is_blank());
    }

    #[test]
    fn test_header_only_sheet() {
        let bytes = workbook_bytes(&[&["Tên cơ sở (*)"]]);
        assert!(read_first_sheet(&bytes).unwrap().is_empty());
    }

    #[test]
    fn test_first_of_alternatives() {
        let row = SheetRow::new(2)
            .with("Tên cơ sở (*)", CellValue::Text(" ".to_string()))
            .with("Tên cơ sở", CellValue::Text("Quán A".to_string()));
        assert_eq!(row.first_of(&["Tên cơ sở (*)", "Tên cơ sở"]), &CellValue::Text("Quán A".to_string()));
        assert!(row.first_of(&["Khác"]).is_blank());
    }

    #[test]
    fn test_rejects_non_workbook() {
        let result = read_first_sheet(b"not a spreadsheet");
        assert!(matches!(result, Err(AttpError::SpreadsheetError(_))));
    }
}
