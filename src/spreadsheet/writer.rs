//! Workbook writing: import template and facility export

use chrono::NaiveDate;
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use crate::database::Facility;
use crate::error::Result;
use crate::utils::format_display_date;
use super::FACILITY_COLUMNS;

pub const DATA_SHEET_NAME: &str = "DỮ LIỆU IMPORT";
pub const GUIDE_SHEET_NAME: &str = "HƯỚNG DẪN";
pub const TYPES_SHEET_NAME: &str = "DANH SÁCH LOẠI HÌNH";

/// Used in the sample row when no types are configured
const FALLBACK_SAMPLE_TYPE: &str = "Dịch vụ ăn uống";

const GUIDE_LINES: &[&str] = &[
    "HƯỚNG DẪN NHẬP LIỆU",
    "",
    "1. CÁC CỘT BẮT BUỘC (đánh dấu *)",
    "   - Tên cơ sở (*): Không được để trống",
    "   - Loại hình (*): Phải là một trong các giá trị trong sheet \"DANH SÁCH LOẠI HÌNH\"",
    "   - Cấp quản lý (*): Phải là \"tinh\" hoặc \"huyen\"",
    "",
    "2. ĐỊNH DẠNG DỮ LIỆU",
    "   - Ngày tháng: DD/MM/YYYY (ví dụ: 31/12/2024)",
    "   - Đã cấp GCN: true hoặc false (hoặc 1/0, có/không)",
    "   - Vĩ độ/Kinh độ: Số thập phân (ví dụ: 10.123456)",
    "",
    "3. GIÁ TRỊ HỢP LỆ",
    "   - Trạng thái:",
    "     + active: Hoạt động",
    "     + inactive: Ngừng hoạt động",
    "     + suspended: Tạm đình chỉ",
    "",
    "   - Cấp quản lý:",
    "     + tinh: Cấp Tỉnh",
    "     + huyen: Cấp Huyện",
    "",
    "4. LƯU Ý",
    "   - Các cột không bắt buộc có thể để trống",
    "   - Xóa dòng dữ liệu mẫu trước khi nhập liệu thực",
    "   - Không thay đổi tên các cột tiêu đề",
];

fn write_header_row(sheet: &mut Worksheet) -> Result<()> {
    let bold = Format::new().set_bold();
    for (col, spec) in FACILITY_COLUMNS.iter().enumerate() {
        let col = col as u16;
        sheet.write_string_with_format(0, col, spec.header, &bold)?;
        sheet.set_column_width(col, spec.width)?;
    }
    Ok(())
}

/// Write non-empty strings of one row, leaving blanks as empty cells
fn write_text_row(sheet: &mut Worksheet, row: u32, values: &[&str]) -> Result<()> {
    for (col, value) in values.iter().enumerate() {
        if !value.is_empty() {
            sheet.write_string(row, col as u16, *value)?;
        }
    }
    Ok(())
}

/// Build the import template
///
/// Three sheets: headers with a sample row, instructions, and the list of
/// accepted facility types.
pub fn generate_template(type_names: &[String]) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();

    {
        let sheet = workbook.add_worksheet();
        sheet.set_name(DATA_SHEET_NAME)?;
        write_header_row(sheet)?;

        let sample_type = type_names.first().map(String::as_str).unwrap_or(FALLBACK_SAMPLE_TYPE);
        write_text_row(sheet, 1, &[
            "Quán ăn ABC",
            "Nguyễn Văn A",
            "123 Đường XYZ, Phường ABC",
            sample_type,
            "huyen",
            "active",
            "true",
            "GCN-001",
            "01/01/2024",
            "01/01/2027",
            "",
            "",
        ])?;
    }

    {
        let sheet = workbook.add_worksheet();
        sheet.set_name(GUIDE_SHEET_NAME)?;
        sheet.set_column_width(0, 80.0)?;
        for (row, line) in GUIDE_LINES.iter().enumerate() {
            write_text_row(sheet, row as u32, &[*line])?;
        }
    }

    {
        let sheet = workbook.add_worksheet();
        sheet.set_name(TYPES_SHEET_NAME)?;
        sheet.set_column_width(0, 40.0)?;
        sheet.write_string(0, 0, TYPES_SHEET_NAME)?;
        for (i, name) in type_names.iter().enumerate() {
            sheet.write_string(i as u32 + 2, 0, name.as_str())?;
        }
    }

    Ok(workbook.save_to_buffer()?)
}

/// Write facilities under the import headers, so the file can be re-imported
pub fn export_facilities(facilities: &[Facility]) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(DATA_SHEET_NAME)?;
    write_header_row(sheet)?;

    for (i, facility) in facilities.iter().enumerate() {
        let row = i as u32 + 1;
        let date = |d: Option<NaiveDate>| d.map(|d| format_display_date(&d)).unwrap_or_default();
        let issued = date(facility.certificate_date);
        let expiry = date(facility.certificate_expiry);

        write_text_row(sheet, row, &[
            facility.name.as_str(),
            facility.owner_name.as_deref().unwrap_or_default(),
            facility.address.as_deref().unwrap_or_default(),
            facility.facility_type.as_str(),
            facility.province_code.as_str(),
            facility.status.as_str(),
            if facility.is_certified { "true" } else { "false" },
            facility.certificate_number.as_deref().unwrap_or_default(),
            issued.as_str(),
            expiry.as_str(),
        ])?;

        if let Some(lat) = facility.latitude {
            sheet.write_number(row, 10, lat)?;
        }
        if let Some(lng) = facility.longitude {
            sheet.write_number(row, 11, lng)?;
        }
    }

    Ok(workbook.save_to_buffer()?)
}

/// `mau_import_coso_YYYYMMDD.xlsx`
pub fn template_filename(date: NaiveDate) -> String {
    format!("mau_import_coso_{}.xlsx", date.format("%Y%m%d"))
}

/// `danh_sach_coso_YYYYMMDD.xlsx`
pub fn export_filename(date: NaiveDate) -> String {
    format!("danh_sach_coso_{}.xlsx", date.format("%Y%m%d"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use calamine::{Reader, open_workbook_auto_from_rs};

    fn sheet_names(bytes: Vec<u8>) -> Vec<String> {
        let workbook = open_workbook_auto_from_rs(Cursor::new(bytes)).unwrap();
        workbook.sheet_names().to_vec()
    }

    #[test]
    fn test_template_sheets() {
        let bytes = generate_template(&["Bếp ăn tập thể".to_string()]).unwrap();
        assert_eq!(sheet_names(bytes), vec![DATA_SHEET_NAME, GUIDE_SHEET_NAME, TYPES_SHEET_NAME]);
    }

    #[test]
    fn test_template_types_sheet_lists_names() {
        let names = vec!["Bếp ăn tập thể".to_string(), "Dịch vụ ăn uống".to_string()];
        let bytes = generate_template(&names).unwrap();

        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes)).unwrap();
        let range = workbook.worksheet_range(TYPES_SHEET_NAME).unwrap();
        let listed: Vec<String> = range.rows()
            .skip(2)
            .filter_map(|r| r.first().map(|c| c.to_string()))
            .collect();
        assert_eq!(listed, names);
    }

    #[test]
    fn test_filenames() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(template_filename(date), "mau_import_coso_20240309.xlsx");
        assert_eq!(export_filename(date), "danh_sach_coso_20240309.xlsx");
    }
}
