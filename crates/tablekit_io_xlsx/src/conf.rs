//! XLSX constants and default preset factories.

use crate::spec::{
    SpecCellFormat, SpecColumnWidthPolicy, SpecConvertOptions, SpecCsvReadOptions,
    SpecXlsxValuePolicy,
};

/// Excel worksheet maximum row count (header included).
pub const N_NROWS_EXCEL_MAX: usize = 1_048_576;
/// Excel worksheet maximum column count.
pub const N_NCOLS_EXCEL_MAX: usize = 16_384;
/// Excel sheet name maximum length.
pub const N_LEN_EXCEL_SHEET_NAME_MAX: usize = 31;
/// Excel table name maximum length.
pub const N_LEN_EXCEL_TABLE_NAME_MAX: usize = 255;
/// Characters not allowed in sheet names.
pub const TUP_EXCEL_ILLEGAL: [&str; 7] = ["*", ":", "?", "/", "\\", "[", "]"];
/// Largest integer magnitude an `f64` cell holds without precision loss (2^53).
pub const N_INT_SAFE_MAX: i64 = 1 << 53;

/// Infix polars puts between a repeated header name and its counter.
pub const C_INFIX_READER_DUPLICATED: &str = "_duplicated_";

/// Suffix appended to the input stem when no output path is given.
pub const C_SUFFIX_FILE_OUT: &str = "_formatted";
/// Workbook file extension.
pub const C_EXTENSION_FILE_OUT: &str = "xlsx";
/// Single worksheet name.
pub const C_SHEET_NAME: &str = "Data";
/// Table display name.
pub const C_TABLE_NAME: &str = "DataTable";

/// Uniform cell format: left/vertical-center, single line.
pub fn derive_default_cell_format() -> SpecCellFormat {
    SpecCellFormat {
        align: Some("left".to_string()),
        valign: Some("vcenter".to_string()),
        text_wrap: Some(false),
        ..Default::default()
    }
}

/// Build default conversion options used by [`crate::formatter::TableFormatter`].
pub fn derive_default_convert_options() -> SpecConvertOptions {
    SpecConvertOptions {
        suffix_file_out: C_SUFFIX_FILE_OUT.to_string(),
        extension_file_out: C_EXTENSION_FILE_OUT.to_string(),
        sheet_name: C_SHEET_NAME.to_string(),
        table_name: C_TABLE_NAME.to_string(),
        fmt_cell: derive_default_cell_format(),
        policy_width: SpecColumnWidthPolicy::default(),
        value_policy: SpecXlsxValuePolicy::default(),
        read_options: SpecCsvReadOptions::default(),
    }
}
