//! `tablekit_io_xlsx` v1:
//! CSV-to-styled-table XLSX kernel.
//!
//! Module layout:
//! - `conf`      : constants and default presets
//! - `spec`      : specs/models/options/errors
//! - `util`      : pure helper functions
//! - `reader`    : delimited-text reader capability
//! - `writer`    : workbook writer capability
//! - `formatter` : read -> plan -> write pipeline
pub mod conf;
pub mod formatter;
pub mod reader;
pub mod spec;
pub mod util;
pub mod writer;

pub use conf::{
    C_SHEET_NAME, C_TABLE_NAME, N_LEN_EXCEL_SHEET_NAME_MAX, N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX,
    TUP_EXCEL_ILLEGAL,
};
pub use formatter::{TableFormatter, convert_csv_to_xlsx};
pub use reader::{CsvTableReader, TableReader};
pub use spec::{
    ConvertError, EnumCellValue, EnumConversionResult, EnumTableStyle, SpecCellFormat,
    SpecColumnWidthPolicy, SpecConversionSummary, SpecConvertOptions, SpecCsvReadOptions,
    SpecSheetPlan, SpecTableRegion, SpecXlsxValuePolicy,
};
pub use util::{
    calculate_column_width, convert_nan_inf_to_str, derive_path_file_out, sanitize_sheet_name,
};
pub use writer::{WorkbookWriter, XlsxWorkbookWriter};
