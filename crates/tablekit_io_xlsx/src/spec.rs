//! Shared conversion specification models.

use std::fmt;
use std::path::PathBuf;

use crate::conf::derive_default_convert_options;

////////////////////////////////////////////////////////////////////////////////
// #region CellFormatSpecification

/// Cell format specification applied uniformly to the table region.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SpecCellFormat {
    /// Horizontal alignment.
    pub align: Option<String>,
    /// Vertical alignment.
    pub valign: Option<String>,
    /// Text wrap.
    pub text_wrap: Option<bool>,
}

/// Normalized cell value during conversion/write pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumCellValue {
    /// Missing/blank value.
    None,
    /// Text value.
    String(String),
    /// Numeric value.
    Number(f64),
    /// Boolean value.
    Boolean(bool),
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region TableStyle

/// Built-in table theme selectable per conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EnumTableStyle {
    /// Table Style Medium 9.
    #[default]
    Blue,
    /// Table Style Medium 2.
    Orange,
    /// Table Style Medium 7.
    Green,
    /// Table Style Medium 15.
    Purple,
}

impl EnumTableStyle {
    /// Every selectable style, default first.
    pub const ALL: [EnumTableStyle; 4] = [Self::Blue, Self::Orange, Self::Green, Self::Purple];

    /// Canonical identifier accepted on the command line.
    pub fn identifier(&self) -> &'static str {
        match self {
            Self::Blue => "blue",
            Self::Orange => "orange",
            Self::Green => "green",
            Self::Purple => "purple",
        }
    }

    /// Excel built-in style name written into the table part.
    pub fn excel_name(&self) -> &'static str {
        match self {
            Self::Blue => "TableStyleMedium9",
            Self::Orange => "TableStyleMedium2",
            Self::Green => "TableStyleMedium7",
            Self::Purple => "TableStyleMedium15",
        }
    }

    /// Resolve an identifier, alias or Excel style name (case-insensitive).
    pub fn from_identifier(value: &str) -> Option<Self> {
        let c_value = value.trim().to_ascii_lowercase();
        match c_value.as_str() {
            "blue" | "mavi" | "tablestylemedium9" | "medium9" => Some(Self::Blue),
            "orange" | "turuncu" | "tablestylemedium2" | "medium2" => Some(Self::Orange),
            "green" | "yesil" | "tablestylemedium7" | "medium7" => Some(Self::Green),
            "purple" | "mor" | "tablestylemedium15" | "medium15" => Some(Self::Purple),
            _ => None,
        }
    }

    /// Resolve an identifier, falling back to the default style when unknown.
    ///
    /// The boolean is `true` when the fallback was taken.
    pub fn resolve(value: &str) -> (Self, bool) {
        match Self::from_identifier(value) {
            Some(style) => (style, false),
            None => (Self::default(), true),
        }
    }
}

impl fmt::Display for EnumTableStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identifier())
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ConvertOptions

/// Column width rule: `max(len * factor + padding, min)`, optionally capped.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecColumnWidthPolicy {
    /// Width units per displayed character.
    pub width_per_char: f64,
    /// Width padding added after scaling.
    pub width_cell_padding: f64,
    /// Minimum final width.
    pub width_cell_min: f64,
    /// Maximum final width. `None` leaves widths unbounded.
    pub width_cell_max: Option<f64>,
}

impl Default for SpecColumnWidthPolicy {
    fn default() -> Self {
        Self {
            width_per_char: 1.1,
            width_cell_padding: 2.0,
            width_cell_min: 8.0,
            width_cell_max: None,
        }
    }
}

/// Replacement text for non-finite floats, which Excel cannot store as numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecXlsxValuePolicy {
    /// Replacement text for NaN.
    pub nan_str: String,
    /// Replacement text for positive infinity.
    pub posinf_str: String,
    /// Replacement text for negative infinity.
    pub neginf_str: String,
}

impl Default for SpecXlsxValuePolicy {
    fn default() -> Self {
        Self {
            nan_str: "NaN".to_string(),
            posinf_str: "Inf".to_string(),
            neginf_str: "-Inf".to_string(),
        }
    }
}

/// Delimited-text reader options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecCsvReadOptions {
    /// Field separator byte.
    pub separator: u8,
    /// Rows inspected for dtype inference; `None` scans the whole file.
    pub infer_schema_length: Option<usize>,
}

impl Default for SpecCsvReadOptions {
    fn default() -> Self {
        Self {
            separator: b',',
            infer_schema_length: Some(100),
        }
    }
}

/// Options controlling one [`crate::formatter::TableFormatter`].
#[derive(Debug, Clone, PartialEq)]
pub struct SpecConvertOptions {
    /// Suffix appended to the input stem for derived output paths.
    pub suffix_file_out: String,
    /// Output extension without the dot.
    pub extension_file_out: String,
    /// Worksheet name.
    pub sheet_name: String,
    /// Table display name.
    pub table_name: String,
    /// Format applied to every cell of the table region.
    pub fmt_cell: SpecCellFormat,
    /// Column width rule.
    pub policy_width: SpecColumnWidthPolicy,
    /// Non-finite float replacement policy.
    pub value_policy: SpecXlsxValuePolicy,
    /// Reader options used by the default CSV reader.
    pub read_options: SpecCsvReadOptions,
}

impl Default for SpecConvertOptions {
    fn default() -> Self {
        derive_default_convert_options()
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetPlan

/// Zero-based inclusive table region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecTableRegion {
    /// First row (the header row).
    pub row_first: usize,
    /// First column.
    pub col_first: usize,
    /// Last row.
    pub row_last: usize,
    /// Last column.
    pub col_last: usize,
}

impl SpecTableRegion {
    /// A1-style reference, e.g. `A1:B3`.
    pub fn to_a1(&self) -> String {
        format!(
            "{}{}:{}{}",
            crate::util::derive_column_letter(self.col_first),
            self.row_first + 1,
            crate::util::derive_column_letter(self.col_last),
            self.row_last + 1
        )
    }
}

/// Fully planned worksheet handed to a [`crate::writer::WorkbookWriter`].
#[derive(Debug, Clone, PartialEq)]
pub struct SpecSheetPlan {
    /// Worksheet name.
    pub sheet_name: String,
    /// Table display name.
    pub table_name: String,
    /// Table theme.
    pub style: EnumTableStyle,
    /// Header texts, unique case-insensitively.
    pub headers: Vec<String>,
    /// Row-major data cells, one inner vec per data row.
    pub rows: Vec<Vec<EnumCellValue>>,
    /// Display width per column.
    pub widths_by_col: Vec<f64>,
    /// Format applied to every cell in `region`.
    pub fmt_cell: SpecCellFormat,
    /// Table region, header row included.
    pub region: SpecTableRegion,
}

impl SpecSheetPlan {
    /// Number of data rows (header excluded).
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns.
    pub fn n_cols(&self) -> usize {
        self.headers.len()
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ResultsAndErrors

/// Outcome of one conversion call. There is no partial success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumConversionResult {
    /// Workbook written.
    Success {
        /// Data rows written (header excluded).
        n_rows: usize,
        /// Columns written.
        n_cols: usize,
        /// Written workbook path.
        path_file_out: PathBuf,
    },
    /// Nothing written.
    Failure {
        /// Human-readable diagnostic.
        reason: String,
    },
}

impl EnumConversionResult {
    /// Whether the conversion produced a workbook.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Data rows written, `0` on failure.
    pub fn n_rows(&self) -> usize {
        match self {
            Self::Success { n_rows, .. } => *n_rows,
            Self::Failure { .. } => 0,
        }
    }
}

impl From<Result<SpecConversionSummary, ConvertError>> for EnumConversionResult {
    fn from(value: Result<SpecConversionSummary, ConvertError>) -> Self {
        match value {
            Ok(summary) => Self::Success {
                n_rows: summary.n_rows,
                n_cols: summary.n_cols,
                path_file_out: summary.path_file_out,
            },
            Err(err) => Self::Failure {
                reason: err.to_string(),
            },
        }
    }
}

/// Typed success payload of [`crate::formatter::TableFormatter::try_convert`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecConversionSummary {
    /// Data rows written.
    pub n_rows: usize,
    /// Columns written.
    pub n_cols: usize,
    /// Written workbook path.
    pub path_file_out: PathBuf,
    /// Style actually applied.
    pub style: EnumTableStyle,
}

/// Conversion failure. Rendered to text at the [`EnumConversionResult`] boundary.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    /// Input path missing or not a regular file.
    #[error("Input file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    /// Input unreadable, wrong encoding or malformed delimited syntax.
    #[error("Failed to read {}: {message}", path.display())]
    Read {
        /// Input path.
        path: PathBuf,
        /// Reader diagnostic.
        message: String,
    },

    /// Parsed table cannot be represented on one worksheet.
    #[error("Invalid table: {0}")]
    InvalidTable(String),

    /// Workbook construction failed.
    #[error("xlsx write error: {0}")]
    Write(String),

    /// Workbook bytes could not be persisted.
    #[error("Failed to save {}: {source}", path.display())]
    Persist {
        /// Output path.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
