//! Stateless helper utilities used by the formatter and writer.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::conf::{
    C_INFIX_READER_DUPLICATED, N_LEN_EXCEL_SHEET_NAME_MAX, N_LEN_EXCEL_TABLE_NAME_MAX,
    N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX, TUP_EXCEL_ILLEGAL,
};
use crate::spec::{
    ConvertError, EnumCellValue, SpecColumnWidthPolicy, SpecTableRegion, SpecXlsxValuePolicy,
};

////////////////////////////////////////////////////////////////////////////////
// #region CellValueConversion

/// Convert `NaN`/`Inf` to policy string; return error for finite values.
pub fn convert_nan_inf_to_str(
    x: f64,
    value_policy: &SpecXlsxValuePolicy,
) -> Result<String, String> {
    if x.is_nan() {
        return Ok(value_policy.nan_str.clone());
    }
    if x.is_infinite() {
        return Ok(if x.is_sign_positive() {
            value_policy.posinf_str.clone()
        } else {
            value_policy.neginf_str.clone()
        });
    }
    Err("Input is neither NaN nor Inf.".to_string())
}

/// Normalize a raw cell so the writer can store it as-is.
pub fn convert_cell_value(
    value: EnumCellValue,
    value_policy: &SpecXlsxValuePolicy,
) -> EnumCellValue {
    match value {
        EnumCellValue::Number(n) if !n.is_finite() => EnumCellValue::String(
            convert_nan_inf_to_str(n, value_policy)
                .unwrap_or_else(|_| value_policy.nan_str.clone()),
        ),
        other => other,
    }
}

/// Text a spreadsheet shows for a number written without a number format.
pub fn format_number_text(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        return format!("{}", n as i64);
    }
    n.to_string()
}

/// Displayed string length of one cell, in Unicode scalar values.
///
/// Blank cells measure `0`.
pub fn measure_display_len(value: &EnumCellValue) -> usize {
    match value {
        EnumCellValue::None => 0,
        EnumCellValue::String(s) => s.chars().count(),
        EnumCellValue::Number(n) => format_number_text(*n).chars().count(),
        EnumCellValue::Boolean(b) => {
            if *b {
                4
            } else {
                5
            }
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ColumnWidth

/// Width for a column whose longest displayed value has `n_len_max` characters.
pub fn calculate_column_width(n_len_max: usize, policy: &SpecColumnWidthPolicy) -> f64 {
    let n_width = f64::max(
        n_len_max as f64 * policy.width_per_char + policy.width_cell_padding,
        policy.width_cell_min,
    );
    match policy.width_cell_max {
        Some(n_max) => f64::min(n_width, n_max),
        None => n_width,
    }
}

/// Per-column widths over header and body cells.
pub fn derive_column_widths(
    headers: &[String],
    rows: &[Vec<EnumCellValue>],
    policy: &SpecColumnWidthPolicy,
) -> Vec<f64> {
    let mut l_len_by_col: Vec<usize> = headers.iter().map(|c| c.chars().count()).collect();
    for row in rows {
        for (n_idx_col, value) in row.iter().enumerate() {
            if let Some(n_len) = l_len_by_col.get_mut(n_idx_col) {
                *n_len = usize::max(*n_len, measure_display_len(value));
            }
        }
    }

    l_len_by_col
        .into_iter()
        .map(|n_len| calculate_column_width(n_len, policy))
        .collect()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Naming

/// `<dir>/<stem><suffix>.<extension>` next to the input file.
pub fn derive_path_file_out(path_file_in: &Path, suffix: &str, extension: &str) -> PathBuf {
    let c_stem = path_file_in
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    path_file_in.with_file_name(format!("{c_stem}{suffix}.{extension}"))
}

/// Undo the reader's `<name>_duplicated_<k>` renaming of repeated header cells.
///
/// A name is restored only when `<name>` appears earlier in `headers`, so a
/// literal `x_duplicated_0` header without a preceding `x` is kept.
pub fn restore_duplicated_headers(headers: &[String]) -> Vec<String> {
    let mut l_headers: Vec<String> = Vec::with_capacity(headers.len());
    for c_header in headers {
        let c_restored = match c_header.rsplit_once(C_INFIX_READER_DUPLICATED) {
            Some((c_base, c_idx))
                if !c_idx.is_empty()
                    && c_idx.chars().all(|chr| chr.is_ascii_digit())
                    && l_headers.iter().any(|c_prev| c_prev == c_base) =>
            {
                c_base.to_string()
            }
            _ => c_header.clone(),
        };
        l_headers.push(c_restored);
    }
    l_headers
}

/// Make header texts usable as table column names.
///
/// Blank headers become `Column<n>` (1-based). Names repeated case-insensitively
/// get `_2`, `_3`, ... suffixes in column order; the first occurrence is kept.
pub fn derive_unique_headers(headers: &[String]) -> Vec<String> {
    let mut set_names_existing: BTreeSet<String> = BTreeSet::new();
    let mut l_headers = Vec::with_capacity(headers.len());

    for (n_idx_col, c_header) in headers.iter().enumerate() {
        let c_base = if c_header.trim().is_empty() {
            format!("Column{}", n_idx_col + 1)
        } else {
            c_header.clone()
        };

        let mut c_candidate = c_base.clone();
        let mut n_idx = 2usize;
        while set_names_existing.contains(&c_candidate.to_lowercase()) {
            c_candidate = format!("{c_base}_{n_idx}");
            n_idx += 1;
        }
        set_names_existing.insert(c_candidate.to_lowercase());
        l_headers.push(c_candidate);
    }

    l_headers
}

/// Replace invalid chars and trim to valid Excel sheet name.
pub fn sanitize_sheet_name(name: &str, replace_to: &str) -> String {
    let mut c_name = name.to_string();
    for c_illegal in TUP_EXCEL_ILLEGAL {
        c_name = c_name.replace(c_illegal, replace_to);
    }
    c_name = c_name.trim().to_string();
    if c_name.is_empty() {
        c_name = "Sheet".to_string();
    }

    c_name.chars().take(N_LEN_EXCEL_SHEET_NAME_MAX).collect()
}

/// Keep letters, digits, `_` and `.`; a leading digit gets a `_` prefix.
pub fn sanitize_table_name(name: &str) -> String {
    let mut c_name: String = name
        .trim()
        .chars()
        .map(|chr| {
            if chr.is_alphanumeric() || chr == '_' || chr == '.' {
                chr
            } else {
                '_'
            }
        })
        .collect();
    if c_name.is_empty() {
        c_name = "Table".to_string();
    }
    if c_name.starts_with(|chr: char| chr.is_ascii_digit() || chr == '.') {
        c_name.insert(0, '_');
    }

    c_name.chars().take(N_LEN_EXCEL_TABLE_NAME_MAX).collect()
}

/// Zero-based column index to letters (`0 -> A`, `27 -> AB`).
pub fn derive_column_letter(col_idx: usize) -> String {
    let mut l_chars = Vec::new();
    let mut n_value = col_idx + 1;
    while n_value > 0 {
        let n_rem = (n_value - 1) % 26;
        l_chars.push((b'A' + n_rem as u8) as char);
        n_value = (n_value - 1) / 26;
    }
    l_chars.iter().rev().collect()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region TableShape

/// Reject tables that do not fit on one worksheet.
pub fn validate_table_shape(n_rows: usize, n_cols: usize) -> Result<(), ConvertError> {
    if n_cols == 0 {
        return Err(ConvertError::InvalidTable(
            "input has no columns (missing header row).".to_string(),
        ));
    }
    if n_cols > N_NCOLS_EXCEL_MAX {
        return Err(ConvertError::InvalidTable(format!(
            "{n_cols} columns exceed the Excel limit of {N_NCOLS_EXCEL_MAX}."
        )));
    }
    if n_rows + 1 > N_NROWS_EXCEL_MAX {
        return Err(ConvertError::InvalidTable(format!(
            "{n_rows} data rows exceed the Excel limit of {}.",
            N_NROWS_EXCEL_MAX - 1
        )));
    }
    Ok(())
}

/// Table region from A1 over header plus data rows.
///
/// A table needs at least one body row, so an empty body still spans one
/// (blank) row below the header.
pub fn derive_table_region(n_rows: usize, n_cols: usize) -> SpecTableRegion {
    SpecTableRegion {
        row_first: 0,
        col_first: 0,
        row_last: usize::max(n_rows, 1),
        col_last: n_cols.saturating_sub(1),
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
