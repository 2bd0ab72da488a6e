//! CSV-to-table conversion pipeline.
//!
//! [`TableFormatter::convert`] reads one delimited file, plans a single styled
//! table sheet and persists it. Every failure is reported as
//! [`EnumConversionResult::Failure`]; nothing is written in that case.

use std::path::{Path, PathBuf};

use polars::prelude::{AnyValue, DataFrame};
use tracing::{debug, warn};

use crate::conf::N_INT_SAFE_MAX;
use crate::reader::{CsvTableReader, TableReader};
use crate::spec::{
    ConvertError, EnumCellValue, EnumConversionResult, EnumTableStyle, SpecConversionSummary,
    SpecConvertOptions, SpecSheetPlan,
};
use crate::util::{
    convert_cell_value, derive_column_widths, derive_path_file_out, derive_table_region,
    derive_unique_headers, restore_duplicated_headers, sanitize_sheet_name, sanitize_table_name,
    validate_table_shape,
};
use crate::writer::{WorkbookWriter, XlsxWorkbookWriter};

/// Converts delimited text files into styled single-table workbooks.
///
/// Reading and writing are injected so either side can be replaced.
#[derive(Debug, Clone)]
pub struct TableFormatter<R = CsvTableReader, W = XlsxWorkbookWriter> {
    reader: R,
    writer: W,
    options: SpecConvertOptions,
}

impl Default for TableFormatter {
    fn default() -> Self {
        Self::from_options(SpecConvertOptions::default())
    }
}

impl TableFormatter {
    /// Polars reader + `rust_xlsxwriter` writer configured from `options`.
    pub fn from_options(options: SpecConvertOptions) -> Self {
        Self {
            reader: CsvTableReader::new(options.read_options.clone()),
            writer: XlsxWorkbookWriter,
            options,
        }
    }
}

impl<R: TableReader, W: WorkbookWriter> TableFormatter<R, W> {
    /// Create formatter from explicit capabilities.
    pub fn new(reader: R, writer: W, options: SpecConvertOptions) -> Self {
        Self {
            reader,
            writer,
            options,
        }
    }

    /// Options in use.
    pub fn options(&self) -> &SpecConvertOptions {
        &self.options
    }

    /// Output path used when the caller gives none.
    pub fn derive_path_file_out(&self, path_file_in: &Path) -> PathBuf {
        derive_path_file_out(
            path_file_in,
            &self.options.suffix_file_out,
            &self.options.extension_file_out,
        )
    }

    /// Convert one file. Unknown `style_choice` values fall back to the default style.
    pub fn convert(
        &self,
        path_file_in: &Path,
        path_file_out: Option<&Path>,
        style_choice: &str,
    ) -> EnumConversionResult {
        let (style, if_fallback) = EnumTableStyle::resolve(style_choice);
        if if_fallback {
            warn!(
                style_choice,
                style_default = %style,
                "Unknown table style; using default."
            );
        }
        self.convert_with_style(path_file_in, path_file_out, style)
    }

    /// Convert one file with an already-resolved style.
    pub fn convert_with_style(
        &self,
        path_file_in: &Path,
        path_file_out: Option<&Path>,
        style: EnumTableStyle,
    ) -> EnumConversionResult {
        let result = self.try_convert(path_file_in, path_file_out, style);
        if let Err(err) = &result {
            debug!(path_file_in = %path_file_in.display(), error = %err, "Conversion failed.");
        }
        result.into()
    }

    /// Typed variant of [`Self::convert_with_style`].
    pub fn try_convert(
        &self,
        path_file_in: &Path,
        path_file_out: Option<&Path>,
        style: EnumTableStyle,
    ) -> Result<SpecConversionSummary, ConvertError> {
        let path_file_out = match path_file_out {
            Some(path) => path.to_path_buf(),
            None => self.derive_path_file_out(path_file_in),
        };

        debug!(path_file_in = %path_file_in.display(), "Reading table.");
        let df = self.reader.read_table(path_file_in)?;
        let plan = self.plan_sheet(&df, style)?;
        debug!(
            n_rows = plan.n_rows(),
            n_cols = plan.n_cols(),
            region = %plan.region.to_a1(),
            "Planned sheet."
        );

        self.writer.write_workbook(&plan, &path_file_out)?;

        Ok(SpecConversionSummary {
            n_rows: plan.n_rows(),
            n_cols: plan.n_cols(),
            path_file_out,
            style,
        })
    }

    /// Plan the table sheet for `df`: headers, cells, region and widths.
    pub fn plan_sheet(
        &self,
        df: &DataFrame,
        style: EnumTableStyle,
    ) -> Result<SpecSheetPlan, ConvertError> {
        let n_height_df = df.height();
        let n_width_df = df.width();
        validate_table_shape(n_height_df, n_width_df)?;

        let l_colnames_df: Vec<String> = df
            .get_column_names_str()
            .into_iter()
            .map(ToString::to_string)
            .collect();
        let headers = derive_unique_headers(&restore_duplicated_headers(&l_colnames_df));
        if headers != l_colnames_df {
            debug!(?l_colnames_df, ?headers, "Renamed header cells for table columns.");
        }

        let l_cols = df.get_columns();
        let mut rows = Vec::with_capacity(n_height_df);
        for n_idx_row in 0..n_height_df {
            let mut row_values = Vec::with_capacity(n_width_df);
            for col in l_cols {
                let value_any = col.get(n_idx_row).map_err(|err| {
                    ConvertError::InvalidTable(format!("Failed to access cell value: {err}"))
                })?;
                let value_raw = derive_cell_value_from_any_value(value_any);
                row_values.push(convert_cell_value(value_raw, &self.options.value_policy));
            }
            rows.push(row_values);
        }

        let widths_by_col = derive_column_widths(&headers, &rows, &self.options.policy_width);

        Ok(SpecSheetPlan {
            sheet_name: sanitize_sheet_name(&self.options.sheet_name, "_"),
            table_name: sanitize_table_name(&self.options.table_name),
            style,
            region: derive_table_region(n_height_df, n_width_df),
            headers,
            rows,
            widths_by_col,
            fmt_cell: self.options.fmt_cell.clone(),
        })
    }
}

/// Convert with the default reader, writer and options.
pub fn convert_csv_to_xlsx(
    path_file_in: &Path,
    path_file_out: Option<&Path>,
    style_choice: &str,
) -> EnumConversionResult {
    TableFormatter::default().convert(path_file_in, path_file_out, style_choice)
}

fn derive_cell_value_from_any_value(value: AnyValue<'_>) -> EnumCellValue {
    match value {
        AnyValue::Null => EnumCellValue::None,
        AnyValue::String(val) => EnumCellValue::String(val.to_string()),
        AnyValue::StringOwned(val) => EnumCellValue::String(val.to_string()),
        AnyValue::Boolean(val) => EnumCellValue::Boolean(val),
        AnyValue::UInt8(val) => EnumCellValue::Number(val as f64),
        AnyValue::UInt16(val) => EnumCellValue::Number(val as f64),
        AnyValue::UInt32(val) => EnumCellValue::Number(val as f64),
        AnyValue::UInt64(val) => derive_cell_value_from_integer(val as i128),
        AnyValue::Int8(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int16(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int32(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int64(val) => derive_cell_value_from_integer(val as i128),
        AnyValue::Float32(val) => EnumCellValue::Number(val as f64),
        AnyValue::Float64(val) => EnumCellValue::Number(val),
        _ => EnumCellValue::String(value.to_string()),
    }
}

fn derive_cell_value_from_integer(val: i128) -> EnumCellValue {
    if val.abs() > N_INT_SAFE_MAX as i128 {
        EnumCellValue::String(val.to_string())
    } else {
        EnumCellValue::Number(val as f64)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::sync::Mutex;

    use polars::prelude::{Column, DataFrame, NamedFrom, Series};
    use pretty_assertions::assert_eq;

    use super::*;

    /// Writer double that keeps plans instead of producing files.
    #[derive(Default)]
    struct RecordingWriter {
        l_plans: Mutex<Vec<(SpecSheetPlan, PathBuf)>>,
    }

    impl WorkbookWriter for RecordingWriter {
        fn write_workbook(
            &self,
            plan: &SpecSheetPlan,
            path_file_out: &Path,
        ) -> Result<(), ConvertError> {
            self.l_plans
                .lock()
                .expect("lock")
                .push((plan.clone(), path_file_out.to_path_buf()));
            Ok(())
        }
    }

    /// Reader double serving a fixed frame.
    struct FixedReader(DataFrame);

    impl TableReader for FixedReader {
        fn read_table(&self, _path_file_in: &Path) -> Result<DataFrame, ConvertError> {
            Ok(self.0.clone())
        }
    }

    struct FailingWriter;

    impl WorkbookWriter for FailingWriter {
        fn write_workbook(
            &self,
            _plan: &SpecSheetPlan,
            path_file_out: &Path,
        ) -> Result<(), ConvertError> {
            Err(ConvertError::Persist {
                path: path_file_out.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "locked"),
            })
        }
    }

    fn derive_recording_formatter() -> TableFormatter<CsvTableReader, RecordingWriter> {
        TableFormatter::new(
            CsvTableReader::default(),
            RecordingWriter::default(),
            SpecConvertOptions::default(),
        )
    }

    fn write_csv(dir: &Path, name: &str, txt: &str) -> PathBuf {
        let path_file = dir.join(name);
        fs::write(&path_file, txt).expect("write csv");
        path_file
    }

    #[test]
    fn convert_reports_rows_and_columns() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path_file_in = write_csv(tmp.path(), "ab.csv", "a,b\n1,2\n3,4");

        let formatter = derive_recording_formatter();
        let result = formatter.convert(&path_file_in, None, "blue");

        assert_eq!(
            result,
            EnumConversionResult::Success {
                n_rows: 2,
                n_cols: 2,
                path_file_out: tmp.path().join("ab_formatted.xlsx"),
            }
        );
        let l_plans = formatter.writer.l_plans.lock().expect("lock");
        let (plan, _) = &l_plans[0];
        assert_eq!(plan.region.to_a1(), "A1:B3");
        assert_eq!(plan.headers, vec!["a", "b"]);
        assert_eq!(
            plan.rows,
            vec![
                vec![EnumCellValue::Number(1.0), EnumCellValue::Number(2.0)],
                vec![EnumCellValue::Number(3.0), EnumCellValue::Number(4.0)],
            ]
        );
    }

    #[test]
    fn convert_sets_width_from_longest_cell() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path_file_in = write_csv(
            tmp.path(),
            "w.csv",
            "id,comment\n1,short\n2,abcdefghijklmnopqrst\n",
        );

        let formatter = derive_recording_formatter();
        assert!(formatter.convert(&path_file_in, None, "green").is_success());

        let l_plans = formatter.writer.l_plans.lock().expect("lock");
        let (plan, _) = &l_plans[0];
        assert_eq!(plan.widths_by_col[0], 8.0);
        assert!((plan.widths_by_col[1] - 24.0).abs() < 1e-9);
        assert_eq!(plan.style, EnumTableStyle::Green);
    }

    #[test]
    fn convert_unknown_style_falls_back_to_default() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path_file_in = write_csv(tmp.path(), "s.csv", "a\n1\n");

        let formatter = derive_recording_formatter();
        assert!(
            formatter
                .convert(&path_file_in, None, "TableStyleDark99")
                .is_success()
        );

        let l_plans = formatter.writer.l_plans.lock().expect("lock");
        assert_eq!(l_plans[0].0.style, EnumTableStyle::Blue);
    }

    #[test]
    fn convert_missing_input_fails_without_writing() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let formatter = derive_recording_formatter();

        let result = formatter.convert(&tmp.path().join("missing.csv"), None, "blue");

        match result {
            EnumConversionResult::Failure { reason } => assert!(!reason.is_empty()),
            other => panic!("expected failure, got {other:?}"),
        }
        assert!(formatter.writer.l_plans.lock().expect("lock").is_empty());
    }

    #[test]
    fn convert_uses_explicit_output_path() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path_file_in = write_csv(tmp.path(), "in.csv", "a\nx\n");
        let path_file_out = tmp.path().join("custom.xlsx");

        let formatter = derive_recording_formatter();
        formatter.convert(&path_file_in, Some(&path_file_out), "blue");

        let l_plans = formatter.writer.l_plans.lock().expect("lock");
        assert_eq!(l_plans[0].1, path_file_out);
    }

    #[test]
    fn convert_write_failure_becomes_failure_result() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path_file_in = write_csv(tmp.path(), "in.csv", "a\nx\n");
        let formatter = TableFormatter::new(
            CsvTableReader::default(),
            FailingWriter,
            SpecConvertOptions::default(),
        );

        let result = formatter.convert(&path_file_in, None, "blue");
        match result {
            EnumConversionResult::Failure { reason } => assert!(reason.contains("locked")),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn plan_sheet_maps_nulls_large_ints_and_duplicate_headers() {
        let df = DataFrame::new(vec![
            Column::from(Series::new(
                "id".into(),
                &[Some(1_i64), Some(9_007_199_254_740_993), None],
            )),
            Column::from(Series::new("ID".into(), &["x", "y", "z"])),
            Column::from(Series::new("flag".into(), &[true, false, true])),
        ])
        .expect("frame");
        let formatter = TableFormatter::new(
            FixedReader(df.clone()),
            RecordingWriter::default(),
            SpecConvertOptions::default(),
        );

        let plan = formatter
            .plan_sheet(&df, EnumTableStyle::Purple)
            .expect("plan");

        assert_eq!(plan.headers, vec!["id", "ID_2", "flag"]);
        assert_eq!(plan.rows[0][0], EnumCellValue::Number(1.0));
        assert_eq!(
            plan.rows[1][0],
            EnumCellValue::String("9007199254740993".to_string())
        );
        assert_eq!(plan.rows[2][0], EnumCellValue::None);
        assert_eq!(plan.rows[1][2], EnumCellValue::Boolean(false));
        assert!((plan.widths_by_col[0] - (16.0 * 1.1 + 2.0)).abs() < 1e-9);
    }

    #[test]
    fn convert_csv_duplicate_headers_get_numbered_suffixes() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path_file_in = write_csv(tmp.path(), "dup.csv", "a,a,A\n1,2,3\n");

        let formatter = derive_recording_formatter();
        assert!(formatter.convert(&path_file_in, None, "blue").is_success());

        let l_plans = formatter.writer.l_plans.lock().expect("lock");
        assert_eq!(l_plans[0].0.headers, vec!["a", "a_2", "A_3"]);
        assert_eq!(
            l_plans[0].0.rows,
            vec![vec![
                EnumCellValue::Number(1.0),
                EnumCellValue::Number(2.0),
                EnumCellValue::Number(3.0),
            ]]
        );
    }

    #[test]
    fn convert_csv_to_xlsx_keeps_late_text_after_numeric_rows() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let mut txt = String::from("id,code\n");
        for n_idx in 0..150 {
            txt.push_str(&format!("{n_idx},{n_idx}\n"));
        }
        txt.push_str("150,N/A\n");
        let path_file_in = write_csv(tmp.path(), "late.csv", &txt);

        let result = convert_csv_to_xlsx(&path_file_in, None, "blue");

        assert_eq!(result.n_rows(), 151);
        use calamine::{Data, Reader, Xlsx, open_workbook};
        let mut workbook: Xlsx<_> =
            open_workbook(tmp.path().join("late_formatted.xlsx")).expect("open workbook");
        let range = workbook.worksheet_range("Data").expect("sheet range");
        assert_eq!(
            range.get_value((151, 1)),
            Some(&Data::String("N/A".to_string()))
        );
        assert_eq!(range.get_value((151, 0)), Some(&Data::Float(150.0)));
    }

    #[test]
    fn convert_with_injected_reader() {
        let df = DataFrame::new(vec![Column::from(Series::new(
            "name".into(),
            &["a", "b", "c"],
        ))])
        .expect("frame");
        let formatter = TableFormatter::new(
            FixedReader(df),
            RecordingWriter::default(),
            SpecConvertOptions::default(),
        );

        let result = formatter.convert(Path::new("virtual.csv"), None, "orange");
        assert_eq!(
            result,
            EnumConversionResult::Success {
                n_rows: 3,
                n_cols: 1,
                path_file_out: PathBuf::from("virtual_formatted.xlsx"),
            }
        );
    }

    #[test]
    fn convert_end_to_end_is_idempotent() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path_file_in = write_csv(
            tmp.path(),
            "people.csv",
            "name,age,city\nAyşe,34,Ankara\nMehmet,,İstanbul\nZeynep,29,\n",
        );

        let formatter = TableFormatter::default();
        let result_first = formatter.convert(&path_file_in, None, "purple");
        let result_second = formatter.convert(&path_file_in, None, "purple");

        assert_eq!(result_first, result_second);
        assert_eq!(result_first.n_rows(), 3);
        let path_file_out = tmp.path().join("people_formatted.xlsx");
        assert!(path_file_out.is_file());

        use calamine::{Data, Reader, Xlsx, open_workbook};
        let mut workbook: Xlsx<_> = open_workbook(&path_file_out).expect("open workbook");
        let range = workbook.worksheet_range("Data").expect("sheet range");
        assert_eq!(range.get_size(), (4, 3));
        assert_eq!(range.get_value((1, 0)), Some(&Data::String("Ayşe".to_string())));
        assert_eq!(range.get_value((1, 1)), Some(&Data::Float(34.0)));
        assert_eq!(
            range.get_value((2, 2)),
            Some(&Data::String("İstanbul".to_string()))
        );
    }

    #[test]
    fn convert_csv_to_xlsx_missing_input_creates_no_file() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path_file_in = tmp.path().join("ghost.csv");

        let result = convert_csv_to_xlsx(&path_file_in, None, "blue");

        assert!(!result.is_success());
        assert!(!tmp.path().join("ghost_formatted.xlsx").exists());
        assert_eq!(fs::read_dir(tmp.path()).expect("list").count(), 0);
    }
}
