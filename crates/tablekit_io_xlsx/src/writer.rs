//! XLSX writer kernel that materializes a planned sheet into workbook output.

use std::io::Write;
use std::path::Path;

use rust_xlsxwriter::{
    Format, FormatAlign, Table, TableColumn, TableStyle, Workbook, Worksheet, XlsxError,
};

use crate::spec::{ConvertError, EnumCellValue, EnumTableStyle, SpecCellFormat, SpecSheetPlan};

/// Writes a planned sheet to a workbook file.
pub trait WorkbookWriter: Send + Sync {
    /// Build the workbook for `plan` and persist it at `path_file_out`,
    /// replacing any existing file. Nothing is left behind on failure.
    fn write_workbook(&self, plan: &SpecSheetPlan, path_file_out: &Path)
    -> Result<(), ConvertError>;
}

/// `rust_xlsxwriter`-backed workbook writer.
///
/// The workbook is serialized in memory, written to a temporary file next to
/// the destination and renamed over it.
#[derive(Debug, Clone, Copy, Default)]
pub struct XlsxWorkbookWriter;

impl WorkbookWriter for XlsxWorkbookWriter {
    fn write_workbook(
        &self,
        plan: &SpecSheetPlan,
        path_file_out: &Path,
    ) -> Result<(), ConvertError> {
        let v_buffer = derive_workbook_bytes(plan)?;
        persist_bytes_atomically(&v_buffer, path_file_out)
    }
}

/// Build workbook bytes for one planned sheet.
pub fn derive_workbook_bytes(plan: &SpecSheetPlan) -> Result<Vec<u8>, ConvertError> {
    let mut workbook = Workbook::new();
    let fmt_cell = derive_rust_xlsx_format(&plan.fmt_cell);

    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name(&plan.sheet_name)
        .map_err(derive_xlsx_error)?;

    write_header(worksheet, &plan.headers, &fmt_cell)?;

    for (n_idx_row, row_values) in plan.rows.iter().enumerate() {
        for (n_idx_col, value) in row_values.iter().enumerate() {
            write_cell_with_format(worksheet, n_idx_row + 1, n_idx_col, value, &fmt_cell)?;
        }
    }

    // Region may extend past the data (empty body); keep those cells formatted too.
    for n_idx_row in (plan.rows.len() + 1)..=plan.region.row_last {
        for n_idx_col in plan.region.col_first..=plan.region.col_last {
            write_cell_with_format(
                worksheet,
                n_idx_row,
                n_idx_col,
                &EnumCellValue::None,
                &fmt_cell,
            )?;
        }
    }

    let table = derive_rust_xlsx_table(plan, &fmt_cell);
    worksheet
        .add_table(
            cast_row_num(plan.region.row_first)?,
            cast_col_num(plan.region.col_first)?,
            cast_row_num(plan.region.row_last)?,
            cast_col_num(plan.region.col_last)?,
            &table,
        )
        .map_err(derive_xlsx_error)?;

    for (n_idx_col, n_width) in plan.widths_by_col.iter().enumerate() {
        worksheet
            .set_column_width(cast_col_num(n_idx_col)?, *n_width)
            .map_err(derive_xlsx_error)?;
    }

    workbook.save_to_buffer().map_err(derive_xlsx_error)
}

/// Write `v_bytes` to `path_file_out` through a sibling temporary file.
pub fn persist_bytes_atomically(v_bytes: &[u8], path_file_out: &Path) -> Result<(), ConvertError> {
    let derive_persist_error = |source: std::io::Error| ConvertError::Persist {
        path: path_file_out.to_path_buf(),
        source,
    };

    let path_dir_parent = match path_file_out.parent() {
        Some(path) if !path.as_os_str().is_empty() => path,
        _ => Path::new("."),
    };

    let mut file_tmp = tempfile::Builder::new()
        .prefix(".tablekit_")
        .suffix(".xlsx.part")
        .tempfile_in(path_dir_parent)
        .map_err(derive_persist_error)?;
    file_tmp.write_all(v_bytes).map_err(derive_persist_error)?;
    file_tmp.as_file().sync_all().map_err(derive_persist_error)?;
    file_tmp
        .persist(path_file_out)
        .map_err(|err| derive_persist_error(err.error))?;
    Ok(())
}

fn derive_rust_xlsx_table(plan: &SpecSheetPlan, fmt_cell: &Format) -> Table {
    let l_columns: Vec<TableColumn> = plan
        .headers
        .iter()
        .map(|c_header| {
            TableColumn::new()
                .set_header(c_header)
                .set_header_format(fmt_cell.clone())
        })
        .collect();

    Table::new()
        .set_name(&plan.table_name)
        .set_style(derive_table_style(plan.style))
        .set_banded_rows(true)
        .set_banded_columns(true)
        .set_first_column(false)
        .set_last_column(false)
        .set_columns(&l_columns)
}

fn derive_table_style(style: EnumTableStyle) -> TableStyle {
    match style {
        EnumTableStyle::Blue => TableStyle::Medium9,
        EnumTableStyle::Orange => TableStyle::Medium2,
        EnumTableStyle::Green => TableStyle::Medium7,
        EnumTableStyle::Purple => TableStyle::Medium15,
    }
}

fn write_header(
    worksheet: &mut Worksheet,
    headers: &[String],
    fmt_header: &Format,
) -> Result<(), ConvertError> {
    for (col_idx, cell_value) in headers.iter().enumerate() {
        worksheet
            .write_string_with_format(0, cast_col_num(col_idx)?, cell_value, fmt_header)
            .map_err(derive_xlsx_error)?;
    }
    Ok(())
}

fn write_cell_with_format(
    worksheet: &mut Worksheet,
    row_idx: usize,
    col_idx: usize,
    value: &EnumCellValue,
    format: &Format,
) -> Result<(), ConvertError> {
    let row = cast_row_num(row_idx)?;
    let col = cast_col_num(col_idx)?;
    match value {
        EnumCellValue::None => {
            worksheet
                .write_blank(row, col, format)
                .map_err(derive_xlsx_error)?;
        }
        EnumCellValue::String(val) => {
            worksheet
                .write_string_with_format(row, col, val, format)
                .map_err(derive_xlsx_error)?;
        }
        EnumCellValue::Number(val) => {
            worksheet
                .write_number_with_format(row, col, *val, format)
                .map_err(derive_xlsx_error)?;
        }
        EnumCellValue::Boolean(val) => {
            worksheet
                .write_boolean_with_format(row, col, *val, format)
                .map_err(derive_xlsx_error)?;
        }
    }
    Ok(())
}

fn derive_rust_xlsx_format(spec: &SpecCellFormat) -> Format {
    let mut format = Format::new();

    if let Some(val) = &spec.align
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }
    if let Some(val) = &spec.valign
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }

    if spec.text_wrap.unwrap_or(false) {
        format = format.set_text_wrap();
    }

    format
}

fn derive_format_align(align: &str) -> Option<FormatAlign> {
    let value = align.trim().to_ascii_lowercase();
    match value.as_str() {
        "general" => Some(FormatAlign::General),
        "left" => Some(FormatAlign::Left),
        "center" => Some(FormatAlign::Center),
        "right" => Some(FormatAlign::Right),
        "fill" => Some(FormatAlign::Fill),
        "justify" => Some(FormatAlign::Justify),
        "center_across" => Some(FormatAlign::CenterAcross),
        "distributed" => Some(FormatAlign::Distributed),
        "top" => Some(FormatAlign::Top),
        "bottom" => Some(FormatAlign::Bottom),
        "vcenter" | "vertical_center" => Some(FormatAlign::VerticalCenter),
        "vjustify" | "vertical_justify" => Some(FormatAlign::VerticalJustify),
        "vdistributed" | "vertical_distributed" => Some(FormatAlign::VerticalDistributed),
        _ => None,
    }
}

fn cast_row_num(value: usize) -> Result<u32, ConvertError> {
    u32::try_from(value).map_err(|_| ConvertError::Write(format!("row index overflow: {value}")))
}

fn cast_col_num(value: usize) -> Result<u16, ConvertError> {
    u16::try_from(value)
        .map_err(|_| ConvertError::Write(format!("column index overflow: {value}")))
}

fn derive_xlsx_error(err: XlsxError) -> ConvertError {
    ConvertError::Write(err.to_string())
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::io::Read;

    use calamine::{Data, Reader, Xlsx, open_workbook};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::conf::derive_default_cell_format;
    use crate::util::derive_table_region;

    fn derive_plan(rows: Vec<Vec<EnumCellValue>>) -> SpecSheetPlan {
        let headers = vec!["city".to_string(), "population".to_string()];
        let region = derive_table_region(rows.len(), headers.len());
        SpecSheetPlan {
            sheet_name: "Data".to_string(),
            table_name: "DataTable".to_string(),
            style: EnumTableStyle::Green,
            widths_by_col: vec![10.0, 12.0],
            headers,
            rows,
            fmt_cell: derive_default_cell_format(),
            region,
        }
    }

    fn read_zip_text(path: &Path, name: &str) -> String {
        let file = fs::File::open(path).expect("open xlsx");
        let mut archive = zip::ZipArchive::new(file).expect("xlsx is a zip");
        let mut entry = archive.by_name(name).expect("entry exists");
        let mut c_text = String::new();
        entry.read_to_string(&mut c_text).expect("read entry");
        c_text
    }

    #[test]
    fn write_workbook_round_trips_values() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path_file_out = tmp.path().join("out.xlsx");
        let plan = derive_plan(vec![
            vec![
                EnumCellValue::String("İzmir".to_string()),
                EnumCellValue::Number(4_400_000.0),
            ],
            vec![EnumCellValue::String("Van".to_string()), EnumCellValue::None],
        ]);

        XlsxWorkbookWriter
            .write_workbook(&plan, &path_file_out)
            .expect("write workbook");

        let mut workbook: Xlsx<_> = open_workbook(&path_file_out).expect("open workbook");
        assert_eq!(workbook.sheet_names(), vec!["Data".to_string()]);
        let range = workbook.worksheet_range("Data").expect("sheet range");
        assert_eq!(range.get_size(), (3, 2));
        assert_eq!(
            range.get_value((0, 1)),
            Some(&Data::String("population".to_string()))
        );
        assert_eq!(
            range.get_value((1, 0)),
            Some(&Data::String("İzmir".to_string()))
        );
        assert_eq!(range.get_value((1, 1)), Some(&Data::Float(4_400_000.0)));
    }

    #[test]
    fn write_workbook_emits_styled_table_over_full_region() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path_file_out = tmp.path().join("out.xlsx");
        let plan = derive_plan(vec![
            vec![EnumCellValue::String("a".to_string()), EnumCellValue::Number(1.0)],
            vec![EnumCellValue::String("b".to_string()), EnumCellValue::Number(2.0)],
        ]);

        XlsxWorkbookWriter
            .write_workbook(&plan, &path_file_out)
            .expect("write workbook");

        let c_table_xml = read_zip_text(&path_file_out, "xl/tables/table1.xml");
        assert!(c_table_xml.contains("ref=\"A1:B3\""));
        assert!(c_table_xml.contains("displayName=\"DataTable\""));
        assert!(c_table_xml.contains("name=\"TableStyleMedium7\""));
        assert!(c_table_xml.contains("showFirstColumn=\"0\""));
        assert!(c_table_xml.contains("showLastColumn=\"0\""));
        assert!(c_table_xml.contains("showRowStripes=\"1\""));
        assert!(c_table_xml.contains("showColumnStripes=\"1\""));

        let c_styles_xml = read_zip_text(&path_file_out, "xl/styles.xml");
        assert!(c_styles_xml.contains("horizontal=\"left\""));
        assert!(c_styles_xml.contains("vertical=\"center\""));
        assert!(!c_styles_xml.contains("wrapText=\"1\""));

        let c_sheet_xml = read_zip_text(&path_file_out, "xl/worksheets/sheet1.xml");
        assert_eq!(c_sheet_xml.matches("customWidth=\"1\"").count(), 2);
    }

    #[test]
    fn write_workbook_header_only_table_gets_blank_body_row() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path_file_out = tmp.path().join("out.xlsx");
        let plan = derive_plan(vec![]);

        XlsxWorkbookWriter
            .write_workbook(&plan, &path_file_out)
            .expect("write workbook");

        let c_table_xml = read_zip_text(&path_file_out, "xl/tables/table1.xml");
        assert!(c_table_xml.contains("ref=\"A1:B2\""));
    }

    #[test]
    fn write_workbook_overwrites_existing_file() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path_file_out = tmp.path().join("out.xlsx");
        fs::write(&path_file_out, b"stale bytes").expect("write stale");

        XlsxWorkbookWriter
            .write_workbook(&derive_plan(vec![]), &path_file_out)
            .expect("write workbook");

        let v_head = fs::read(&path_file_out).expect("read output");
        assert_eq!(&v_head[..2], b"PK");
        let n_entries = fs::read_dir(tmp.path()).expect("list dir").count();
        assert_eq!(n_entries, 1);
    }

    #[test]
    fn write_workbook_into_missing_directory_leaves_nothing() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path_file_out = tmp.path().join("no_such_dir").join("out.xlsx");

        let err = XlsxWorkbookWriter
            .write_workbook(&derive_plan(vec![]), &path_file_out)
            .expect_err("missing parent must fail");
        assert!(matches!(err, ConvertError::Persist { .. }));
        assert!(!path_file_out.exists());
    }
}
