//! Delimited-text reader capability.

use std::path::Path;

use polars::prelude::{
    CsvEncoding, CsvParseOptions, CsvReadOptions, DataFrame, PolarsResult, SerReader,
};
use tracing::debug;

use crate::spec::{ConvertError, SpecCsvReadOptions};

/// Reads one input file into a table.
pub trait TableReader: Send + Sync {
    /// Parse `path_file_in` using its first row as column names.
    fn read_table(&self, path_file_in: &Path) -> Result<DataFrame, ConvertError>;
}

/// Polars-backed CSV reader (strict UTF-8, header row required).
#[derive(Debug, Clone, Default)]
pub struct CsvTableReader {
    options: SpecCsvReadOptions,
}

impl CsvTableReader {
    /// Create reader with explicit options.
    pub fn new(options: SpecCsvReadOptions) -> Self {
        Self { options }
    }

    /// Reader options in use.
    pub fn options(&self) -> &SpecCsvReadOptions {
        &self.options
    }
}

impl CsvTableReader {
    /// Inference lengths tried in order: configured, whole file, all text.
    ///
    /// A column whose first rows look numeric may hold text further down; the
    /// later passes read it as text instead of failing. Syntax and encoding
    /// errors fail every pass, and the first error is reported.
    fn derive_infer_schema_lengths(&self) -> Vec<Option<usize>> {
        let mut l_lengths = vec![self.options.infer_schema_length];
        if self.options.infer_schema_length.is_some() {
            l_lengths.push(None);
        }
        if self.options.infer_schema_length != Some(0) {
            l_lengths.push(Some(0));
        }
        l_lengths
    }

    fn read_with_infer_schema_length(
        &self,
        path_file_in: &Path,
        infer_schema_length: Option<usize>,
    ) -> PolarsResult<DataFrame> {
        let parse_options = CsvParseOptions::default()
            .with_separator(self.options.separator)
            .with_encoding(CsvEncoding::Utf8);

        CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(infer_schema_length)
            .with_parse_options(parse_options)
            .try_into_reader_with_file_path(Some(path_file_in.to_path_buf()))
            .and_then(|reader| reader.finish())
    }
}

impl TableReader for CsvTableReader {
    fn read_table(&self, path_file_in: &Path) -> Result<DataFrame, ConvertError> {
        if !path_file_in.is_file() {
            return Err(ConvertError::InputNotFound(path_file_in.to_path_buf()));
        }

        let mut err_first = None;
        for infer_schema_length in self.derive_infer_schema_lengths() {
            match self.read_with_infer_schema_length(path_file_in, infer_schema_length) {
                Ok(df) => return Ok(df),
                Err(err) => {
                    debug!(
                        path_file_in = %path_file_in.display(),
                        ?infer_schema_length,
                        error = %err,
                        "CSV read pass failed."
                    );
                    err_first.get_or_insert(err);
                }
            }
        }

        Err(ConvertError::Read {
            path: path_file_in.to_path_buf(),
            message: err_first
                .map(|err| err.to_string())
                .unwrap_or_else(|| "no read attempt made".to_string()),
        })
    }
}
