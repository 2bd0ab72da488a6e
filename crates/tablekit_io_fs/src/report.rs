//! Batch report models and mutable report builder.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use crate::spec::SpecFileError;

/// Aggregate counters and diagnostics for one batch run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReportBatch {
    /// Input files found by the scan.
    pub cnt_discovered: u64,
    /// Files converted successfully.
    pub cnt_converted: u64,
    /// Files that failed to convert.
    pub cnt_failed: u64,
    /// Data rows written across all converted files.
    pub n_rows_total: u64,
    /// Non-fatal warnings collected during scan/convert.
    pub warnings: Vec<String>,
    /// Per-file failures.
    pub errors: Vec<SpecFileError>,
}

impl ReportBatch {
    /// Number of collected hard errors.
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Number of collected warnings.
    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// Whether every discovered file converted.
    pub fn is_all_converted(&self) -> bool {
        self.cnt_failed == 0 && self.cnt_converted == self.cnt_discovered
    }

    /// Machine-readable counters.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        dict_counts.insert("cnt_discovered".to_string(), self.cnt_discovered);
        dict_counts.insert("cnt_converted".to_string(), self.cnt_converted);
        dict_counts.insert("cnt_failed".to_string(), self.cnt_failed);
        dict_counts.insert("n_rows_total".to_string(), self.n_rows_total);
        dict_counts.insert("cnt_errors".to_string(), self.error_count() as u64);
        dict_counts.insert("cnt_warnings".to_string(), self.warning_count() as u64);
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        let dict_counts = self.to_dict();
        format!(
            "{prefix} converted={}/{} failed={} rows={} errors={} warnings={}",
            dict_counts["cnt_converted"],
            dict_counts["cnt_discovered"],
            dict_counts["cnt_failed"],
            dict_counts["n_rows_total"],
            dict_counts["cnt_errors"],
            dict_counts["cnt_warnings"]
        )
    }
}

impl fmt::Display for ReportBatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[BATCH]"))
    }
}

/// Mutable accumulator for batch statistics.
#[derive(Debug, Default, Clone)]
pub struct ReportBatchBuilder {
    /// See [`ReportBatch::cnt_discovered`].
    pub cnt_discovered: u64,
    /// See [`ReportBatch::cnt_converted`].
    pub cnt_converted: u64,
    /// See [`ReportBatch::cnt_failed`].
    pub cnt_failed: u64,
    /// See [`ReportBatch::n_rows_total`].
    pub n_rows_total: u64,
    /// See [`ReportBatch::errors`].
    pub errors: Vec<SpecFileError>,
    /// See [`ReportBatch::warnings`].
    pub warnings: Vec<String>,
}

impl ReportBatchBuilder {
    /// Record `value` discovered files.
    pub fn add_discovered(&mut self, value: u64) {
        self.cnt_discovered += value;
    }

    /// Record one converted file with its data row count.
    pub fn add_converted(&mut self, n_rows: usize) {
        self.cnt_converted += 1;
        self.n_rows_total += n_rows as u64;
    }

    /// Record one failed file.
    pub fn add_failed(&mut self, path: PathBuf, exception: String) {
        self.cnt_failed += 1;
        self.errors.push(SpecFileError { path, exception });
    }

    /// Add warning message.
    pub fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }

    /// Add several warning messages.
    pub fn extend_warnings<I: IntoIterator<Item = String>>(&mut self, warnings: I) {
        self.warnings.extend(warnings);
    }

    /// Finalize builder into immutable report.
    pub fn build(self) -> ReportBatch {
        ReportBatch {
            cnt_discovered: self.cnt_discovered,
            cnt_converted: self.cnt_converted,
            cnt_failed: self.cnt_failed,
            n_rows_total: self.n_rows_total,
            errors: self.errors,
            warnings: self.warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::{ReportBatch, ReportBatchBuilder};

    #[test]
    fn report_batch_to_dict_and_format_are_stable() {
        let report = ReportBatch {
            cnt_discovered: 3,
            cnt_converted: 2,
            cnt_failed: 1,
            n_rows_total: 120,
            warnings: vec!["w".to_string()],
            errors: vec![],
        };

        let dict_counts = report.to_dict();
        assert_eq!(dict_counts["cnt_discovered"], 3);
        assert_eq!(dict_counts["cnt_converted"], 2);
        assert_eq!(dict_counts["cnt_failed"], 1);
        assert_eq!(dict_counts["n_rows_total"], 120);
        assert_eq!(dict_counts["cnt_errors"], 0);
        assert_eq!(dict_counts["cnt_warnings"], 1);

        let txt = report.format("[BATCH]");
        assert_eq!(
            txt,
            "[BATCH] converted=2/3 failed=1 rows=120 errors=0 warnings=1"
        );
        assert_eq!(report.to_string(), txt);
        assert!(!report.is_all_converted());
    }

    #[test]
    fn report_batch_builder_accumulates() {
        let mut builder = ReportBatchBuilder::default();
        builder.add_discovered(2);
        builder.add_converted(10);
        builder.add_failed(PathBuf::from("bad.csv"), "broken".to_string());
        builder.extend_warnings(vec!["dup".to_string()]);

        let report = builder.build();
        assert_eq!(report.cnt_converted, 1);
        assert_eq!(report.cnt_failed, 1);
        assert_eq!(report.n_rows_total, 10);
        assert_eq!(report.errors[0].path, PathBuf::from("bad.csv"));
        assert_eq!(report.warning_count(), 1);
    }
}
