//! `tablekit_io_fs` v1:
//! Input discovery for batch conversion.
//!
//! Module layout:
//! - `scan`    : folder traversal and CSV discovery
//! - `archive` : ZIP extraction into a scoped scratch directory
//! - `spec`    : enums/options/errors
//! - `report`  : batch report model
//! - `util`    : shared helper functions

pub mod archive;
pub mod report;
pub mod scan;
pub mod spec;
mod util;

pub use archive::{ExtractedArchive, extract_csv_archive};
pub use report::{ReportBatch, ReportBatchBuilder};
pub use scan::scan_csv_files;
pub use spec::{
    EnumDepthLimitMode, EnumPatternMode, ExtractError, ScanError, SpecCsvEntry, SpecFileError,
    SpecScanOptions, SpecScanResult,
};
pub use util::{calculate_worker_limit, has_extension_ignore_case};
