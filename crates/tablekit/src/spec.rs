//! Batch specification models, events and errors.

use std::path::PathBuf;

use tablekit_io_fs::{ExtractError, ReportBatch, ScanError, SpecScanOptions};
use tablekit_io_xlsx::{EnumConversionResult, EnumTableStyle};

////////////////////////////////////////////////////////////////////////////////
// #region Inputs

/// Where the batch takes its input files from.
#[derive(Debug, Clone)]
pub enum EnumBatchSource {
    /// One CSV file, optionally with an explicit output path.
    File {
        /// Input CSV file.
        path_file_in: PathBuf,
        /// Output workbook; derived from the input when `None`.
        path_file_out: Option<PathBuf>,
    },
    /// CSV files found in a folder.
    Folder {
        /// Folder to scan.
        path_dir: PathBuf,
        /// Scan rules (non-recursive by default).
        spec_scan_options: SpecScanOptions,
    },
    /// CSV files found anywhere inside a ZIP archive.
    Archive {
        /// Archive file.
        path_file_zip: PathBuf,
    },
}

/// Batch-wide options.
#[derive(Debug, Clone)]
pub struct SpecBatchOptions {
    /// Style identifier; unknown values fall back to the default style.
    pub style_choice: String,
    /// Output directory. `None` writes next to each input, or next to the
    /// archive for archive sources.
    pub dir_out: Option<PathBuf>,
    /// Maximum worker threads for the convert stage.
    pub num_workers_max: Option<usize>,
    /// Parent of the archive scratch directory; system temp dir when `None`.
    pub dir_scratch_parent: Option<PathBuf>,
}

impl Default for SpecBatchOptions {
    fn default() -> Self {
        Self {
            style_choice: EnumTableStyle::default().identifier().to_string(),
            dir_out: None,
            num_workers_max: Some(1),
            dir_scratch_parent: None,
        }
    }
}

/// One planned conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecConvertJob {
    /// Input CSV file.
    pub path_file_in: PathBuf,
    /// Target workbook.
    pub path_file_out: PathBuf,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Events

/// Progress message sent from the batch worker to the foreground loop.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumBatchEvent {
    /// Inputs resolved; conversion is about to start.
    Started {
        /// Number of files to convert.
        cnt_files: usize,
        /// Style applied to every file.
        style: EnumTableStyle,
    },
    /// A worker picked up one file.
    FileStarted {
        /// Position of the file in the job list.
        n_idx: usize,
        /// Input CSV file.
        path_file_in: PathBuf,
    },
    /// One file finished, successfully or not.
    FileFinished {
        /// Position of the file in the job list.
        n_idx: usize,
        /// Input CSV file.
        path_file_in: PathBuf,
        /// Conversion outcome.
        result: EnumConversionResult,
    },
    /// Every file processed.
    Finished(ReportBatch),
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Errors

/// Batch-level failures. Per-file failures are recorded in [`ReportBatch`] instead.
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    /// Folder scan failed.
    #[error(transparent)]
    Scan(#[from] ScanError),
    /// Archive extraction failed.
    #[error(transparent)]
    Extract(#[from] ExtractError),
    /// Source holds no CSV files.
    #[error("No CSV files found in {}", .0.display())]
    NoInputFiles(PathBuf),
    /// Output directory could not be created.
    #[error("Failed to create output directory {}: {source}", path.display())]
    OutputDir {
        /// Output directory.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
    /// Background worker could not be started.
    #[error("Failed to start batch worker: {0}")]
    Spawn(std::io::Error),
    /// Background worker panicked.
    #[error("Batch worker panicked")]
    WorkerPanicked,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
