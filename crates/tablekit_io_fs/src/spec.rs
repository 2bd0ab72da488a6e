//! Scan/extract specification models and top-level error types.

use std::path::PathBuf;

////////////////////////////////////////////////////////////////////////////////
// #region EnumsInit

/// Pattern matching mode for include/exclude lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumPatternMode {
    /// Shell-like wildcards (`*`, `?`, character classes).
    #[default]
    Glob,
    /// Regular expression pattern.
    Regex,
    /// Substring match.
    Literal,
}

/// Depth filter mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumDepthLimitMode {
    /// Include files with depth `<= depth_limit`.
    #[default]
    AtMost,
    /// Include files with depth exactly equal to `depth_limit`.
    Exact,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region StructsAndErrors

/// Input options for `scan_csv_files`.
///
/// Depth is relative to the scanned root: files directly inside it have depth `0`.
#[derive(Debug, Clone)]
pub struct SpecScanOptions {
    /// Include patterns applied to file basename.
    pub patterns_include_files: Option<Vec<String>>,
    /// Exclude patterns applied to file basename.
    pub patterns_exclude_files: Option<Vec<String>>,
    /// Exclude patterns applied to directory basename.
    pub patterns_exclude_dirs: Option<Vec<String>>,
    /// Pattern interpretation mode.
    pub rule_pattern: EnumPatternMode,
    /// Optional maximum/target depth (depends on `rule_depth_limit`).
    pub depth_limit: Option<usize>,
    /// Depth evaluation mode.
    pub rule_depth_limit: EnumDepthLimitMode,
    /// File extension matched case-insensitively, without the dot.
    pub extension: String,
}

impl Default for SpecScanOptions {
    fn default() -> Self {
        Self {
            patterns_include_files: None,
            patterns_exclude_files: None,
            patterns_exclude_dirs: None,
            rule_pattern: EnumPatternMode::Glob,
            depth_limit: Some(0),
            rule_depth_limit: EnumDepthLimitMode::AtMost,
            extension: "csv".to_string(),
        }
    }
}

impl SpecScanOptions {
    /// Same options without a depth limit.
    pub fn recursive(mut self) -> Self {
        self.depth_limit = None;
        self
    }
}

/// One discovered input file.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SpecCsvEntry {
    /// Path relative to the scanned root.
    pub path_rel: PathBuf,
    /// Full path.
    pub path_file: PathBuf,
}

/// Scan result: matched files sorted by relative path, plus skipped-entry notes.
#[derive(Debug, Clone, Default)]
pub struct SpecScanResult {
    /// Matched files.
    pub entries: Vec<SpecCsvEntry>,
    /// Non-fatal traversal warnings.
    pub warnings: Vec<String>,
}

/// One per-file failure item with path + error text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecFileError {
    /// Failed input path.
    pub path: PathBuf,
    /// User-facing error text.
    pub exception: String,
}

/// Top-level scan failures (input validation / setup stage).
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// Invalid include/exclude pattern.
    #[error("Invalid pattern in include/exclude: {0}")]
    InvalidPattern(String),
    /// Scan root is not a directory.
    #[error("Source is not a directory: {}", .0.display())]
    SourceNotDirectory(PathBuf),
}

/// Archive extraction failures. Any of these aborts the whole archive.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// Archive path missing or not a regular file.
    #[error("Archive not found: {}", .0.display())]
    ArchiveNotFound(PathBuf),
    /// Archive is not a readable ZIP file.
    #[error("Failed to read archive {}: {source}", path.display())]
    Corrupted {
        /// Archive path.
        path: PathBuf,
        /// Underlying ZIP error.
        source: zip::result::ZipError,
    },
    /// Entry name would land outside the scratch directory.
    #[error("Unsafe archive entry path: {0}")]
    UnsafeEntry(String),
    /// Filesystem failure while creating or filling the scratch directory.
    #[error("Failed to extract into {}: {source}", path.display())]
    Io {
        /// Path being written.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
    /// Scan of the extracted tree failed.
    #[error(transparent)]
    Scan(#[from] ScanError),
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
