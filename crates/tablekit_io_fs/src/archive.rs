//! ZIP extraction into a scoped scratch directory.

use std::fs::{self, File};
use std::io;
use std::path::Path;

use tempfile::TempDir;
use tracing::debug;

use crate::scan::scan_csv_files;
use crate::spec::{EnumPatternMode, ExtractError, SpecCsvEntry, SpecScanOptions, SpecScanResult};

/// Prefix of scratch directories created for archive extraction.
pub const C_PREFIX_DIR_SCRATCH: &str = "tablekit_archive_";
/// Resource-fork folder added by macOS archivers; never scanned.
pub const C_NAME_DIR_MACOS_METADATA: &str = "__MACOSX";

/// Extracted archive contents. The scratch directory lives as long as this value.
#[derive(Debug)]
pub struct ExtractedArchive {
    dir_scratch: TempDir,
    result: SpecScanResult,
}

impl ExtractedArchive {
    /// Scratch directory holding the extracted tree.
    pub fn path(&self) -> &Path {
        self.dir_scratch.path()
    }

    /// CSV files found in the archive, sorted by archive-relative path.
    pub fn entries(&self) -> &[SpecCsvEntry] {
        &self.result.entries
    }

    /// Non-fatal notes from scanning the extracted tree.
    pub fn warnings(&self) -> &[String] {
        &self.result.warnings
    }

    /// Remove the scratch directory now and surface removal errors.
    pub fn close(self) -> Result<(), ExtractError> {
        let path_dir_scratch = self.dir_scratch.path().to_path_buf();
        self.dir_scratch.close().map_err(|source| ExtractError::Io {
            path: path_dir_scratch,
            source,
        })
    }
}

/// Extract `path_file_zip` and list every CSV file inside it, at any depth.
///
/// The scratch directory is created under `path_dir_scratch_parent` when given,
/// otherwise under the system temp directory. Any entry whose name would land
/// outside the scratch directory aborts the extraction. On error nothing is
/// left behind.
pub fn extract_csv_archive(
    path_file_zip: &Path,
    path_dir_scratch_parent: Option<&Path>,
) -> Result<ExtractedArchive, ExtractError> {
    if !path_file_zip.is_file() {
        return Err(ExtractError::ArchiveNotFound(path_file_zip.to_path_buf()));
    }

    let file_zip = File::open(path_file_zip).map_err(|source| ExtractError::Io {
        path: path_file_zip.to_path_buf(),
        source,
    })?;
    let mut archive =
        zip::ZipArchive::new(file_zip).map_err(|source| ExtractError::Corrupted {
            path: path_file_zip.to_path_buf(),
            source,
        })?;

    let mut builder = tempfile::Builder::new();
    builder.prefix(C_PREFIX_DIR_SCRATCH);
    let dir_scratch = match path_dir_scratch_parent {
        Some(path_dir_parent) => builder.tempdir_in(path_dir_parent),
        None => builder.tempdir(),
    }
    .map_err(|source| ExtractError::Io {
        path: path_dir_scratch_parent
            .map(Path::to_path_buf)
            .unwrap_or_else(std::env::temp_dir),
        source,
    })?;

    for n_idx in 0..archive.len() {
        let mut file_entry = archive
            .by_index(n_idx)
            .map_err(|source| ExtractError::Corrupted {
                path: path_file_zip.to_path_buf(),
                source,
            })?;
        let Some(path_rel) = file_entry.enclosed_name() else {
            return Err(ExtractError::UnsafeEntry(file_entry.name().to_string()));
        };
        let path_out = dir_scratch.path().join(&path_rel);

        if file_entry.is_dir() {
            create_dir_all(&path_out)?;
            continue;
        }
        if let Some(path_parent) = path_out.parent() {
            create_dir_all(path_parent)?;
        }
        let mut file_out = File::create(&path_out).map_err(|source| ExtractError::Io {
            path: path_out.clone(),
            source,
        })?;
        io::copy(&mut file_entry, &mut file_out).map_err(|source| ExtractError::Io {
            path: path_out.clone(),
            source,
        })?;
    }

    let spec_scan_options = SpecScanOptions {
        patterns_exclude_dirs: Some(vec![C_NAME_DIR_MACOS_METADATA.to_string()]),
        rule_pattern: EnumPatternMode::Glob,
        ..SpecScanOptions::default().recursive()
    };
    let result = scan_csv_files(dir_scratch.path(), &spec_scan_options)?;
    debug!(
        path_file_zip = %path_file_zip.display(),
        path_dir_scratch = %dir_scratch.path().display(),
        cnt_entries_zip = archive.len(),
        cnt_csv = result.entries.len(),
        "Extracted archive."
    );

    Ok(ExtractedArchive {
        dir_scratch,
        result,
    })
}

fn create_dir_all(path_dir: &Path) -> Result<(), ExtractError> {
    fs::create_dir_all(path_dir).map_err(|source| ExtractError::Io {
        path: path_dir.to_path_buf(),
        source,
    })
}
