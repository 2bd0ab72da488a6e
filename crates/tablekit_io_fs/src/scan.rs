//! Input discovery: list CSV files under a folder.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::spec::{ScanError, SpecCsvEntry, SpecScanOptions, SpecScanResult};
use crate::util::{
    SpecScanPatterns, has_extension_ignore_case, is_depth_within_limit, should_descend,
    should_exclude_by_patterns,
};

#[derive(Debug, Clone)]
struct SpecDirEntry {
    path_dir_sub: PathBuf,
    name_dir: String,
}

#[derive(Debug, Clone)]
struct SpecFileEntry {
    path_file: PathBuf,
    name_file: String,
}

#[derive(Debug)]
struct SpecScanContext {
    path_dir_root: PathBuf,
    spec_scan_options: SpecScanOptions,
    spec_scan_pats: SpecScanPatterns,
    result: SpecScanResult,
}

/// List files with the configured extension under `dir_source`.
///
/// With default options only direct children are listed. Matching is on the
/// file basename; the extension check ignores case. Symlinked directories are
/// not followed. Unreadable entries are skipped and reported as warnings.
///
/// Entries come back sorted by path relative to `dir_source`.
pub fn scan_csv_files<P: AsRef<Path>>(
    dir_source: P,
    spec_scan_options: &SpecScanOptions,
) -> Result<SpecScanResult, ScanError> {
    let path_dir_root = dir_source.as_ref().to_path_buf();
    if !path_dir_root.is_dir() {
        return Err(ScanError::SourceNotDirectory(path_dir_root));
    }

    let spec_scan_pats = SpecScanPatterns::from_raw(
        spec_scan_options.patterns_include_files.as_deref(),
        spec_scan_options.patterns_exclude_files.as_deref(),
        spec_scan_options.patterns_exclude_dirs.as_deref(),
        spec_scan_options.rule_pattern,
    )?;

    let mut spec_scan_ctx = SpecScanContext {
        path_dir_root: path_dir_root.clone(),
        spec_scan_options: spec_scan_options.clone(),
        spec_scan_pats,
        result: SpecScanResult::default(),
    };
    walk_directory(&path_dir_root, 0, &mut spec_scan_ctx);

    let mut result = spec_scan_ctx.result;
    result.entries.sort();
    debug!(
        path_dir_root = %path_dir_root.display(),
        cnt_entries = result.entries.len(),
        cnt_warnings = result.warnings.len(),
        "Scanned input folder."
    );
    Ok(result)
}

fn walk_directory(path_root: &Path, n_depth_relative: usize, spec_scan_ctx: &mut SpecScanContext) {
    let mut l_dirs: Vec<SpecDirEntry> = Vec::new();
    let mut l_files: Vec<SpecFileEntry> = Vec::new();

    let iter_entries = match fs::read_dir(path_root) {
        Ok(iter) => iter,
        Err(e) => {
            spec_scan_ctx.result.warnings.push(format!(
                "Failed to read directory {} ({e})",
                path_root.display()
            ));
            return;
        }
    };

    for _entry_res in iter_entries {
        let entry = match _entry_res {
            Ok(v) => v,
            Err(e) => {
                spec_scan_ctx.result.warnings.push(format!(
                    "Failed to read directory entry under {} ({e})",
                    path_root.display()
                ));
                continue;
            }
        };

        let path_entry = entry.path();
        let c_name = entry.file_name().to_string_lossy().to_string();
        let cfg_file_type = match entry.file_type() {
            Ok(v) => v,
            Err(e) => {
                spec_scan_ctx
                    .result
                    .warnings
                    .push(format!("Failed to inspect {} ({e})", path_entry.display()));
                continue;
            }
        };

        if cfg_file_type.is_dir() {
            l_dirs.push(SpecDirEntry {
                path_dir_sub: path_entry,
                name_dir: c_name,
            });
        } else if cfg_file_type.is_file() || (cfg_file_type.is_symlink() && path_entry.is_file())
        {
            l_files.push(SpecFileEntry {
                path_file: path_entry,
                name_file: c_name,
            });
        }
    }

    l_dirs.sort_by(|a, b| a.name_dir.cmp(&b.name_dir));
    l_files.sort_by(|a, b| a.name_file.cmp(&b.name_file));

    let spec_scan_options = &spec_scan_ctx.spec_scan_options;
    if is_depth_within_limit(
        n_depth_relative,
        spec_scan_options.depth_limit,
        spec_scan_options.rule_depth_limit,
    ) {
        for _file_entry in l_files {
            if !has_extension_ignore_case(&_file_entry.path_file, &spec_scan_options.extension)
                || should_exclude_by_patterns(
                    &_file_entry.name_file,
                    spec_scan_ctx.spec_scan_pats.patterns_include_files.as_ref(),
                    spec_scan_ctx.spec_scan_pats.patterns_exclude_files.as_ref(),
                )
            {
                continue;
            }
            let path_rel = _file_entry
                .path_file
                .strip_prefix(&spec_scan_ctx.path_dir_root)
                .map(Path::to_path_buf)
                .unwrap_or_else(|_| PathBuf::from(&_file_entry.name_file));
            spec_scan_ctx.result.entries.push(SpecCsvEntry {
                path_rel,
                path_file: _file_entry.path_file,
            });
        }
    }

    if !should_descend(n_depth_relative, spec_scan_ctx.spec_scan_options.depth_limit) {
        return;
    }
    for _dir_entry in l_dirs {
        if should_exclude_by_patterns(
            &_dir_entry.name_dir,
            None,
            spec_scan_ctx.spec_scan_pats.patterns_exclude_dirs.as_ref(),
        ) {
            continue;
        }
        walk_directory(&_dir_entry.path_dir_sub, n_depth_relative + 1, spec_scan_ctx);
    }
}
