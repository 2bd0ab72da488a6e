//! Command line front end: argument model, event rendering, exit codes.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tablekit_io_fs::{EnumDepthLimitMode, EnumPatternMode, ReportBatch, SpecScanOptions};
use tablekit_io_xlsx::{EnumConversionResult, EnumTableStyle};

use crate::batch::spawn_batch;
use crate::conf::{C_ENV_LOG, C_ENV_STYLE, C_LOG_LEVEL_DEFAULT, C_PREFIX_REPORT_BATCH};
use crate::spec::{EnumBatchEvent, EnumBatchSource, SpecBatchOptions};

const PB_STYLE: &str = "{spinner:.blue} [{elapsed_precise}] {wide_bar:.cyan/blue} {pos}/{len} {wide_msg}";

const PB_CHARS: &str = "█▓▒░  ";

#[derive(Debug, Parser)]
#[command(
    name = "tablekit",
    version,
    about = "Convert CSV files into styled Excel tables."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: EnumCommand,

    /// Log level for tablekit crates (`error`, `warn`, `info`, `debug`, `trace`).
    #[arg(long, global = true, env = C_ENV_LOG, default_value = C_LOG_LEVEL_DEFAULT)]
    pub log_level: String,

    /// Table style: blue (default), orange, green, purple.
    #[arg(long, global = true, env = C_ENV_STYLE, default_value = "blue")]
    pub style: String,

    /// Hide the progress bar.
    #[arg(long, global = true)]
    pub quiet: bool,
}

/// How `--include`/`--exclude`/`--exclude-dir` patterns are read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum EnumCliPatternMode {
    /// Shell wildcards.
    #[default]
    Glob,
    /// Regular expressions.
    Regex,
    /// Plain substrings.
    Literal,
}

impl From<EnumCliPatternMode> for EnumPatternMode {
    fn from(value: EnumCliPatternMode) -> Self {
        match value {
            EnumCliPatternMode::Glob => Self::Glob,
            EnumCliPatternMode::Regex => Self::Regex,
            EnumCliPatternMode::Literal => Self::Literal,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum EnumCommand {
    /// Convert one CSV file.
    File {
        /// Input CSV file.
        path_file_in: PathBuf,

        /// Output workbook (default: `<stem>_formatted.xlsx` next to the input).
        #[arg(short = 'o', long = "output")]
        path_file_out: Option<PathBuf>,
    },
    /// Convert every CSV file in a folder.
    Folder {
        /// Folder to scan.
        path_dir: PathBuf,

        /// Output directory (default: next to each input).
        #[arg(long = "out-dir")]
        dir_out: Option<PathBuf>,

        /// Descend into subfolders.
        #[arg(long, conflicts_with = "depth_limit")]
        recursive: bool,

        /// Descend at most this many folder levels (0 = top level only).
        #[arg(long = "depth")]
        depth_limit: Option<usize>,

        /// Only take files exactly `--depth` levels down.
        #[arg(long, requires = "depth_limit")]
        exact_depth: bool,

        /// Only convert files whose name matches this pattern (repeatable).
        #[arg(long = "include")]
        patterns_include: Vec<String>,

        /// Skip files whose name matches this pattern (repeatable).
        #[arg(long = "exclude")]
        patterns_exclude: Vec<String>,

        /// Skip subfolders whose name matches this pattern (repeatable).
        #[arg(long = "exclude-dir")]
        patterns_exclude_dirs: Vec<String>,

        /// Pattern syntax for the include/exclude options.
        #[arg(long = "pattern-mode", value_enum, default_value_t = EnumCliPatternMode::Glob)]
        rule_pattern: EnumCliPatternMode,

        /// Maximum worker threads.
        #[arg(long = "workers")]
        num_workers_max: Option<usize>,
    },
    /// Convert every CSV file inside a ZIP archive.
    Archive {
        /// ZIP archive.
        path_file_zip: PathBuf,

        /// Output directory (default: the archive's folder).
        #[arg(long = "out-dir")]
        dir_out: Option<PathBuf>,

        /// Maximum worker threads.
        #[arg(long = "workers")]
        num_workers_max: Option<usize>,
    },
    /// List available table styles.
    Styles,
}

/// Batch source and options for a conversion command; `None` for `styles`.
pub fn derive_batch_request(args: &Args) -> Option<(EnumBatchSource, SpecBatchOptions)> {
    let mut spec_batch_options = SpecBatchOptions {
        style_choice: args.style.clone(),
        ..SpecBatchOptions::default()
    };

    let source = match &args.command {
        EnumCommand::File {
            path_file_in,
            path_file_out,
        } => EnumBatchSource::File {
            path_file_in: path_file_in.clone(),
            path_file_out: path_file_out.clone(),
        },
        EnumCommand::Folder {
            path_dir,
            dir_out,
            recursive,
            depth_limit,
            exact_depth,
            patterns_include,
            patterns_exclude,
            patterns_exclude_dirs,
            rule_pattern,
            num_workers_max,
        } => {
            let mut spec_scan_options = SpecScanOptions {
                patterns_include_files: derive_patterns(patterns_include),
                patterns_exclude_files: derive_patterns(patterns_exclude),
                patterns_exclude_dirs: derive_patterns(patterns_exclude_dirs),
                rule_pattern: (*rule_pattern).into(),
                ..SpecScanOptions::default()
            };
            if *recursive {
                spec_scan_options = spec_scan_options.recursive();
            }
            if let Some(n_depth) = depth_limit {
                spec_scan_options.depth_limit = Some(*n_depth);
            }
            if *exact_depth {
                spec_scan_options.rule_depth_limit = EnumDepthLimitMode::Exact;
            }
            spec_batch_options.dir_out = dir_out.clone();
            spec_batch_options.num_workers_max = *num_workers_max;
            EnumBatchSource::Folder {
                path_dir: path_dir.clone(),
                spec_scan_options,
            }
        }
        EnumCommand::Archive {
            path_file_zip,
            dir_out,
            num_workers_max,
        } => {
            spec_batch_options.dir_out = dir_out.clone();
            spec_batch_options.num_workers_max = *num_workers_max;
            EnumBatchSource::Archive {
                path_file_zip: path_file_zip.clone(),
            }
        }
        EnumCommand::Styles => return None,
    };

    Some((source, spec_batch_options))
}

fn derive_patterns(patterns: &[String]) -> Option<Vec<String>> {
    (!patterns.is_empty()).then(|| patterns.to_vec())
}

/// Run the parsed command. Logging must already be initialized.
pub fn run(args: &Args) -> Result<ExitCode> {
    let Some((source, spec_batch_options)) = derive_batch_request(args) else {
        for c_line in derive_style_lines() {
            println!("{c_line}");
        }
        return Ok(ExitCode::SUCCESS);
    };

    let handle = spawn_batch(source, spec_batch_options).context("Failed to start batch")?;
    let pb = derive_progress_bar(args.quiet);
    for event in handle.rx_events.iter() {
        render_event(&pb, &event);
    }
    pb.finish_and_clear();

    let report = handle.join().context("Batch aborted")?;
    println!("{}", report.format(C_PREFIX_REPORT_BATCH));
    Ok(derive_exit_code(&report))
}

/// `0` when every discovered file converted, `1` otherwise.
pub fn derive_exit_code(report: &ReportBatch) -> ExitCode {
    if report.is_all_converted() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// One line per style: identifier, Excel style name, default marker.
pub fn derive_style_lines() -> Vec<String> {
    EnumTableStyle::ALL
        .iter()
        .map(|style| {
            let c_marker = if *style == EnumTableStyle::default() {
                " (default)"
            } else {
                ""
            };
            format!("{:<8}{}{c_marker}", style.identifier(), style.excel_name())
        })
        .collect()
}

/// Per-file line printed when a file finishes.
pub fn format_file_line(path_file_in: &Path, result: &EnumConversionResult) -> String {
    let c_name = path_file_in
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path_file_in.display().to_string());
    match result {
        EnumConversionResult::Success {
            n_rows,
            n_cols,
            path_file_out,
        } => format!(
            "[OK]   {c_name}: {n_rows} rows x {n_cols} cols -> {}",
            path_file_out.display()
        ),
        EnumConversionResult::Failure { reason } => format!("[FAIL] {c_name}: {reason}"),
    }
}

fn derive_progress_bar(if_quiet: bool) -> ProgressBar {
    if if_quiet {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::with_draw_target(Some(0), ProgressDrawTarget::stdout());
    match ProgressStyle::with_template(PB_STYLE) {
        Ok(pb_style) => pb.with_style(pb_style.progress_chars(PB_CHARS)),
        Err(_) => pb,
    }
}

fn render_event(pb: &ProgressBar, event: &EnumBatchEvent) {
    match event {
        EnumBatchEvent::Started { cnt_files, style } => {
            pb.set_length(*cnt_files as u64);
            pb.set_message(format!("style={style}"));
        }
        EnumBatchEvent::FileStarted { path_file_in, .. } => {
            pb.set_message(path_file_in.display().to_string());
        }
        EnumBatchEvent::FileFinished {
            path_file_in,
            result,
            ..
        } => {
            let c_line = format_file_line(path_file_in, result);
            if pb.is_hidden() {
                println!("{c_line}");
            } else {
                pb.println(c_line);
            }
            pb.inc(1);
        }
        EnumBatchEvent::Finished(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use clap::Parser;
    use pretty_assertions::assert_eq;
    use tablekit_io_fs::ReportBatch;

    use super::*;

    #[test]
    fn args_parse_file_command_with_global_style_after_subcommand() {
        let args = Args::try_parse_from([
            "tablekit", "file", "data.csv", "-o", "out.xlsx", "--style", "green",
        ])
        .expect("parse");

        assert_eq!(args.style, "green");
        let (source, spec_batch_options) = derive_batch_request(&args).expect("request");
        assert_eq!(spec_batch_options.style_choice, "green");
        match source {
            EnumBatchSource::File {
                path_file_in,
                path_file_out,
            } => {
                assert_eq!(path_file_in, PathBuf::from("data.csv"));
                assert_eq!(path_file_out, Some(PathBuf::from("out.xlsx")));
            }
            other => panic!("unexpected source {other:?}"),
        }
    }

    #[test]
    fn args_parse_folder_command_options() {
        let args = Args::try_parse_from([
            "tablekit",
            "folder",
            "in",
            "--out-dir",
            "out",
            "--recursive",
            "--exclude",
            "*_draft.csv",
            "--workers",
            "3",
        ])
        .expect("parse");

        let (source, spec_batch_options) = derive_batch_request(&args).expect("request");
        assert_eq!(spec_batch_options.dir_out, Some(PathBuf::from("out")));
        assert_eq!(spec_batch_options.num_workers_max, Some(3));
        match source {
            EnumBatchSource::Folder {
                spec_scan_options, ..
            } => {
                assert_eq!(spec_scan_options.depth_limit, None);
                assert_eq!(spec_scan_options.patterns_include_files, None);
                assert_eq!(
                    spec_scan_options.patterns_exclude_files,
                    Some(vec!["*_draft.csv".to_string()])
                );
            }
            other => panic!("unexpected source {other:?}"),
        }
    }

    #[test]
    fn args_parse_folder_pattern_and_depth_modes() {
        let args = Args::try_parse_from([
            "tablekit",
            "folder",
            "in",
            "--depth",
            "2",
            "--exact-depth",
            "--pattern-mode",
            "regex",
            "--include",
            r"^sales_\d+\.csv$",
            "--exclude-dir",
            "^tmp",
        ])
        .expect("parse");

        let (source, _) = derive_batch_request(&args).expect("request");
        match source {
            EnumBatchSource::Folder {
                spec_scan_options, ..
            } => {
                assert_eq!(spec_scan_options.depth_limit, Some(2));
                assert_eq!(
                    spec_scan_options.rule_depth_limit,
                    EnumDepthLimitMode::Exact
                );
                assert_eq!(spec_scan_options.rule_pattern, EnumPatternMode::Regex);
                assert_eq!(
                    spec_scan_options.patterns_exclude_dirs,
                    Some(vec!["^tmp".to_string()])
                );
            }
            other => panic!("unexpected source {other:?}"),
        }

        let res_exact_alone = Args::try_parse_from(["tablekit", "folder", "in", "--exact-depth"]);
        assert!(res_exact_alone.is_err());
        let res_conflict =
            Args::try_parse_from(["tablekit", "folder", "in", "--recursive", "--depth", "1"]);
        assert!(res_conflict.is_err());
    }

    #[test]
    fn run_folder_with_literal_pattern_skips_matching_files() {
        let tmp = tempfile::tempdir().expect("tempdir");
        std::fs::write(tmp.path().join("keep.csv"), "a\n1\n").expect("write csv");
        std::fs::write(tmp.path().join("keep_draft.csv"), "a\n1\n").expect("write csv");

        let args = Args::try_parse_from([
            "tablekit".to_string(),
            "--quiet".to_string(),
            "folder".to_string(),
            tmp.path().display().to_string(),
            "--pattern-mode".to_string(),
            "literal".to_string(),
            "--exclude".to_string(),
            "_draft".to_string(),
        ])
        .expect("parse");

        assert_eq!(run(&args).expect("run"), ExitCode::SUCCESS);
        assert!(tmp.path().join("keep_formatted.xlsx").is_file());
        assert!(!tmp.path().join("keep_draft_formatted.xlsx").exists());
    }

    #[test]
    fn args_styles_command_has_no_batch() {
        let args = Args::try_parse_from(["tablekit", "styles"]).expect("parse");
        assert!(derive_batch_request(&args).is_none());
        assert!(Args::try_parse_from(["tablekit"]).is_err());
    }

    #[test]
    fn style_lines_mark_default() {
        let l_lines = derive_style_lines();
        assert_eq!(l_lines.len(), 4);
        assert_eq!(l_lines[0], "blue    TableStyleMedium9 (default)");
        assert_eq!(l_lines[3], "purple  TableStyleMedium15");
    }

    #[test]
    fn file_lines_and_exit_codes() {
        let txt_ok = format_file_line(
            Path::new("/in/sales.csv"),
            &EnumConversionResult::Success {
                n_rows: 2,
                n_cols: 3,
                path_file_out: PathBuf::from("/in/sales_formatted.xlsx"),
            },
        );
        assert_eq!(
            txt_ok,
            "[OK]   sales.csv: 2 rows x 3 cols -> /in/sales_formatted.xlsx"
        );
        let txt_fail = format_file_line(
            Path::new("bad.csv"),
            &EnumConversionResult::Failure {
                reason: "boom".to_string(),
            },
        );
        assert_eq!(txt_fail, "[FAIL] bad.csv: boom");

        let report_ok = ReportBatch {
            cnt_discovered: 1,
            cnt_converted: 1,
            ..ReportBatch::default()
        };
        assert_eq!(derive_exit_code(&report_ok), ExitCode::SUCCESS);
        let report_failed = ReportBatch {
            cnt_discovered: 2,
            cnt_converted: 1,
            cnt_failed: 1,
            ..ReportBatch::default()
        };
        assert_eq!(derive_exit_code(&report_failed), ExitCode::FAILURE);
    }

    #[test]
    fn run_converts_file_quietly() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path_file_in = tmp.path().join("q.csv");
        std::fs::write(&path_file_in, "a,b\n1,2\n").expect("write csv");

        let args = Args::try_parse_from([
            "tablekit".to_string(),
            "--quiet".to_string(),
            "file".to_string(),
            path_file_in.display().to_string(),
        ])
        .expect("parse");

        let exit_code = run(&args).expect("run");
        assert_eq!(exit_code, ExitCode::SUCCESS);
        assert!(tmp.path().join("q_formatted.xlsx").is_file());
    }
}
