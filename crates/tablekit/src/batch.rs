//! Batch driver: resolve inputs, convert them, report progress over a channel.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use tablekit_io_fs::{
    ExtractedArchive, ReportBatch, ReportBatchBuilder, SpecCsvEntry, calculate_worker_limit,
    extract_csv_archive, scan_csv_files,
};
use tablekit_io_xlsx::{
    EnumConversionResult, EnumTableStyle, TableFormatter, TableReader, WorkbookWriter,
};
use tracing::{debug, info, warn};

use crate::conf::C_NAME_THREAD_BATCH;
use crate::spec::{BatchError, EnumBatchEvent, EnumBatchSource, SpecBatchOptions, SpecConvertJob};

/// Running background batch.
#[derive(Debug)]
pub struct BatchHandle {
    /// Progress events; the channel closes once the worker is done.
    pub rx_events: Receiver<EnumBatchEvent>,
    handle: JoinHandle<Result<ReportBatch, BatchError>>,
}

impl BatchHandle {
    /// Wait for the worker and return its report.
    pub fn join(self) -> Result<ReportBatch, BatchError> {
        self.handle.join().map_err(|_| BatchError::WorkerPanicked)?
    }
}

/// Start a batch on a background thread with the default formatter.
pub fn spawn_batch(
    source: EnumBatchSource,
    spec_batch_options: SpecBatchOptions,
) -> Result<BatchHandle, BatchError> {
    spawn_batch_with(TableFormatter::default(), source, spec_batch_options)
}

/// Start a batch on a background thread with an explicit formatter.
pub fn spawn_batch_with<R, W>(
    formatter: TableFormatter<R, W>,
    source: EnumBatchSource,
    spec_batch_options: SpecBatchOptions,
) -> Result<BatchHandle, BatchError>
where
    R: TableReader + 'static,
    W: WorkbookWriter + 'static,
{
    let (tx_events, rx_events) = mpsc::channel();
    let handle = thread::Builder::new()
        .name(C_NAME_THREAD_BATCH.to_string())
        .spawn(move || run_batch(&formatter, &source, &spec_batch_options, &tx_events))
        .map_err(BatchError::Spawn)?;
    Ok(BatchHandle { rx_events, handle })
}

/// Run a batch on the calling thread.
///
/// Per-file failures are recorded in the report and never stop the batch.
/// Archive scratch files are removed before this returns, whatever the outcome.
pub fn run_batch<R: TableReader, W: WorkbookWriter>(
    formatter: &TableFormatter<R, W>,
    source: &EnumBatchSource,
    spec_batch_options: &SpecBatchOptions,
    tx_events: &Sender<EnumBatchEvent>,
) -> Result<ReportBatch, BatchError> {
    let mut builder_batch_report = ReportBatchBuilder::default();

    let (style, if_fallback) = EnumTableStyle::resolve(&spec_batch_options.style_choice);
    if if_fallback {
        warn!(
            style_choice = %spec_batch_options.style_choice,
            style_default = %style,
            "Unknown table style; using default."
        );
        builder_batch_report.add_warning(format!(
            "Unknown table style `{}`; using `{style}`.",
            spec_batch_options.style_choice
        ));
    }

    // Holds the scratch directory until every job has run.
    let mut extracted_archive: Option<ExtractedArchive> = None;
    let l_jobs = plan_jobs(
        formatter,
        source,
        spec_batch_options,
        &mut extracted_archive,
        &mut builder_batch_report,
    )?;
    builder_batch_report.add_discovered(l_jobs.len() as u64);
    warn_duplicate_outputs(&l_jobs, &mut builder_batch_report);

    let _ = tx_events.send(EnumBatchEvent::Started {
        cnt_files: l_jobs.len(),
        style,
    });

    let n_workers_max = calculate_worker_limit(spec_batch_options.num_workers_max);
    let l_results = execute_jobs(
        formatter,
        &l_jobs,
        style,
        n_workers_max,
        tx_events,
        &mut builder_batch_report,
    );
    for (spec_job, result) in l_jobs.iter().zip(l_results) {
        match result {
            EnumConversionResult::Success { n_rows, .. } => {
                builder_batch_report.add_converted(n_rows)
            }
            EnumConversionResult::Failure { reason } => {
                builder_batch_report.add_failed(spec_job.path_file_in.clone(), reason)
            }
        }
    }

    if let Some(extracted_archive) = extracted_archive.take()
        && let Err(err) = extracted_archive.close()
    {
        builder_batch_report.add_warning(err.to_string());
    }

    let report = builder_batch_report.build();
    info!(
        cnt_converted = report.cnt_converted,
        cnt_failed = report.cnt_failed,
        n_rows_total = report.n_rows_total,
        "Batch finished."
    );
    let _ = tx_events.send(EnumBatchEvent::Finished(report.clone()));
    Ok(report)
}

fn plan_jobs<R: TableReader, W: WorkbookWriter>(
    formatter: &TableFormatter<R, W>,
    source: &EnumBatchSource,
    spec_batch_options: &SpecBatchOptions,
    extracted_archive: &mut Option<ExtractedArchive>,
    builder_batch_report: &mut ReportBatchBuilder,
) -> Result<Vec<SpecConvertJob>, BatchError> {
    let dir_out = spec_batch_options.dir_out.as_deref();

    let l_jobs = match source {
        EnumBatchSource::File {
            path_file_in,
            path_file_out,
        } => {
            let path_file_out = match path_file_out {
                Some(path) => path.clone(),
                None => derive_job_path_file_out(formatter, path_file_in, dir_out),
            };
            vec![SpecConvertJob {
                path_file_in: path_file_in.clone(),
                path_file_out,
            }]
        }
        EnumBatchSource::Folder {
            path_dir,
            spec_scan_options,
        } => {
            let result_scan = scan_csv_files(path_dir, spec_scan_options)?;
            builder_batch_report.extend_warnings(result_scan.warnings);
            derive_jobs(formatter, &result_scan.entries, dir_out)
        }
        EnumBatchSource::Archive { path_file_zip } => {
            let archive = extract_csv_archive(
                path_file_zip,
                spec_batch_options.dir_scratch_parent.as_deref(),
            )?;
            builder_batch_report.extend_warnings(archive.warnings().iter().cloned());
            let dir_out_archive = match dir_out {
                Some(path) => path.to_path_buf(),
                None => derive_parent_dir(path_file_zip),
            };
            let l_jobs = derive_jobs(formatter, archive.entries(), Some(&dir_out_archive));
            *extracted_archive = Some(archive);
            l_jobs
        }
    };

    if l_jobs.is_empty() {
        let path_source = match source {
            EnumBatchSource::File { path_file_in, .. } => path_file_in,
            EnumBatchSource::Folder { path_dir, .. } => path_dir,
            EnumBatchSource::Archive { path_file_zip } => path_file_zip,
        };
        return Err(BatchError::NoInputFiles(path_source.clone()));
    }

    if let Some(dir_out) = dir_out {
        fs::create_dir_all(dir_out).map_err(|source| BatchError::OutputDir {
            path: dir_out.to_path_buf(),
            source,
        })?;
    }

    debug!(cnt_jobs = l_jobs.len(), "Planned conversion jobs.");
    Ok(l_jobs)
}

fn derive_jobs<R: TableReader, W: WorkbookWriter>(
    formatter: &TableFormatter<R, W>,
    l_entries: &[SpecCsvEntry],
    dir_out: Option<&Path>,
) -> Vec<SpecConvertJob> {
    l_entries
        .iter()
        .map(|spec_entry| SpecConvertJob {
            path_file_in: spec_entry.path_file.clone(),
            path_file_out: derive_job_path_file_out(formatter, &spec_entry.path_file, dir_out),
        })
        .collect()
}

/// Default output path, moved into `dir_out` when one is given.
fn derive_job_path_file_out<R: TableReader, W: WorkbookWriter>(
    formatter: &TableFormatter<R, W>,
    path_file_in: &Path,
    dir_out: Option<&Path>,
) -> PathBuf {
    let path_file_out = formatter.derive_path_file_out(path_file_in);
    match (dir_out, path_file_out.file_name()) {
        (Some(dir_out), Some(name_file_out)) => dir_out.join(name_file_out),
        _ => path_file_out,
    }
}

fn derive_parent_dir(path_file: &Path) -> PathBuf {
    match path_file.parent() {
        Some(path_parent) if !path_parent.as_os_str().is_empty() => path_parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Jobs sharing one output path overwrite each other; the last one wins.
fn warn_duplicate_outputs(
    l_jobs: &[SpecConvertJob],
    builder_batch_report: &mut ReportBatchBuilder,
) {
    let mut dict_inputs_by_output: BTreeMap<&Path, Vec<&Path>> = BTreeMap::new();
    for spec_job in l_jobs {
        dict_inputs_by_output
            .entry(spec_job.path_file_out.as_path())
            .or_default()
            .push(spec_job.path_file_in.as_path());
    }

    for (path_file_out, l_inputs) in dict_inputs_by_output {
        if l_inputs.len() < 2 {
            continue;
        }
        warn!(
            path_file_out = %path_file_out.display(),
            cnt_inputs = l_inputs.len(),
            "Several inputs share one output path; the last one wins."
        );
        builder_batch_report.add_warning(format!(
            "{} inputs write to {}; the last one wins.",
            l_inputs.len(),
            path_file_out.display()
        ));
    }
}

fn execute_jobs<R: TableReader, W: WorkbookWriter>(
    formatter: &TableFormatter<R, W>,
    l_jobs: &[SpecConvertJob],
    style: EnumTableStyle,
    n_workers_max: usize,
    tx_events: &Sender<EnumBatchEvent>,
    builder_batch_report: &mut ReportBatchBuilder,
) -> Vec<EnumConversionResult> {
    let convert_job = |(n_idx, spec_job): (usize, &SpecConvertJob)| {
        convert_one(formatter, n_idx, spec_job, style, tx_events)
    };

    if n_workers_max <= 1 || l_jobs.len() <= 1 {
        return l_jobs.iter().enumerate().map(convert_job).collect();
    }

    let thread_pool = ThreadPoolBuilder::new().num_threads(n_workers_max).build();
    let Ok(thread_pool) = thread_pool else {
        builder_batch_report.add_warning(format!(
            "Failed to initialize thread pool (workers={n_workers_max}); fallback to serial convert."
        ));
        return l_jobs.iter().enumerate().map(convert_job).collect();
    };

    thread_pool.install(|| l_jobs.par_iter().enumerate().map(convert_job).collect())
}

fn convert_one<R: TableReader, W: WorkbookWriter>(
    formatter: &TableFormatter<R, W>,
    n_idx: usize,
    spec_job: &SpecConvertJob,
    style: EnumTableStyle,
    tx_events: &Sender<EnumBatchEvent>,
) -> EnumConversionResult {
    let _ = tx_events.send(EnumBatchEvent::FileStarted {
        n_idx,
        path_file_in: spec_job.path_file_in.clone(),
    });

    let result = formatter.convert_with_style(
        &spec_job.path_file_in,
        Some(&spec_job.path_file_out),
        style,
    );
    match &result {
        EnumConversionResult::Success {
            n_rows,
            n_cols,
            path_file_out,
        } => info!(
            path_file_in = %spec_job.path_file_in.display(),
            path_file_out = %path_file_out.display(),
            n_rows,
            n_cols,
            "Converted."
        ),
        EnumConversionResult::Failure { reason } => warn!(
            path_file_in = %spec_job.path_file_in.display(),
            reason,
            "Conversion failed."
        ),
    }

    let _ = tx_events.send(EnumBatchEvent::FileFinished {
        n_idx,
        path_file_in: spec_job.path_file_in.clone(),
        result: result.clone(),
    });
    result
}
