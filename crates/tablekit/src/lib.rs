//! `tablekit` v1:
//! Batch driver and command line front end for CSV-to-XLSX conversion.
//!
//! Module layout:
//! - `conf`  : constants and presets
//! - `spec`  : batch sources/options/events/errors
//! - `batch` : background batch worker
//! - `cli`   : argument model and event rendering
pub mod batch;
pub mod cli;
pub mod conf;
pub mod spec;

pub use batch::{BatchHandle, run_batch, spawn_batch, spawn_batch_with};
pub use spec::{BatchError, EnumBatchEvent, EnumBatchSource, SpecBatchOptions, SpecConvertJob};
