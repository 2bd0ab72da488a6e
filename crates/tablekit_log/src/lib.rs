//! `tablekit_log` v1:
//! `tracing` subscriber setup shared by tablekit front ends.
//!
//! Filter precedence: `TABLEKIT_LOG`, then `RUST_LOG`, then the level passed
//! by the caller (applied to tablekit crates only; everything else stays at `warn`).

use tracing_subscriber::EnvFilter;

/// Environment variable read before `RUST_LOG`.
pub const C_ENV_LOG: &str = "TABLEKIT_LOG";
/// Crates whose verbosity follows the caller's level.
pub const TUP_CRATES_LOGGED: [&str; 3] = ["tablekit", "tablekit_io_xlsx", "tablekit_io_fs"];

/// Subscriber setup failure.
#[derive(Debug, thiserror::Error)]
pub enum LogInitError {
    /// Level or directive string did not parse.
    #[error("Invalid log filter `{directives}`: {message}")]
    InvalidFilter {
        /// Directive string that failed.
        directives: String,
        /// Parser diagnostic.
        message: String,
    },
    /// A global subscriber is already installed.
    #[error("Failed to install log subscriber: {0}")]
    Install(String),
}

/// Directive string applying `level` to tablekit crates, `warn` elsewhere.
pub fn derive_filter_directives(level: &str) -> String {
    let c_level = level.trim().to_ascii_lowercase();
    let mut l_directives = vec!["warn".to_string()];
    l_directives.extend(
        TUP_CRATES_LOGGED
            .iter()
            .map(|c_crate| format!("{c_crate}={c_level}")),
    );
    l_directives.join(",")
}

/// Filter used when neither environment variable is set.
pub fn derive_default_env_filter(level: &str) -> Result<EnvFilter, LogInitError> {
    let directives = derive_filter_directives(level);
    EnvFilter::try_new(&directives).map_err(|err| LogInitError::InvalidFilter {
        directives,
        message: err.to_string(),
    })
}

/// Resolve the active filter from the environment, falling back to `level`.
pub fn derive_env_filter(level: &str) -> Result<EnvFilter, LogInitError> {
    if let Ok(filter) = EnvFilter::try_from_env(C_ENV_LOG) {
        return Ok(filter);
    }
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    derive_default_env_filter(level)
}

/// Install the global fmt subscriber writing to stderr.
pub fn init_logging(level: &str) -> Result<(), LogInitError> {
    let filter = derive_env_filter(level)?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|err| LogInitError::Install(err.to_string()))?;
    tracing::debug!(level, "Logging initialized.");
    Ok(())
}
