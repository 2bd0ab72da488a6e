//! Front-end constants and presets.

/// Environment variable for the default style identifier.
pub const C_ENV_STYLE: &str = "TABLEKIT_STYLE";
/// Environment variable for the log level (also read as a filter by `tablekit_log`).
pub const C_ENV_LOG: &str = tablekit_log::C_ENV_LOG;
/// Name of the background batch thread.
pub const C_NAME_THREAD_BATCH: &str = "tablekit-batch";
/// Prefix of the final summary line.
pub const C_PREFIX_REPORT_BATCH: &str = "[BATCH]";
/// Default level when neither the flag nor the environment sets one.
pub const C_LOG_LEVEL_DEFAULT: &str = "info";
