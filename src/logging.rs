//! Logger bootstrap. Diagnostics go to stderr so they never mix with responses.

use anyhow::{Context, Result};
use flexi_logger::{Logger, LoggerHandle};

/// Start logging with `RUST_LOG` if set, else `level`.
///
/// The returned handle must be kept alive for as long as logging is wanted.
pub fn init(level: &str) -> Result<LoggerHandle> {
    Logger::try_with_env_or_str(level)
        .with_context(|| format!("invalid log level `{level}`"))?
        .log_to_stderr()
        .start()
        .context("starting logger")
}
