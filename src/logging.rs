use anyhow::{Context, Result};
use std::path::Path;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

pub const LOG_FILE_PREFIX: &str = "options-signal-bot.log";

/// Initialize logging to both console and file.
/// Log files land in `dir` with daily rotation.
pub fn init_logging(dir: impl AsRef<Path>) -> Result<()> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, dir, LOG_FILE_PREFIX);

    tracing_subscriber::registry()
        .with(
            // Console output
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_line_number(true)
                .with_ansi(true),
        )
        .with(
            // File output with JSON formatting
            tracing_subscriber::fmt::layer()
                .with_writer(file_appender)
                .with_target(true)
                .with_line_number(true)
                .with_ansi(false)
                .json(),
        )
        // RUST_LOG, defaulting to info
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::{info, warn};

    #[test]
    fn test_logging_creates_directory() {
        let dir = std::env::temp_dir().join(format!("options-signal-bot-logs-{}", std::process::id()));
        init_logging(&dir).unwrap();

        info!("This is an info message");
        warn!("This is a warning message");

        assert!(dir.exists());
        // A second subscriber can't be installed in the same process
        assert!(init_logging(&dir).is_err());
    }
}
