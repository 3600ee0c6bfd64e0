//! File and console logging.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;

const LOG_FILE: &str = "schematic-undo.log";

/// Install the global subscriber: colored output on stdout and plain output
/// appended to `logs_dir/schematic-undo.log`.
///
/// The returned guard flushes the file writer when dropped, so keep it alive
/// for as long as the app runs. Returns `None` when the logs directory can't
/// be created or a subscriber is already installed.
pub fn setup_logging(logs_dir: &Path) -> Option<WorkerGuard> {
    // Create logs directory if it doesn't exist
    if let Err(e) = std::fs::create_dir_all(logs_dir) {
        eprintln!("Failed to create logs directory {:?}: {}", logs_dir, e);
        return None;
    }

    let log_file_path = logs_dir.join(LOG_FILE);

    // Append session separator to existing log file
    if let Ok(mut file) = OpenOptions::new().append(true).open(&log_file_path) {
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        let separator = "=".repeat(80);
        let _ = writeln!(
            file,
            "\n\n{}\n=== New Session Started at {} ===\n{}\n",
            separator, timestamp, separator
        );
    }

    let file_appender = tracing_appender::rolling::never(logs_dir, LOG_FILE);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // No ANSI colors in the file
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_level(true);

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .with_ansi(true)
        .with_target(true)
        .with_level(true);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,schematic_undo=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stdout_layer)
        .try_init()
        .ok()?;

    Some(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_logging_appends_session_separator() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(LOG_FILE), "previous session\n").unwrap();

        // Another test may already own the global subscriber, so only the
        // separator is checked.
        let _guard = setup_logging(dir.path());

        let text = std::fs::read_to_string(dir.path().join(LOG_FILE)).unwrap();
        assert!(text.starts_with("previous session"));
        assert!(text.contains("=== New Session Started at"));
    }
}
