// Logging module
// Builds the tracing subscriber stack shared by the navview binaries:
// - Console output with ANSI colours
// - Optional daily-rolling log file through a non-blocking writer
// - RUST_LOG takes precedence over the configured level

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Default file name used when a log directory is configured
pub const DEFAULT_LOG_FILE: &str = "navtool.log";

/// Initialize the logging system.
///
/// When `log_dir` is set, a second layer writes to a daily-rolling file in that
/// directory. The returned guard flushes the file writer on drop, so the caller
/// has to keep it alive for the lifetime of the program.
pub fn initialize_logging(
    log_dir: Option<&str>,
    log_level: &str,
    file_name: Option<&str>,
) -> Option<WorkerGuard> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level));

    let console = fmt::layer()
        .with_ansi(true)
        .with_target(false)
        .with_thread_ids(false);

    if let Some(dir) = log_dir {
        let path = Path::new(dir);
        if !path.exists() {
            let _ = std::fs::create_dir_all(path);
        }

        let file_appender = rolling::daily(dir, file_name.unwrap_or(DEFAULT_LOG_FILE));
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(console)
            .with(
                fmt::layer()
                    .with_writer(non_blocking)
                    .with_ansi(false)
                    .with_target(true),
            )
            .init();

        Some(guard)
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(console)
            .init();

        None
    }
}

/// Map a numeric console level (0=Minimum .. 4=Trace) to a filter directive
pub fn map_log_level(level: i32) -> &'static str {
    match level {
        i32::MIN..=0 => "error",
        1 => "warn",
        2 => "info",
        3 => "debug",
        _ => "trace",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_log_level() {
        assert_eq!(map_log_level(-3), "error");
        assert_eq!(map_log_level(0), "error");
        assert_eq!(map_log_level(2), "info");
        assert_eq!(map_log_level(3), "debug");
        assert_eq!(map_log_level(9), "trace");
    }
}
