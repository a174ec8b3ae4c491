use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Console plus daily rolling JSON file logging.
///
/// `RUST_LOG` wins over `LOG_LEVEL`; `LOG_FILE` picks the file (default
/// `logs/app.log`). Keep the returned guard alive for the life of the process
/// or buffered file lines are lost on exit.
pub fn setup_logging() -> WorkerGuard {
    dotenv::dotenv().ok();

    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let log_file = std::env::var("LOG_FILE").unwrap_or_else(|_| "logs/app.log".to_string());

    let log_path = Path::new(&log_file);
    let directory = log_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("logs"));
    let file_name = log_path
        .file_name()
        .unwrap_or(std::ffi::OsStr::new("app.log"));

    std::fs::create_dir_all(directory).ok();

    let file_appender = RollingFileAppender::new(Rotation::DAILY, directory, file_name);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let console_layer = fmt::layer()
        .with_target(true)
        .compact();

    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_target(true)
        .with_ansi(false)
        .json();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level)))
        .with(console_layer)
        .with(file_layer)
        .init();

    tracing::info!(level = %log_level, file = %log_file, "Logging initialized");
    guard
}
