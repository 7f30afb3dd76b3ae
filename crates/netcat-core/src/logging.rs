use crate::error::NetcatError;
use chrono::Local;
use std::fs::create_dir_all;
use std::io;
use std::path::Path;
use tracing::metadata::LevelFilter;
use tracing::Span;
use tracing_subscriber::{
    fmt::{self, time::FormatTime},
    prelude::*,
    EnvFilter,
};

struct CustomTime;

impl FormatTime for CustomTime {
    fn format_time(&self, w: &mut fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", Local::now().format("%Y-%m-%d %H:%M:%S"))
    }
}

/// Initialize the tracing system for logging.
///
/// `level` is one of "error"/"warn"/"info"/"debug"/"trace"; `RUST_LOG`, when
/// set, overrides it. `log_file_path`, when given, adds a non-ANSI file
/// layer alongside stdout (the original system rotated daily into
/// `/var/log/netcat_backup`; this reproduces that as a plain append-mode
/// file, rotation being an operational/deployment concern).
pub fn init_logging(level: &str, log_file_path: Option<&str>) -> Result<(), NetcatError> {
    let filter_level = match level.to_lowercase().as_str() {
        "error" => LevelFilter::ERROR,
        "warn" => LevelFilter::WARN,
        "info" => LevelFilter::INFO,
        "debug" => LevelFilter::DEBUG,
        "trace" => LevelFilter::TRACE,
        _ => LevelFilter::INFO,
    };

    let env_filter = match std::env::var("RUST_LOG") {
        Ok(env_val) => EnvFilter::new(env_val),
        Err(_) => EnvFilter::new(level.to_lowercase()),
    };

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stdout)
        .with_ansi(true)
        .with_timer(CustomTime)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_filter(filter_level);

    if let Some(log_path) = log_file_path {
        let dir = Path::new(log_path).parent().unwrap_or(Path::new(""));
        create_dir_all(dir).map_err(NetcatError::Io)?;

        let log_file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)
            .map_err(NetcatError::Io)?;

        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(log_file)
            .with_ansi(false)
            .with_timer(CustomTime)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .with_filter(filter_level);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(file_layer)
            .with(stdout_layer)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stdout_layer)
            .init();
    }

    tracing::info!("logging initialized at {} level", level.to_uppercase());
    Ok(())
}

/// Enter (and return) a span carrying the device name as its logical
/// "process name", the way the original bound a per-process logger extra
/// field. Call once per worker thread and hold the returned span for the
/// worker's lifetime.
pub fn bind_device_span(device_name: &str) -> Span {
    let span = tracing::info_span!("device", device = %device_name.to_uppercase());
    span
}
