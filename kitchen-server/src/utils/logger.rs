//! Logging Infrastructure
//!
//! Structured logging for development and production:
//! - Console output, pretty or JSON
//! - Optional daily rotating application logs under `{log_dir}/app`
//! - Application logs older than 14 days are deleted by a periodic task

use chrono::{Local, NaiveDate};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, prelude::*};

/// Days an application log file is kept
pub const LOG_RETENTION_DAYS: i64 = 14;

const APP_LOG_PREFIX: &str = "app";
const APP_LOG_SUFFIX: &str = "log";
const CLEANUP_INTERVAL: Duration = Duration::from_secs(3600);

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// Date encoded in an application log file name (`app.YYYY-MM-DD.log`)
fn app_log_date(file_name: &str) -> Option<NaiveDate> {
    let date = file_name
        .strip_prefix(APP_LOG_PREFIX)?
        .strip_prefix('.')?
        .strip_suffix(APP_LOG_SUFFIX)?
        .strip_suffix('.')?;
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
}

/// Delete application log files older than [`LOG_RETENTION_DAYS`]
///
/// Returns the number of deleted files.
pub fn cleanup_old_logs(log_dir: &Path) -> anyhow::Result<usize> {
    let app_log_dir = log_dir.join("app");
    if !app_log_dir.exists() {
        return Ok(0);
    }

    let cutoff = (Local::now() - chrono::Duration::days(LOG_RETENTION_DAYS)).date_naive();
    let mut deleted = 0;

    for entry in fs::read_dir(app_log_dir)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if let Some(date) = app_log_date(name)
            && date < cutoff
        {
            fs::remove_file(&path)?;
            tracing::info!(file = %name, "Deleted old log file");
            deleted += 1;
        }
    }

    Ok(deleted)
}

/// Initialize the logging system
///
/// `RUST_LOG` overrides `level` when set.
///
/// ```no_run
/// // Development setup (console only)
/// kitchen_server::init_logger_with_file("debug", false, None)?;
///
/// // Production setup (JSON console + rotating file)
/// kitchen_server::init_logger_with_file("info", true, Some(std::path::Path::new("./work_dir/logs")))?;
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn init_logger_with_file(
    level: &str,
    json_format: bool,
    log_dir: Option<&Path>,
) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let console_layer: BoxedLayer = if json_format {
        fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    };

    let mut layers = vec![console_layer];

    if let Some(dir) = log_dir {
        let app_log_dir = dir.join("app");
        fs::create_dir_all(&app_log_dir)?;

        // app.YYYY-MM-DD.log, rotated daily, subject to cleanup
        let app_log = RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix(APP_LOG_PREFIX)
            .filename_suffix(APP_LOG_SUFFIX)
            .build(&app_log_dir)?;

        let app_layer: BoxedLayer = fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(false)
            .with_writer(std::sync::Mutex::new(app_log))
            .boxed();
        layers.push(app_layer);
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(env_filter)
        .try_init()?;

    Ok(())
}

/// Hourly log cleanup until shutdown
pub async fn periodic_cleanup(log_dir: PathBuf, shutdown: CancellationToken) {
    let mut interval = tokio::time::interval(CLEANUP_INTERVAL);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = interval.tick() => {
                if let Err(e) = cleanup_old_logs(&log_dir) {
                    tracing::error!(error = %e, "Failed to cleanup old logs");
                }
            }
        }
    }
}
