use log::LevelFilter;
use log4rs::append::rolling_file::RollingFileAppender;
use log4rs::append::rolling_file::policy::compound::{
    CompoundPolicy, roll::fixed_window::FixedWindowRoller, trigger::size::SizeTrigger,
};
use log4rs::config::{Appender, Config, Logger, Root};
use log4rs::encode::pattern::PatternEncoder;
use std::path::Path;

use crate::errors::DbError;
use crate::telemetry::{AUDIT_TARGET, METRICS_TARGET};

const ENC_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S%.3f)} [{l}] {t} - {m}{n}";
const ROLL_SIZE: u64 = 10 * 1024 * 1024;
pub const DEFAULT_RETENTION: u32 = 7;

fn logger_err(e: impl std::fmt::Display) -> DbError {
    DbError::Logger(e.to_string())
}

/// `error|warn|info|debug|trace`, case-insensitive; anything else is `info`.
#[must_use]
pub fn parse_level(level: Option<&str>) -> LevelFilter {
    match level.unwrap_or("info").trim().to_ascii_lowercase().as_str() {
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        "off" => LevelFilter::Off,
        _ => LevelFilter::Info,
    }
}

fn rolling(base: &Path, stem: &str, keep: u32) -> Result<RollingFileAppender, DbError> {
    let roller = FixedWindowRoller::builder()
        .build(&format!("{}", base.join(format!("{stem}.{{}}.log")).display()), keep)
        .map_err(logger_err)?;
    let policy = CompoundPolicy::new(Box::new(SizeTrigger::new(ROLL_SIZE)), Box::new(roller));
    RollingFileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(ENC_PATTERN)))
        .build(base.join(format!("{stem}.log")), Box::new(policy))
        .map_err(logger_err)
}

/// log4rs configuration writing `app.log`, `audit.log` and `metrics.log` under `base`.
///
/// # Errors
/// Returns an error if an appender cannot be created.
pub fn build_config(base: &Path, level: LevelFilter, retention: u32) -> Result<Config, DbError> {
    std::fs::create_dir_all(base)?;
    Config::builder()
        .appender(Appender::builder().build("app", Box::new(rolling(base, "app", retention)?)))
        .appender(Appender::builder().build("audit", Box::new(rolling(base, "audit", retention)?)))
        .appender(Appender::builder().build("metrics", Box::new(rolling(base, "metrics", retention)?)))
        .logger(Logger::builder().appender("audit").additive(false).build(AUDIT_TARGET, level))
        .logger(Logger::builder().appender("metrics").additive(false).build(METRICS_TARGET, level))
        .build(Root::builder().appender("app").build(level))
        .map_err(logger_err)
}

/// Configure logging for the process.
/// - dir: base directory for logs; current directory when `None`
/// - level: see `parse_level`
/// - retention: rolled files kept per log (default 7)
///
/// # Errors
/// Returns an error if the directory or appenders cannot be created, or a logger is already set.
pub fn configure_logging(
    dir: Option<&Path>,
    level: Option<&str>,
    retention: Option<u32>,
) -> Result<(), DbError> {
    let base = match dir {
        Some(d) => d.to_path_buf(),
        None => std::env::current_dir()?,
    };
    let config = build_config(&base, parse_level(level), retention.unwrap_or(DEFAULT_RETENTION))?;
    log4rs::init_config(config).map_err(logger_err)?;
    log::info!("logging to {}", base.display());
    Ok(())
}

/// Initialize logging from a log4rs YAML file.
///
/// # Errors
/// Returns an error if the file cannot be parsed or a logger is already set.
pub fn init_file(path: &Path) -> Result<(), DbError> {
    log4rs::init_file(path, log4rs::config::Deserializers::default()).map_err(logger_err)?;
    log::info!("logging configured from {}", path.display());
    Ok(())
}
