//! # cfglog
//! Logger factory: build and install a logger from a YAML config file,
//! with a console + rotating-file fallback when the config is missing,
//! malformed, or does not define the requested logger name.
//!
//! ## Usage
//! ```toml
//! // Cargo.toml
//! ...
//! [dependencies]
//! cfglog = "0.1.0"
//! ```
//!
//! ```yaml
//! # logging-config.yaml
//! version: 1
//! formatters:
//!   simple:
//!     format: "%(asctime)s - %(name)s - %(levelname)s - %(message)s"
//! handlers:
//!   console:
//!     class: console
//!     level: WARNING
//!     formatter: simple
//!   file:
//!     class: rotating_file
//!     level: INFO
//!     formatter: simple
//!     filename: logs/myapp.log
//!     max_bytes: 10240
//!     backup_count: 20
//! loggers:
//!   myapp:
//!     level: INFO
//!     handlers: [console, file]
//! ```
//!
//! ```rust,no_run
//! let _guard = cfglog::init_with_fallback("logging-config.yaml", "myapp")
//!     .expect("Unable to set up logging");
//! log::info!("Hello, world!");
//! // guard ensures logs are flushed when dropped
//! ```
//!
//! ## Strict setup
//! When a missing or incomplete config should be an error rather than a
//! fallback:
//!
//! ```rust,no_run
//! let guard = cfglog::init_from_file("logging-config.yaml", "myapp");
//! match guard {
//!     Ok(_guard) => log::info!("configured from file"),
//!     Err(err) => eprintln!("logging setup failed: {err}"),
//! }
//! ```
//!
//! ## Per-stage logger names
//! ```rust,no_run
//! use cfglog::DevStatus;
//!
//! // Uses the logger named `myapp_PRODUCTION` from the config file.
//! let _guard = cfglog::init_for_stage("logging-config.yaml", "myapp", DevStatus::Production)
//!     .expect("Unable to set up logging");
//! ```

mod config;
mod config_file;
mod dev_status;
mod error;
mod format;
mod log_writer;
mod worker;

pub use config_file::{ConfigFile, ConfigLevel, FormatterDef, HandlerDef, LoggerDef};
pub use dev_status::DevStatus;
pub use error::Error;
pub use format::{DEFAULT_PATTERN, Formatter};
pub use log_writer::{LogStdout, LogWriter, RotatingLogFile};
pub use worker::LoggerGuard;

use std::{
    fs,
    path::Path,
    sync::{Arc, LazyLock, RwLock},
};

use log::{LevelFilter, Log};

use crate::worker::{LogMessage, LogSender, spawn_log_thread};

/// Rotation policy of the fallback file handler.
const DEFAULT_MAX_BYTES: u64 = 10 * 1024;
const DEFAULT_BACKUP_COUNT: u32 = 20;
const DEFAULT_LOG_DIR: &str = "logs";

/// One running handler: a level gate in front of a writer thread.
struct Handler {
    level: LevelFilter,
    sender: Arc<LogSender>,
}

/// The active dispatch: logger name, level gate and handlers.
struct Dispatch {
    name: Option<String>,
    level: LevelFilter,
    handlers: Vec<Handler>,
}

impl Dispatch {
    fn empty() -> Self {
        Self {
            name: None,
            level: LevelFilter::Off,
            handlers: Vec::new(),
        }
    }
}

/// Global dispatch, swapped out by each factory call.
static GLOBAL_DISPATCH: LazyLock<Arc<RwLock<Dispatch>>> = LazyLock::new(|| {
    log::set_boxed_logger(Box::new(CfgLogger)).unwrap();
    log::set_max_level(LevelFilter::Off);
    Arc::new(RwLock::new(Dispatch::empty()))
});

/// Custom logger implementation routing records to the active handlers.
struct CfgLogger;

impl Log for CfgLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= GLOBAL_DISPATCH.read().unwrap().level
    }

    fn log(&self, record: &log::Record) {
        let dispatch = GLOBAL_DISPATCH.read().unwrap();
        let level = record.level();
        if level > dispatch.level {
            return;
        }
        let log_message = Arc::new(LogMessage {
            level,
            name: dispatch.name.clone(),
            message: record.args().to_string(),
        });
        for handler in &dispatch.handlers {
            if level <= handler.level {
                handler.sender.send(log_message.clone()).ok();
            }
        }
    }

    fn flush(&self) {}
}

/// Swap in a new dispatch and hand back a guard over its writer threads.
fn install(dispatch: Dispatch) -> LoggerGuard {
    let senders: Vec<_> = dispatch
        .handlers
        .iter()
        .map(|handler| Arc::clone(&handler.sender))
        .collect();
    let level = dispatch.level;
    // The lazy init of GLOBAL_DISPATCH resets the max level, so the
    // dispatch swap must happen before set_max_level.
    *GLOBAL_DISPATCH.write().unwrap() = dispatch;
    log::set_max_level(level);
    LoggerGuard::new(senders)
}

/// Build the dispatch described by `config` for the logger `logger_name`.
/// Parent directories of file handler targets are created before any
/// handler opens its file.
fn build_dispatch(config: &ConfigFile, logger_name: &str) -> Result<Dispatch, Error> {
    let logger = config.logger(logger_name)?;
    config.ensure_log_dirs()?;
    let mut handlers = Vec::with_capacity(logger.handlers.len());
    for handler_name in &logger.handlers {
        // References were validated at parse time
        let def = &config.handlers[handler_name];
        let formatter = Formatter::compile(&config.formatters[def.formatter()].format)?;
        let handler = match def {
            HandlerDef::Console { level, .. } => Handler {
                level: level.to_filter(),
                sender: Arc::new(spawn_log_thread(LogStdout, formatter, true)),
            },
            HandlerDef::RotatingFile {
                level,
                filename,
                max_bytes,
                backup_count,
                ..
            } => Handler {
                level: level.to_filter(),
                sender: Arc::new(spawn_log_thread(
                    RotatingLogFile::new(filename, *max_bytes, *backup_count)?,
                    formatter,
                    false,
                )),
            },
        };
        handlers.push(handler);
    }
    Ok(Dispatch {
        name: Some(logger_name.to_string()),
        level: logger.level.to_filter(),
        handlers,
    })
}

/// The hardcoded fallback: console at WARNING, rotating file at INFO under
/// `dir`, 10 KiB per file with 20 backups.
fn fallback_dispatch_at(dir: &Path, logger_name: &str) -> Result<Dispatch, std::io::Error> {
    fs::create_dir_all(dir)?;
    let formatter = Formatter::default();
    let file = RotatingLogFile::new(
        dir.join(format!("{logger_name}.log")),
        DEFAULT_MAX_BYTES,
        DEFAULT_BACKUP_COUNT,
    )?;
    Ok(Dispatch {
        name: Some(logger_name.to_string()),
        level: LevelFilter::Info,
        handlers: vec![
            Handler {
                level: LevelFilter::Warn,
                sender: Arc::new(spawn_log_thread(LogStdout, formatter.clone(), true)),
            },
            Handler {
                level: LevelFilter::Info,
                sender: Arc::new(spawn_log_thread(file, formatter, false)),
            },
        ],
    })
}

/// Initialize logging from a YAML config file, strictly.
///
/// Errors if the file is missing, unreadable or malformed, or if it does
/// not define `logger_name`. On success the returned guard keeps the
/// writer threads alive; drop it to flush and shut them down.
pub fn init_from_file<P: AsRef<Path>>(path: P, logger_name: &str) -> Result<LoggerGuard, Error> {
    let config = ConfigFile::from_yaml_file(&path)?;
    let dispatch = build_dispatch(&config, logger_name)?;
    let guard = install(dispatch);
    log::info!(
        "Logging successfully setup using {} config",
        path.as_ref().display()
    );
    Ok(guard)
}

/// Initialize logging from a YAML config file, falling back to the default
/// logger on any config problem.
///
/// The fallback logs to the console at WARNING and to
/// `logs/<logger_name>.log` at INFO (10 KiB files, 20 backups), and emits
/// a warning naming the config problem. Only an I/O failure while setting
/// up the fallback itself is an error.
pub fn init_with_fallback<P: AsRef<Path>>(
    path: P,
    logger_name: &str,
) -> Result<LoggerGuard, std::io::Error> {
    let configured = ConfigFile::from_yaml_file(&path)
        .and_then(|config| build_dispatch(&config, logger_name));
    match configured {
        Ok(dispatch) => {
            let guard = install(dispatch);
            log::info!(
                "Logging successfully setup using {} config",
                path.as_ref().display()
            );
            Ok(guard)
        }
        Err(reason) => {
            let guard = install(fallback_dispatch_at(Path::new(DEFAULT_LOG_DIR), logger_name)?);
            log::warn!("{reason}, switching to default logger");
            log::info!("Default logger has been invoked");
            Ok(guard)
        }
    }
}

/// Initialize logging for `package` at a development stage, using the
/// logger named `<package>_<STAGE>` and falling back like
/// [`init_with_fallback`].
pub fn init_for_stage<P: AsRef<Path>>(
    path: P,
    package: &str,
    stage: DevStatus,
) -> Result<LoggerGuard, std::io::Error> {
    init_with_fallback(path, &stage.logger_name(package))
}
