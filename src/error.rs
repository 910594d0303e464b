use std::path::PathBuf;

use thiserror::Error;

/// Everything that can go wrong while building a logger from a config file.
///
/// The lenient entry points treat every variant except [`Error::Io`] as a
/// reason to fall back to the default logger.
#[derive(Debug, Error)]
pub enum Error {
    #[error("logging config file `{0}` not found")]
    ConfigNotFound(PathBuf),
    #[error("unable to read logging config file `{path}`: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed logging config: {0}")]
    Malformed(#[from] serde_yaml::Error),
    #[error("unsupported logging config version {0}, expected 1")]
    UnsupportedVersion(u32),
    #[error("logger `{0}` not present in logging config")]
    LoggerNotDefined(String),
    #[error("logger `{logger}` references undefined handler `{handler}`")]
    UnknownHandler { logger: String, handler: String },
    #[error("handler `{handler}` references undefined formatter `{formatter}`")]
    UnknownFormatter { handler: String, formatter: String },
    #[error("unsupported placeholder `%({0})s` in format pattern")]
    UnknownPlaceholder(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
