use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use log::LevelFilter;
use serde::Deserialize;

use crate::{error::Error, format::Formatter};

/// Level names as they appear in config files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConfigLevel {
    Debug,
    Info,
    #[serde(alias = "WARN")]
    Warning,
    Error,
    Critical,
}

impl ConfigLevel {
    pub fn to_filter(self) -> LevelFilter {
        match self {
            ConfigLevel::Debug => LevelFilter::Debug,
            ConfigLevel::Info => LevelFilter::Info,
            ConfigLevel::Warning => LevelFilter::Warn,
            // The log facade has no level above error
            ConfigLevel::Error | ConfigLevel::Critical => LevelFilter::Error,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FormatterDef {
    pub format: String,
}

/// A handler definition, discriminated by its `class` field.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "class", rename_all = "snake_case")]
pub enum HandlerDef {
    Console {
        level: ConfigLevel,
        formatter: String,
    },
    RotatingFile {
        level: ConfigLevel,
        formatter: String,
        filename: PathBuf,
        max_bytes: u64,
        backup_count: u32,
    },
}

impl HandlerDef {
    pub fn level(&self) -> ConfigLevel {
        match self {
            HandlerDef::Console { level, .. } | HandlerDef::RotatingFile { level, .. } => *level,
        }
    }

    pub fn formatter(&self) -> &str {
        match self {
            HandlerDef::Console { formatter, .. }
            | HandlerDef::RotatingFile { formatter, .. } => formatter,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggerDef {
    pub level: ConfigLevel,
    pub handlers: Vec<String>,
}

/// A parsed logging config file: named formatters, handlers and loggers.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub formatters: HashMap<String, FormatterDef>,
    #[serde(default)]
    pub handlers: HashMap<String, HandlerDef>,
    #[serde(default)]
    pub loggers: HashMap<String, LoggerDef>,
}

fn default_version() -> u32 {
    1
}

impl ConfigFile {
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::ConfigNotFound(path.to_path_buf()));
        }
        let raw = fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&raw)
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self, Error> {
        let config: Self = serde_yaml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject dangling references and unsupported versions early, so the
    /// factory never has to deal with a half-usable config.
    fn validate(&self) -> Result<(), Error> {
        if self.version != 1 {
            return Err(Error::UnsupportedVersion(self.version));
        }
        for def in self.formatters.values() {
            Formatter::compile(&def.format)?;
        }
        for (name, handler) in &self.handlers {
            if !self.formatters.contains_key(handler.formatter()) {
                return Err(Error::UnknownFormatter {
                    handler: name.clone(),
                    formatter: handler.formatter().to_string(),
                });
            }
        }
        for (name, logger) in &self.loggers {
            for handler in &logger.handlers {
                if !self.handlers.contains_key(handler) {
                    return Err(Error::UnknownHandler {
                        logger: name.clone(),
                        handler: handler.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Definition for `name`, or [`Error::LoggerNotDefined`].
    pub fn logger(&self, name: &str) -> Result<&LoggerDef, Error> {
        self.loggers
            .get(name)
            .ok_or_else(|| Error::LoggerNotDefined(name.to_string()))
    }

    /// Create the parent directory of every file handler target.
    /// Called before any handler attaches to its file.
    pub fn ensure_log_dirs(&self) -> Result<(), std::io::Error> {
        for handler in self.handlers.values() {
            if let HandlerDef::RotatingFile { filename, .. } = handler
                && let Some(parent) = filename.parent()
                && !parent.as_os_str().is_empty()
            {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }
}
