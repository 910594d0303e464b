use std::sync::LazyLock;

use chrono::Utc;
use colored::Colorize;
use log::Level;
use regex::Regex;

use crate::error::Error;

/// Pattern used by the fallback logger.
pub const DEFAULT_PATTERN: &str = "%(asctime)s - %(name)s - %(levelname)s - %(message)s";

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"%\((\w+)\)s").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Asctime,
    Name,
    Levelname,
    Message,
}

/// A compiled format pattern.
///
/// Patterns use `%(key)s` placeholders; the supported keys are `asctime`,
/// `name`, `levelname` and `message`. Anything between placeholders is
/// emitted verbatim.
#[derive(Debug, Clone)]
pub struct Formatter {
    segments: Vec<Segment>,
}

impl Default for Formatter {
    fn default() -> Self {
        Self::compile(DEFAULT_PATTERN).expect("default pattern must compile")
    }
}

impl Formatter {
    pub fn compile(pattern: &str) -> Result<Self, Error> {
        let mut segments = Vec::new();
        let mut last = 0;
        for caps in PLACEHOLDER.captures_iter(pattern) {
            let whole = caps.get(0).unwrap();
            if whole.start() > last {
                segments.push(Segment::Literal(pattern[last..whole.start()].to_string()));
            }
            segments.push(match &caps[1] {
                "asctime" => Segment::Asctime,
                "name" => Segment::Name,
                "levelname" => Segment::Levelname,
                "message" => Segment::Message,
                other => return Err(Error::UnknownPlaceholder(other.to_string())),
            });
            last = whole.end();
        }
        if last < pattern.len() {
            segments.push(Segment::Literal(pattern[last..].to_string()));
        }
        Ok(Self { segments })
    }

    /// Render one log line. `colorize` colors the level name for terminals.
    pub fn render(&self, message: &str, level: Level, name: Option<&str>, colorize: bool) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Asctime => {
                    out.push_str(&Utc::now().format("%Y-%m-%d %H:%M:%S%.3f").to_string());
                }
                Segment::Name => out.push_str(name.unwrap_or("root")),
                Segment::Levelname => {
                    if colorize {
                        out.push_str(&colorize_level(level));
                    } else {
                        out.push_str(level_name(level));
                    }
                }
                Segment::Message => out.push_str(message),
            }
        }
        out
    }
}

/// Level names as they appear in log lines and config files.
pub fn level_name(level: Level) -> &'static str {
    match level {
        Level::Error => "ERROR",
        Level::Warn => "WARNING",
        Level::Info => "INFO",
        Level::Debug => "DEBUG",
        Level::Trace => "TRACE",
    }
}

fn colorize_level(level: Level) -> String {
    let name = level_name(level);
    match level {
        Level::Error => name.red(),
        Level::Warn => name.yellow(),
        Level::Info => name.green(),
        Level::Debug => name.blue(),
        Level::Trace => name.purple(),
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pattern_renders_all_fields() {
        let formatter = Formatter::default();
        let line = formatter.render("hello", Level::Warn, Some("myapp"), false);
        assert!(line.contains(" - myapp - WARNING - hello"));
        // asctime comes first: "2024-01-01 00:00:00.000"
        assert_eq!(line.as_bytes()[4], b'-');
    }

    #[test]
    fn test_literal_only_pattern() {
        let formatter = Formatter::compile("plain").unwrap();
        assert_eq!(formatter.render("ignored", Level::Info, None, false), "plain");
    }

    #[test]
    fn test_missing_name_renders_root() {
        let formatter = Formatter::compile("%(name)s: %(message)s").unwrap();
        assert_eq!(formatter.render("msg", Level::Info, None, false), "root: msg");
    }

    #[test]
    fn test_unknown_placeholder_rejected() {
        let result = Formatter::compile("%(asctime)s %(thread)s");
        assert!(matches!(result, Err(Error::UnknownPlaceholder(key)) if key == "thread"));
    }

    #[test]
    fn test_levelname_mapping() {
        assert_eq!(level_name(Level::Warn), "WARNING");
        assert_eq!(level_name(Level::Error), "ERROR");
        let formatter = Formatter::compile("%(levelname)s").unwrap();
        assert_eq!(formatter.render("", Level::Debug, None, false), "DEBUG");
    }
}
