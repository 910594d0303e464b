use std::fmt;

/// Stage of development a package is deployed in.
///
/// Only used to derive logger names: each stage of a package logs under
/// its own name, e.g. `myapp_PRODUCTION`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DevStatus {
    Development,
    Testing,
    Production,
}

impl DevStatus {
    /// Stage name as it appears in logger names.
    pub fn name(self) -> &'static str {
        match self {
            DevStatus::Development => "DEVELOPMENT",
            DevStatus::Testing => "TESTING",
            DevStatus::Production => "PRODUCTION",
        }
    }

    /// Logger name for `package` at this stage.
    pub fn logger_name(self, package: &str) -> String {
        format!("{package}_{}", self.name())
    }
}

impl fmt::Display for DevStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_names() {
        assert_eq!(DevStatus::Development.name(), "DEVELOPMENT");
        assert_eq!(DevStatus::Testing.name(), "TESTING");
        assert_eq!(DevStatus::Production.name(), "PRODUCTION");
    }

    #[test]
    fn test_logger_name_suffix() {
        assert_eq!(
            DevStatus::Production.logger_name("myapp"),
            "myapp_PRODUCTION"
        );
        assert_eq!(DevStatus::Testing.to_string(), "TESTING");
    }
}
