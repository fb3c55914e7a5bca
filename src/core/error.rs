use thiserror::Error;

/// Core error types for flowgen
///
/// Every variant is fatal for the input or artifact being processed. Per-rule
/// problems that only exclude one line from the rule set are [`SkipReason`]s.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A source line does not follow any supported rule grammar
    #[error("Line {line}: {reason}: '{text}'")]
    Grammar {
        line: usize,
        text: String,
        reason: String,
    },

    /// Caller-supplied configuration was rejected
    #[error("Configuration error in {field}: {message}")]
    Config { field: String, message: String },

    /// The selected backend cannot express a rule
    #[error("{backend} backend: {message}")]
    Unsupported { backend: String, message: String },

    /// Internal logic error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Config {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn unsupported(backend: impl std::fmt::Display, message: impl Into<String>) -> Self {
        Error::Unsupported {
            backend: backend.to_string(),
            message: message.into(),
        }
    }

    /// Translates the error into a user-facing message with suggestions.
    pub fn hint(&self) -> ErrorTranslation {
        match self {
            Error::Grammar { .. } => ErrorTranslation::new("Input rule does not follow a supported format")
                .with_suggestion("Filter rules start with allow, drop or deny: 'allow src host 10.0.0.1'")
                .with_suggestion("Lookup rules are an address and a port: '10.1.2.0/24 7'")
                .with_suggestion("Director rules start with 'flow create', 'ingress', 'egress' or 'transfer'")
                .with_suggestion("No output was written for this input; fix the line and rerun"),
            Error::Config { field, .. } => {
                ErrorTranslation::new(format!("Invalid value for '{field}'"))
                    .with_suggestion("Check the command line flags and the config file")
                    .with_suggestion("Run with --help to see accepted values")
            }
            Error::Unsupported { .. } => ErrorTranslation::new("Rule cannot be expressed by the selected backend")
                .with_suggestion("Controller flows only accept exact transport ports")
                .with_suggestion("Use the flow-api or switch-cli backend for masked port matches"),
            Error::Io(e) if e.kind() == std::io::ErrorKind::NotFound => {
                ErrorTranslation::new("Input file or output folder not found")
                    .with_suggestion("Check that the paths exist and are readable")
            }
            Error::Io(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                ErrorTranslation::new("Permission denied while reading input or writing output")
                    .with_suggestion("Choose an output folder you can write to")
            }
            _ => ErrorTranslation::new(format!("Translation failed: {self}"))
                .with_suggestion("Rerun with -v for detailed rule-by-rule logging"),
        }
    }
}

/// Reasons a single source line is excluded from the rule set.
///
/// Skipped lines are logged and do not consume a priority slot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkipReason {
    #[error("IPv6 classification is not supported")]
    Ipv6Unsupported,

    #[error("invalid port '{0}'")]
    InvalidPort(String),

    #[error("invalid IPv4 address '{0}'")]
    InvalidAddress(String),

    #[error("invalid prefix length '{0}'")]
    InvalidPrefix(String),

    #[error("invalid IP protocol '{0}'")]
    InvalidProtocol(String),

    #[error("missing operand after '{0}'")]
    MissingOperand(String),

    #[error("unexpected token '{0}'")]
    UnexpectedToken(String),
}

/// Represents a translated error with helpful context
#[derive(Debug, Clone)]
pub struct ErrorTranslation {
    pub user_message: String,
    pub suggestions: Vec<String>,
}

impl ErrorTranslation {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            user_message: message.into(),
            suggestions: Vec::new(),
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grammar_error_message_carries_line() {
        let err = Error::Grammar {
            line: 3,
            text: "permit any".to_string(),
            reason: "unknown rule format".to_string(),
        };
        assert_eq!(err.to_string(), "Line 3: unknown rule format: 'permit any'");
    }

    #[test]
    fn test_grammar_hint() {
        let err = Error::Grammar {
            line: 1,
            text: "x".to_string(),
            reason: "unknown rule format".to_string(),
        };
        let translation = err.hint();
        assert!(translation.user_message.contains("supported format"));
        assert!(translation.suggestions.iter().any(|s| s.contains("allow")));
        assert!(translation.suggestions.len() >= 3);
    }

    #[test]
    fn test_config_hint_names_field() {
        let err = Error::config("queues.target", "must be at least 1");
        assert!(err.to_string().contains("queues.target"));
        assert!(err.hint().user_message.contains("queues.target"));
    }

    #[test]
    fn test_unsupported_hint() {
        let err = Error::unsupported("controller-json", "wildcard TCP source port");
        assert_eq!(
            err.to_string(),
            "controller-json backend: wildcard TCP source port"
        );
        assert!(
            err.hint()
                .suggestions
                .iter()
                .any(|s| s.contains("exact transport ports"))
        );
    }

    #[test]
    fn test_io_not_found_hint() {
        let err = Error::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert!(err.hint().user_message.contains("not found"));
    }

    #[test]
    fn test_skip_reason_messages() {
        assert_eq!(
            SkipReason::InvalidPort("-1".to_string()).to_string(),
            "invalid port '-1'"
        );
        assert_eq!(
            SkipReason::Ipv6Unsupported.to_string(),
            "IPv6 classification is not supported"
        );
    }
}
