//! Error types for swiftly-core
//!
//! One error type is shared by option resolution, backend selection and the
//! commands themselves. The dispatcher matches on the variant to decide
//! between a one-line message and a full diagnostic.

use thiserror::Error;

/// Result type alias for swiftly-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for swiftly operations
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file could not be read or parsed
    #[error("Configuration error: {0}")]
    Config(String),

    /// An option value could not be coerced to its declared type
    #[error("Invalid value for {option}: {reason}")]
    Resolution { option: String, reason: String },

    /// Standard backend selected without an auth URL
    #[error("No Auth URL has been given.")]
    MissingAuthUrl,

    /// Command token not present in the registry
    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    /// Described failure raised by a command
    #[error("{text}")]
    Command { text: String, code: i32 },

    /// A verbose template did not match its arguments
    #[error("{reason}: {template:?} {args:?}")]
    VerboseFormat {
        reason: String,
        template: String,
        args: Vec<String>,
    },

    /// Backend does not support the requested operation
    #[error("Unsupported feature: {0}")]
    UnsupportedFeature(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(String),

    /// General error
    #[error("{0}")]
    General(String),
}

impl Error {
    /// A described command failure with exit code 1
    pub fn command(text: impl Into<String>) -> Self {
        Self::Command {
            text: text.into(),
            code: 1,
        }
    }

    /// A described command failure with an explicit exit code
    pub fn command_with_code(text: impl Into<String>, code: i32) -> Self {
        Self::Command {
            text: text.into(),
            code,
        }
    }

    pub(crate) fn resolution(option: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Resolution {
            option: option.into(),
            reason: reason.into(),
        }
    }

    /// Get the exit code for this error
    pub const fn exit_code(&self) -> i32 {
        match self {
            Error::Command { code, .. } => *code,
            _ => 1,
        }
    }

    /// Whether this error is rendered as a single `ERROR <text>` line
    ///
    /// Everything else gets the full diagnostic treatment.
    pub fn is_described(&self) -> bool {
        match self {
            Error::Command { text, .. } => !text.is_empty(),
            Error::UnknownCommand(_) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_exit_codes() {
        assert_eq!(Error::command("boom").exit_code(), 1);
        assert_eq!(Error::command_with_code("quota exceeded", 3).exit_code(), 3);
        assert_eq!(Error::MissingAuthUrl.exit_code(), 1);
        assert_eq!(Error::UnknownCommand("bogus".into()).exit_code(), 1);
        assert_eq!(Error::General("x".into()).exit_code(), 1);
    }

    #[test]
    fn test_error_display() {
        let err = Error::resolution("retries", "'abc' is not an integer");
        assert_eq!(err.to_string(), "Invalid value for retries: 'abc' is not an integer");

        assert_eq!(
            Error::MissingAuthUrl.to_string(),
            "No Auth URL has been given."
        );
        assert_eq!(
            Error::UnknownCommand("bogus".into()).to_string(),
            "unknown command 'bogus'"
        );
    }

    #[test]
    fn test_described_errors() {
        assert!(Error::command("quota exceeded").is_described());
        assert!(!Error::command("").is_described());
        assert!(Error::UnknownCommand("x".into()).is_described());
        assert!(!Error::Io(std::io::Error::other("disk")).is_described());
    }
}
