//! Exit code definitions for the swiftly CLI
//!
//! Only two codes are fixed. A command that fails with a described error may
//! pick any other code, and that code is passed through unchanged.

/// Exit codes for the swiftly CLI application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Operation completed successfully
    Success,

    /// General error: bad options, unknown command, unexpected failure
    GeneralError,

    /// Code chosen by the failing command
    Command(i32),
}

impl ExitCode {
    /// Convert exit code to i32 for use with std::process::exit
    #[inline]
    pub const fn as_i32(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::GeneralError => 1,
            Self::Command(code) => code,
        }
    }

    /// Create exit code from i32 value
    pub const fn from_i32(code: i32) -> Self {
        match code {
            0 => Self::Success,
            1 => Self::GeneralError,
            code => Self::Command(code),
        }
    }

    /// Get a human-readable description of the exit code
    pub const fn description(self) -> &'static str {
        match self {
            Self::Success => "Operation completed successfully",
            Self::GeneralError => "General error",
            Self::Command(_) => "Command failure",
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.as_i32()
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.description(), self.as_i32())
    }
}
