//! CLI-specific error types and exit code mapping

use packwatch_core::error::PackwatchError;
use packwatch_tracker::TrackerError;

/// CLI-specific error type.
///
/// The `exit_code()` method maps errors to process exit codes.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// A subcommand-specific operation failed.
    #[error("{0}")]
    Command(String),

    /// Logging could not be initialised.
    #[error("logging setup failed: {0:#}")]
    Logging(#[from] anyhow::Error),

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapped domain error from packwatch-core.
    ///
    /// Tracker errors arrive here through `From<TrackerError> for PackwatchError`.
    #[error("{0}")]
    Core(#[from] PackwatchError),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                          |
    /// |------|----------------------------------|
    /// | 0    | Success (including an unusable upstream payload) |
    /// | 1    | General / command error          |
    /// | 2    | Configuration error              |
    /// | 3    | State store error                |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Core(PackwatchError::Config(_)) => 2,
            Self::Core(PackwatchError::Store(_)) => 3,
            Self::Command(_)
            | Self::Logging(_)
            | Self::JsonSerialize(_)
            | Self::Io(_)
            | Self::Core(_) => 1,
        }
    }
}

impl From<TrackerError> for CliError {
    fn from(e: TrackerError) -> Self {
        Self::Core(PackwatchError::from(e))
    }
}
