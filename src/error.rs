/*!
 * Error types for seqport
 */

use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SeqportError>;

/// Exit code constants for structured process exit
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_DECLINED: i32 = 1;
pub const EXIT_PLANNING: i32 = 1;
pub const EXIT_FATAL: i32 = 2;

#[derive(Error, Debug)]
pub enum SeqportError {
    /// A file or folder expected to exist is absent at stat time
    #[error("Missing file: {}", .0.display())]
    MissingFile(PathBuf),

    /// The destination template references a field nobody provides
    #[error("Destination pattern '{template}' references unknown field '{field}'")]
    TemplateField { field: String, template: String },

    /// The destination template cannot be parsed
    #[error("Invalid destination pattern '{template}': {reason}")]
    TemplateSyntax { template: String, reason: String },

    /// The source regular expression does not compile
    #[error("Invalid source regex '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },

    /// The external transfer tool exited unsuccessfully
    #[error("Command `{command}` failed ({}): {stderr}", status_text(.status))]
    ExecutorFailure {
        command: String,
        status: Option<i32>,
        stderr: String,
    },

    /// The metadata server answered with something unusable
    #[error("Metadata error: {0}")]
    Metadata(String),

    /// HTTP transport error talking to the metadata server
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Worker pool error
    #[error("Parallel processing error: {0}")]
    Parallel(String),
}

fn status_text(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!("exit status {}", code),
        None => "terminated by signal".to_string(),
    }
}

impl SeqportError {
    /// Get the process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            SeqportError::ExecutorFailure {
                status: Some(code), ..
            } if *code != 0 => *code,
            SeqportError::ExecutorFailure { .. } => EXIT_FATAL,
            SeqportError::Parallel(_) | SeqportError::Io(_) => EXIT_FATAL,
            // Planning and lookup problems: nothing was transferred
            _ => EXIT_PLANNING,
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> ErrorCategory {
        match self {
            SeqportError::MissingFile(_) => ErrorCategory::Filesystem,
            SeqportError::TemplateField { .. }
            | SeqportError::TemplateSyntax { .. }
            | SeqportError::InvalidPattern { .. } => ErrorCategory::Planning,
            SeqportError::ExecutorFailure { .. } => ErrorCategory::Executor,
            SeqportError::Metadata(_) | SeqportError::Http(_) => ErrorCategory::Network,
            SeqportError::Config(_) => ErrorCategory::Configuration,
            SeqportError::Io(_) => ErrorCategory::IoError,
            SeqportError::Parallel(_) => ErrorCategory::Concurrency,
        }
    }
}

/// Error category for classification and reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Missing files and folders
    Filesystem,
    /// Pattern and template errors
    Planning,
    /// External transfer tool failures
    Executor,
    /// Metadata server errors
    Network,
    /// Configuration errors
    Configuration,
    /// I/O operation errors
    IoError,
    /// Worker pool errors
    Concurrency,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Filesystem => write!(f, "filesystem"),
            ErrorCategory::Planning => write!(f, "planning"),
            ErrorCategory::Executor => write!(f, "executor"),
            ErrorCategory::Network => write!(f, "network"),
            ErrorCategory::Configuration => write!(f, "configuration"),
            ErrorCategory::IoError => write!(f, "io"),
            ErrorCategory::Concurrency => write!(f, "concurrency"),
        }
    }
}

impl From<serde_json::Error> for SeqportError {
    fn from(err: serde_json::Error) -> Self {
        SeqportError::Metadata(format!("JSON parse error: {}", err))
    }
}

impl From<toml::de::Error> for SeqportError {
    fn from(err: toml::de::Error) -> Self {
        SeqportError::Config(format!("TOML parse error: {}", err))
    }
}
