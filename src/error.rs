//! Error types for aclstore.
//!
//! Provides structured error handling with:
//! - Machine-readable error codes (`ErrorCode`)
//! - Category-based exit codes (2=db, 4=validation, 7=config, 8=io)
//! - Retryability flags so callers can decide whether to resubmit a batch
//! - Structured JSON output for piped / non-TTY consumers
//!
//! Not-found is never an error in this crate: every read path answers an
//! absent key with an empty sequence.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for aclstore operations.
pub type Result<T> = std::result::Result<T, Error>;

// ── Error Code ────────────────────────────────────────────────

/// Machine-readable error codes grouped by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Database (exit 2)
    NotInitialized,
    AlreadyInitialized,
    DatabaseError,

    // Validation (exit 4)
    InvalidBucket,
    InvalidArgument,
    BatchClosed,

    // Config (exit 7)
    ConfigError,

    // I/O (exit 8)
    IoError,
    JsonError,
}

impl ErrorCode {
    /// Machine-readable SCREAMING_SNAKE code string.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        match self {
            Self::NotInitialized => "NOT_INITIALIZED",
            Self::AlreadyInitialized => "ALREADY_INITIALIZED",
            Self::DatabaseError => "DATABASE_ERROR",
            Self::InvalidBucket => "INVALID_BUCKET",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::BatchClosed => "BATCH_CLOSED",
            Self::ConfigError => "CONFIG_ERROR",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
        }
    }

    /// Category-based exit code.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::NotInitialized | Self::AlreadyInitialized | Self::DatabaseError => 2,
            Self::InvalidBucket | Self::InvalidArgument | Self::BatchClosed => 4,
            Self::ConfigError => 7,
            Self::IoError | Self::JsonError => 8,
        }
    }

    /// Whether resubmitting (with corrected input, or the whole batch) can succeed.
    ///
    /// Storage failures are retryable as a whole batch; nothing is retried
    /// automatically.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::InvalidBucket | Self::InvalidArgument | Self::DatabaseError
        )
    }
}

// ── Error Enum ────────────────────────────────────────────────

/// Errors that can occur in aclstore operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Not initialized: run `aclstore init` first")]
    NotInitialized,

    #[error("Already initialized at {path}")]
    AlreadyInitialized { path: PathBuf },

    #[error("Unknown bucket: {name}")]
    InvalidBucket { name: String },

    #[error("Batch is not open (state: {state})")]
    BatchClosed { state: String },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(String),

    /// A committed batch stopped at `unit`; units before it stay written.
    #[error("Batch failed at unit {unit} of {units}: {source}")]
    BatchFailed {
        unit: usize,
        units: usize,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Map this error to its structured `ErrorCode`.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::NotInitialized => ErrorCode::NotInitialized,
            Self::AlreadyInitialized { .. } => ErrorCode::AlreadyInitialized,
            Self::InvalidBucket { .. } => ErrorCode::InvalidBucket,
            Self::BatchClosed { .. } => ErrorCode::BatchClosed,
            Self::Database(_) => ErrorCode::DatabaseError,
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Self::Config(_) => ErrorCode::ConfigError,
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) => ErrorCode::JsonError,
            Self::BatchFailed { source, .. } => source.error_code(),
        }
    }

    /// Category-based exit code, delegating to the `ErrorCode`.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.error_code().exit_code()
    }

    /// True for errors raised before any storage call was made.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self.error_code().exit_code(), 4)
    }

    /// Context-aware recovery hint.
    ///
    /// Returns `None` if no actionable suggestion exists.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::NotInitialized => {
                Some("Run `aclstore init` to create the database and its tables".to_string())
            }

            Self::AlreadyInitialized { path } => Some(format!(
                "Database already exists at {}. Use `--force` to reinitialize.",
                path.display()
            )),

            Self::InvalidBucket { .. } => Some(
                "Valid buckets: meta, parents, resources, roles, users, \
                 or any permission bucket name containing \"allows\""
                    .to_string(),
            ),

            Self::BatchClosed { .. } => {
                Some("Open a new batch with `begin()`; a batch commits once".to_string())
            }

            Self::Database(e) if e.to_string().contains("no such table") => Some(
                "A bucket table is missing. Run `aclstore init` or `aclstore migrate up --execute`."
                    .to_string(),
            ),

            Self::BatchFailed { unit, source, .. } => source.hint().or_else(|| {
                Some(format!(
                    "Units 0..{unit} were committed; resubmit from unit {unit} after fixing the cause"
                ))
            }),

            Self::Database(_)
            | Self::Io(_)
            | Self::Json(_)
            | Self::InvalidArgument(_)
            | Self::Config(_) => None,
        }
    }

    /// Structured JSON representation for machine consumption.
    #[must_use]
    pub fn to_structured_json(&self) -> serde_json::Value {
        let code = self.error_code();
        let mut obj = serde_json::json!({
            "error": {
                "code": code.as_str(),
                "message": self.to_string(),
                "retryable": code.is_retryable(),
                "exit_code": code.exit_code(),
            }
        });

        if let Some(hint) = self.hint() {
            obj["error"]["hint"] = serde_json::Value::String(hint);
        }

        if let Self::BatchFailed { unit, units, .. } = self {
            obj["error"]["failed_unit"] = serde_json::json!(unit);
            obj["error"]["executed"] = serde_json::json!(unit);
            obj["error"]["units"] = serde_json::json!(units);
        }

        obj
    }
}
