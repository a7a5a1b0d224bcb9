//! Error types for wishsync.
//!
//! Provides structured error handling with:
//! - Machine-readable error codes (`ErrorCode`)
//! - Category-based exit codes (2=db, 3=not_found, 4=validation, 5=identity, 6=upstream, etc.)
//! - Retryability flags
//! - Context-aware recovery hints
//! - Structured JSON output for piped / non-TTY consumers

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for wishsync operations.
pub type Result<T> = std::result::Result<T, Error>;

// ── Error Code ────────────────────────────────────────────────

/// Machine-readable error codes grouped by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Database (exit 2)
    NotInitialized,
    AlreadyInitialized,
    DatabaseError,

    // Not Found (exit 3)
    UserNotFound,

    // Validation (exit 4)
    InvalidArgument,

    // Identity (exit 5)
    NotLinked,
    IdentityMismatch,
    InvalidCredentials,

    // Upstream (exit 6)
    UpstreamUnavailable,
    MalformedResponse,

    // Config (exit 7)
    ConfigError,

    // I/O (exit 8)
    IoError,
    JsonError,

    // Internal (exit 1)
    InternalError,
}

impl ErrorCode {
    /// Machine-readable SCREAMING_SNAKE code string.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        match self {
            Self::NotInitialized => "NOT_INITIALIZED",
            Self::AlreadyInitialized => "ALREADY_INITIALIZED",
            Self::DatabaseError => "DATABASE_ERROR",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::NotLinked => "NOT_LINKED",
            Self::IdentityMismatch => "IDENTITY_MISMATCH",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::UpstreamUnavailable => "UPSTREAM_UNAVAILABLE",
            Self::MalformedResponse => "MALFORMED_RESPONSE",
            Self::ConfigError => "CONFIG_ERROR",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Category-based exit code (1-8).
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::InternalError => 1,
            Self::NotInitialized | Self::AlreadyInitialized | Self::DatabaseError => 2,
            Self::UserNotFound => 3,
            Self::InvalidArgument => 4,
            Self::NotLinked | Self::IdentityMismatch | Self::InvalidCredentials => 5,
            Self::UpstreamUnavailable | Self::MalformedResponse => 6,
            Self::ConfigError => 7,
            Self::IoError | Self::JsonError => 8,
        }
    }

    /// Whether the caller may retry the same operation.
    ///
    /// Upstream failures are transient; retry policy belongs to the caller,
    /// so this only flags them. Identity errors need user action first, and
    /// a malformed provider record comes back the same on every attempt.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::UpstreamUnavailable | Self::InvalidArgument | Self::DatabaseError
        )
    }
}

// ── Error Enum ────────────────────────────────────────────────

/// Errors that can occur in wishsync operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Not initialized: run `wishsync init` first")]
    NotInitialized,

    #[error("Already initialized at {path}")]
    AlreadyInitialized { path: PathBuf },

    #[error("User not found: {id}")]
    UserNotFound { id: String },

    #[error("User {user_id} has no linked provider account")]
    NotLinked { user_id: i64 },

    #[error("Provider account mismatch: user is linked to {linked}, credentials belong to {remote}")]
    IdentityMismatch { linked: String, remote: String },

    #[error("Invalid provider credentials: {0}")]
    InvalidCredentials(String),

    #[error("Provider unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Malformed provider data: {0}")]
    MalformedResponse(String),

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

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Map this error to its structured `ErrorCode`.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::NotInitialized => ErrorCode::NotInitialized,
            Self::AlreadyInitialized { .. } => ErrorCode::AlreadyInitialized,
            Self::Database(_) => ErrorCode::DatabaseError,
            Self::UserNotFound { .. } => ErrorCode::UserNotFound,
            Self::NotLinked { .. } => ErrorCode::NotLinked,
            Self::IdentityMismatch { .. } => ErrorCode::IdentityMismatch,
            Self::InvalidCredentials(_) => ErrorCode::InvalidCredentials,
            Self::UpstreamUnavailable(_) => ErrorCode::UpstreamUnavailable,
            Self::MalformedResponse(_) => ErrorCode::MalformedResponse,
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Self::Config(_) => ErrorCode::ConfigError,
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) => ErrorCode::JsonError,
            Self::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Category-based exit code, delegating to the `ErrorCode`.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.error_code().exit_code()
    }

    /// Context-aware recovery hint.
    ///
    /// Returns `None` if no actionable suggestion exists.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::NotInitialized => {
                Some("Run `wishsync init` to initialize the database".to_string())
            }

            Self::AlreadyInitialized { .. } => {
                Some("Use `wishsync init --force` to recreate an empty database".to_string())
            }

            Self::UserNotFound { id } => Some(format!(
                "No user with ID '{id}'. Use `wishsync user list` to see known users."
            )),

            Self::NotLinked { user_id } => Some(format!(
                "Link a provider account first: wishsync user link {user_id} <provider-uid>"
            )),

            Self::IdentityMismatch { linked, .. } => Some(format!(
                "Generate an authkey while logged in as {linked}, or re-link the user."
            )),

            Self::InvalidCredentials(_) => Some(
                "The authkey is expired or malformed. Open the wish history in game \
                 and copy a fresh authkey."
                    .to_string(),
            ),

            Self::UpstreamUnavailable(_) => Some(
                "Check `wishsync provider status` and try again later.".to_string(),
            ),

            Self::MalformedResponse(_) => Some(
                "The provider returned a record wishsync cannot read. Retrying will not help; \
                 report the message above."
                    .to_string(),
            ),

            Self::InvalidArgument(msg) => {
                if msg.contains("banner") {
                    Some(
                        "Valid banners: novice (100), permanent (200), character (301), weapon (302)"
                            .to_string(),
                    )
                } else {
                    None
                }
            }

            Self::Database(_) | Self::Io(_) | Self::Json(_) | Self::Config(_) | Self::Other(_) => {
                None
            }
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

        obj
    }
}
