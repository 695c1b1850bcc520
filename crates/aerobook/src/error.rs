//! Error types for aerobook.
//!
//! Every fallible operation in the crate returns [`Error`]. Callers that need
//! to render a message (or decide whether an operator has to step in) can
//! classify an error with [`Error::kind`].

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// The main error type for aerobook operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Validation Errors ===
    /// The aircraft registration is not part of the configured fleet.
    #[error("unknown aircraft: {0}")]
    UnknownAircraft(String),

    /// The flight type is not one of the known types.
    #[error("unknown flight type: {0}")]
    UnknownFlightType(String),

    /// The booking interval is empty or inverted.
    #[error("invalid time range: end {end} is not after start {start}")]
    InvalidTimeRange {
        /// Requested start.
        start: DateTime<Utc>,
        /// Requested end.
        end: DateTime<Utc>,
    },

    /// A timestamp or date could not be parsed.
    #[error("malformed {field}: {value:?}")]
    MalformedTime {
        /// Which input was malformed.
        field: &'static str,
        /// The rejected input.
        value: String,
    },

    /// A field failed a shape rule.
    #[error("invalid {field}: {message}")]
    InvalidField {
        /// Name of the offending field.
        field: &'static str,
        /// Description of the rule that failed.
        message: String,
    },

    /// The booking would overlap an existing booking while overlaps are disallowed.
    #[error("booking overlaps existing booking {existing} on {aircraft}")]
    Conflict {
        /// Aircraft the conflict is on.
        aircraft: String,
        /// Id of the booking already holding the slot.
        existing: i64,
    },

    /// The actor is not allowed to perform the operation.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// The requested booking does not exist (or is not visible to the actor).
    #[error("booking not found: {0}")]
    NotFound(i64),

    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Configuration Errors ===
    /// The system guest account is missing from the user table.
    #[error("system guest account {email} not found; check database seed data")]
    GuestAccountMissing {
        /// Email the guest account is looked up by.
        email: String,
    },

    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },
}

/// A specialized Result type for aerobook operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The caller supplied bad input; nothing was written.
    Validation,
    /// The database failed; details are logged, not shown to users.
    Database,
    /// Deployment or seed data is wrong; an operator has to fix it.
    Configuration,
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a field validation error.
    #[must_use]
    pub fn invalid_field(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            message: message.into(),
        }
    }

    /// Create a malformed time error.
    #[must_use]
    pub fn malformed_time(field: &'static str, value: impl Into<String>) -> Self {
        Self::MalformedTime {
            field,
            value: value.into(),
        }
    }

    /// Create a permission error.
    #[must_use]
    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::PermissionDenied(message.into())
    }

    /// Classify this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownAircraft(_)
            | Self::UnknownFlightType(_)
            | Self::InvalidTimeRange { .. }
            | Self::MalformedTime { .. }
            | Self::InvalidField { .. }
            | Self::Conflict { .. }
            | Self::PermissionDenied(_)
            | Self::NotFound(_) => ErrorKind::Validation,
            Self::DatabaseOpen { .. }
            | Self::DatabaseQuery(_)
            | Self::DatabaseMigration { .. }
            | Self::DirectoryCreate { .. } => ErrorKind::Database,
            Self::GuestAccountMissing { .. }
            | Self::ConfigLoad(_)
            | Self::ConfigValidation { .. } => ErrorKind::Configuration,
        }
    }

    /// Check if this error was caused by caller input.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }

    /// Check if this error needs operator attention.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        self.kind() == ErrorKind::Configuration
    }

    /// Check if this error came from the database layer.
    #[must_use]
    pub fn is_database(&self) -> bool {
        self.kind() == ErrorKind::Database
    }
}
