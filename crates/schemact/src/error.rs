//! Error types for the migration engine, ledger, and adapters.

use std::path::PathBuf;

/// Errors that can occur while discovering, applying, or rolling back migrations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// DSL source failed to lex, parse, or validate.
    #[error("{0}")]
    Schema(#[from] schemact_core::SchemactError),

    /// An applied migration's file is missing or its hash no longer matches.
    #[error("integrity violation: {0}")]
    Integrity(String),

    /// A migration name, identifier, or path was rejected.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A database connection or transaction failed.
    #[error("adapter error: {0}")]
    Adapter(String),

    /// A `sqlx` database error, surfaced as an adapter failure.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Every migration in a batch committed but the ledger failed to
    /// record it. Highest severity: the database and the ledger have
    /// diverged and require manual reconciliation.
    #[error(
        "CRITICAL: {count} migration(s) committed to the database but the ledger update failed ({cause}). \
         The database and the ledger have diverged; reconcile manually before running further migrations."
    )]
    CriticalInconsistency {
        /// How many migrations committed before the ledger write failed.
        count: usize,
        /// The underlying persistence failure.
        cause: String,
    },

    /// Ledger lock could not be acquired before the configured deadline.
    #[error("could not acquire the ledger lock within the configured timeout (held by {holder})")]
    LockContention {
        /// A description of the current lock holder, for operator diagnosis.
        holder: String,
    },

    /// IO error reading a migration file, the ledger, or the lock.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to serialize the ledger or a lock file to JSON.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The ledger file exists but could not be parsed as JSON.
    #[error("ledger file is corrupted: {0}")]
    LedgerCorrupted(String),

    /// A referenced migration file does not exist on disk.
    #[error("migration file not found: {}", .0.display())]
    MigrationFileNotFound(PathBuf),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
