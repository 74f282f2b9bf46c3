//! Engine configuration.
//!
//! Replaces a freely-extensible configuration bag with a single record that
//! enumerates every recognized key; there is no "any extra key is silently
//! accepted" path; `clap` rejects unknown flags statically at the CLI
//! boundary, and every field here has an explicit default.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::Level;

/// The SQL dialect to target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Adapter {
    /// PostgreSQL via `sqlx`.
    Postgres,
    /// MySQL via `sqlx`.
    MySql,
    /// SQLite via `sqlx`.
    Sqlite,
}

impl std::str::FromStr for Adapter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "postgres" => Ok(Self::Postgres),
            "mysql" => Ok(Self::MySql),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(format!("unknown adapter '{other}', expected postgres, mysql, or sqlite")),
        }
    }
}

/// A single migration's measured wall time, emitted through
/// [`Options::metrics_sink`] if one is configured.
#[derive(Debug, Clone)]
pub struct MigrationMetric {
    /// The migration file's name.
    pub filename: String,
    /// How long the migration's transaction took to execute.
    pub wall_time: Duration,
}

/// How the engine should report its own activity. The CLI binary builds a
/// `tracing_subscriber` from this at startup; the engine itself never
/// installs a global subscriber, so embedding callers remain in control of
/// their own logging setup.
#[derive(Debug, Clone)]
pub struct LoggingOptions {
    /// The maximum level to emit.
    pub level: Level,
    /// Whether to include the module path in formatted output.
    pub with_target: bool,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            with_target: false,
        }
    }
}

/// Every knob the engine recognizes. Unknown keys have nowhere to go: this
/// is a closed record, not a map.
#[derive(Clone)]
pub struct Options {
    /// Which SQL dialect to generate and execute against.
    pub adapter: Adapter,
    /// Directory containing `.sigl` migration files.
    pub migrations_path: PathBuf,
    /// Path to the JSON ledger file.
    pub ledger_path: PathBuf,
    /// Maximum size, in bytes, of a single migration file.
    pub max_file_size: u64,
    /// Maximum aggregate size, in bytes, of all pending migration files in one run.
    pub max_total_size: u64,
    /// Whether file-size validation runs at all; disabling requires an explicit opt-out.
    pub enable_file_size_validation: bool,
    /// Total time budget for acquiring the ledger lock.
    pub lock_timeout: Duration,
    /// Delay between lock acquisition retries.
    pub lock_retry_delay: Duration,
    /// Logging configuration, passed explicitly rather than read from a global.
    pub logging: LoggingOptions,
    /// An optional callback invoked once per applied migration.
    pub metrics_sink: Option<Arc<dyn Fn(&MigrationMetric) + Send + Sync>>,
}

impl std::fmt::Debug for Options {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Options")
            .field("adapter", &self.adapter)
            .field("migrations_path", &self.migrations_path)
            .field("ledger_path", &self.ledger_path)
            .field("max_file_size", &self.max_file_size)
            .field("max_total_size", &self.max_total_size)
            .field("enable_file_size_validation", &self.enable_file_size_validation)
            .field("lock_timeout", &self.lock_timeout)
            .field("lock_retry_delay", &self.lock_retry_delay)
            .field("logging", &self.logging)
            .field("metrics_sink", &self.metrics_sink.is_some())
            .finish()
    }
}

impl Options {
    /// Starts from the documented defaults for the given adapter.
    #[must_use]
    pub fn new(adapter: Adapter) -> Self {
        Self {
            adapter,
            migrations_path: PathBuf::from("migrations"),
            ledger_path: PathBuf::from(".schemact_ledger.json"),
            max_file_size: 5 * 1024 * 1024,
            max_total_size: 50 * 1024 * 1024,
            enable_file_size_validation: true,
            lock_timeout: Duration::from_secs(30),
            lock_retry_delay: Duration::from_millis(100),
            logging: LoggingOptions::default(),
            metrics_sink: None,
        }
    }

    /// Overrides the migrations directory.
    #[must_use]
    pub fn migrations_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.migrations_path = path.into();
        self
    }

    /// Overrides the ledger file path.
    #[must_use]
    pub fn ledger_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.ledger_path = path.into();
        self
    }

    /// Opts out of file-size validation. Must be called explicitly; there
    /// is no ambient way to silently disable the caps.
    #[must_use]
    pub const fn without_file_size_validation(mut self) -> Self {
        self.enable_file_size_validation = false;
        self
    }

    /// Registers a metrics callback invoked once per applied migration.
    #[must_use]
    pub fn metrics_sink(mut self, sink: Arc<dyn Fn(&MigrationMetric) + Send + Sync>) -> Self {
        self.metrics_sink = Some(sink);
        self
    }

    /// The lock file's path, sibling to the ledger.
    #[must_use]
    pub fn lock_path(&self) -> PathBuf {
        let mut path = self.ledger_path.clone().into_os_string();
        path.push(".lock");
        PathBuf::from(path)
    }
}
