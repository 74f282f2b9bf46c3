//! The migration runner: discovers files, validates them against the
//! ledger, and applies or reverses them one database transaction at a time.
//!
//! Generalizes the teacher's `MigrationExecutor<D: MigrationDialect>` to be
//! generic over the database adapter instead of the dialect: dialect
//! selection happens once, at generator-construction time, while the
//! adapter is a separate, swappable execution concern.

pub mod discovery;
pub mod path_validate;

use std::time::Instant;

use tracing::{debug, info, warn};

use schemact_core::parser::Parser;

use crate::adapter::{generator_for, DatabaseAdapter};
use crate::config::{MigrationMetric, Options};
use crate::error::{EngineError, Result};
use crate::ledger::{Ledger, LedgerEntry};

/// The outcome of an `up()` run.
#[derive(Debug, Clone)]
pub struct UpReport {
    /// Filenames applied, in application order. Empty if nothing was pending.
    pub applied: Vec<String>,
    /// The batch number they were recorded under, if any were applied.
    pub batch: Option<u32>,
}

/// The outcome of a `down()` run.
#[derive(Debug, Clone)]
pub struct DownReport {
    /// Filenames rolled back, in rollback order. Empty if there was no batch to undo.
    pub rolled_back: Vec<String>,
    /// The batch number that was rolled back, if any.
    pub batch: Option<u32>,
}

/// A snapshot of the ledger's state, read without mutating anything.
#[derive(Debug, Clone)]
pub struct Status {
    /// Every applied entry, in append order.
    pub applied: Vec<LedgerEntry>,
    /// Filenames on disk with no ledger entry yet, in discovery order.
    pub pending: Vec<String>,
    /// The most recent batch number.
    pub current_batch: u32,
}

/// Orchestrates `up()`, `down()`, and `status()` against one configured
/// adapter.
pub struct MigrationEngine<A: DatabaseAdapter> {
    options: Options,
    adapter: A,
}

impl<A: DatabaseAdapter> MigrationEngine<A> {
    /// Builds an engine over an already-connected adapter.
    pub const fn new(options: Options, adapter: A) -> Self {
        Self { options, adapter }
    }

    fn load_ledger(&self) -> Result<Ledger> {
        Ledger::load(
            &self.options.ledger_path,
            self.options.lock_path(),
            self.options.lock_timeout,
            self.options.lock_retry_delay,
        )
    }

    /// Returns the current ledger state without taking the lock or applying anything.
    ///
    /// # Errors
    /// Returns [`EngineError::LedgerCorrupted`] or an IO error if the ledger
    /// can't be read.
    pub fn status(&self) -> Result<Status> {
        let ledger = self.load_ledger()?;
        let discovered = discovery::discover_filenames(&self.options.migrations_path)?;
        let pending = ledger.pending(&discovered);
        Ok(Status {
            applied: ledger.applied_entries().to_vec(),
            pending,
            current_batch: ledger.current_batch(),
        })
    }

    /// Applies every pending migration as a single batch.
    ///
    /// # Errors
    /// Returns [`EngineError::Integrity`] if an applied file is missing or
    /// modified, [`EngineError::Validation`] if size caps are exceeded,
    /// [`EngineError::CriticalInconsistency`] if the migrations committed
    /// but the ledger failed to record them, or any parse/generator/adapter
    /// error encountered along the way.
    pub async fn up(&self) -> Result<UpReport> {
        let mut ledger = self.load_ledger()?;

        let discovered = discovery::discover_filenames(&self.options.migrations_path)?;
        let files = discovery::read_files(&self.options.migrations_path, &discovered, &self.options)?;
        ledger.validate_integrity(&files)?;

        let pending = ledger.pending(&discovered);
        if pending.is_empty() {
            info!("no pending migrations");
            return Ok(UpReport {
                applied: Vec::new(),
                batch: None,
            });
        }

        ledger.check_writable()?;
        self.adapter.ping().await?;

        let generator = generator_for(self.options.adapter);
        let mut committed = Vec::with_capacity(pending.len());

        for filename in &pending {
            let bytes = files.get(filename).expect("discovered file must be in the map");
            let source = String::from_utf8_lossy(bytes);

            let outcome: Result<std::time::Duration> = async {
                let schema = Parser::parse(&source)?;
                let statements = generator.generate_up(&schema)?;
                let start = Instant::now();
                self.adapter.apply_transaction(&statements).await?;
                Ok(start.elapsed())
            }
            .await;

            let wall_time = match outcome {
                Ok(wall_time) => wall_time,
                Err(e) if committed.is_empty() => return Err(e),
                Err(e) => {
                    // Earlier migrations in this run already committed to the
                    // database; this one failing leaves them applied but
                    // unrecorded, the same hazard as a `record_batch` failure.
                    warn!(filename = %filename, error = %e, "migration failed after earlier migrations in this run already committed");
                    return Err(EngineError::CriticalInconsistency {
                        count: committed.len(),
                        cause: e.to_string(),
                    });
                }
            };

            info!(filename = %filename, ?wall_time, "applied migration");
            if let Some(sink) = &self.options.metrics_sink {
                sink(&MigrationMetric {
                    filename: filename.clone(),
                    wall_time,
                });
            }

            committed.push((filename.clone(), bytes.clone()));
        }

        let applied_filenames: Vec<String> = committed.iter().map(|(name, _)| name.clone()).collect();
        let count = committed.len();

        match ledger.record_batch(committed) {
            Ok(()) => Ok(UpReport {
                applied: applied_filenames,
                batch: Some(ledger.current_batch()),
            }),
            Err(cause) => {
                warn!(%cause, "database transactions committed but the ledger write failed");
                Err(EngineError::CriticalInconsistency {
                    count,
                    cause: cause.to_string(),
                })
            }
        }
    }

    /// Rolls back the most recently applied batch.
    ///
    /// # Errors
    /// Returns [`EngineError::MigrationFileNotFound`] if a file the
    /// rollback needs no longer exists, or any parse/generator/adapter
    /// error.
    pub async fn down(&self) -> Result<DownReport> {
        let mut ledger = self.load_ledger()?;

        if ledger.current_batch() == 0 {
            return Ok(DownReport {
                rolled_back: Vec::new(),
                batch: None,
            });
        }

        ledger.check_writable()?;
        self.adapter.ping().await?;

        let batch = ledger.current_batch();
        let entries: Vec<LedgerEntry> = ledger.last_batch_entries().into_iter().cloned().collect();
        let generator = generator_for(self.options.adapter);
        let mut rolled_back = Vec::with_capacity(entries.len());

        for entry in &entries {
            let path = self.options.migrations_path.join(&entry.filename);
            let bytes = std::fs::read(&path).map_err(|_| EngineError::MigrationFileNotFound(path.clone()))?;
            let source = String::from_utf8_lossy(&bytes);

            let schema = Parser::parse(&source)?;
            let statements = generator.generate_down(&schema)?;

            debug!(filename = %entry.filename, "rolling back migration");
            self.adapter.apply_transaction(&statements).await?;
            rolled_back.push(entry.filename.clone());
        }

        ledger.rollback_last_batch()?;
        info!(batch, count = rolled_back.len(), "rolled back batch");

        Ok(DownReport {
            rolled_back,
            batch: Some(batch),
        })
    }
}
