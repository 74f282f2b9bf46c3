//! Migration engine, ledger, and database adapters for the `schemact`
//! schema migration DSL.
//!
//! The DSL itself — lexer, parser, AST, and the per-dialect SQL generators —
//! lives in `schemact-core`, which this crate depends on and re-exports
//! nothing from, to keep the pure/sync parsing half cleanly separated from
//! the async execution half.
//!
//! # Architecture
//!
//! - [`config`] — the closed [`config::Options`] record every run is configured through.
//! - [`ledger`] — the durable JSON record of applied migrations, file-locked against concurrent runs.
//! - [`adapter`] — one `sqlx` pool per dialect behind a single [`adapter::DatabaseAdapter`] trait.
//! - [`engine`] — discovery, path validation, and the `up`/`down`/`status` pipelines that tie the rest together.
//! - [`error`] — [`error::EngineError`], the single error type every public function returns.
//!
//! # Example
//!
//! ```rust,no_run
//! # async fn run() -> schemact::error::Result<()> {
//! use schemact::adapter::SqliteAdapter;
//! use schemact::config::{Adapter, Options};
//! use schemact::engine::MigrationEngine;
//!
//! let options = Options::new(Adapter::Sqlite).migrations_path("migrations");
//! let adapter = SqliteAdapter::connect("sqlite:app.db").await?;
//! let engine = MigrationEngine::new(options, adapter);
//! let report = engine.up().await?;
//! println!("applied {} migrations", report.applied.len());
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod config;
pub mod engine;
pub mod error;
pub mod ledger;

pub use config::{Adapter, Options};
pub use engine::{DownReport, MigrationEngine, Status, UpReport};
pub use error::{EngineError, Result};
