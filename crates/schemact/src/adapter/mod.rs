//! The engine's only view of the database: connect, probe reachability,
//! and run one migration's statements inside a single transaction.

pub mod mysql;
pub mod postgres;
pub mod sqlite;

pub use mysql::MySqlAdapter;
pub use postgres::PostgresAdapter;
pub use sqlite::SqliteAdapter;

use std::future::Future;
use std::time::Duration;

use schemact_core::generator::{MySqlGenerator, PostgresGenerator, SqliteGenerator, SqlGenerator};

use crate::config::Adapter;
use crate::error::Result;

const PING_ATTEMPTS: u32 = 3;
const PING_RETRY_DELAY: Duration = Duration::from_millis(200);

/// Runs `attempt` up to [`PING_ATTEMPTS`] times, pausing [`PING_RETRY_DELAY`]
/// between failures, and returns the final attempt's error if none succeed.
/// Shared by every adapter's `ping` so each one carries the same bounded
/// retry budget instead of failing on the first transient hiccup.
pub(crate) async fn ping_with_retries<F, Fut>(mut attempt: F) -> Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<()>>,
{
    let mut last_err = None;
    for remaining in (0..PING_ATTEMPTS).rev() {
        match attempt().await {
            Ok(()) => return Ok(()),
            Err(e) => {
                last_err = Some(e);
                if remaining > 0 {
                    tokio::time::sleep(PING_RETRY_DELAY).await;
                }
            }
        }
    }
    Err(last_err.expect("loop runs at least once"))
}

/// A connected database the engine can run migrations against.
pub trait DatabaseAdapter: Send + Sync {
    /// The dialect name, for diagnostics.
    fn dialect_name(&self) -> &'static str;

    /// A trivial connectivity probe with the adapter's own bounded retry budget.
    async fn ping(&self) -> Result<()>;

    /// Executes `statements` in order inside a single transaction: begin,
    /// run each statement, commit on success, roll back and propagate the
    /// error on any failure.
    async fn apply_transaction(&self, statements: &[String]) -> Result<()>;
}

/// Builds the generator matching a configured dialect.
#[must_use]
pub fn generator_for(adapter: Adapter) -> Box<dyn SqlGenerator> {
    match adapter {
        Adapter::Postgres => Box::new(PostgresGenerator),
        Adapter::MySql => Box::new(MySqlGenerator::default()),
        Adapter::Sqlite => Box::new(SqliteGenerator),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::ping_with_retries;
    use crate::error::EngineError;

    #[tokio::test]
    async fn succeeds_without_retrying_when_the_first_attempt_works() {
        let calls = AtomicU32::new(0);
        let result = ping_with_retries(|| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(()) }
        })
        .await;
        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_up_to_the_attempt_budget_then_surfaces_the_last_error() {
        let calls = AtomicU32::new(0);
        let result = ping_with_retries(|| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(EngineError::Adapter("unreachable".to_string())) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), super::PING_ATTEMPTS);
    }

    #[tokio::test]
    async fn recovers_if_a_later_attempt_succeeds() {
        let calls = AtomicU32::new(0);
        let result = ping_with_retries(|| {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 1 {
                    Err(EngineError::Adapter("not yet".to_string()))
                } else {
                    Ok(())
                }
            }
        })
        .await;
        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
