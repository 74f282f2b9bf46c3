//! SQLite adapter, backed by a `sqlx` connection pool.

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::Executor;

use super::DatabaseAdapter;
use crate::error::Result;

/// Executes migrations against a SQLite database.
pub struct SqliteAdapter {
    pool: SqlitePool,
}

impl SqliteAdapter {
    /// Connects to `database_url` (e.g. `sqlite:db.sqlite3` or `sqlite::memory:`).
    ///
    /// # Errors
    /// Returns [`crate::error::EngineError::Database`] if the connection fails.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }
}

impl DatabaseAdapter for SqliteAdapter {
    fn dialect_name(&self) -> &'static str {
        "sqlite"
    }

    async fn ping(&self) -> Result<()> {
        super::ping_with_retries(|| async {
            self.pool.execute("SELECT 1").await?;
            Ok(())
        })
        .await
    }

    async fn apply_transaction(&self, statements: &[String]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for statement in statements {
            tx.execute(statement.as_str()).await?;
        }
        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn applies_statements_in_one_transaction() {
        let adapter = SqliteAdapter::connect("sqlite::memory:").await.unwrap();
        adapter
            .apply_transaction(&["CREATE TABLE t (id INTEGER PRIMARY KEY)".to_string()])
            .await
            .unwrap();
        adapter.ping().await.unwrap();
    }

    #[tokio::test]
    async fn failing_statement_rolls_back_the_whole_transaction() {
        let adapter = SqliteAdapter::connect("sqlite::memory:").await.unwrap();
        let result = adapter
            .apply_transaction(&[
                "CREATE TABLE t (id INTEGER PRIMARY KEY)".to_string(),
                "this is not valid sql".to_string(),
            ])
            .await;
        assert!(result.is_err());
    }
}
