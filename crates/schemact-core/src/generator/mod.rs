//! Dialect-aware DDL generation.
//!
//! All three generators implement [`SqlGenerator`] and share decorator
//! validation and foreign-key rendering through [`common`]; only column
//! type mapping and the handful of dialect quirks called out in the type
//! table differ between them.

mod common;
pub mod mysql;
pub mod postgres;
pub mod sqlite;

pub use mysql::MySqlGenerator;
pub use postgres::PostgresGenerator;
pub use sqlite::SqliteGenerator;

use crate::ast::Schema;
use crate::error::Result;

/// A single statement-at-a-time DDL generator for one SQL dialect.
pub trait SqlGenerator {
    /// The dialect's name, for diagnostics (`"postgres"`, `"mysql"`, `"sqlite"`).
    fn dialect_name(&self) -> &'static str;

    /// Statements to apply the schema, in source order, raw SQL last.
    fn generate_up(&self, schema: &Schema) -> Result<Vec<String>>;

    /// Statements to reverse the schema, in the reverse of model source
    /// order. Never re-emits raw SQL; the DSL offers no inverse for it.
    fn generate_down(&self, schema: &Schema) -> Result<Vec<String>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;

    fn schema(source: &str) -> Schema {
        Parser::parse(source).unwrap()
    }

    #[test]
    fn minimal_up_down_postgres() {
        let schema = schema("model User {\n  id Serial @pk\n}\n");
        let gen = PostgresGenerator;
        let up = gen.generate_up(&schema).unwrap();
        assert_eq!(
            up,
            vec!["CREATE TABLE \"User\" (\n  \"id\" SERIAL PRIMARY KEY\n);".to_string()]
        );
        let down = gen.generate_down(&schema).unwrap();
        assert_eq!(down, vec!["DROP TABLE IF EXISTS \"User\" CASCADE;".to_string()]);
    }

    #[test]
    fn foreign_key_with_cascade() {
        let schema = schema(
            "model User {\n  id Serial @pk\n}\nmodel Post {\n  id Serial @pk\n  authorId Int @ref(User.id) @onDelete(CASCADE)\n}\n",
        );
        let up = PostgresGenerator.generate_up(&schema).unwrap();
        let post_stmt = &up[1];
        assert!(post_stmt
            .contains("FOREIGN KEY (\"authorId\") REFERENCES \"User\"(\"id\") ON DELETE CASCADE"));
    }

    #[test]
    fn down_reverses_model_order_and_skips_raw_sql() {
        let schema = schema(
            "> create extension if not exists pgcrypto\nmodel A {\n  id Serial @pk\n}\nmodel B {\n  id Serial @pk\n}\n",
        );
        let down = PostgresGenerator.generate_down(&schema).unwrap();
        assert_eq!(
            down,
            vec![
                "DROP TABLE IF EXISTS \"B\" CASCADE;".to_string(),
                "DROP TABLE IF EXISTS \"A\" CASCADE;".to_string(),
            ]
        );
    }
}
