//! SQLite DDL generation.

use super::common::{self, ParsedDecorators};
use super::SqlGenerator;
use crate::ast::{Column, Model, Schema};
use crate::error::{Result, SchemactError};
use crate::lexer::TypeName;
use crate::validate::{self, Dialect};

/// Generates SQLite DDL.
pub struct SqliteGenerator;

/// SQLite's plain (non-primary-key) type mapping.
fn plain_type_sql(column: &Column) -> Result<String> {
    Ok(match column.type_name {
        TypeName::Serial | TypeName::Int | TypeName::BigInt | TypeName::SmallInt => {
            "INTEGER".to_string()
        }
        TypeName::VarChar | TypeName::Char | TypeName::Text => "TEXT".to_string(),
        TypeName::Boolean => "INTEGER".to_string(),
        TypeName::Timestamp | TypeName::Date | TypeName::Time => "TEXT".to_string(),
        TypeName::Decimal | TypeName::Numeric | TypeName::Real | TypeName::DoublePrecision => {
            "REAL".to_string()
        }
        TypeName::Json | TypeName::Jsonb | TypeName::Uuid => "TEXT".to_string(),
        TypeName::Enum => {
            if column.type_args.is_empty() {
                return Err(SchemactError::generator("Enum requires at least one variant"));
            }
            format!("TEXT {}", enum_check_clause(&column.name, &column.type_args))
        }
    })
}

fn enum_check_clause(column_name: &str, args: &[String]) -> String {
    let variants = args
        .iter()
        .map(|v| validate::format_string_literal(v))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "CHECK ({} IN ({variants}))",
        validate::quote_identifier(column_name, Dialect::Sqlite)
    )
}

fn column_clause(column: &Column, decorators: &ParsedDecorators) -> Result<String> {
    // Serial, and any integer-typed @pk, collapses into SQLite's rowid alias.
    // Any other @pk (e.g. a Uuid primary key) gets a plain PRIMARY KEY with
    // no AUTOINCREMENT, since SQLite only assigns rowids to INTEGER columns.
    let is_integer_type = matches!(
        column.type_name,
        TypeName::Serial | TypeName::Int | TypeName::BigInt | TypeName::SmallInt
    );

    let (type_sql, pk_embedded) = if column.type_name == TypeName::Serial {
        ("INTEGER PRIMARY KEY AUTOINCREMENT".to_string(), true)
    } else if decorators.pk && is_integer_type {
        ("INTEGER PRIMARY KEY AUTOINCREMENT".to_string(), true)
    } else {
        (plain_type_sql(column)?, false)
    };

    Ok(common::render_column_clause(
        &column.name,
        &type_sql,
        decorators,
        Dialect::Sqlite,
        pk_embedded,
    ))
}

fn create_table(model: &Model) -> Result<String> {
    validate::validate_identifier(&model.name, Dialect::Sqlite)?;

    let mut lines = Vec::new();
    let mut fk_lines = Vec::new();
    for column in &model.columns {
        validate::validate_identifier(&column.name, Dialect::Sqlite)?;
        let decorators = common::parse_decorators(column)?;
        lines.push(column_clause(column, &decorators)?);
        if let Some(fk) = &decorators.foreign_key {
            fk_lines.push(common::foreign_key_clause(&column.name, fk, Dialect::Sqlite));
        }
    }
    lines.extend(fk_lines);

    Ok(format!(
        "CREATE TABLE {} (\n  {}\n);",
        validate::quote_identifier(&model.name, Dialect::Sqlite),
        lines.join(",\n  ")
    ))
}

fn drop_table(model: &Model) -> String {
    format!(
        "DROP TABLE IF EXISTS {};",
        validate::quote_identifier(&model.name, Dialect::Sqlite)
    )
}

impl SqlGenerator for SqliteGenerator {
    fn dialect_name(&self) -> &'static str {
        "sqlite"
    }

    fn generate_up(&self, schema: &Schema) -> Result<Vec<String>> {
        let mut statements = vec!["PRAGMA foreign_keys = ON;".to_string()];
        for model in &schema.models {
            statements.push(create_table(model)?);
        }
        for raw in &schema.raw_sql {
            statements.push(format!("{};", raw.sql));
        }
        Ok(statements)
    }

    fn generate_down(&self, schema: &Schema) -> Result<Vec<String>> {
        let mut statements = vec!["PRAGMA foreign_keys = ON;".to_string()];
        statements.extend(schema.models.iter().rev().map(drop_table));
        Ok(statements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;

    #[test]
    fn serial_pk_becomes_rowid_alias() {
        let schema = Parser::parse("model User {\n  id Serial @pk\n}\n").unwrap();
        let up = SqliteGenerator.generate_up(&schema).unwrap();
        assert_eq!(up[0], "PRAGMA foreign_keys = ON;");
        assert!(up[1].contains("\"id\" INTEGER PRIMARY KEY AUTOINCREMENT"));
        assert!(!up[1].contains("PRIMARY KEY AUTOINCREMENT PRIMARY KEY"));
    }

    #[test]
    fn non_integer_pk_has_no_autoincrement() {
        let schema = Parser::parse("model User {\n  id Uuid @pk\n}\n").unwrap();
        let up = SqliteGenerator.generate_up(&schema).unwrap();
        assert!(up[1].contains("\"id\" TEXT PRIMARY KEY"));
        assert!(!up[1].contains("AUTOINCREMENT"));
    }

    #[test]
    fn enum_check_precedes_default() {
        let schema = Parser::parse("model U {\n  role Enum(admin, user) @default(user)\n}\n").unwrap();
        let up = SqliteGenerator.generate_up(&schema).unwrap();
        assert!(up[1].contains("TEXT CHECK (\"role\" IN ('admin', 'user')) DEFAULT 'user'"));
    }

    #[test]
    fn down_prepends_pragma() {
        let schema = Parser::parse("model User {\n  id Serial @pk\n}\n").unwrap();
        let down = SqliteGenerator.generate_down(&schema).unwrap();
        assert_eq!(down[0], "PRAGMA foreign_keys = ON;");
        assert_eq!(down[1], "DROP TABLE IF EXISTS \"User\";");
    }
}
