//! PostgreSQL DDL generation.

use super::common::{self, ParsedDecorators};
use super::SqlGenerator;
use crate::ast::{Column, Model, Schema};
use crate::error::{Result, SchemactError};
use crate::lexer::TypeName;
use crate::validate::{self, Dialect};

/// Generates PostgreSQL DDL.
pub struct PostgresGenerator;

fn type_sql(column: &Column) -> Result<String> {
    let args = &column.type_args;
    Ok(match column.type_name {
        TypeName::Serial => "SERIAL".to_string(),
        TypeName::Int => "INTEGER".to_string(),
        TypeName::BigInt => "BIGINT".to_string(),
        TypeName::SmallInt => "SMALLINT".to_string(),
        TypeName::VarChar => format!("VARCHAR({})", args.first().map_or("255", String::as_str)),
        TypeName::Char => format!("CHAR({})", args.first().map_or("1", String::as_str)),
        TypeName::Text => "TEXT".to_string(),
        TypeName::Boolean => "BOOLEAN".to_string(),
        TypeName::Timestamp => "TIMESTAMP".to_string(),
        TypeName::Date => "DATE".to_string(),
        TypeName::Time => "TIME".to_string(),
        TypeName::Decimal | TypeName::Numeric => {
            let precision = args.first().map_or("10", String::as_str);
            let scale = args.get(1).map_or("2", String::as_str);
            format!("NUMERIC({precision}, {scale})")
        }
        TypeName::Real => "REAL".to_string(),
        TypeName::DoublePrecision => "DOUBLE PRECISION".to_string(),
        TypeName::Json => "JSON".to_string(),
        TypeName::Jsonb => "JSONB".to_string(),
        TypeName::Uuid => "UUID".to_string(),
        TypeName::Enum => {
            if args.is_empty() {
                return Err(SchemactError::generator("Enum requires at least one variant"));
            }
            format!("VARCHAR(50) {}", enum_check_clause(&column.name, args))
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
        validate::quote_identifier(column_name, Dialect::Postgres)
    )
}

fn column_clause(column: &Column, decorators: &ParsedDecorators) -> Result<String> {
    Ok(common::render_column_clause(
        &column.name,
        &type_sql(column)?,
        decorators,
        Dialect::Postgres,
        false,
    ))
}

fn create_table(model: &Model) -> Result<String> {
    validate::validate_identifier(&model.name, Dialect::Postgres)?;

    let mut lines = Vec::new();
    let mut fk_lines = Vec::new();
    for column in &model.columns {
        validate::validate_identifier(&column.name, Dialect::Postgres)?;
        let decorators = common::parse_decorators(column)?;
        lines.push(column_clause(column, &decorators)?);
        if let Some(fk) = &decorators.foreign_key {
            fk_lines.push(common::foreign_key_clause(&column.name, fk, Dialect::Postgres));
        }
    }
    lines.extend(fk_lines);

    Ok(format!(
        "CREATE TABLE {} (\n  {}\n);",
        validate::quote_identifier(&model.name, Dialect::Postgres),
        lines.join(",\n  ")
    ))
}

fn drop_table(model: &Model) -> String {
    format!(
        "DROP TABLE IF EXISTS {} CASCADE;",
        validate::quote_identifier(&model.name, Dialect::Postgres)
    )
}

impl SqlGenerator for PostgresGenerator {
    fn dialect_name(&self) -> &'static str {
        "postgres"
    }

    fn generate_up(&self, schema: &Schema) -> Result<Vec<String>> {
        let mut statements = Vec::new();
        for model in &schema.models {
            statements.push(create_table(model)?);
        }
        for raw in &schema.raw_sql {
            statements.push(format!("{};", raw.sql));
        }
        Ok(statements)
    }

    fn generate_down(&self, schema: &Schema) -> Result<Vec<String>> {
        Ok(schema.models.iter().rev().map(drop_table).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;

    #[test]
    fn enum_renders_check_constraint() {
        let schema = Parser::parse("model User {\n  id Serial @pk\n  status Enum(active, banned)\n}\n").unwrap();
        let up = PostgresGenerator.generate_up(&schema).unwrap();
        assert!(up[0].contains("VARCHAR(50)"));
        assert!(up[0].contains("CHECK (\"status\" IN ('active', 'banned'))"));
    }

    #[test]
    fn enum_check_precedes_default() {
        let schema = Parser::parse("model U {\n  role Enum(admin, user) @default(user)\n}\n").unwrap();
        let up = PostgresGenerator.generate_up(&schema).unwrap();
        assert!(up[0].contains("VARCHAR(50) CHECK (\"role\" IN ('admin', 'user')) DEFAULT 'user'"));
    }

    #[test]
    fn varchar_defaults_to_255() {
        let schema = Parser::parse("model User {\n  name VarChar\n}\n").unwrap();
        let up = PostgresGenerator.generate_up(&schema).unwrap();
        assert!(up[0].contains("VARCHAR(255)"));
    }
}
