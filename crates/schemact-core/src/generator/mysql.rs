//! MySQL DDL generation.
//!
//! The teacher's generator pair (`postgres.rs`/`sqlite.rs`) has no MySQL
//! counterpart; this module generalizes their shared shape to the third
//! cell of the dialect table.

use super::common::{self, ParsedDecorators};
use super::SqlGenerator;
use crate::ast::{Column, Model, Schema};
use crate::error::{Result, SchemactError};
use crate::lexer::TypeName;
use crate::validate::{self, Dialect};

/// The storage engine, charset, and collation appended to every `CREATE
/// TABLE` statement. Defaults match spec.md's MySQL specifics.
#[derive(Debug, Clone)]
pub struct MySqlTableOptions {
    pub engine: String,
    pub charset: String,
    pub collation: String,
}

impl Default for MySqlTableOptions {
    fn default() -> Self {
        Self {
            engine: "InnoDB".to_string(),
            charset: "utf8mb4".to_string(),
            collation: "utf8mb4_unicode_ci".to_string(),
        }
    }
}

/// Generates MySQL DDL.
#[derive(Default)]
pub struct MySqlGenerator {
    pub options: MySqlTableOptions,
}

fn type_sql(column: &Column) -> Result<String> {
    let args = &column.type_args;
    Ok(match column.type_name {
        TypeName::Serial => "INT AUTO_INCREMENT".to_string(),
        TypeName::Int => "INT".to_string(),
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
            format!("DECIMAL({precision}, {scale})")
        }
        TypeName::Real => "FLOAT".to_string(),
        TypeName::DoublePrecision => "DOUBLE".to_string(),
        TypeName::Json => "JSON".to_string(),
        TypeName::Jsonb => "JSON".to_string(),
        TypeName::Uuid => "CHAR(36)".to_string(),
        TypeName::Enum => {
            if args.is_empty() {
                return Err(SchemactError::generator("Enum requires at least one variant"));
            }
            let variants = args
                .iter()
                .map(|v| validate::format_string_literal(v))
                .collect::<Vec<_>>()
                .join(", ");
            format!("ENUM({variants})")
        }
    })
}

fn column_clause(column: &Column, decorators: &ParsedDecorators) -> Result<String> {
    Ok(common::render_column_clause(
        &column.name,
        &type_sql(column)?,
        decorators,
        Dialect::MySql,
        false,
    ))
}

fn create_table(model: &Model, options: &MySqlTableOptions) -> Result<String> {
    validate::validate_identifier(&model.name, Dialect::MySql)?;

    let mut lines = Vec::new();
    let mut fk_lines = Vec::new();
    for column in &model.columns {
        validate::validate_identifier(&column.name, Dialect::MySql)?;
        let decorators = common::parse_decorators(column)?;
        lines.push(column_clause(column, &decorators)?);
        if let Some(fk) = &decorators.foreign_key {
            fk_lines.push(common::foreign_key_clause(&column.name, fk, Dialect::MySql));
        }
    }
    lines.extend(fk_lines);

    Ok(format!(
        "CREATE TABLE {} (\n  {}\n) ENGINE={} DEFAULT CHARSET={} COLLATE={};",
        validate::quote_identifier(&model.name, Dialect::MySql),
        lines.join(",\n  "),
        options.engine,
        options.charset,
        options.collation,
    ))
}

fn drop_table(model: &Model) -> String {
    format!(
        "DROP TABLE IF EXISTS {};",
        validate::quote_identifier(&model.name, Dialect::MySql)
    )
}

impl SqlGenerator for MySqlGenerator {
    fn dialect_name(&self) -> &'static str {
        "mysql"
    }

    fn generate_up(&self, schema: &Schema) -> Result<Vec<String>> {
        let mut statements = Vec::new();
        for model in &schema.models {
            statements.push(create_table(model, &self.options)?);
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
    fn serial_gets_auto_increment_before_primary_key() {
        let schema = Parser::parse("model User {\n  id Serial @pk\n}\n").unwrap();
        let up = MySqlGenerator::default().generate_up(&schema).unwrap();
        assert!(up[0].contains("`id` INT AUTO_INCREMENT PRIMARY KEY"));
        assert!(up[0].ends_with("ENGINE=InnoDB DEFAULT CHARSET=utf8mb4 COLLATE=utf8mb4_unicode_ci;"));
    }

    #[test]
    fn enum_renders_native_enum_type() {
        let schema = Parser::parse("model User {\n  status Enum(active, banned)\n}\n").unwrap();
        let up = MySqlGenerator::default().generate_up(&schema).unwrap();
        assert!(up[0].contains("ENUM('active', 'banned')"));
    }
}
