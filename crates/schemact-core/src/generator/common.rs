//! Decorator validation and foreign-key rendering shared by all dialects.

use crate::ast::{Column, DecoratorArg};
use crate::error::{Result, SchemactError};
use crate::validate::{self, Dialect};

const ALLOWED_ON_DELETE_ACTIONS: [&str; 5] =
    ["CASCADE", "SET NULL", "SET DEFAULT", "RESTRICT", "NO ACTION"];

/// The decorators recognized on a single column, validated and pulled apart
/// into their meaning rather than their surface syntax.
pub struct ParsedDecorators {
    pub pk: bool,
    pub unique: bool,
    pub notnull: bool,
    pub default: Option<String>,
    pub foreign_key: Option<ForeignKey>,
}

/// A validated `@ref(...)` with its optional `@onDelete(...)`.
pub struct ForeignKey {
    pub table: String,
    pub column: String,
    pub on_delete: Option<String>,
}

fn arg_as_text(name: &str, arg: &DecoratorArg) -> Result<String> {
    match arg {
        DecoratorArg::String(s) | DecoratorArg::Ident(s) => Ok(s.clone()),
        DecoratorArg::Number(n) => Ok(n.clone()),
        DecoratorArg::DottedPair(_, _) => Err(SchemactError::generator(format!(
            "@{name} does not accept a dotted argument"
        ))),
    }
}

/// Validates and extracts the closed set of decorators on `column`.
///
/// # Errors
/// Returns a [`SchemactError::Generator`] for any decorator name outside the
/// closed set, any argument-count mismatch, or an `@onDelete` action outside
/// the allowed set.
pub fn parse_decorators(column: &Column) -> Result<ParsedDecorators> {
    let mut pk = false;
    let mut unique = false;
    let mut notnull = false;
    let mut default = None;
    let mut ref_pair = None;
    let mut on_delete = None;

    for decorator in &column.decorators {
        match decorator.name.as_str() {
            "pk" => {
                if !decorator.args.is_empty() {
                    return Err(SchemactError::generator("@pk does not take arguments"));
                }
                pk = true;
            }
            "unique" => {
                if !decorator.args.is_empty() {
                    return Err(SchemactError::generator("@unique does not take arguments"));
                }
                unique = true;
            }
            "notnull" => {
                if !decorator.args.is_empty() {
                    return Err(SchemactError::generator("@notnull does not take arguments"));
                }
                notnull = true;
            }
            "default" => {
                let [arg] = decorator.args.as_slice() else {
                    return Err(SchemactError::generator("@default requires exactly one argument"));
                };
                default = Some(arg_as_text("default", arg)?);
            }
            "ref" => {
                let [DecoratorArg::DottedPair(table, col)] = decorator.args.as_slice() else {
                    return Err(SchemactError::generator(
                        "@ref requires exactly one dotted Table.column argument",
                    ));
                };
                ref_pair = Some((table.clone(), col.clone()));
            }
            "onDelete" => {
                let [arg] = decorator.args.as_slice() else {
                    return Err(SchemactError::generator("@onDelete requires exactly one argument"));
                };
                let action = arg_as_text("onDelete", arg)?.to_ascii_uppercase();
                if !ALLOWED_ON_DELETE_ACTIONS.contains(&action.as_str()) {
                    return Err(SchemactError::generator(format!(
                        "invalid ON DELETE action '{action}'"
                    )));
                }
                on_delete = Some(action);
            }
            other => {
                return Err(SchemactError::generator(format!("unknown decorator '{other}'")));
            }
        }
    }

    if on_delete.is_some() && ref_pair.is_none() {
        return Err(SchemactError::generator("@onDelete without @ref"));
    }

    let foreign_key = ref_pair.map(|(table, column)| ForeignKey {
        table,
        column,
        on_delete,
    });

    Ok(ParsedDecorators {
        pk,
        unique,
        notnull,
        default,
        foreign_key,
    })
}

/// Renders one column's full clause: quoted name, type, and decorator
/// suffixes in `PRIMARY KEY UNIQUE NOT NULL DEFAULT` order.
///
/// `pk_embedded` suppresses the trailing ` PRIMARY KEY` when the dialect's
/// type mapping already folds primary-key-ness into `type_sql` (SQLite's
/// `INTEGER PRIMARY KEY AUTOINCREMENT`).
#[must_use]
pub fn render_column_clause(
    name: &str,
    type_sql: &str,
    decorators: &ParsedDecorators,
    dialect: Dialect,
    pk_embedded: bool,
) -> String {
    let mut clause = format!("{} {type_sql}", validate::quote_identifier(name, dialect));
    if decorators.pk && !pk_embedded {
        clause.push_str(" PRIMARY KEY");
    }
    if decorators.unique {
        clause.push_str(" UNIQUE");
    }
    if decorators.notnull {
        clause.push_str(" NOT NULL");
    }
    if let Some(default) = &decorators.default {
        clause.push_str(&format!(" DEFAULT {}", validate::format_default_value(default, dialect)));
    }
    clause
}

/// Renders a table-level `FOREIGN KEY` constraint line, without a trailing comma.
#[must_use]
pub fn foreign_key_clause(column_name: &str, fk: &ForeignKey, dialect: Dialect) -> String {
    let column = validate::quote_identifier(column_name, dialect);
    let table = validate::quote_identifier(&fk.table, dialect);
    let ref_column = validate::quote_identifier(&fk.column, dialect);
    let mut clause = format!("FOREIGN KEY ({column}) REFERENCES {table}({ref_column})");
    if let Some(action) = &fk.on_delete {
        clause.push_str(&format!(" ON DELETE {action}"));
    }
    clause
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;

    #[test]
    fn on_delete_without_ref_is_a_generator_error() {
        let schema = Parser::parse("model Post {\n  author_id Int @onDelete(cascade)\n}\n").unwrap();
        let err = parse_decorators(&schema.models[0].columns[0]).unwrap_err();
        assert!(matches!(err, SchemactError::Generator(_)));
    }
}
