//! Identifier and literal validation shared by all three generators.
//!
//! Rejection is loud: an invalid identifier or literal always produces a
//! [`SchemactError`], never a silently-mangled one.

use crate::error::{Result, SchemactError};

/// The dialects a [`crate::generator::SqlGenerator`] can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// PostgreSQL: 63-byte identifier cap, double-quoted identifiers.
    Postgres,
    /// MySQL: 64-byte identifier cap, backtick-quoted identifiers.
    MySql,
    /// SQLite: 256-byte identifier cap, double-quoted identifiers.
    Sqlite,
}

impl Dialect {
    /// The maximum identifier length this dialect accepts.
    #[must_use]
    pub const fn identifier_length_cap(self) -> usize {
        match self {
            Self::Postgres => 63,
            Self::MySql => 64,
            Self::Sqlite => 256,
        }
    }

    /// The pair of characters used to quote identifiers in this dialect.
    #[must_use]
    pub const fn quote_chars(self) -> (char, char) {
        match self {
            Self::Postgres | Self::Sqlite => ('"', '"'),
            Self::MySql => ('`', '`'),
        }
    }
}

const FORBIDDEN_CHARS: [char; 7] = [';', '\'', '"', '\\', '/', '*', '#'];

/// Rejects an identifier that contains dangerous characters, doesn't start
/// with a letter or underscore, doesn't match `[A-Za-z_][A-Za-z0-9_]*`, or
/// exceeds the dialect's length cap.
pub fn validate_identifier(name: &str, dialect: Dialect) -> Result<()> {
    if name.is_empty() {
        return Err(SchemactError::validation("identifier must not be empty"));
    }
    if let Some(bad) = name.chars().find(|c| FORBIDDEN_CHARS.contains(c)) {
        return Err(SchemactError::validation(format!(
            "identifier '{name}' contains forbidden character '{bad}'"
        )));
    }
    let first = name.chars().next().expect("checked non-empty");
    if !(first.is_ascii_alphabetic() || first == '_') {
        return Err(SchemactError::validation(format!(
            "identifier '{name}' must begin with a letter or underscore"
        )));
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(SchemactError::validation(format!(
            "identifier '{name}' must match [A-Za-z_][A-Za-z0-9_]*"
        )));
    }
    let cap = dialect.identifier_length_cap();
    if name.len() > cap {
        return Err(SchemactError::validation(format!(
            "identifier '{name}' exceeds the {cap}-byte cap for this dialect"
        )));
    }
    Ok(())
}

/// Wraps an already-validated identifier in the dialect's quote characters.
#[must_use]
pub fn quote_identifier(name: &str, dialect: Dialect) -> String {
    let (open, close) = dialect.quote_chars();
    format!("{open}{name}{close}")
}

/// Escapes a string literal by doubling embedded single quotes and wrapping
/// it in single quotes. Identical across all three dialects.
#[must_use]
pub fn format_string_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Whether a lexeme is a purely numeric literal (integer or decimal).
fn is_numeric_lexeme(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|c| c.is_ascii_digit() || c == '.')
}

/// Formats a `@default(v)` argument per the shared decorator rules:
/// `now` (case-insensitive) becomes `CURRENT_TIMESTAMP`, `true`/`false`
/// become the dialect's native boolean spelling, a purely numeric lexeme is
/// emitted verbatim, and anything else is treated as a string literal.
#[must_use]
pub fn format_default_value(value: &str, dialect: Dialect) -> String {
    if value.eq_ignore_ascii_case("now") {
        return "CURRENT_TIMESTAMP".to_string();
    }
    if value.eq_ignore_ascii_case("true") {
        return match dialect {
            Dialect::Postgres => "TRUE".to_string(),
            Dialect::MySql | Dialect::Sqlite => "1".to_string(),
        };
    }
    if value.eq_ignore_ascii_case("false") {
        return match dialect {
            Dialect::Postgres => "FALSE".to_string(),
            Dialect::MySql | Dialect::Sqlite => "0".to_string(),
        };
    }
    if is_numeric_lexeme(value) {
        return value.to_string();
    }
    format_string_literal(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_forbidden_characters() {
        assert!(validate_identifier("us;er", Dialect::Postgres).is_err());
    }

    #[test]
    fn rejects_leading_digit() {
        assert!(validate_identifier("1user", Dialect::Postgres).is_err());
    }

    #[test]
    fn enforces_dialect_length_caps() {
        let long = "a".repeat(64);
        assert!(validate_identifier(&long, Dialect::Postgres).is_err());
        assert!(validate_identifier(&long, Dialect::MySql).is_ok());
        assert!(validate_identifier(&long, Dialect::Sqlite).is_ok());
    }

    #[test]
    fn quoting_differs_by_dialect() {
        assert_eq!(quote_identifier("users", Dialect::Postgres), "\"users\"");
        assert_eq!(quote_identifier("users", Dialect::MySql), "`users`");
    }

    #[test]
    fn default_value_formatting() {
        assert_eq!(format_default_value("now", Dialect::Postgres), "CURRENT_TIMESTAMP");
        assert_eq!(format_default_value("NOW", Dialect::Postgres), "CURRENT_TIMESTAMP");
        assert_eq!(format_default_value("true", Dialect::Postgres), "TRUE");
        assert_eq!(format_default_value("true", Dialect::MySql), "1");
        assert_eq!(format_default_value("42", Dialect::Postgres), "42");
        assert_eq!(format_default_value("active", Dialect::Postgres), "'active'");
    }

    #[test]
    fn string_literal_doubles_quotes() {
        assert_eq!(format_string_literal("O'Brien"), "'O''Brien'");
    }
}
