//! Recursive-descent parser turning a token stream into a [`Schema`].
//!
//! Grammar (informal):
//!
//! ```text
//! schema     := (model | raw_sql)* EOF
//! model      := "model" IDENT "{" column+ "}"
//! column     := IDENT type decorator*
//! type       := TYPE_NAME ( "(" type_arg ("," type_arg)* ")" )?
//! decorator  := "@" NAME ( "(" decorator_arg ("," decorator_arg)* ")" )?
//! ```
//!
//! The parser consumes one token of lookahead at a time and never
//! backtracks.

use crate::ast::{Column, Decorator, DecoratorArg, Model, RawSql, Schema};
use crate::error::{Location, Result, SchemactError};
use crate::lexer::{Lexer, Token, TokenKind, TypeName};

/// Parses DSL source text into a [`Schema`].
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    /// Lexes and parses `source` in one step.
    pub fn parse(source: &str) -> Result<Schema> {
        let tokens = Lexer::tokenize(source)?;
        Self { tokens, pos: 0 }.parse_schema()
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn here(&self) -> Location {
        self.peek().location
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, expected: &str, matches: impl Fn(&TokenKind) -> bool) -> Result<Token> {
        if matches(&self.peek().kind) {
            Ok(self.advance())
        } else {
            Err(SchemactError::parse(
                format!("expected {expected}, found {:?}", self.peek().kind),
                self.here(),
            ))
        }
    }

    fn expect_ident(&mut self, expected: &str) -> Result<String> {
        match self.peek().kind.clone() {
            TokenKind::Ident(name) => {
                self.advance();
                Ok(name)
            }
            other => Err(SchemactError::parse(
                format!("expected {expected}, found {other:?}"),
                self.here(),
            )),
        }
    }

    fn parse_schema(&mut self) -> Result<Schema> {
        let mut schema = Schema::new();
        loop {
            match &self.peek().kind {
                TokenKind::Eof => break,
                TokenKind::Model => schema.models.push(self.parse_model()?),
                TokenKind::RawSql(_) => schema.raw_sql.push(self.parse_raw_sql()),
                other => {
                    return Err(SchemactError::parse(
                        format!("expected 'model' or a raw-SQL line, found {other:?}"),
                        self.here(),
                    ));
                }
            }
        }
        Ok(schema)
    }

    fn parse_raw_sql(&mut self) -> RawSql {
        let TokenKind::RawSql(sql) = self.advance().kind else {
            unreachable!("caller checked for RawSql")
        };
        RawSql { sql }
    }

    fn parse_model(&mut self) -> Result<Model> {
        self.expect("'model'", |k| matches!(k, TokenKind::Model))?;
        let name = self.expect_ident("a model name")?;
        self.expect("'{'", |k| matches!(k, TokenKind::LBrace))?;

        let mut columns = Vec::new();
        while !matches!(self.peek().kind, TokenKind::RBrace) {
            columns.push(self.parse_column()?);
        }
        let close_loc = self.here();
        self.expect("'}'", |k| matches!(k, TokenKind::RBrace))?;

        if columns.is_empty() {
            return Err(SchemactError::parse(
                format!("model '{name}' must have at least one column"),
                close_loc,
            ));
        }

        Ok(Model { name, columns })
    }

    fn parse_column(&mut self) -> Result<Column> {
        let name = self.expect_ident("a column name")?;
        let type_loc = self.here();
        let type_name = match self.peek().kind.clone() {
            TokenKind::Type(t) => {
                self.advance();
                t
            }
            other => {
                return Err(SchemactError::parse(
                    format!("expected a type name, found {other:?}"),
                    type_loc,
                ));
            }
        };

        let mut type_args = Vec::new();
        if matches!(self.peek().kind, TokenKind::LParen) {
            self.advance();
            if !matches!(self.peek().kind, TokenKind::RParen) {
                loop {
                    type_args.push(self.parse_type_arg()?);
                    if matches!(self.peek().kind, TokenKind::Comma) {
                        self.advance();
                    } else {
                        break;
                    }
                }
            }
            self.expect("')'", |k| matches!(k, TokenKind::RParen))?;
        }

        let mut decorators = Vec::new();
        while matches!(self.peek().kind, TokenKind::Decorator(_)) {
            let decorator = self.parse_decorator()?;
            if decorators.iter().any(|d: &Decorator| d.name == decorator.name) {
                return Err(SchemactError::parse(
                    format!(
                        "duplicate decorator '@{}' on column '{name}'",
                        decorator.name
                    ),
                    type_loc,
                ));
            }
            decorators.push(decorator);
        }

        Ok(Column {
            name,
            type_name,
            type_args,
            decorators,
        })
    }

    fn parse_type_arg(&mut self) -> Result<String> {
        match self.peek().kind.clone() {
            TokenKind::Number(n) => {
                self.advance();
                Ok(n)
            }
            TokenKind::Ident(i) => {
                self.advance();
                Ok(i)
            }
            TokenKind::String(s) => {
                self.advance();
                Ok(s)
            }
            other => Err(SchemactError::parse(
                format!("expected a type argument, found {other:?}"),
                self.here(),
            )),
        }
    }

    fn parse_decorator(&mut self) -> Result<Decorator> {
        let TokenKind::Decorator(name) = self.peek().kind.clone() else {
            unreachable!("caller checked for Decorator")
        };
        self.advance();

        let mut args = Vec::new();
        if matches!(self.peek().kind, TokenKind::LParen) {
            self.advance();
            if !matches!(self.peek().kind, TokenKind::RParen) {
                loop {
                    args.push(self.parse_decorator_arg()?);
                    if matches!(self.peek().kind, TokenKind::Comma) {
                        self.advance();
                    } else {
                        break;
                    }
                }
            }
            self.expect("')'", |k| matches!(k, TokenKind::RParen))?;
        }

        Ok(Decorator { name, args })
    }

    fn parse_decorator_arg(&mut self) -> Result<DecoratorArg> {
        match self.peek().kind.clone() {
            TokenKind::String(s) => {
                self.advance();
                Ok(DecoratorArg::String(s))
            }
            TokenKind::Number(n) => {
                self.advance();
                Ok(DecoratorArg::Number(n))
            }
            TokenKind::Ident(first) => {
                self.advance();
                if matches!(self.peek().kind, TokenKind::Dot) {
                    self.advance();
                    let second = self.expect_ident("an identifier after '.'")?;
                    Ok(DecoratorArg::DottedPair(first, second))
                } else {
                    Ok(DecoratorArg::Ident(first))
                }
            }
            TokenKind::Type(t) => {
                // Type names are valid identifiers in decorator argument
                // position, e.g. `@default(text)` colliding with no type,
                // but `Enum` variant lists reuse bare words too.
                self.advance();
                Ok(DecoratorArg::Ident(type_name_to_word(t)))
            }
            other => Err(SchemactError::parse(
                format!("expected a decorator argument, found {other:?}"),
                self.here(),
            )),
        }
    }
}

fn type_name_to_word(type_name: TypeName) -> String {
    format!("{type_name:?}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_model() {
        let schema = Parser::parse("model User {\n  id Serial @pk\n}\n").unwrap();
        assert_eq!(schema.models.len(), 1);
        assert_eq!(schema.models[0].name, "User");
        assert_eq!(schema.models[0].columns.len(), 1);
        assert_eq!(schema.models[0].columns[0].name, "id");
    }

    #[test]
    fn empty_model_is_rejected() {
        let err = Parser::parse("model User {\n}\n").unwrap_err();
        assert!(matches!(err, SchemactError::Parse { .. }));
    }

    #[test]
    fn duplicate_decorator_is_rejected() {
        let err = Parser::parse("model User {\n  id Int @pk @pk\n}\n").unwrap_err();
        assert!(matches!(err, SchemactError::Parse { .. }));
    }

    #[test]
    fn on_delete_without_ref_parses_fine() {
        // The parser doesn't validate semantic rules across decorators; an
        // `@onDelete` without `@ref` is rejected later, by the generator.
        let schema = Parser::parse("model Post {\n  author_id Int @onDelete(cascade)\n}\n").unwrap();
        assert!(schema.models[0].columns[0].decorator("onDelete").is_some());
    }

    #[test]
    fn parses_type_args_and_ref_decorator() {
        let schema = Parser::parse(
            "model Post {\n  id Serial @pk\n  author_id Int @ref(User.id) @onDelete(cascade)\n  name VarChar(255)\n}\n",
        )
        .unwrap();
        let post = &schema.models[0];
        assert_eq!(post.columns[2].type_args, vec!["255".to_string()]);
        let ref_decorator = post.columns[1].decorator("ref").unwrap();
        assert_eq!(
            ref_decorator.args[0],
            DecoratorArg::DottedPair("User".to_string(), "id".to_string())
        );
    }

    #[test]
    fn parses_raw_sql_interleaved_with_models() {
        let schema = Parser::parse(
            "> create extension if not exists pgcrypto\nmodel User {\n  id Serial @pk\n}\n",
        )
        .unwrap();
        assert_eq!(schema.raw_sql.len(), 1);
        assert_eq!(schema.raw_sql[0].sql, "create extension if not exists pgcrypto");
        assert_eq!(schema.models.len(), 1);
    }

    #[test]
    fn empty_parens_means_no_args() {
        let schema = Parser::parse("model User {\n  id Serial @pk()\n}\n").unwrap();
        assert!(schema.models[0].columns[0].decorator("pk").unwrap().args.is_empty());
    }
}
