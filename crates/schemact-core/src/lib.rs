//! # schemact-core
//!
//! Lexer, parser, and dialect-aware SQL generators for the schemact
//! migration DSL.
//!
//! This crate is synchronous and has no I/O: it turns DSL source text into
//! an [`ast::Schema`], validates it, and renders it to UP/DOWN SQL for
//! PostgreSQL, MySQL, or SQLite. Everything that touches a filesystem or a
//! database lives in the `schemact` crate, which depends on this one.
//!
//! ```rust
//! use schemact_core::{generator::SqlGenerator, parser::Parser};
//!
//! let source = "model User {\n  id Serial @pk\n  email VarChar(255) @unique\n}\n";
//! let schema = Parser::parse(source).unwrap();
//! let gen = schemact_core::generator::postgres::PostgresGenerator;
//! let up = gen.generate_up(&schema).unwrap();
//! assert!(up[0].starts_with("CREATE TABLE \"User\""));
//! ```

pub mod ast;
pub mod error;
pub mod generator;
pub mod lexer;
pub mod parser;
pub mod validate;

pub use ast::{Column, Decorator, DecoratorArg, Model, RawSql, Schema};
pub use error::{Location, SchemactError};
pub use lexer::{Lexer, Token, TokenKind, TypeName};
pub use parser::Parser;
