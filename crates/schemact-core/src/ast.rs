//! The abstract syntax tree produced by the parser.
//!
//! A [`Schema`] is an ordered sequence of [`Model`] and raw-SQL statements, in
//! the order they appeared in the source file. Order matters: it drives both
//! the sequence of `CREATE TABLE` statements on the way up and the reverse
//! sequence of `DROP TABLE` statements on the way down.

/// A parsed DSL file: an ordered list of models interleaved with raw-SQL lines.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Schema {
    /// Models, in source order.
    pub models: Vec<Model>,
    /// Raw SQL lines, in source order. Source position relative to the
    /// models is not retained; see [`crate::SchemactError`] generator docs
    /// for the UP-only ordering rule this implies.
    pub raw_sql: Vec<RawSql>,
}

impl Schema {
    /// Creates an empty schema.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            models: Vec::new(),
            raw_sql: Vec::new(),
        }
    }
}

/// A single `model Name { ... }` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Model {
    /// The model's name, used as the table name.
    pub name: String,
    /// Columns, in source order. Never empty for a successfully parsed model.
    pub columns: Vec<Column>,
}

/// A single column declaration inside a model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    /// The column's name.
    pub name: String,
    /// The column's DSL type.
    pub type_name: crate::lexer::TypeName,
    /// Arguments to the type, e.g. the `10` in `VarChar(10)` or the variant
    /// list in `Enum(active, banned)`.
    pub type_args: Vec<String>,
    /// Decorators attached to the column, in source order. No two decorators
    /// on the same column share a name.
    pub decorators: Vec<Decorator>,
}

impl Column {
    /// Returns the decorator with the given name, if present.
    #[must_use]
    pub fn decorator(&self, name: &str) -> Option<&Decorator> {
        self.decorators.iter().find(|d| d.name == name)
    }

    /// True if a decorator with the given name is present.
    #[must_use]
    pub fn has_decorator(&self, name: &str) -> bool {
        self.decorator(name).is_some()
    }
}

/// A decorator attached to a column, such as `@pk` or `@ref(User.id)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decorator {
    /// The decorator's name, without the leading `@`.
    pub name: String,
    /// Arguments, in source order. Empty for argument-less decorators and
    /// for decorators written with empty parens.
    pub args: Vec<DecoratorArg>,
}

/// A single argument to a decorator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecoratorArg {
    /// A quoted string argument, e.g. `@default('active')`.
    String(String),
    /// A bare numeric argument, e.g. `@default(0)`.
    Number(String),
    /// A bare identifier argument, e.g. `@default(now)`.
    Ident(String),
    /// A dotted `Table.column` pair, as used by `@ref(User.id)`.
    DottedPair(String, String),
}

/// A raw SQL line, passed through verbatim into the UP migration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSql {
    /// The SQL text, trimmed of its leading `>` and surrounding whitespace.
    pub sql: String,
}
