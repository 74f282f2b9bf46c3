//! Error types shared by the lexer, parser, and generators.

/// A source location, 1-based in both fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    /// Line number, counting from 1.
    pub line: usize,
    /// Column number, counting from 1.
    pub column: usize,
}

impl Location {
    /// Creates a new location.
    #[must_use]
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl core::fmt::Display for Location {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Errors produced while compiling a DSL source file into DDL.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemactError {
    /// Lexer or parser failure.
    #[error("{message} at {location}")]
    Parse {
        /// Human-readable description of the failure.
        message: String,
        /// Where in the source it occurred.
        location: Location,
    },

    /// Semantic misuse caught during DDL generation.
    #[error("{0}")]
    Generator(String),

    /// An identifier, literal, or migration name was rejected.
    #[error("{0}")]
    Validation(String),
}

impl SchemactError {
    /// Builds a [`SchemactError::Parse`].
    #[must_use]
    pub fn parse(message: impl Into<String>, location: Location) -> Self {
        Self::Parse {
            message: message.into(),
            location,
        }
    }

    /// Builds a [`SchemactError::Generator`].
    #[must_use]
    pub fn generator(message: impl Into<String>) -> Self {
        Self::Generator(message.into())
    }

    /// Builds a [`SchemactError::Validation`].
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

/// Result type for the compiler pipeline.
pub type Result<T> = core::result::Result<T, SchemactError>;
