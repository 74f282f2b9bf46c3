//! Hand-written lexer for the migration DSL.
//!
//! A single-pass, character-by-character scanner with one character of
//! lookahead. Allocates one [`Token`] per lexeme and runs in O(n) time in
//! the length of the input.

mod token;

pub use token::{Token, TokenKind, TypeName};

use crate::error::{Location, Result, SchemactError};

/// Tokenizes DSL source text into a stream of tokens ending in [`TokenKind::Eof`].
pub struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: usize,
    column: usize,
    /// True until the first non-whitespace character of the current line is consumed.
    at_line_start: bool,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer over `source`.
    #[must_use]
    pub fn new(source: &'a str) -> Self {
        Self {
            chars: source.chars().peekable(),
            line: 1,
            column: 1,
            at_line_start: true,
        }
    }

    /// Tokenizes the full input.
    pub fn tokenize(source: &'a str) -> Result<Vec<Token>> {
        let mut lexer = Self::new(source);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token()?;
            let is_eof = matches!(token.kind, TokenKind::Eof);
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        Ok(tokens)
    }

    fn here(&self) -> Location {
        Location::new(self.line, self.column)
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
            self.at_line_start = true;
        } else {
            self.column += 1;
            if c != ' ' && c != '\t' && c != '\r' {
                self.at_line_start = false;
            }
        }
        Some(c)
    }

    #[allow(clippy::too_many_lines)]
    fn next_token(&mut self) -> Result<Token> {
        loop {
            match self.peek() {
                None => return Ok(Token::new(TokenKind::Eof, self.here())),
                Some(' ' | '\t' | '\r') => {
                    self.bump();
                    continue;
                }
                Some('\n') => {
                    self.bump();
                    continue;
                }
                Some('#') => {
                    while self.peek().is_some_and(|c| c != '\n') {
                        self.bump();
                    }
                    continue;
                }
                Some('>') if self.at_line_start => {
                    let loc = self.here();
                    self.bump();
                    let mut body = String::new();
                    while self.peek().is_some_and(|c| c != '\n') {
                        body.push(self.bump().expect("peeked"));
                    }
                    return Ok(Token::new(TokenKind::RawSql(body.trim().to_string()), loc));
                }
                _ => break,
            }
        }

        let loc = self.here();
        let Some(c) = self.peek() else {
            return Ok(Token::new(TokenKind::Eof, loc));
        };

        match c {
            '(' => {
                self.bump();
                Ok(Token::new(TokenKind::LParen, loc))
            }
            ')' => {
                self.bump();
                Ok(Token::new(TokenKind::RParen, loc))
            }
            '{' => {
                self.bump();
                Ok(Token::new(TokenKind::LBrace, loc))
            }
            '}' => {
                self.bump();
                Ok(Token::new(TokenKind::RBrace, loc))
            }
            ',' => {
                self.bump();
                Ok(Token::new(TokenKind::Comma, loc))
            }
            '.' => {
                self.bump();
                Ok(Token::new(TokenKind::Dot, loc))
            }
            '>' => Err(SchemactError::parse("unexpected character '>'", loc)),
            '@' => self.lex_decorator(loc),
            '\'' | '"' => self.lex_string(c, loc),
            c if c.is_ascii_digit() => self.lex_number(loc),
            c if c.is_ascii_alphabetic() || c == '_' => self.lex_ident(loc),
            other => Err(SchemactError::parse(
                format!("unexpected character '{other}'"),
                loc,
            )),
        }
    }

    fn lex_decorator(&mut self, loc: Location) -> Result<Token> {
        self.bump(); // '@'
        let mut name = String::new();
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            name.push(self.bump().expect("peeked"));
        }
        if name.is_empty() {
            return Err(SchemactError::parse("expected decorator name", loc));
        }
        Ok(Token::new(TokenKind::Decorator(name), loc))
    }

    fn lex_string(&mut self, quote: char, loc: Location) -> Result<Token> {
        self.bump(); // opening quote
        let mut value = String::new();
        loop {
            match self.bump() {
                None => return Err(SchemactError::parse("unterminated string", loc)),
                Some('\\') => match self.bump() {
                    None => return Err(SchemactError::parse("unterminated string", loc)),
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some('r') => value.push('\r'),
                    Some('\\') => value.push('\\'),
                    Some(c) if c == quote => value.push(quote),
                    Some(other) => value.push(other),
                },
                Some(c) if c == quote => break,
                Some(c) => value.push(c),
            }
        }
        Ok(Token::new(TokenKind::String(value), loc))
    }

    fn lex_number(&mut self, loc: Location) -> Result<Token> {
        let mut lexeme = String::new();
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            lexeme.push(self.bump().expect("peeked"));
        }
        if self.peek() == Some('.') {
            let mut after_dot = self.chars.clone();
            after_dot.next();
            if after_dot.next().is_some_and(|c| c.is_ascii_digit()) {
                lexeme.push(self.bump().expect("peeked")); // '.'
                while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    lexeme.push(self.bump().expect("peeked"));
                }
            }
        }
        Ok(Token::new(TokenKind::Number(lexeme), loc))
    }

    fn lex_ident(&mut self, loc: Location) -> Result<Token> {
        let mut lexeme = String::new();
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            lexeme.push(self.bump().expect("peeked"));
        }

        if lexeme.eq_ignore_ascii_case("model") {
            return Ok(Token::new(TokenKind::Model, loc));
        }
        if let Some(type_name) = TypeName::from_str(&lexeme) {
            return Ok(Token::new(TokenKind::Type(type_name), loc));
        }
        Ok(Token::new(TokenKind::Ident(lexeme), loc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn empty_source_yields_only_eof() {
        assert_eq!(kinds(""), vec![TokenKind::Eof]);
    }

    #[test]
    fn tokenizes_minimal_model() {
        let tokens = kinds("model User { id Serial @pk }");
        assert_eq!(
            tokens,
            vec![
                TokenKind::Model,
                TokenKind::Ident("User".to_string()),
                TokenKind::LBrace,
                TokenKind::Ident("id".to_string()),
                TokenKind::Type(TypeName::Serial),
                TokenKind::Decorator("pk".to_string()),
                TokenKind::RBrace,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn model_keyword_is_case_insensitive() {
        assert_eq!(kinds("MODEL")[0], TokenKind::Model);
        assert_eq!(kinds("Model")[0], TokenKind::Model);
    }

    #[test]
    fn comment_is_discarded() {
        assert_eq!(
            kinds("# a comment\nmodel"),
            vec![TokenKind::Model, TokenKind::Eof]
        );
    }

    #[test]
    fn raw_sql_line_requires_line_start() {
        let tokens = kinds("> select 1");
        assert_eq!(tokens[0], TokenKind::RawSql("select 1".to_string()));
    }

    #[test]
    fn gt_elsewhere_is_an_error() {
        let err = Lexer::tokenize("a > b").unwrap_err();
        assert!(matches!(err, SchemactError::Parse { .. }));
    }

    #[test]
    fn raw_sql_line_allows_leading_whitespace() {
        let tokens = kinds("   > select 1");
        assert_eq!(tokens[0], TokenKind::RawSql("select 1".to_string()));
    }

    #[test]
    fn string_literal_handles_escapes() {
        let tokens = kinds(r#"'a\nb\'c'"#);
        assert_eq!(tokens[0], TokenKind::String("a\nb'c".to_string()));
    }

    #[test]
    fn unterminated_string_is_an_error() {
        assert!(Lexer::tokenize("'abc").is_err());
    }

    #[test]
    fn numeric_literal_with_fraction() {
        assert_eq!(kinds("10.5")[0], TokenKind::Number("10.5".to_string()));
        // a trailing dot not followed by a digit is not consumed
        assert_eq!(kinds("10.")[0], TokenKind::Number("10".to_string()));
    }

    #[test]
    fn decorator_without_name_is_an_error() {
        assert!(Lexer::tokenize("@()").is_err());
    }

    #[test]
    fn tracks_line_and_column() {
        let tokens = Lexer::tokenize("model\nUser").unwrap();
        assert_eq!(tokens[0].location, Location::new(1, 1));
        assert_eq!(tokens[1].location, Location::new(2, 1));
    }
}
