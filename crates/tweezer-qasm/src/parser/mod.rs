//! Recursive-descent parser for the dialect.

mod expression;
mod lowering;
mod statement;

use tweezer_ir::Circuit;

use crate::ast::Program;
use crate::error::{ParseError, ParseResult};
use crate::lexer::{SpannedToken, Token, tokenize};

/// Name given to parsed circuits.
pub const DEFAULT_CIRCUIT_NAME: &str = "main";

/// Parse source text into a [`Circuit`].
pub fn parse(source: &str) -> ParseResult<Circuit> {
    parse_named(source, DEFAULT_CIRCUIT_NAME)
}

/// Parse source text into a [`Circuit`] called `name`.
pub fn parse_named(source: &str, name: &str) -> ParseResult<Circuit> {
    let program = parse_ast(source)?;
    lowering::lower_to_circuit(&program, name)
}

/// Parse source text into a [`Program`] without lowering it.
pub fn parse_ast(source: &str) -> ParseResult<Program> {
    let mut parser = Parser::new(source)?;
    parser.parse_program()
}

/// Parser state.
pub(super) struct Parser {
    pub(super) tokens: Vec<SpannedToken>,
    pub(super) pos: usize,
}

impl Parser {
    fn new(source: &str) -> ParseResult<Self> {
        let mut tokens = Vec::new();
        for result in tokenize(source) {
            match result {
                Ok(t) => tokens.push(t),
                Err((span, message)) => {
                    return Err(ParseError::LexerError {
                        position: span.start,
                        message,
                    });
                }
            }
        }
        Ok(Self { tokens, pos: 0 })
    }

    pub(super) fn is_eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    pub(super) fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|t| &t.token)
    }

    /// Line of the current token, or of the last one at end of input.
    pub(super) fn line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or(1, |t| t.line)
    }

    pub(super) fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos)?.token.clone();
        self.pos += 1;
        Some(token)
    }

    /// Consume a token of the same kind as `expected` or fail.
    #[allow(clippy::needless_pass_by_value)]
    pub(super) fn expect(&mut self, expected: Token) -> ParseResult<()> {
        let line = self.line();
        let found = self
            .advance()
            .ok_or_else(|| ParseError::UnexpectedEof(format!("expected {expected}")))?;

        if std::mem::discriminant(&found) != std::mem::discriminant(&expected) {
            return Err(ParseError::UnexpectedToken {
                line,
                expected: expected.to_string(),
                found: found.to_string(),
            });
        }
        Ok(())
    }

    pub(super) fn check(&self, token: &Token) -> bool {
        self.peek()
            .is_some_and(|t| std::mem::discriminant(t) == std::mem::discriminant(token))
    }

    pub(super) fn consume(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Error for the current token, or end of input.
    pub(super) fn unexpected(&self, expected: &str) -> ParseError {
        match self.peek() {
            Some(found) => ParseError::UnexpectedToken {
                line: self.line(),
                expected: expected.to_string(),
                found: found.to_string(),
            },
            None => ParseError::UnexpectedEof(format!("expected {expected}")),
        }
    }

    fn parse_program(&mut self) -> ParseResult<Program> {
        self.expect(Token::OpenQasm)?;
        let version = self.parse_version()?;
        self.expect(Token::Semicolon)?;

        let mut statements = Vec::new();
        while !self.is_eof() {
            statements.push(self.parse_statement()?);
        }

        Ok(Program {
            version,
            statements,
        })
    }

    fn parse_version(&mut self) -> ParseResult<String> {
        match self.advance() {
            Some(Token::FloatLiteral(v)) if v == 2.0 => Ok("2.0".into()),
            Some(Token::IntLiteral(2)) => Ok("2.0".into()),
            Some(Token::FloatLiteral(v)) => Err(ParseError::InvalidVersion(format!("{v:?}"))),
            Some(Token::IntLiteral(v)) => Err(ParseError::InvalidVersion(v.to_string())),
            Some(other) => Err(ParseError::UnexpectedToken {
                line: self.line(),
                expected: "version number".into(),
                found: other.to_string(),
            }),
            None => Err(ParseError::UnexpectedEof("expected version number".into())),
        }
    }

    pub(super) fn parse_identifier(&mut self) -> ParseResult<String> {
        match self.peek() {
            Some(Token::Identifier(name)) => {
                let name = name.clone();
                self.pos += 1;
                Ok(name)
            }
            _ => Err(self.unexpected("identifier")),
        }
    }

    pub(super) fn parse_int_literal(&mut self) -> ParseResult<u64> {
        match self.peek() {
            Some(Token::IntLiteral(v)) => {
                let v = *v;
                self.pos += 1;
                Ok(v)
            }
            _ => Err(self.unexpected("integer")),
        }
    }
}
