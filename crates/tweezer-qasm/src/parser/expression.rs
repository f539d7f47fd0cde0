//! Parameter and index expressions.

use tweezer_ir::{IndexExpr, ParameterExpression};

use super::Parser;
use crate::error::{ParseError, ParseResult};
use crate::lexer::Token;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl BinOp {
    fn precedence(self) -> u8 {
        match self {
            BinOp::Add | BinOp::Sub => 1,
            BinOp::Mul | BinOp::Div => 2,
            BinOp::Pow => 3,
        }
    }

    fn right_associative(self) -> bool {
        self == BinOp::Pow
    }

    fn apply(self, left: ParameterExpression, right: ParameterExpression) -> ParameterExpression {
        match self {
            BinOp::Add => left + right,
            BinOp::Sub => left - right,
            BinOp::Mul => left * right,
            BinOp::Div => left / right,
            BinOp::Pow => left.pow(right),
        }
    }
}

impl Parser {
    /// Parse a parameter expression.
    pub(super) fn parse_expression(&mut self) -> ParseResult<ParameterExpression> {
        self.parse_binary_expr(0)
    }

    /// Precedence climbing over `+ - * / **`.
    fn parse_binary_expr(&mut self, min_prec: u8) -> ParseResult<ParameterExpression> {
        let mut left = self.parse_unary_expr()?;

        while let Some(op) = self.peek_binary_op() {
            let prec = op.precedence();
            if prec < min_prec {
                break;
            }
            self.advance();

            let next = if op.right_associative() { prec } else { prec + 1 };
            let right = self.parse_binary_expr(next)?;
            left = op.apply(left, right);
        }

        Ok(left)
    }

    /// A minus directly in front of a literal folds into the constant, so
    /// `-0.5` reads back as the value the emitter printed.
    fn parse_unary_expr(&mut self) -> ParseResult<ParameterExpression> {
        if self.consume(&Token::Minus) {
            return match self.peek() {
                Some(Token::FloatLiteral(v)) => {
                    let v = *v;
                    self.advance();
                    Ok(ParameterExpression::constant(-v))
                }
                Some(Token::IntLiteral(v)) => {
                    let v = *v;
                    self.advance();
                    Ok(ParameterExpression::constant(-int_to_f64(v)))
                }
                _ => Ok(-self.parse_unary_expr()?),
            };
        }
        self.parse_primary_expr()
    }

    fn parse_primary_expr(&mut self) -> ParseResult<ParameterExpression> {
        let token = self
            .peek()
            .cloned()
            .ok_or_else(|| ParseError::UnexpectedEof("expected expression".into()))?;

        match token {
            Token::IntLiteral(v) => {
                self.advance();
                Ok(ParameterExpression::constant(int_to_f64(v)))
            }
            Token::FloatLiteral(v) => {
                self.advance();
                Ok(ParameterExpression::constant(v))
            }
            Token::Pi => {
                self.advance();
                Ok(ParameterExpression::pi())
            }
            Token::Identifier(name) => {
                self.advance();
                Ok(ParameterExpression::symbol(name))
            }
            Token::LParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(Token::RParen)?;
                Ok(expr)
            }
            _ => Err(self.unexpected("expression")),
        }
    }

    fn peek_binary_op(&self) -> Option<BinOp> {
        match self.peek()? {
            Token::Plus => Some(BinOp::Add),
            Token::Minus => Some(BinOp::Sub),
            Token::Star => Some(BinOp::Mul),
            Token::Slash => Some(BinOp::Div),
            Token::Power => Some(BinOp::Pow),
            _ => None,
        }
    }

    /// Parse a comma-separated expression list up to (not including) `)`.
    pub(super) fn parse_expression_list(&mut self) -> ParseResult<Vec<ParameterExpression>> {
        let mut exprs = Vec::new();
        if self.check(&Token::RParen) {
            return Ok(exprs);
        }
        loop {
            exprs.push(self.parse_expression()?);
            if !self.consume(&Token::Comma) {
                break;
            }
        }
        Ok(exprs)
    }

    /// Parse an affine index: `[-] term (("+" | "-") term)*` where a term
    /// is `n`, `v`, `n*v` or `v*n`.
    pub(super) fn parse_index_expr(&mut self) -> ParseResult<IndexExpr> {
        let mut expr = IndexExpr::constant(0);
        let mut negate = self.consume(&Token::Minus);
        loop {
            let term = self.parse_index_term()?;
            let next = if negate {
                expr.checked_sub(&term)
            } else {
                expr.checked_add(&term)
            };
            expr = next.ok_or_else(|| ParseError::UnexpectedToken {
                line: self.line(),
                expected: "index that fits in 64 bits".into(),
                found: term.to_string(),
            })?;
            if self.consume(&Token::Plus) {
                negate = false;
            } else if self.consume(&Token::Minus) {
                negate = true;
            } else {
                return Ok(expr);
            }
        }
    }

    fn parse_index_term(&mut self) -> ParseResult<IndexExpr> {
        match self.peek().cloned() {
            Some(Token::IntLiteral(v)) => {
                self.advance();
                let factor = self.index_constant(v)?;
                if self.consume(&Token::Star) {
                    let var = self.parse_identifier()?;
                    Ok(IndexExpr::var(var).scaled(factor))
                } else {
                    Ok(IndexExpr::constant(factor))
                }
            }
            Some(Token::Identifier(name)) => {
                self.advance();
                if self.consume(&Token::Star) {
                    let v = self.parse_int_literal()?;
                    Ok(IndexExpr::var(name).scaled(self.index_constant(v)?))
                } else {
                    Ok(IndexExpr::var(name))
                }
            }
            _ => Err(self.unexpected("index")),
        }
    }

    fn index_constant(&self, v: u64) -> ParseResult<i64> {
        i64::try_from(v).map_err(|_| ParseError::UnexpectedToken {
            line: self.line(),
            expected: "index that fits in 64 bits".into(),
            found: v.to_string(),
        })
    }
}

#[allow(clippy::cast_precision_loss)]
fn int_to_f64(v: u64) -> f64 {
    v as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expr(source: &str) -> ParameterExpression {
        Parser::new(source).unwrap().parse_expression().unwrap()
    }

    fn index(source: &str) -> IndexExpr {
        Parser::new(source).unwrap().parse_index_expr().unwrap()
    }

    #[test]
    fn test_precedence() {
        let e = expr("1 + 2 * 3");
        assert_eq!(e.as_f64(), Some(7.0));
        let e = expr("(1 + 2) * 3");
        assert_eq!(e.as_f64(), Some(9.0));
        let e = expr("pi / 2");
        assert_eq!(e.as_f64(), Some(std::f64::consts::FRAC_PI_2));
    }

    #[test]
    fn test_power_is_right_associative() {
        assert_eq!(expr("2 ** 3 ** 2").as_f64(), Some(512.0));
        assert_eq!(expr("8 - 2 - 1").as_f64(), Some(5.0));
    }

    #[test]
    fn test_minus_folds_into_literal() {
        assert_eq!(expr("-0.5"), ParameterExpression::constant(-0.5));
        assert_eq!(expr("-(0.5)"), -ParameterExpression::constant(0.5));
        assert_eq!(expr("-pi"), -ParameterExpression::pi());
        assert_eq!(expr("-0.0").as_f64().map(f64::to_bits), Some((-0.0_f64).to_bits()));
    }

    #[test]
    fn test_symbols() {
        let e = expr("pi / 2.0 ** (k - j)");
        assert!(e.is_symbolic());
        let bound = e.bind("k", 3.0).bind("j", 1.0);
        assert_eq!(bound.as_f64(), Some(std::f64::consts::FRAC_PI_4));
    }

    #[test]
    fn test_affine_index() {
        assert_eq!(index("3"), IndexExpr::constant(3));
        assert_eq!(index("i + 1"), IndexExpr::var("i") + 1);
        assert_eq!(index("-i + 3"), IndexExpr::constant(3) - IndexExpr::var("i"));
        assert_eq!(index("2*i - j"), IndexExpr::var("i").scaled(2) - IndexExpr::var("j"));
        assert_eq!(index("i*2"), IndexExpr::var("i").scaled(2));
    }

    #[test]
    fn test_index_sum_overflow_is_a_parse_error() {
        let err = Parser::new("9223372036854775807 + 1")
            .unwrap()
            .parse_index_expr()
            .unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedToken { ref found, .. } if found == "1"));
    }

    #[test]
    fn test_index_rejects_non_affine() {
        assert!(Parser::new("pi").unwrap().parse_index_expr().is_err());
    }
}
