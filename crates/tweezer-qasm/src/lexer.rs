//! Lexer for the Tweezer QASM dialect.

use logos::Logos;

/// Tokens of the dialect.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
#[logos(skip r"//[^\n]*")]
#[logos(skip r"/\*[^*]*\*+(?:[^/*][^*]*\*+)*/")]
pub enum Token {
    // Keywords
    #[token("OPENQASM")]
    OpenQasm,

    #[token("include")]
    Include,

    #[token("qreg")]
    QReg,

    #[token("creg")]
    CReg,

    #[token("measure")]
    Measure,

    #[token("barrier")]
    Barrier,

    #[token("for")]
    For,

    #[token("in")]
    In,

    #[token("pi")]
    #[token("π")]
    Pi,

    // Literals
    #[regex(r"[0-9]+\.[0-9]*([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+", |lex| lex.slice().parse::<f64>().ok())]
    FloatLiteral(f64),

    #[regex(r"[0-9]+", |lex| lex.slice().parse::<u64>().ok())]
    IntLiteral(u64),

    #[regex(r#""[^"]*""#, |lex| {
        let s = lex.slice();
        Some(s[1..s.len()-1].to_string())
    })]
    StringLiteral(String),

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Identifier(String),

    // Operators
    #[token("+")]
    Plus,

    #[token("-")]
    Minus,

    #[token("*")]
    Star,

    #[token("/")]
    Slash,

    #[token("**")]
    Power,

    #[token("->")]
    Arrow,

    // Delimiters
    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token(";")]
    Semicolon,

    #[token(":")]
    Colon,

    #[token(",")]
    Comma,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::OpenQasm => write!(f, "OPENQASM"),
            Token::Include => write!(f, "include"),
            Token::QReg => write!(f, "qreg"),
            Token::CReg => write!(f, "creg"),
            Token::Measure => write!(f, "measure"),
            Token::Barrier => write!(f, "barrier"),
            Token::For => write!(f, "for"),
            Token::In => write!(f, "in"),
            Token::Pi => write!(f, "pi"),
            Token::FloatLiteral(v) => write!(f, "{v:?}"),
            Token::IntLiteral(v) => write!(f, "{v}"),
            Token::StringLiteral(s) => write!(f, "\"{s}\""),
            Token::Identifier(s) => write!(f, "{s}"),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Power => write!(f, "**"),
            Token::Arrow => write!(f, "->"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
            Token::LBrace => write!(f, "{{"),
            Token::RBrace => write!(f, "}}"),
            Token::Semicolon => write!(f, ";"),
            Token::Colon => write!(f, ":"),
            Token::Comma => write!(f, ","),
        }
    }
}

/// A token with its location.
#[derive(Debug, Clone)]
pub struct SpannedToken {
    pub token: Token,
    pub span: std::ops::Range<usize>,
    /// 1-based source line.
    pub line: usize,
}

/// Tokenize a source string.
pub fn tokenize(source: &str) -> Vec<Result<SpannedToken, (std::ops::Range<usize>, String)>> {
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();
    let mut line = 1;
    let mut scanned = 0;

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        line += source[scanned..span.start].matches('\n').count();
        scanned = span.start;

        if let Ok(token) = result {
            tokens.push(Ok(SpannedToken { token, span, line }));
        } else {
            let slice = &source[span.clone()];
            tokens.push(Err((span, format!("Invalid token '{slice}' on line {line}"))));
        }
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(source: &str) -> Vec<Token> {
        tokenize(source)
            .into_iter()
            .filter_map(Result::ok)
            .map(|t| t.token)
            .collect()
    }

    #[test]
    fn test_header_tokens() {
        let t = tokens("OPENQASM 2.0;\ninclude \"qelib1.inc\";");
        assert_eq!(t[0], Token::OpenQasm);
        assert!(matches!(t[1], Token::FloatLiteral(v) if v == 2.0));
        assert_eq!(t[2], Token::Semicolon);
        assert_eq!(t[3], Token::Include);
        assert_eq!(t[4], Token::StringLiteral("qelib1.inc".into()));
    }

    #[test]
    fn test_measure_arrow() {
        let t = tokens("measure q[0] -> c[0];");
        assert_eq!(t[0], Token::Measure);
        assert_eq!(t[1], Token::Identifier("q".into()));
        assert_eq!(t[3], Token::IntLiteral(0));
        assert_eq!(t[5], Token::Arrow);
    }

    #[test]
    fn test_power_is_one_token() {
        let t = tokens("2 ** (k - j)");
        assert_eq!(t[1], Token::Power);
        assert_eq!(t[4], Token::Minus);
    }

    #[test]
    fn test_float_forms() {
        let t = tokens("0.5 1e-7 1.5e300 3.");
        assert!(matches!(t[0], Token::FloatLiteral(v) if v == 0.5));
        assert!(matches!(t[1], Token::FloatLiteral(v) if v == 1e-7));
        assert!(matches!(t[2], Token::FloatLiteral(v) if v == 1.5e300));
        assert!(matches!(t[3], Token::FloatLiteral(v) if v == 3.0));
    }

    #[test]
    fn test_keywords_beat_identifiers() {
        let t = tokens("for in pi pix");
        assert_eq!(t[0], Token::For);
        assert_eq!(t[1], Token::In);
        assert_eq!(t[2], Token::Pi);
        assert_eq!(t[3], Token::Identifier("pix".into()));
    }

    #[test]
    fn test_comments_and_lines() {
        let spanned: Vec<_> = tokenize("// header\nh q[0]; /* block\ncomment */\nx q[1];")
            .into_iter()
            .filter_map(Result::ok)
            .collect();
        assert_eq!(spanned.len(), 12);
        assert_eq!(spanned[0].line, 2);
        assert_eq!(spanned[6].token, Token::Identifier("x".into()));
        assert_eq!(spanned[6].line, 4);
    }

    #[test]
    fn test_invalid_token() {
        let result = tokenize("h q[0] $;");
        assert!(result.iter().any(Result::is_err));
    }
}
