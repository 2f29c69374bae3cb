use logos::Logos;
use std::fmt;

use crate::Span;

/// An atom token after number conversion has been attempted.
#[derive(Debug, Clone, PartialEq)]
pub enum Atom {
    Integer(i64),
    Float(f64),
    Symbol(String),
}

impl Atom {
    /// Integer first, then floating point, otherwise the text is a symbol.
    pub fn classify(text: &str) -> Atom {
        if let Ok(n) = text.parse::<i64>() {
            Atom::Integer(n)
        } else if let Ok(x) = text.parse::<f64>() {
            Atom::Float(x)
        } else {
            Atom::Symbol(text.to_string())
        }
    }
}

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"\s+")]
pub enum TokenKind {
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("'")]
    Quote,
    // Anything that is not whitespace or punctuation runs into one atom
    #[regex(r"[^\s()']+", |lex| Atom::classify(lex.slice()))]
    Atom(Atom),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Atom::Integer(n) => write!(f, "{}", n),
            Atom::Float(x) => write!(f, "{:?}", x),
            Atom::Symbol(s) => write!(f, "{}", s),
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::LParen => write!(f, "("),
            TokenKind::RParen => write!(f, ")"),
            TokenKind::Quote => write!(f, "'"),
            TokenKind::Atom(atom) => write!(f, "{}", atom),
        }
    }
}

/// Splits program text into tokens. Lexing never fails: input the token rules
/// cannot match is kept as a symbol and left for the parser or evaluator to reject.
pub fn tokenize(input: &str) -> Vec<Token> {
    let mut lexer = TokenKind::lexer(input);
    let mut tokens = Vec::new();
    while let Some(result) = lexer.next() {
        let range = lexer.span();
        let kind = match result {
            Ok(kind) => kind,
            Err(()) => TokenKind::Atom(Atom::Symbol(lexer.slice().to_string())),
        };
        tokens.push(Token {
            kind,
            span: Span::new(range.start, range.end),
        });
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_tokens(input: &str, expected: Vec<TokenKind>) {
        let kinds: Vec<TokenKind> = tokenize(input).into_iter().map(|t| t.kind).collect();
        assert_eq!(kinds, expected, "Input: '{}'", input);
    }

    fn sym(s: &str) -> TokenKind {
        TokenKind::Atom(Atom::Symbol(s.to_string()))
    }

    fn int(n: i64) -> TokenKind {
        TokenKind::Atom(Atom::Integer(n))
    }

    fn float(x: f64) -> TokenKind {
        TokenKind::Atom(Atom::Float(x))
    }

    #[test]
    fn test_empty_input() {
        assert_tokens("", vec![]);
        assert_tokens("  \n\t ", vec![]);
    }

    #[test]
    fn test_mixed_program() {
        assert_tokens(
            "( hello 2 3.14 (world)  ) goodbye",
            vec![
                TokenKind::LParen,
                sym("hello"),
                int(2),
                float(3.14),
                TokenKind::LParen,
                sym("world"),
                TokenKind::RParen,
                TokenKind::RParen,
                sym("goodbye"),
            ],
        );
    }

    #[test]
    fn test_punctuation_splits_atoms() {
        assert_tokens(
            "(a)b'c",
            vec![
                TokenKind::LParen,
                sym("a"),
                TokenKind::RParen,
                sym("b"),
                TokenKind::Quote,
                sym("c"),
            ],
        );
        assert_tokens("''", vec![TokenKind::Quote, TokenKind::Quote]);
    }

    #[test]
    fn test_numbers() {
        assert_tokens("42", vec![int(42)]);
        assert_tokens("-7", vec![int(-7)]);
        assert_tokens("+3", vec![int(3)]);
        assert_tokens("0.5", vec![float(0.5)]);
        assert_tokens(".5", vec![float(0.5)]);
        assert_tokens("1e3", vec![float(1000.0)]);
        // Too large for i64, still a number
        assert_tokens("92233720368547758070", vec![float(92233720368547758070.0)]);
    }

    #[test]
    fn test_operator_symbols() {
        assert_tokens(
            "+ - * / eq? atom?",
            vec![
                sym("+"),
                sym("-"),
                sym("*"),
                sym("/"),
                sym("eq?"),
                sym("atom?"),
            ],
        );
    }

    #[test]
    fn test_number_like_symbols() {
        assert_tokens("1-2", vec![sym("1-2")]);
        assert_tokens("1.2.3", vec![sym("1.2.3")]);
        assert_tokens("no-idea", vec![sym("no-idea")]);
    }

    #[test]
    fn test_tokenize_spans() {
        let tokens = tokenize("(1 2 +)'");
        let spans: Vec<Span> = tokens.iter().map(|t| t.span).collect();
        assert_eq!(
            spans,
            vec![
                Span::new(0, 1),
                Span::new(1, 2),
                Span::new(3, 4),
                Span::new(5, 6),
                Span::new(6, 7),
                Span::new(7, 8),
            ]
        );
    }

    #[test]
    fn test_display_round_trip() {
        let text: Vec<String> = tokenize("(x 2.0 ')")
            .iter()
            .map(|t| t.kind.to_string())
            .collect();
        assert_eq!(text, vec!["(", "x", "2.0", "'", ")"]);
    }
}
