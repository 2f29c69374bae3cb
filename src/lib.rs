// Declare modules publicly so they are part of the library interface
pub mod environment;
pub mod evaluator;
pub mod lexer;
pub mod memo;
pub mod parser;
pub mod pretty_print;
pub mod primitives;
pub mod source;
pub mod types;
pub mod value;

pub use environment::{EnvError, Environment};
pub use evaluator::{EvalError, EvalResult, Interpreter, Options, Profile};
pub use lexer::{Token, TokenKind, tokenize};
pub use parser::{ParseError, Parser, parse_str};
pub use source::Span;
pub use types::{Node, Sexpr};
pub use value::Value;

/// Any failure between program text and its value.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Eval(#[from] EvalError),
}

impl Error {
    pub fn span(&self) -> Span {
        match self {
            Error::Parse(err) => err.span(),
            Error::Eval(err) => err.span(),
        }
    }
}
