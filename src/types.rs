use crate::source::Span;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: Sexpr, // The actual S-expression data
    pub span: Span,  // The source span it covers
}

impl Node {
    pub fn new(kind: Sexpr, span: Span) -> Self {
        Node { kind, span }
    }

    pub fn new_integer(n: i64, span: Span) -> Self {
        Node::new(Sexpr::Integer(n), span)
    }

    pub fn new_float(x: f64, span: Span) -> Self {
        Node::new(Sexpr::Float(x), span)
    }

    pub fn new_symbol(name: impl Into<String>, span: Span) -> Self {
        Node::new(Sexpr::Symbol(name.into()), span)
    }

    pub fn new_list(elements: Vec<Node>, span: Span) -> Self {
        Node::new(Sexpr::List(elements), span)
    }

    /// Builds `(expr quote)`, the expansion of the `'` shorthand.
    pub fn new_quoted(quoted: Node, quote_span: Span) -> Self {
        let span = quoted.span.merge(quote_span);
        Node::new_list(vec![quoted, Node::new_symbol("quote", quote_span)], span)
    }

    /// The symbol name, if this node is a bare symbol.
    pub fn as_symbol(&self) -> Option<&str> {
        match &self.kind {
            Sexpr::Symbol(name) => Some(name.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

/// A postfix S-expression as written in the program text.
/// The last element of a list is its operator or special-form tag.
#[derive(Debug, Clone, PartialEq)]
pub enum Sexpr {
    Integer(i64),
    Float(f64),
    Symbol(String),
    List(Vec<Node>),
}

impl fmt::Display for Sexpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sexpr::Integer(n) => write!(f, "{}", n),
            Sexpr::Float(x) => write!(f, "{:?}", x),
            Sexpr::Symbol(s) => write!(f, "{}", s),
            Sexpr::List(list) => {
                write!(f, "(")?;
                let mut first = true;
                for node in list {
                    if !first {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", node)?;
                    first = false;
                }
                write!(f, ")")
            }
        }
    }
}
