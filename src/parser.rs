use crate::Span;
use crate::lexer::{Atom, Token, TokenKind};
use crate::types::{Node, Sexpr};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("Parse Error [at {0}]: unbalanced expression, ')' has no matching '('")]
    UnbalancedClose(Span),
    #[error("Parse Error [at {0}]: unbalanced expression, '(' is never closed")]
    Unclosed(Span),
    #[error("Parse Error [at {0}]: misplaced quote, nothing precedes it")]
    MisplacedQuote(Span),
}

impl ParseError {
    pub fn span(&self) -> Span {
        match self {
            ParseError::UnbalancedClose(span)
            | ParseError::Unclosed(span)
            | ParseError::MisplacedQuote(span) => *span,
        }
    }
}

// Result type alias for convenience
type ParseResult<T> = Result<T, ParseError>;

// Bracket structure before the quote shorthand is expanded.
#[derive(Debug)]
enum Item {
    Atom(Node),
    Quote(Span),
    List(Vec<Item>, Span),
}

// A list still waiting for its ')'.
struct OpenList {
    items: Vec<Item>,
    open_span: Span,
}

pub struct Parser {
    tokens: Vec<Token>,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser { tokens }
    }

    /// Parses every top-level expression in the token stream.
    pub fn parse(self) -> ParseResult<Vec<Node>> {
        let items = Self::build_tree(self.tokens)?;
        expand_quotes(items)
    }

    // The stack is seeded with the top-level list; '(' pushes, ')' pops.
    fn build_tree(tokens: Vec<Token>) -> ParseResult<Vec<Item>> {
        let mut top_level = Vec::new();
        let mut stack: Vec<OpenList> = Vec::new();

        for token in tokens {
            let item = match token.kind {
                TokenKind::LParen => {
                    stack.push(OpenList {
                        items: Vec::new(),
                        open_span: token.span,
                    });
                    continue;
                }
                TokenKind::RParen => {
                    let open = stack
                        .pop()
                        .ok_or(ParseError::UnbalancedClose(token.span))?;
                    Item::List(open.items, open.open_span.merge(token.span))
                }
                TokenKind::Quote => Item::Quote(token.span),
                TokenKind::Atom(atom) => Item::Atom(atom_node(atom, token.span)),
            };
            match stack.last_mut() {
                Some(open) => open.items.push(item),
                None => top_level.push(item),
            }
        }

        match stack.pop() {
            Some(open) => Err(ParseError::Unclosed(open.open_span)),
            None => Ok(top_level),
        }
    }
}

fn atom_node(atom: Atom, span: Span) -> Node {
    match atom {
        Atom::Integer(n) => Node::new_integer(n, span),
        Atom::Float(x) => Node::new_float(x, span),
        Atom::Symbol(s) => Node::new_symbol(s, span),
    }
}

/// Replaces each quote mark with `(previous-sibling quote)`, recursively.
fn expand_quotes(items: Vec<Item>) -> ParseResult<Vec<Node>> {
    let mut nodes: Vec<Node> = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Item::Atom(node) => nodes.push(node),
            Item::List(children, span) => {
                nodes.push(Node::new(Sexpr::List(expand_quotes(children)?), span))
            }
            Item::Quote(span) => {
                let quoted = nodes.pop().ok_or(ParseError::MisplacedQuote(span))?;
                nodes.push(Node::new_quoted(quoted, span));
            }
        }
    }
    Ok(nodes)
}

/// Tokenizes and parses program text.
pub fn parse_str(input: &str) -> ParseResult<Vec<Node>> {
    Parser::new(crate::lexer::tokenize(input)).parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    // Compares the rendered forest, ignoring spans
    fn assert_parse(input: &str, expected: &[&str]) {
        match parse_str(input) {
            Ok(nodes) => {
                let rendered: Vec<String> = nodes.iter().map(|n| n.to_string()).collect();
                assert_eq!(rendered, expected, "Input: '{}'", input);
            }
            Err(e) => panic!("Parsing failed for input '{}': {}", input, e),
        }
    }

    fn assert_parse_error(input: &str, expected_error_variant: ParseError) {
        match parse_str(input) {
            Ok(result) => panic!(
                "Expected parsing to fail for input '{}', but got: {:?}",
                input, result
            ),
            Err(e) => assert_eq!(
                std::mem::discriminant(&e),
                std::mem::discriminant(&expected_error_variant),
                "Input: '{}', Expected error variant like {:?}, got: {:?}",
                input,
                expected_error_variant,
                e
            ),
        }
    }

    #[test]
    fn test_parse_forest_structure() {
        let nodes = parse_str("( hello 2 3.14 (world) ) goodbye").unwrap();
        let expected = vec![
            Node::new_list(
                vec![
                    Node::new_symbol("hello", Span::new(2, 7)),
                    Node::new_integer(2, Span::new(8, 9)),
                    Node::new_float(3.14, Span::new(10, 14)),
                    Node::new_list(
                        vec![Node::new_symbol("world", Span::new(16, 21))],
                        Span::new(15, 22),
                    ),
                ],
                Span::new(0, 24),
            ),
            Node::new_symbol("goodbye", Span::new(25, 32)),
        ];
        assert_eq!(nodes, expected);
    }

    #[test]
    fn test_parse_empty() {
        assert_parse("", &[]);
        assert_parse("()", &["()"]);
        assert_parse("(()())", &["(() ())"]);
    }

    #[test]
    fn test_parse_multiple_top_level() {
        assert_parse("(x 42 define) x", &["(x 42 define)", "x"]);
    }

    #[test]
    fn test_quote_sugar() {
        assert_parse("a'", &["(a quote)"]);
        assert_parse("(a b c)'", &["((a b c) quote)"]);
        assert_parse("(x (a b)' define)", &["(x ((a b) quote) define)"]);
        assert_parse("1 2'", &["1", "(2 quote)"]);
    }

    #[test]
    fn test_repeated_quote_nests() {
        assert_parse("a''", &["((a quote) quote)"]);
    }

    #[test]
    fn test_quote_inside_nested_lists() {
        assert_parse("((a' b') c')", &["(((a quote) (b quote)) (c quote))"]);
    }

    #[test]
    fn test_unbalanced_open() {
        assert_parse_error("(", ParseError::Unclosed(Span::default()));
        assert_parse_error("((a)", ParseError::Unclosed(Span::default()));
    }

    #[test]
    fn test_unbalanced_close() {
        assert_parse_error(")", ParseError::UnbalancedClose(Span::default()));
        assert_parse_error(") x", ParseError::UnbalancedClose(Span::default()));
        assert_parse_error("(a))", ParseError::UnbalancedClose(Span::default()));
    }

    #[test]
    fn test_misplaced_quote() {
        assert_parse_error("'", ParseError::MisplacedQuote(Span::default()));
        assert_parse_error("('a)", ParseError::MisplacedQuote(Span::default()));
        assert_parse_error("(x (' y))", ParseError::MisplacedQuote(Span::default()));
    }

    #[test]
    fn test_error_spans() {
        assert_eq!(parse_str("(a))"), Err(ParseError::UnbalancedClose(Span::new(3, 4))));
        assert_eq!(parse_str("x (a"), Err(ParseError::Unclosed(Span::new(2, 3))));
        assert_eq!(parse_str("(' b)"), Err(ParseError::MisplacedQuote(Span::new(1, 2))));
    }
}
