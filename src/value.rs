use crate::environment::Environment;
use crate::types::{Node, Sexpr};
use std::fmt;
use std::rc::Rc;

/// Identity handed to every function value when it is created.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FunctionId(pub u64);

impl fmt::Display for FunctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A closure: parameters, body, and the frozen copy of the scope it was made in.
#[derive(Debug)]
pub struct Function {
    pub id: FunctionId,
    pub params: Vec<String>,
    pub body: Vec<Node>,
    pub closure: Rc<Environment>,
}

/// Runtime values produced by evaluation.
#[derive(Debug, Clone)]
pub enum Value {
    Integer(i64),
    Float(f64),
    Bool(bool),
    Symbol(String), // Only reachable through quote
    List(Vec<Value>),
    Pair(Box<Value>, Box<Value>),
    Function(Rc<Function>),
    Unit,
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::Bool(_) => "boolean",
            Value::Symbol(_) => "symbol",
            Value::List(_) => "list",
            Value::Pair(_, _) => "pair",
            Value::Function(_) => "function",
            Value::Unit => "void",
        }
    }

    pub fn pair(head: Value, tail: Value) -> Value {
        Value::Pair(Box::new(head), Box::new(tail))
    }

    pub fn symbol(name: impl Into<String>) -> Value {
        Value::Symbol(name.into())
    }

    /// Numeric view used for mixed integer/float comparison.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(n) => Some(*n as f64),
            Value::Float(x) => Some(*x),
            _ => None,
        }
    }

    /// Converts source text into data, leaving symbols unresolved.
    pub fn quote(node: &Node) -> Value {
        match &node.kind {
            Sexpr::Integer(n) => Value::Integer(*n),
            Sexpr::Float(x) => Value::Float(*x),
            Sexpr::Symbol(s) => Value::Symbol(s.clone()),
            Sexpr::List(nodes) => Value::List(nodes.iter().map(Value::quote).collect()),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Integer(_) | Value::Float(_), Value::Integer(_) | Value::Float(_)) => {
                self.as_f64() == other.as_f64()
            }
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Pair(h1, t1), Value::Pair(h2, t2)) => h1 == h2 && t1 == t2,
            (Value::Function(f1), Value::Function(f2)) => Rc::ptr_eq(f1, f2),
            (Value::Unit, Value::Unit) => true,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{:?}", x),
            Value::Bool(b) => write!(f, "{}", if *b { "#t" } else { "#f" }),
            Value::Symbol(s) => write!(f, "{}", s),
            Value::List(list) => {
                write!(f, "(")?;
                for (i, value) in list.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", value)?;
                }
                write!(f, ")")
            }
            Value::Pair(head, tail) => write!(f, "({} . {})", head, tail),
            Value::Function(function) => write!(f, "#<lambda:{}>", function.id),
            Value::Unit => write!(f, "#<void>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_str;

    #[test]
    fn test_numeric_equality_crosses_representation() {
        assert_eq!(Value::Integer(2), Value::Float(2.0));
        assert_ne!(Value::Integer(2), Value::Float(2.5));
        assert_ne!(Value::Float(f64::NAN), Value::Float(f64::NAN));
    }

    #[test]
    fn test_cross_type_is_unequal() {
        assert_ne!(Value::Integer(1), Value::Bool(true));
        assert_ne!(Value::Integer(2), Value::symbol("a"));
        assert_ne!(Value::List(vec![]), Value::Unit);
        assert_ne!(
            Value::List(vec![Value::Integer(1), Value::Integer(2)]),
            Value::pair(Value::Integer(1), Value::Integer(2))
        );
    }

    #[test]
    fn test_quote_keeps_symbols() {
        let nodes = parse_str("(a (1 2.5) b)").unwrap();
        assert_eq!(
            Value::quote(&nodes[0]),
            Value::List(vec![
                Value::symbol("a"),
                Value::List(vec![Value::Integer(1), Value::Float(2.5)]),
                Value::symbol("b"),
            ])
        );
    }

    #[test]
    fn test_display() {
        let value = Value::List(vec![
            Value::Integer(1),
            Value::Float(1.5),
            Value::Bool(false),
            Value::pair(Value::symbol("a"), Value::Integer(2)),
            Value::List(vec![]),
        ]);
        assert_eq!(value.to_string(), "(1 1.5 #f (a . 2) ())");
        assert_eq!(Value::Float(2.0).to_string(), "2.0");
        assert_eq!(Value::Unit.to_string(), "#<void>");
    }
}
