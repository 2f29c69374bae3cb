use crate::evaluator::{EvalError, EvalResult};
use crate::source::Span;
use crate::value::Value;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl ArithOp {
    pub fn from_symbol(symbol: &str) -> Option<ArithOp> {
        match symbol {
            "+" => Some(ArithOp::Add),
            "-" => Some(ArithOp::Subtract),
            "*" => Some(ArithOp::Multiply),
            "/" => Some(ArithOp::Divide),
            _ => None,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            ArithOp::Add => "+",
            ArithOp::Subtract => "-",
            ArithOp::Multiply => "*",
            ArithOp::Divide => "/",
        }
    }
}

/// Left fold of the operands through `op`. A single operand is returned as is.
pub fn fold_numbers(op: ArithOp, args: Vec<Value>, span: Span) -> EvalResult<Value> {
    let mut args = args.into_iter();
    let first = args.next().ok_or_else(|| {
        EvalError::InvalidArguments(
            format!("'{}' expects at least one operand, got 0", op.symbol()),
            span,
        )
    })?;
    args.try_fold(first, |acc, value| apply_binary(op, acc, value, span))
}

fn apply_binary(op: ArithOp, lhs: Value, rhs: Value, span: Span) -> EvalResult<Value> {
    match (lhs, rhs) {
        (Value::Integer(a), Value::Integer(b)) => integer_op(op, a, b, span),
        (Value::List(mut a), Value::List(b)) if op == ArithOp::Add => {
            a.extend(b);
            Ok(Value::List(a))
        }
        (lhs, rhs) => match (lhs.as_f64(), rhs.as_f64()) {
            (Some(a), Some(b)) => float_op(op, a, b, span),
            (None, _) => Err(type_mismatch(op, &lhs, span)),
            (_, None) => Err(type_mismatch(op, &rhs, span)),
        },
    }
}

fn type_mismatch(op: ArithOp, found: &Value, span: Span) -> EvalError {
    EvalError::TypeMismatch {
        operation: op.symbol(),
        expected: "numbers",
        found: found.type_name(),
        span,
    }
}

fn integer_op(op: ArithOp, a: i64, b: i64, span: Span) -> EvalResult<Value> {
    let result = match op {
        ArithOp::Add => a.checked_add(b),
        ArithOp::Subtract => a.checked_sub(b),
        ArithOp::Multiply => a.checked_mul(b),
        // True division, never truncating
        ArithOp::Divide => return float_op(op, a as f64, b as f64, span),
    };
    result
        .map(Value::Integer)
        .ok_or(EvalError::Overflow(op.symbol(), span))
}

fn float_op(op: ArithOp, a: f64, b: f64, span: Span) -> EvalResult<Value> {
    Ok(Value::Float(match op {
        ArithOp::Add => a + b,
        ArithOp::Subtract => a - b,
        ArithOp::Multiply => a * b,
        ArithOp::Divide => {
            if b == 0.0 {
                return Err(EvalError::DivisionByZero(span));
            }
            a / b
        }
    }))
}

/// Prepends onto a list; any other tail makes a pair.
pub fn cons(head: Value, tail: Value) -> Value {
    match tail {
        Value::List(mut list) => {
            list.insert(0, head);
            Value::List(list)
        }
        tail => Value::pair(head, tail),
    }
}

pub fn car(value: Value, span: Span) -> EvalResult<Value> {
    match value {
        Value::List(list) => list.into_iter().next().ok_or_else(|| {
            EvalError::InvalidArguments("'car' of an empty list".to_string(), span)
        }),
        Value::Pair(head, _) => Ok(*head),
        other => Err(EvalError::TypeMismatch {
            operation: "car",
            expected: "a list or pair",
            found: other.type_name(),
            span,
        }),
    }
}

/// The rest of a list (empty stays empty) or the second half of a pair.
pub fn cdr(value: Value, span: Span) -> EvalResult<Value> {
    match value {
        Value::List(list) => Ok(Value::List(list.into_iter().skip(1).collect())),
        Value::Pair(_, tail) => Ok(*tail),
        other => Err(EvalError::TypeMismatch {
            operation: "cdr",
            expected: "a list or pair",
            found: other.type_name(),
            span,
        }),
    }
}

pub fn is_atom(value: &Value) -> bool {
    !matches!(value, Value::List(_))
}
