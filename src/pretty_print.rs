use crate::{EnvError, Error, EvalError, ParseError, Span};
use ariadne::{Label, Report, ReportKind, Source};
use std::io;

// Builds and prints one single-label report against `input`.
fn report(name: &str, input: &str, span: Span, message: String, label: String) -> io::Result<()> {
    Report::build(ReportKind::Error, (name, span.to_range()))
        .with_message(message)
        .with_label(Label::new((name, span.to_range())).with_message(label))
        .finish()
        .eprint((name, Source::from(input)))
}

impl EvalError {
    pub fn pretty_print(&self, name: &str, input: &str) -> io::Result<()> {
        let (message, label) = match self {
            EvalError::EnvError(EnvError::UnboundSymbol(symbol, _)) => (
                format!("Unbound symbol `{}`", symbol),
                "Not defined locally, in the closure, or globally".to_string(),
            ),
            EvalError::UnknownOperation(op, _) => (
                format!("Unknown operation `{}`", op),
                "Not a special form, an arithmetic operator, or a bound function".to_string(),
            ),
            EvalError::NotAFunction(found, _) => (
                "Not a function".to_string(),
                format!("This evaluates to a {}, which cannot be called", found),
            ),
            EvalError::EmptyForm(_) => (
                "Empty form".to_string(),
                "An empty list has no operator to apply".to_string(),
            ),
            EvalError::NotASymbol(found, _) => (
                format!("Not a symbol: {}", found),
                "Expected a bare symbol here".to_string(),
            ),
            EvalError::InvalidSpecialForm(message, _) => (
                "Invalid special form".to_string(),
                message.clone(),
            ),
            EvalError::InvalidArguments(message, _) => {
                ("Invalid arguments".to_string(), message.clone())
            }
            EvalError::TypeMismatch {
                operation,
                expected,
                found,
                ..
            } => (
                format!("Type mismatch in `{}`", operation),
                format!("Expected {}, found {}", expected, found),
            ),
            EvalError::DivisionByZero(_) => (
                "Division by zero".to_string(),
                "The divisor evaluates to zero".to_string(),
            ),
            EvalError::Overflow(operation, _) => (
                format!("Integer overflow in `{}`", operation),
                "The result does not fit in 64 bits".to_string(),
            ),
            EvalError::NoMatchingClause(_) => (
                "No cond clause matched".to_string(),
                "Add an `else` clause to cover the remaining cases".to_string(),
            ),
            EvalError::RecursionLimit(limit, _) => (
                format!("Recursion limit of {} exceeded", limit),
                "Evaluation nested too deeply here".to_string(),
            ),
        };
        report(name, input, self.span(), message, label)
    }
}

impl ParseError {
    pub fn pretty_print(&self, name: &str, input: &str) -> io::Result<()> {
        let (message, label) = match self {
            ParseError::UnbalancedClose(_) => ("Unbalanced expression", "This ')' closes nothing"),
            ParseError::Unclosed(_) => ("Unbalanced expression", "This '(' is never closed"),
            ParseError::MisplacedQuote(_) => ("Misplaced quote", "Nothing precedes this quote mark"),
        };
        report(name, input, self.span(), message.to_string(), label.to_string())
    }
}

impl Error {
    pub fn pretty_print(&self, name: &str, input: &str) -> io::Result<()> {
        match self {
            Error::Parse(err) => err.pretty_print(name, input),
            Error::Eval(err) => err.pretty_print(name, input),
        }
    }
}
