use crate::environment::{EnvError, Environment, Frame};
use crate::memo::{CallKey, MemoCache};
use crate::parser::parse_str;
use crate::primitives::{self, ArithOp};
use crate::source::Span;
use crate::types::{Node, Sexpr};
use crate::value::{Function, FunctionId, Value};
use std::collections::HashSet;
use std::rc::Rc;
use tracing::{debug, trace};

/// Default nesting limit for form evaluation.
pub const DEFAULT_MAX_DEPTH: usize = 1000;

// Stack growth for deep recursion: grow by 4 MiB once less than 128 KiB remains
const STACK_RED_ZONE: usize = 128 * 1024;
const STACK_GROW_SIZE: usize = 4 * 1024 * 1024;

// --- Evaluation Error ---
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    #[error(transparent)]
    EnvError(#[from] EnvError), // Symbol missing from every lookup tier
    #[error("Evaluation Error: unknown operation '{0}'")]
    UnknownOperation(String, Span),
    #[error("Evaluation Error: expected a function, but got a {0}")]
    NotAFunction(&'static str, Span),
    #[error("Evaluation Error: cannot evaluate an empty form")]
    EmptyForm(Span),
    #[error("Evaluation Error: expected a symbol, but got: {0}")]
    NotASymbol(String, Span),
    #[error("Evaluation Error: invalid special form - {0}")]
    InvalidSpecialForm(String, Span),
    #[error("Evaluation Error: invalid arguments - {0}")]
    InvalidArguments(String, Span),
    #[error("Evaluation Error: '{operation}' expects {expected}, got {found}")]
    TypeMismatch {
        operation: &'static str,
        expected: &'static str,
        found: &'static str,
        span: Span,
    },
    #[error("Evaluation Error: division by zero")]
    DivisionByZero(Span),
    #[error("Evaluation Error: integer overflow in '{0}'")]
    Overflow(&'static str, Span),
    #[error("Evaluation Error: no cond clause matched")]
    NoMatchingClause(Span),
    #[error("Evaluation Error: recursion limit of {0} exceeded")]
    RecursionLimit(usize, Span),
}

impl EvalError {
    pub fn span(&self) -> Span {
        match self {
            EvalError::EnvError(env_err) => env_err.span(),
            EvalError::UnknownOperation(_, span)
            | EvalError::NotAFunction(_, span)
            | EvalError::EmptyForm(span)
            | EvalError::NotASymbol(_, span)
            | EvalError::InvalidSpecialForm(_, span)
            | EvalError::InvalidArguments(_, span)
            | EvalError::TypeMismatch { span, .. }
            | EvalError::DivisionByZero(span)
            | EvalError::Overflow(_, span)
            | EvalError::NoMatchingClause(span)
            | EvalError::RecursionLimit(_, span) => *span,
        }
    }
}

// Result type alias for convenience
pub type EvalResult<T = Value> = Result<T, EvalError>;

/// Tags whose operands are not simply evaluated and passed along.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SpecialForm {
    Define,
    Lambda,
    Eq,
    Atom,
    Quote,
    Cons,
    Car,
    Cdr,
    Cond,
}

impl SpecialForm {
    const ALL: [SpecialForm; 9] = [
        SpecialForm::Define,
        SpecialForm::Lambda,
        SpecialForm::Eq,
        SpecialForm::Atom,
        SpecialForm::Quote,
        SpecialForm::Cons,
        SpecialForm::Car,
        SpecialForm::Cdr,
        SpecialForm::Cond,
    ];

    pub fn from_symbol(symbol: &str) -> Option<SpecialForm> {
        SpecialForm::ALL
            .into_iter()
            .find(|form| form.symbol() == symbol)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            SpecialForm::Define => "define",
            SpecialForm::Lambda => "lambda",
            SpecialForm::Eq => "eq?",
            SpecialForm::Atom => "atom?",
            SpecialForm::Quote => "quote",
            SpecialForm::Cons => "cons",
            SpecialForm::Car => "car",
            SpecialForm::Cdr => "cdr",
            SpecialForm::Cond => "cond",
        }
    }
}

/// Every reserved tag, for completion and display.
pub fn special_form_identifiers() -> HashSet<String> {
    SpecialForm::ALL
        .iter()
        .map(|form| form.symbol())
        .chain(["+", "-", "*", "/", "else"])
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Options {
    pub memoize: bool,
    pub max_depth: usize,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            memoize: true,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Observability record for a run.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct Profile {
    /// Function invocations that missed the cache and were actually evaluated.
    pub count: u64,
}

// Checks the operand count of a special form, yielding a fixed-size array
macro_rules! expect_operands {
    ($operands:expr, $count:literal, $form:expr, $span:expr) => {
        match <&[Node; $count]>::try_from($operands) {
            Ok(array) => array,
            Err(_) => {
                return Err(EvalError::InvalidSpecialForm(
                    format!(
                        "'{}' expects exactly {} operand(s), got {}",
                        $form.symbol(),
                        $count,
                        $operands.len()
                    ),
                    $span,
                ));
            }
        }
    };
}

/// One program run: the global namespace, the call cache and the profiler live
/// here, so separate interpreters never share state.
#[derive(Debug, Default)]
pub struct Interpreter {
    globals: Environment,
    cache: MemoCache,
    profile: Profile,
    options: Options,
    next_function_id: u64,
    depth: usize,
}

impl Interpreter {
    pub fn new() -> Self {
        Interpreter::default()
    }

    pub fn with_options(options: Options) -> Self {
        Interpreter {
            options,
            ..Interpreter::default()
        }
    }

    pub fn globals(&self) -> &Environment {
        &self.globals
    }

    pub fn profile(&self) -> Profile {
        self.profile
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Evaluates top-level expressions in order; the last value is the result.
    pub fn run(&mut self, program: &[Node]) -> EvalResult {
        let mut frame = Frame::top_level();
        let mut result = Value::Unit;
        for node in program {
            result = self.evaluate(node, &mut frame)?;
        }
        Ok(result)
    }

    /// Tokenizes, parses and runs program text against this session.
    pub fn run_source(&mut self, source: &str) -> Result<Value, crate::Error> {
        let program = parse_str(source)?;
        Ok(self.run(&program)?)
    }

    /// Evaluates a given node against `frame`, with this interpreter's globals as
    /// the outermost tier.
    pub fn evaluate(&mut self, node: &Node, frame: &mut Frame) -> EvalResult {
        match &node.kind {
            Sexpr::Integer(n) => Ok(Value::Integer(*n)),
            Sexpr::Float(x) => Ok(Value::Float(*x)),
            Sexpr::Symbol(name) => Ok(frame.resolve(name, &self.globals, node.span)?),
            Sexpr::List(elements) => {
                if self.depth >= self.options.max_depth {
                    return Err(EvalError::RecursionLimit(self.options.max_depth, node.span));
                }
                self.depth += 1;
                let result = stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || {
                    self.evaluate_form(elements, frame, node.span)
                });
                self.depth -= 1;
                result
            }
        }
    }

    fn evaluate_form(&mut self, elements: &[Node], frame: &mut Frame, span: Span) -> EvalResult {
        let Some((operator, operands)) = elements.split_last() else {
            return Err(EvalError::EmptyForm(span));
        };

        let Sexpr::Symbol(tag) = &operator.kind else {
            // Inline call, e.g. (5 ((x) (x x *) lambda))
            return match self.evaluate(operator, frame)? {
                Value::Function(function) => {
                    let args = self.evaluate_operands(operands, frame)?;
                    self.apply(&function, args, span)
                }
                other => Err(EvalError::NotAFunction(other.type_name(), operator.span)),
            };
        };

        if let Some(op) = ArithOp::from_symbol(tag) {
            let args = self.evaluate_operands(operands, frame)?;
            return primitives::fold_numbers(op, args, span);
        }
        if let Some(form) = SpecialForm::from_symbol(tag) {
            return self.evaluate_special_form(form, operands, frame, span);
        }
        match frame.lookup(tag, &self.globals).cloned() {
            Some(Value::Function(function)) => {
                let args = self.evaluate_operands(operands, frame)?;
                self.apply(&function, args, span)
            }
            Some(other) => Err(EvalError::NotAFunction(other.type_name(), operator.span)),
            None => Err(EvalError::UnknownOperation(tag.clone(), operator.span)),
        }
    }

    fn evaluate_operands(&mut self, operands: &[Node], frame: &mut Frame) -> EvalResult<Vec<Value>> {
        operands
            .iter()
            .map(|operand| self.evaluate(operand, frame))
            .collect()
    }

    fn evaluate_special_form(
        &mut self,
        form: SpecialForm,
        operands: &[Node],
        frame: &mut Frame,
        span: Span,
    ) -> EvalResult {
        match form {
            SpecialForm::Define => self.evaluate_define(operands, frame, span),
            SpecialForm::Lambda => self.evaluate_lambda(operands, frame, span),
            SpecialForm::Cond => self.evaluate_cond(operands, frame, span),
            SpecialForm::Quote => {
                let [quoted] = expect_operands!(operands, 1, form, span);
                Ok(Value::quote(quoted))
            }
            SpecialForm::Eq => {
                let [lhs, rhs] = expect_operands!(operands, 2, form, span);
                let lhs = self.evaluate(lhs, frame)?;
                let rhs = self.evaluate(rhs, frame)?;
                Ok(Value::Bool(lhs == rhs))
            }
            SpecialForm::Atom => {
                let [operand] = expect_operands!(operands, 1, form, span);
                let value = self.evaluate(operand, frame)?;
                Ok(Value::Bool(primitives::is_atom(&value)))
            }
            SpecialForm::Cons => {
                let [head, tail] = expect_operands!(operands, 2, form, span);
                let head = self.evaluate(head, frame)?;
                let tail = self.evaluate(tail, frame)?;
                Ok(primitives::cons(head, tail))
            }
            SpecialForm::Car => {
                let [operand] = expect_operands!(operands, 1, form, span);
                let value = self.evaluate(operand, frame)?;
                primitives::car(value, span)
            }
            SpecialForm::Cdr => {
                let [operand] = expect_operands!(operands, 1, form, span);
                let value = self.evaluate(operand, frame)?;
                primitives::cdr(value, span)
            }
        }
    }

    // (name value define)
    fn evaluate_define(&mut self, operands: &[Node], frame: &mut Frame, span: Span) -> EvalResult {
        let [name, value] = expect_operands!(operands, 2, SpecialForm::Define, span);
        let name = name
            .as_symbol()
            .ok_or_else(|| EvalError::NotASymbol(name.to_string(), name.span))?;
        let value = self.evaluate(value, frame)?;
        if frame.is_top_level() {
            debug!(name, value = %value, "global definition");
        }
        frame.define(name.to_string(), value, &mut self.globals);
        Ok(Value::Unit)
    }

    // ((params...) body... lambda)
    fn evaluate_lambda(&mut self, operands: &[Node], frame: &mut Frame, span: Span) -> EvalResult {
        let [params, body @ ..] = operands else {
            return Err(EvalError::InvalidSpecialForm(
                "'lambda' expects a parameter list and a body".to_string(),
                span,
            ));
        };
        if body.is_empty() {
            return Err(EvalError::InvalidSpecialForm(
                "'lambda' body cannot be empty".to_string(),
                span,
            ));
        }
        let Sexpr::List(param_nodes) = &params.kind else {
            return Err(EvalError::InvalidSpecialForm(
                format!("'lambda' expects a parameter list, got {}", params),
                params.span,
            ));
        };
        let params = param_nodes
            .iter()
            .map(|param| {
                param
                    .as_symbol()
                    .map(str::to_string)
                    .ok_or_else(|| EvalError::NotASymbol(param.to_string(), param.span))
            })
            .collect::<EvalResult<Vec<_>>>()?;

        let id = FunctionId(self.next_function_id);
        self.next_function_id += 1;
        let closure = Rc::new(frame.snapshot(&self.globals));
        debug!(%id, arity = params.len(), captured = closure.len(), "function created");

        Ok(Value::Function(Rc::new(Function {
            id,
            params,
            body: body.to_vec(),
            closure,
        })))
    }

    // ((condition value)... cond), first true clause wins
    fn evaluate_cond(&mut self, clauses: &[Node], frame: &mut Frame, span: Span) -> EvalResult {
        for clause in clauses {
            let Sexpr::List(parts) = &clause.kind else {
                return Err(EvalError::InvalidSpecialForm(
                    format!("'cond' clause must be a (condition value) list, got {}", clause),
                    clause.span,
                ));
            };
            let [condition, value] = expect_operands!(parts.as_slice(), 2, SpecialForm::Cond, clause.span);
            let matched = match condition.as_symbol() {
                Some("else") => true,
                _ => self.evaluate(condition, frame)? == Value::Bool(true),
            };
            if matched {
                return self.evaluate(value, frame);
            }
        }
        Err(EvalError::NoMatchingClause(span))
    }

    /// Calls `function`, consulting the memo cache first.
    pub fn apply(&mut self, function: &Rc<Function>, args: Vec<Value>, span: Span) -> EvalResult {
        if args.len() != function.params.len() {
            return Err(EvalError::InvalidArguments(
                format!(
                    "function expects {} argument(s), got {}",
                    function.params.len(),
                    args.len()
                ),
                span,
            ));
        }

        let key = if self.options.memoize {
            CallKey::new(function.id, &args)
        } else {
            None
        };
        if let Some(key) = &key
            && let Some(cached) = self.cache.get(key)
        {
            trace!(id = %function.id, "cache hit");
            return Ok(cached.clone());
        }

        trace!(id = %function.id, cacheable = key.is_some(), "cache miss");
        self.profile.count += 1;

        let mut locals = Environment::new();
        for (param, arg) in function.params.iter().zip(args) {
            locals.define(param.clone(), arg);
        }
        let mut frame = Frame::call(locals, function.closure.clone());
        let mut result = Value::Unit;
        for node in &function.body {
            result = self.evaluate(node, &mut frame)?;
        }

        if let Some(key) = key {
            self.cache.insert(key, result.clone());
        }
        Ok(result)
    }
}
