use crate::source::Span;
use crate::value::Value;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EnvError {
    #[error("Unbound symbol: '{0}'")]
    UnboundSymbol(String, Span), // Symbol name, span where lookup happened
}

impl EnvError {
    pub fn span(&self) -> Span {
        match self {
            EnvError::UnboundSymbol(_, span) => *span,
        }
    }
}

/// A single flat table of bindings. Used for call locals, closure snapshots and
/// the global namespace alike. Values are shared, so cloning the table copies
/// pointers and never the lists behind them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Environment {
    bindings: HashMap<String, Rc<Value>>,
}

impl Environment {
    pub fn new() -> Self {
        Environment::default()
    }

    /// Binds `name`, replacing any previous value.
    pub fn define(&mut self, name: String, value: Value) {
        self.bindings.insert(name, Rc::new(value));
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name).map(Rc::as_ref)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Gets a list of all identifiers bound here
    pub fn get_identifiers(&self) -> HashSet<String> {
        self.bindings.keys().cloned().collect()
    }
}

/// The lookup chain seen by one evaluation: locals, then the captured closure,
/// then globals. At top level there are no separate locals; the global namespace
/// plays that role.
#[derive(Debug, Default)]
pub struct Frame {
    locals: Option<Environment>,
    closure: Rc<Environment>,
}

impl Frame {
    pub fn top_level() -> Self {
        Frame::default()
    }

    /// Frame for a function call: fresh locals over the callee's snapshot.
    pub fn call(locals: Environment, closure: Rc<Environment>) -> Self {
        Frame {
            locals: Some(locals),
            closure,
        }
    }

    pub fn is_top_level(&self) -> bool {
        self.locals.is_none()
    }

    /// First match wins: locals, closure, globals.
    pub fn lookup<'a>(&'a self, name: &str, globals: &'a Environment) -> Option<&'a Value> {
        self.locals
            .as_ref()
            .and_then(|locals| locals.get(name))
            .or_else(|| self.closure.get(name))
            .or_else(|| globals.get(name))
    }

    pub fn resolve(&self, name: &str, globals: &Environment, span: Span) -> Result<Value, EnvError> {
        self.lookup(name, globals)
            .cloned()
            .ok_or_else(|| EnvError::UnboundSymbol(name.to_string(), span))
    }

    /// Writes into the innermost tier.
    pub fn define(&mut self, name: String, value: Value, globals: &mut Environment) {
        match &mut self.locals {
            Some(locals) => locals.define(name, value),
            None => globals.define(name, value),
        }
    }

    /// Owned copy of the innermost tier, frozen for a new closure.
    pub fn snapshot(&self, globals: &Environment) -> Environment {
        match &self.locals {
            Some(locals) => locals.clone(),
            None => globals.clone(),
        }
    }
}
