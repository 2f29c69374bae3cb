use crate::value::{FunctionId, Value};
use std::collections::HashMap;

/// Hashable image of an argument value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ArgKey {
    Integer(i64),
    Float(u64), // Bit pattern; integral floats use Integer instead
    Bool(bool),
    Symbol(String),
    List(Vec<ArgKey>),
    Pair(Box<ArgKey>, Box<ArgKey>),
    Unit,
}

impl ArgKey {
    /// `None` when the value cannot key the cache (functions, NaN).
    pub fn from_value(value: &Value) -> Option<ArgKey> {
        Some(match value {
            Value::Integer(n) => ArgKey::Integer(*n),
            Value::Float(x) => float_key(*x)?,
            Value::Bool(b) => ArgKey::Bool(*b),
            Value::Symbol(s) => ArgKey::Symbol(s.clone()),
            Value::List(values) => ArgKey::List(
                values
                    .iter()
                    .map(ArgKey::from_value)
                    .collect::<Option<Vec<_>>>()?,
            ),
            Value::Pair(head, tail) => ArgKey::Pair(
                Box::new(ArgKey::from_value(head)?),
                Box::new(ArgKey::from_value(tail)?),
            ),
            Value::Unit => ArgKey::Unit,
            Value::Function(_) => return None,
        })
    }
}

// Equal numbers must hash equal, so 2.0 shares the key of 2.
fn float_key(x: f64) -> Option<ArgKey> {
    if x.is_nan() {
        None
    } else if x.fract() == 0.0 && x >= i64::MIN as f64 && x < i64::MAX as f64 {
        Some(ArgKey::Integer(x as i64))
    } else {
        Some(ArgKey::Float(x.to_bits()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallKey {
    function: FunctionId,
    args: Vec<ArgKey>,
}

impl CallKey {
    pub fn new(function: FunctionId, args: &[Value]) -> Option<CallKey> {
        let args = args
            .iter()
            .map(ArgKey::from_value)
            .collect::<Option<Vec<_>>>()?;
        Some(CallKey { function, args })
    }
}

/// Results of completed calls. Entries are never evicted.
#[derive(Debug, Default)]
pub struct MemoCache {
    entries: HashMap<CallKey, Value>,
}

impl MemoCache {
    pub fn new() -> Self {
        MemoCache::default()
    }

    pub fn get(&self, key: &CallKey) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: CallKey, value: Value) {
        self.entries.insert(key, value);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::Environment;
    use crate::value::Function;
    use std::rc::Rc;

    fn function_value() -> Value {
        Value::Function(Rc::new(Function {
            id: FunctionId(0),
            params: vec![],
            body: vec![],
            closure: Rc::new(Environment::new()),
        }))
    }

    #[test]
    fn test_integral_float_shares_integer_key() {
        assert_eq!(
            ArgKey::from_value(&Value::Float(2.0)),
            ArgKey::from_value(&Value::Integer(2))
        );
        assert_eq!(
            ArgKey::from_value(&Value::Float(-0.0)),
            Some(ArgKey::Integer(0))
        );
        assert_ne!(
            ArgKey::from_value(&Value::Float(2.5)),
            ArgKey::from_value(&Value::Integer(2))
        );
    }

    #[test]
    fn test_uncacheable_values() {
        assert_eq!(ArgKey::from_value(&Value::Float(f64::NAN)), None);
        assert_eq!(ArgKey::from_value(&function_value()), None);
        // A function buried in a list still poisons the key
        assert_eq!(
            ArgKey::from_value(&Value::List(vec![Value::Integer(1), function_value()])),
            None
        );
        assert_eq!(
            CallKey::new(FunctionId(1), &[Value::Integer(1), function_value()]),
            None
        );
    }

    #[test]
    fn test_compound_keys() {
        let list = Value::List(vec![Value::symbol("a"), Value::Integer(1)]);
        assert_eq!(
            ArgKey::from_value(&list),
            Some(ArgKey::List(vec![
                ArgKey::Symbol("a".to_string()),
                ArgKey::Integer(1)
            ]))
        );
        assert!(ArgKey::from_value(&Value::pair(Value::Bool(true), Value::Unit)).is_some());
    }

    #[test]
    fn test_cache_keys_on_identity_and_args() {
        let mut cache = MemoCache::new();
        let key = CallKey::new(FunctionId(1), &[Value::Integer(5)]).unwrap();
        cache.insert(key.clone(), Value::Integer(25));

        assert_eq!(cache.get(&key), Some(&Value::Integer(25)));
        let other_function = CallKey::new(FunctionId(2), &[Value::Integer(5)]).unwrap();
        assert_eq!(cache.get(&other_function), None);
        let other_args = CallKey::new(FunctionId(1), &[Value::Integer(6)]).unwrap();
        assert_eq!(cache.get(&other_args), None);
        assert_eq!(cache.len(), 1);
    }
}
