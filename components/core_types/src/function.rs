//! Callable values.

use crate::error::ScriptError;
use crate::value::Value;
use std::fmt;
use std::rc::Rc;

/// A function that can be called with arguments and returns a Result.
///
/// An `Err` return models a thrown error. Cloning a `Function` aliases the
/// same underlying callable; callables are shared between values and may be
/// re-entered through adoption chains, which is why the closure is `Fn`
/// rather than `FnMut`.
///
/// # Examples
///
/// ```
/// use core_types::{Function, Value};
///
/// let double = Function::new(|args| match args.first() {
///     Some(Value::Int(n)) => Ok(Value::Int(n * 2)),
///     _ => Ok(Value::Undefined),
/// });
/// assert_eq!(double.call(vec![Value::Int(21)]).unwrap(), Value::Int(42));
/// ```
#[derive(Clone)]
pub struct Function {
    callback: Rc<dyn Fn(Vec<Value>) -> Result<Value, ScriptError>>,
}

impl Function {
    /// Creates a new Function from a closure.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Vec<Value>) -> Result<Value, ScriptError> + 'static,
    {
        Self {
            callback: Rc::new(f),
        }
    }

    /// Calls the function with the given arguments.
    pub fn call(&self, args: Vec<Value>) -> Result<Value, ScriptError> {
        (self.callback)(args)
    }

    /// Returns true if `self` and `other` alias the same underlying callable.
    pub fn ptr_eq(&self, other: &Function) -> bool {
        Rc::ptr_eq(&self.callback, &other.callback)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Function {{ ... }}")
    }
}
