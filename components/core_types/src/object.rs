//! Member-bearing objects.
//!
//! Objects hold named members that are either plain fields or getters. A
//! getter runs arbitrary code on access and may throw, so member lookup
//! returns a `Result`. This is what makes probing an arbitrary value for a
//! capability a potentially-throwing operation.

use crate::error::ScriptError;
use crate::function::Function;
use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// One named member of an [`Object`].
#[derive(Debug, Clone)]
pub enum Member {
    /// A plain stored value
    Field(Value),
    /// A computed member; invoked with no arguments on access
    Getter(Function),
}

/// A member-bearing object.
///
/// Cloning an `Object` aliases the same underlying member table, matching
/// reference semantics: two clones observe each other's mutations and compare
/// equal by identity.
///
/// # Examples
///
/// ```
/// use core_types::{Object, Value};
///
/// let obj = Object::new();
/// obj.set_field("status", Value::String("fulfilled".to_string()));
/// let status = obj.get("status").unwrap();
/// assert_eq!(status, Some(Value::String("fulfilled".to_string())));
/// assert_eq!(obj.get("missing").unwrap(), None);
/// ```
#[derive(Clone, Default)]
pub struct Object {
    members: Rc<RefCell<HashMap<String, Member>>>,
}

impl Object {
    /// Creates a new object with no members.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a plain field under `name`, replacing any existing member.
    pub fn set_field(&self, name: impl Into<String>, value: Value) {
        self.members
            .borrow_mut()
            .insert(name.into(), Member::Field(value));
    }

    /// Stores a getter under `name`, replacing any existing member.
    ///
    /// The getter is invoked with no arguments on every access and its
    /// result (or thrown error) becomes the outcome of the lookup.
    pub fn set_getter(&self, name: impl Into<String>, getter: Function) {
        self.members
            .borrow_mut()
            .insert(name.into(), Member::Getter(getter));
    }

    /// Looks up the member named `name`.
    ///
    /// Returns `Ok(None)` if the member does not exist. A getter member is
    /// invoked; if it throws, the error propagates to the caller.
    pub fn get(&self, name: &str) -> Result<Option<Value>, ScriptError> {
        // Clone out of the borrow before invoking a getter: the getter may
        // re-enter this object.
        let member = self.members.borrow().get(name).cloned();
        match member {
            None => Ok(None),
            Some(Member::Field(value)) => Ok(Some(value)),
            Some(Member::Getter(getter)) => getter.call(vec![]).map(Some),
        }
    }

    /// Returns true if `self` and `other` alias the same object.
    pub fn ptr_eq(&self, other: &Object) -> bool {
        Rc::ptr_eq(&self.members, &other.members)
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let members = self.members.borrow();
        let mut names: Vec<&str> = members.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("Object").field("members", &names).finish()
    }
}
