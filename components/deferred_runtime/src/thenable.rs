//! Then-capability detection.
//!
//! Adoption is duck-typed: any value exposing a callable `then` member can
//! be adopted, independent of its concrete type. Probing must not let member
//! access throw uncontrolled: an object's `then` can be a getter that
//! raises, and that failure belongs to the rejection path.

use crate::deferred::Deferred;
use core_types::{Function, ScriptError, Value};

/// Outcome of probing a value for a then-capability.
pub(crate) enum ThenCapability {
    /// Plain value, no capability
    None,
    /// One of our own deferred values
    Native(Deferred),
    /// A foreign object with a callable `then` member
    Foreign(Function),
}

/// Probes `value` for a then-capability.
///
/// A getter throw during the member lookup propagates as `Err` and becomes
/// an adoption failure. A `then` member that exists but is not callable is
/// not a capability; the value takes the plain-value path.
pub(crate) fn probe(value: &Value) -> Result<ThenCapability, ScriptError> {
    match value {
        Value::NativeObject(_) => Ok(match Deferred::from_value(value) {
            Some(deferred) => ThenCapability::Native(deferred),
            None => ThenCapability::None,
        }),
        Value::Object(object) => match object.get("then")? {
            Some(Value::Function(then_fn)) => Ok(ThenCapability::Foreign(then_fn)),
            _ => Ok(ThenCapability::None),
        },
        _ => Ok(ThenCapability::None),
    }
}
