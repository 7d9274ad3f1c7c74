//! Core script value types and error handling.
//!
//! This crate provides the foundational types for a deferred-value runtime,
//! including value representation, callables, member-bearing objects, and
//! error types.
//!
//! # Overview
//!
//! - [`Value`] - Tagged representation of script values
//! - [`Function`] - Callable values
//! - [`Object`] / [`Member`] - Objects with fields and (possibly throwing) getters
//! - [`ScriptError`] / [`ErrorKind`] - Script errors carried as rejection reasons
//!
//! # Examples
//!
//! ```
//! use core_types::{ErrorKind, Object, ScriptError, Value};
//!
//! // Create script values
//! let num = Value::Int(42);
//! assert_eq!(num.type_of(), "number");
//!
//! // Objects carry named members whose access can fail
//! let obj = Object::new();
//! obj.set_field("answer", num);
//! assert!(obj.get("answer").is_ok());
//!
//! // Errors are values too
//! let error = ScriptError::new(ErrorKind::TypeError, "not callable");
//! assert_eq!(Value::Error(error).type_of(), "object");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod error;
mod function;
mod object;
mod value;

pub use error::{ErrorKind, ScriptError};
pub use function::Function;
pub use object::{Member, Object};
pub use value::Value;
