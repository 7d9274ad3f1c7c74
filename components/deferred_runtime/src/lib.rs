//! Deferred-value runtime.
//!
//! This crate provides a deferred-value primitive: an object representing
//! the eventual result of an asynchronous operation, with chaining, error
//! propagation, and adoption of other eventual values.
//!
//! # Overview
//!
//! - [`Deferred`] - The deferred value: state machine plus chaining protocol
//! - [`Resolver`] - The settlement pair (resolve/reject) of one value
//! - [`TaskQueue`] / [`Schedule`] - Deferred execution of handler dispatch
//! - [`combinators`] - Aggregate operations built on the public contract
//!
//! Handlers registered with [`Deferred::then`] never run in the synchronous
//! turn that registered them or settled the value; dispatch always goes
//! through the scheduler, in registration order. Settlement is final: the
//! first resolve or reject wins and every later call is a no-op.
//!
//! Resolving with a value that itself carries a then-capability (another
//! deferred value, or any object with a callable `then` member) adopts it:
//! the outer value stays pending until the inner one settles, then mirrors
//! its outcome exactly.
//!
//! # Examples
//!
//! ## Chaining
//!
//! ```
//! use deferred_runtime::{Deferred, TaskQueue};
//! use core_types::{Function, Value};
//!
//! let queue = TaskQueue::new();
//! let deferred = Deferred::new(queue.scheduler(), |resolver| {
//!     resolver.resolve(Value::Int(5));
//!     Ok(())
//! });
//! let doubled = deferred.then(
//!     Some(Function::new(|args| match args.first() {
//!         Some(Value::Int(n)) => Ok(Value::Int(n * 2)),
//!         _ => Ok(Value::Undefined),
//!     })),
//!     None,
//! );
//!
//! queue.run_until_idle();
//! assert_eq!(doubled.settled_value(), Some(Value::Int(10)));
//! ```
//!
//! ## Catching a rejection
//!
//! ```
//! use deferred_runtime::{Deferred, DeferredState, TaskQueue};
//! use core_types::{Function, Value};
//!
//! let queue = TaskQueue::new();
//! let caught = Deferred::rejected(queue.scheduler(), Value::String("boom".to_string()))
//!     .catch(Function::new(|args| match args.first() {
//!         Some(reason) => Ok(reason.clone()),
//!         None => Ok(Value::Undefined),
//!     }));
//!
//! queue.run_until_idle();
//! assert_eq!(caught.state(), DeferredState::Fulfilled);
//! assert_eq!(caught.settled_value(), Some(Value::String("boom".to_string())));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod combinators;
pub mod deferred;
pub mod scheduler;
mod thenable;

// Re-export main types at crate root
pub use deferred::{Deferred, DeferredState, HandlerRecord, Resolver};
pub use scheduler::{Schedule, Task, TaskQueue};
