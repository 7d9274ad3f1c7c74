//! Deferred value implementation.
//!
//! This module provides the deferred-value state machine with chaining
//! support: an object representing the eventual result of an asynchronous
//! operation. Handlers never run in the synchronous turn that registered
//! them; dispatch always goes through the injected scheduler.

use crate::scheduler::{Schedule, Task};
use crate::thenable::{probe, ThenCapability};
use core_types::{Function, ScriptError, Value};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

/// The state of a deferred value.
///
/// A deferred value transitions out of `Pending` at most once. Once settled
/// (Fulfilled or Rejected), it cannot change state.
#[derive(Debug, Clone, PartialEq)]
pub enum DeferredState {
    /// The initial state; neither fulfilled nor rejected.
    Pending,
    /// The value has been resolved with a result.
    Fulfilled,
    /// The value has been rejected with a reason.
    Rejected,
}

/// One `then`-style registration waiting for settlement.
///
/// Holds the two optional handlers and the settlement pair of the downstream
/// value created by that `then` call. The upstream value owns its records;
/// the continuation points only downstream, so the ownership graph is
/// acyclic.
#[derive(Debug)]
pub struct HandlerRecord {
    /// Handler for the fulfilled outcome
    pub on_fulfilled: Option<Function>,
    /// Handler for the rejected outcome
    pub on_rejected: Option<Function>,
    /// Settlement pair of the downstream value
    pub continuation: Resolver,
}

struct Inner {
    state: DeferredState,
    settled: Option<Value>,
    handler_queue: Vec<HandlerRecord>,
    // Weak link to the value currently being adopted from, kept only while
    // an adoption is in flight. Used to detect chaining cycles.
    adopting_from: Option<Weak<RefCell<Inner>>>,
}

/// The settlement pair of one deferred value.
///
/// A `Resolver` carries both settlement functions and a shared once-flag:
/// after the first effective `resolve` or `reject` through a pair, every
/// later call through the same pair (or a clone of it) is a no-op. The
/// flag is per pair, not per value: each thenable adoption is wired
/// through a fresh pair, so a misbehaving thenable that calls back twice
/// cannot settle the value twice either.
#[derive(Clone)]
pub struct Resolver {
    target: Rc<RefCell<Inner>>,
    scheduler: Rc<dyn Schedule>,
    used: Rc<Cell<bool>>,
}

impl Resolver {
    fn new(deferred: &Deferred) -> Self {
        Self {
            target: Rc::clone(&deferred.inner),
            scheduler: Rc::clone(&deferred.scheduler),
            used: Rc::new(Cell::new(false)),
        }
    }

    fn fresh_pair(target: &Rc<RefCell<Inner>>, scheduler: &Rc<dyn Schedule>) -> Self {
        Self {
            target: Rc::clone(target),
            scheduler: Rc::clone(scheduler),
            used: Rc::new(Cell::new(false)),
        }
    }

    /// Resolves the target with a value.
    ///
    /// If the value carries a then-capability the target adopts it instead
    /// of fulfilling directly: it stays Pending until the adopted value
    /// settles and then mirrors its outcome exactly.
    ///
    /// No-op if this pair was already used or the target is settled.
    pub fn resolve(&self, value: Value) {
        if self.used.replace(true) {
            return;
        }
        resolve_value(&self.target, &self.scheduler, value);
    }

    /// Rejects the target with a reason.
    ///
    /// Rejection never adopts, even if the reason carries a then-capability.
    ///
    /// No-op if this pair was already used or the target is settled.
    pub fn reject(&self, reason: Value) {
        if self.used.replace(true) {
            return;
        }
        settle(&self.target, &self.scheduler, DeferredState::Rejected, reason);
    }
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("used", &self.used.get())
            .finish_non_exhaustive()
    }
}

/// A deferred value.
///
/// Represents the eventual completion (or failure) of an asynchronous
/// operation and its resulting value. Cloning a `Deferred` produces another
/// handle onto the same shared state.
///
/// All handler dispatch goes through the scheduler supplied at construction;
/// downstream values created by [`then`](Deferred::then) inherit it.
///
/// # Examples
///
/// ```
/// use deferred_runtime::{Deferred, DeferredState, TaskQueue};
/// use core_types::Value;
///
/// let queue = TaskQueue::new();
/// let deferred = Deferred::new(queue.scheduler(), |resolver| {
///     resolver.resolve(Value::Int(42));
///     Ok(())
/// });
/// assert_eq!(deferred.state(), DeferredState::Fulfilled);
/// assert_eq!(deferred.settled_value(), Some(Value::Int(42)));
/// ```
#[derive(Clone)]
pub struct Deferred {
    inner: Rc<RefCell<Inner>>,
    scheduler: Rc<dyn Schedule>,
}

impl Deferred {
    fn pending(scheduler: Rc<dyn Schedule>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                state: DeferredState::Pending,
                settled: None,
                handler_queue: Vec::new(),
                adopting_from: None,
            })),
            scheduler,
        }
    }

    /// Creates a new deferred value and synchronously runs `initializer`
    /// with its settlement pair.
    ///
    /// An `Err` returned by the initializer is routed through `reject` with
    /// the error reified as [`Value::Error`]; if the initializer already
    /// settled the value, the late rejection is a no-op. An initializer
    /// that never settles leaves the value Pending forever.
    pub fn new<F>(scheduler: Rc<dyn Schedule>, initializer: F) -> Self
    where
        F: FnOnce(Resolver) -> Result<(), ScriptError>,
    {
        let deferred = Self::pending(scheduler);
        let resolver = Resolver::new(&deferred);
        if let Err(error) = initializer(resolver.clone()) {
            resolver.reject(Value::Error(error));
        }
        deferred
    }

    /// Creates a deferred value resolved with `value`.
    ///
    /// If `value` carries a then-capability the result adopts it rather
    /// than fulfilling directly, like any resolve.
    pub fn resolved(scheduler: Rc<dyn Schedule>, value: Value) -> Self {
        let deferred = Self::pending(scheduler);
        Resolver::new(&deferred).resolve(value);
        deferred
    }

    /// Creates a deferred value rejected with `reason`.
    pub fn rejected(scheduler: Rc<dyn Schedule>, reason: Value) -> Self {
        let deferred = Self::pending(scheduler);
        Resolver::new(&deferred).reject(reason);
        deferred
    }

    /// Adds handlers for the fulfilled and/or rejected outcome.
    ///
    /// Returns the downstream deferred value immediately and synchronously,
    /// in every state. The handlers themselves never run inline, not even
    /// when this value is already settled at registration time; dispatch is
    /// always scheduled.
    ///
    /// An absent handler passes the settlement through unchanged, so a
    /// rejection propagates past `then` calls that supply no rejection
    /// handler.
    ///
    /// # Examples
    ///
    /// ```
    /// use deferred_runtime::{Deferred, TaskQueue};
    /// use core_types::{Function, Value};
    ///
    /// let queue = TaskQueue::new();
    /// let doubled = Deferred::resolved(queue.scheduler(), Value::Int(21)).then(
    ///     Some(Function::new(|args| match args.first() {
    ///         Some(Value::Int(n)) => Ok(Value::Int(n * 2)),
    ///         _ => Ok(Value::Undefined),
    ///     })),
    ///     None,
    /// );
    /// assert_eq!(doubled.settled_value(), None);
    /// queue.run_until_idle();
    /// assert_eq!(doubled.settled_value(), Some(Value::Int(42)));
    /// ```
    pub fn then(&self, on_fulfilled: Option<Function>, on_rejected: Option<Function>) -> Deferred {
        let chained = Deferred::pending(Rc::clone(&self.scheduler));
        self.register(HandlerRecord {
            on_fulfilled,
            on_rejected,
            continuation: Resolver::new(&chained),
        });
        chained
    }

    /// Adds a handler for the rejected outcome.
    ///
    /// Sugar for `then(None, Some(on_rejected))`.
    pub fn catch(&self, on_rejected: Function) -> Deferred {
        self.then(None, Some(on_rejected))
    }

    /// Returns the current state.
    pub fn state(&self) -> DeferredState {
        self.inner.borrow().state.clone()
    }

    /// Returns the fulfillment value or rejection reason, if settled.
    pub fn settled_value(&self) -> Option<Value> {
        self.inner.borrow().settled.clone()
    }

    /// Returns the number of handler records waiting for settlement.
    pub fn pending_handlers(&self) -> usize {
        self.inner.borrow().handler_queue.len()
    }

    /// Wraps this handle into a [`Value`] so a deferred value can itself be
    /// a fulfillment value, a handler result, or a combinator input.
    pub fn to_value(&self) -> Value {
        Value::NativeObject(Rc::new(RefCell::new(self.clone())))
    }

    /// Recovers a `Deferred` handle from a [`Value`] produced by
    /// [`to_value`](Deferred::to_value).
    pub fn from_value(value: &Value) -> Option<Deferred> {
        match value {
            Value::NativeObject(object) => object.borrow().downcast_ref::<Deferred>().cloned(),
            _ => None,
        }
    }

    /// Appends a record while Pending, or schedules its dispatch when
    /// already settled. Registration after settlement still defers to a
    /// later turn, never runs inline.
    fn register(&self, record: HandlerRecord) {
        let settled = {
            let mut inner = self.inner.borrow_mut();
            if matches!(inner.state, DeferredState::Pending) {
                inner.handler_queue.push(record);
                None
            } else {
                let value = inner.settled.clone().unwrap_or(Value::Undefined);
                Some((inner.state.clone(), value, record))
            }
        };
        if let Some((state, value, record)) = settled {
            schedule_record(&self.scheduler, state, value, record);
        }
    }
}

impl fmt::Debug for Deferred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Deferred")
            .field("state", &inner.state)
            .field("settled", &inner.settled)
            .field("pending_handlers", &inner.handler_queue.len())
            .finish_non_exhaustive()
    }
}

/// Full resolution procedure: adopt a then-capable value, otherwise fulfill.
fn resolve_value(target: &Rc<RefCell<Inner>>, scheduler: &Rc<dyn Schedule>, value: Value) {
    if !matches!(target.borrow().state, DeferredState::Pending) {
        return;
    }
    match probe(&value) {
        Ok(ThenCapability::None) => {
            settle(target, scheduler, DeferredState::Fulfilled, value);
        }
        Ok(ThenCapability::Native(adopted)) => {
            adopt_native(target, scheduler, adopted);
        }
        Ok(ThenCapability::Foreign(then_fn)) => {
            adopt_foreign(target, scheduler, then_fn);
        }
        Err(error) => {
            settle(target, scheduler, DeferredState::Rejected, Value::Error(error));
        }
    }
}

/// Adopts one of our own deferred values: the target mirrors the adopted
/// value's eventual outcome through a pass-through record.
fn adopt_native(target: &Rc<RefCell<Inner>>, scheduler: &Rc<dyn Schedule>, adopted: Deferred) {
    if chain_reaches(&adopted.inner, target) {
        let error = ScriptError::type_error("chaining cycle detected");
        settle(target, scheduler, DeferredState::Rejected, Value::Error(error));
        return;
    }
    target.borrow_mut().adopting_from = Some(Rc::downgrade(&adopted.inner));
    let continuation = Resolver::fresh_pair(target, scheduler);
    adopted.register(HandlerRecord {
        on_fulfilled: None,
        on_rejected: None,
        continuation,
    });
}

/// Adopts a foreign thenable by handing a fresh settlement pair to its
/// `then` member. A synchronous throw from the call rejects the target
/// unless the pair already fired.
fn adopt_foreign(target: &Rc<RefCell<Inner>>, scheduler: &Rc<dyn Schedule>, then_fn: Function) {
    let pair = Resolver::fresh_pair(target, scheduler);
    let resolve_fn = {
        let pair = pair.clone();
        Function::new(move |args| {
            pair.resolve(first_arg(args));
            Ok(Value::Undefined)
        })
    };
    let reject_fn = {
        let pair = pair.clone();
        Function::new(move |args| {
            pair.reject(first_arg(args));
            Ok(Value::Undefined)
        })
    };
    let args = vec![Value::Function(resolve_fn), Value::Function(reject_fn)];
    if let Err(error) = then_fn.call(args) {
        pair.reject(Value::Error(error));
    }
}

/// Walks the in-flight adoption chain starting at `start`. Returns true if
/// the chain reaches `target`, i.e. settling `target` from `start` would
/// close a cycle.
fn chain_reaches(start: &Rc<RefCell<Inner>>, target: &Rc<RefCell<Inner>>) -> bool {
    let mut visited: Vec<*const RefCell<Inner>> = Vec::new();
    let mut cursor = Rc::clone(start);
    loop {
        if Rc::ptr_eq(&cursor, target) {
            return true;
        }
        let address = Rc::as_ptr(&cursor);
        if visited.contains(&address) {
            return false;
        }
        visited.push(address);
        let next = cursor.borrow().adopting_from.as_ref().and_then(Weak::upgrade);
        match next {
            Some(next) => cursor = next,
            None => return false,
        }
    }
}

/// The single settlement point: transitions out of Pending at most once,
/// stores the outcome, and drains the handler queue into scheduled
/// dispatches.
fn settle(
    target: &Rc<RefCell<Inner>>,
    scheduler: &Rc<dyn Schedule>,
    state: DeferredState,
    value: Value,
) {
    let drained = {
        let mut inner = target.borrow_mut();
        if !matches!(inner.state, DeferredState::Pending) {
            return;
        }
        inner.state = state.clone();
        inner.settled = Some(value.clone());
        inner.adopting_from = None;
        std::mem::take(&mut inner.handler_queue)
    };
    for record in drained {
        schedule_record(scheduler, state.clone(), value.clone(), record);
    }
}

/// Schedules the dispatch of one handler record. The handler's return value
/// (or thrown error) determines the downstream settlement; an absent
/// handler passes the outcome through unchanged.
fn schedule_record(
    scheduler: &Rc<dyn Schedule>,
    state: DeferredState,
    value: Value,
    record: HandlerRecord,
) {
    scheduler.schedule(Task::new(move || {
        let fulfilled = matches!(state, DeferredState::Fulfilled);
        let handler = if fulfilled {
            record.on_fulfilled
        } else {
            record.on_rejected
        };
        match handler {
            Some(callback) => match callback.call(vec![value]) {
                Ok(result) => record.continuation.resolve(result),
                Err(error) => record.continuation.reject(Value::Error(error)),
            },
            None if fulfilled => record.continuation.resolve(value),
            None => record.continuation.reject(value),
        }
    }));
}

fn first_arg(args: Vec<Value>) -> Value {
    args.into_iter().next().unwrap_or(Value::Undefined)
}
