//! Aggregate operations over collections of deferred values.
//!
//! Everything here is a thin consumer of the public [`Deferred`] contract:
//! construction, [`Deferred::resolved`], and [`Deferred::then`], plus
//! ordinary iteration. Plain inputs are wrapped with `resolved` so every
//! item is treated uniformly, adopting deferred values and thenables alike.

use crate::deferred::Deferred;
use crate::scheduler::Schedule;
use core_types::{Function, Object, ScriptError, Value};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Settles once every input fulfills, with a list of their values in input
/// order; the first rejection rejects the aggregate with its reason.
///
/// An empty input fulfills with an empty list.
pub fn all(scheduler: &Rc<dyn Schedule>, items: Vec<Value>) -> Deferred {
    let sched = Rc::clone(scheduler);
    Deferred::new(Rc::clone(scheduler), move |resolver| {
        if items.is_empty() {
            resolver.resolve(Value::List(Rc::new(Vec::new())));
            return Ok(());
        }
        let slots: Rc<RefCell<Vec<Option<Value>>>> =
            Rc::new(RefCell::new(vec![None; items.len()]));
        let remaining = Rc::new(Cell::new(items.len()));
        for (index, item) in items.into_iter().enumerate() {
            let on_fulfilled = {
                let slots = Rc::clone(&slots);
                let remaining = Rc::clone(&remaining);
                let resolver = resolver.clone();
                Function::new(move |args| {
                    slots.borrow_mut()[index] = Some(first_arg(args));
                    remaining.set(remaining.get() - 1);
                    if remaining.get() == 0 {
                        resolver.resolve(Value::List(Rc::new(take_slots(&slots))));
                    }
                    Ok(Value::Undefined)
                })
            };
            let on_rejected = {
                let resolver = resolver.clone();
                Function::new(move |args| {
                    resolver.reject(first_arg(args));
                    Ok(Value::Undefined)
                })
            };
            Deferred::resolved(Rc::clone(&sched), item).then(Some(on_fulfilled), Some(on_rejected));
        }
        Ok(())
    })
}

/// Mirrors the first input to settle, whatever its outcome.
///
/// An empty input never settles.
pub fn race(scheduler: &Rc<dyn Schedule>, items: Vec<Value>) -> Deferred {
    let sched = Rc::clone(scheduler);
    Deferred::new(Rc::clone(scheduler), move |resolver| {
        for item in items {
            let on_fulfilled = {
                let resolver = resolver.clone();
                Function::new(move |args| {
                    resolver.resolve(first_arg(args));
                    Ok(Value::Undefined)
                })
            };
            let on_rejected = {
                let resolver = resolver.clone();
                Function::new(move |args| {
                    resolver.reject(first_arg(args));
                    Ok(Value::Undefined)
                })
            };
            Deferred::resolved(Rc::clone(&sched), item).then(Some(on_fulfilled), Some(on_rejected));
        }
        Ok(())
    })
}

/// Settles with the first input to fulfill; if every input rejects, rejects
/// with an aggregate error carrying each reason in input order.
///
/// An empty input rejects with an empty aggregate immediately.
pub fn any(scheduler: &Rc<dyn Schedule>, items: Vec<Value>) -> Deferred {
    let sched = Rc::clone(scheduler);
    Deferred::new(Rc::clone(scheduler), move |resolver| {
        if items.is_empty() {
            resolver.reject(Value::Error(aggregate_rejection(Vec::new())));
            return Ok(());
        }
        let reasons: Rc<RefCell<Vec<Option<Value>>>> =
            Rc::new(RefCell::new(vec![None; items.len()]));
        let remaining = Rc::new(Cell::new(items.len()));
        for (index, item) in items.into_iter().enumerate() {
            let on_fulfilled = {
                let resolver = resolver.clone();
                Function::new(move |args| {
                    resolver.resolve(first_arg(args));
                    Ok(Value::Undefined)
                })
            };
            let on_rejected = {
                let reasons = Rc::clone(&reasons);
                let remaining = Rc::clone(&remaining);
                let resolver = resolver.clone();
                Function::new(move |args| {
                    reasons.borrow_mut()[index] = Some(first_arg(args));
                    remaining.set(remaining.get() - 1);
                    if remaining.get() == 0 {
                        resolver.reject(Value::Error(aggregate_rejection(take_slots(&reasons))));
                    }
                    Ok(Value::Undefined)
                })
            };
            Deferred::resolved(Rc::clone(&sched), item).then(Some(on_fulfilled), Some(on_rejected));
        }
        Ok(())
    })
}

/// Settles once every input settles, regardless of outcome, with a list of
/// status-tagged records in input order. Never rejects.
///
/// Each record is an object with a `"status"` field of `"fulfilled"` or
/// `"rejected"` and a `"value"` or `"reason"` field respectively.
pub fn all_settled(scheduler: &Rc<dyn Schedule>, items: Vec<Value>) -> Deferred {
    let sched = Rc::clone(scheduler);
    Deferred::new(Rc::clone(scheduler), move |resolver| {
        if items.is_empty() {
            resolver.resolve(Value::List(Rc::new(Vec::new())));
            return Ok(());
        }
        let slots: Rc<RefCell<Vec<Option<Value>>>> =
            Rc::new(RefCell::new(vec![None; items.len()]));
        let remaining = Rc::new(Cell::new(items.len()));
        for (index, item) in items.into_iter().enumerate() {
            let record_outcome = {
                let slots = Rc::clone(&slots);
                let remaining = Rc::clone(&remaining);
                let resolver = resolver.clone();
                move |record: Value| {
                    slots.borrow_mut()[index] = Some(record);
                    remaining.set(remaining.get() - 1);
                    if remaining.get() == 0 {
                        resolver.resolve(Value::List(Rc::new(take_slots(&slots))));
                    }
                }
            };
            let on_fulfilled = {
                let record_outcome = record_outcome.clone();
                Function::new(move |args| {
                    record_outcome(settled_record("fulfilled", "value", first_arg(args)));
                    Ok(Value::Undefined)
                })
            };
            let on_rejected = Function::new(move |args| {
                record_outcome(settled_record("rejected", "reason", first_arg(args)));
                Ok(Value::Undefined)
            });
            Deferred::resolved(Rc::clone(&sched), item).then(Some(on_fulfilled), Some(on_rejected));
        }
        Ok(())
    })
}

fn settled_record(status: &str, key: &str, value: Value) -> Value {
    let record = Object::new();
    record.set_field("status", Value::String(status.to_string()));
    record.set_field(key, value);
    Value::Object(record)
}

fn aggregate_rejection(reasons: Vec<Value>) -> ScriptError {
    ScriptError::aggregate("all deferred values rejected", reasons)
}

fn take_slots(slots: &Rc<RefCell<Vec<Option<Value>>>>) -> Vec<Value> {
    slots
        .borrow_mut()
        .iter_mut()
        .map(|slot| slot.take().unwrap_or(Value::Undefined))
        .collect()
}

fn first_arg(args: Vec<Value>) -> Value {
    args.into_iter().next().unwrap_or(Value::Undefined)
}
