//! Deferred task scheduling.
//!
//! This module provides the scheduling capability the deferred-value core
//! consumes: a handler registered or a value settled in the current
//! synchronous turn must never run its callbacks inline, only through a
//! scheduled task.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

/// One deferred unit of work.
///
/// A task runs exactly once, after the synchronous execution that scheduled
/// it has completed.
pub struct Task {
    callback: Box<dyn FnOnce()>,
}

impl Task {
    /// Creates a new Task from a closure.
    ///
    /// # Arguments
    ///
    /// * `f` - The function to execute when the task runs
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce() + 'static,
    {
        Self {
            callback: Box::new(f),
        }
    }

    /// Executes the task, consuming it.
    pub fn run(self) {
        (self.callback)()
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Task {{ ... }}")
    }
}

/// The deferred-execution capability consumed by the core.
///
/// Contract: a scheduled task runs after the current synchronous execution
/// completes, exactly once, in an order consistent with other scheduled
/// tasks (FIFO is sufficient).
pub trait Schedule {
    /// Adds a task to be executed after the current synchronous execution.
    fn schedule(&self, task: Task);
}

/// A FIFO task queue.
///
/// Cloning a `TaskQueue` produces another handle onto the same queue, so the
/// core can hold the scheduler while a caller drives the very same queue.
/// Driving the queue by hand is also what makes tests deterministic.
///
/// # Examples
///
/// ```
/// use deferred_runtime::{Schedule, Task, TaskQueue};
///
/// let queue = TaskQueue::new();
/// queue.schedule(Task::new(|| {}));
/// assert_eq!(queue.len(), 1);
/// queue.run_until_idle();
/// assert!(queue.is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct TaskQueue {
    queue: Rc<RefCell<VecDeque<Task>>>,
}

impl TaskQueue {
    /// Creates a new empty TaskQueue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns this queue as a shareable scheduling capability.
    pub fn scheduler(&self) -> Rc<dyn Schedule> {
        Rc::new(self.clone())
    }

    /// Removes and runs the next task from the queue.
    ///
    /// Returns false if the queue was empty.
    pub fn run_next(&self) -> bool {
        // The borrow must end before the task runs: the task may schedule
        // more work on this same queue.
        let task = self.queue.borrow_mut().pop_front();
        match task {
            Some(task) => {
                task.run();
                true
            }
            None => false,
        }
    }

    /// Runs tasks until the queue is empty.
    ///
    /// This drains the queue completely. New tasks scheduled during
    /// execution will also be processed before this method returns.
    pub fn run_until_idle(&self) {
        while self.run_next() {}
    }

    /// Returns true if the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }

    /// Returns the number of tasks in the queue.
    pub fn len(&self) -> usize {
        self.queue.borrow().len()
    }
}

impl Schedule for TaskQueue {
    fn schedule(&self, task: Task) {
        self.queue.borrow_mut().push_back(task);
    }
}
