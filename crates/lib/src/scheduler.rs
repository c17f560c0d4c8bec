//! Deferred task queue.
//!
//! Every store operation resolves synchronously except the acknowledgment of
//! `set`, which is queued here and runs on the next scheduler turn. The queue
//! is owned by a [`Graph`](crate::Graph) and shared with every node it creates.
//!
//! # Example
//!
//! ```
//! use std::{cell::Cell, rc::Rc};
//! use ripple::Scheduler;
//!
//! let scheduler = Scheduler::new();
//! let ran = Rc::new(Cell::new(false));
//! let flag = ran.clone();
//! scheduler.defer(move || flag.set(true));
//!
//! assert!(!ran.get());
//! scheduler.run_until_idle();
//! assert!(ran.get());
//! ```

use std::{cell::RefCell, collections::VecDeque, fmt};

type Task = Box<dyn FnOnce()>;

/// FIFO of tasks deferred to a later turn.
///
/// There is no cancellation: once queued, a task runs when its turn is reached.
#[derive(Default)]
pub struct Scheduler {
    queue: RefCell<VecDeque<Task>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a task for the next turn.
    pub fn defer(&self, task: impl FnOnce() + 'static) {
        self.queue.borrow_mut().push_back(Box::new(task));
    }

    /// Number of queued tasks.
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Run one turn: every task queued before this call, in order.
    ///
    /// Tasks queued while the turn runs wait for the next turn.
    /// Returns the number of tasks run.
    pub fn tick(&self) -> usize {
        let turn = self.queue.borrow().len();
        let mut ran = 0;
        while ran < turn {
            // The borrow must end before the task runs, tasks may queue more work
            let task = self.queue.borrow_mut().pop_front();
            match task {
                Some(task) => task(),
                None => break,
            }
            ran += 1;
        }
        if ran > 0 {
            tracing::trace!(ran, pending = self.pending(), "Scheduler turn completed");
        }
        ran
    }

    /// Run turns until the queue is empty. Returns the total number of tasks run.
    pub fn run_until_idle(&self) -> usize {
        let mut total = 0;
        loop {
            let ran = self.tick();
            if ran == 0 {
                return total;
            }
            total += ran;
        }
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("pending", &self.pending())
            .finish()
    }
}
