//! Testing utilities for users of the rytm library.
//!
//! This module provides helpers for testing chains:
//!
//! - [`ManualHost`]: A host driven by hand on a virtual clock
//! - [`Recorder`]: Task factory that records every invocation and its arguments

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;
use std::time::Duration;

use crate::core::args::Args;
use crate::core::task::Step;
use crate::execution::{Continuation, Host, Job};

/// A deterministic host running jobs on a virtual clock.
///
/// Nothing runs until the test drives the host with [`turn`](Self::turn),
/// [`advance_by`](Self::advance_by) or [`run_until_idle`](Self::run_until_idle).
/// Jobs due at the same instant run in the order they were scheduled.
///
/// # Example
///
/// ```
/// use std::rc::Rc;
/// use std::time::Duration;
/// use rytm::testing::{ManualHost, Recorder};
/// use rytm::Chain;
///
/// let host = Rc::new(ManualHost::new());
/// let chain = Chain::with_host(host.clone());
/// let rec = Recorder::new();
/// chain.wait(Duration::from_millis(100)).append(rec.task("done"));
///
/// chain.go();
/// host.advance_by(Duration::from_millis(100));
/// assert_eq!(rec.labels(), vec!["done"]);
/// ```
#[derive(Default)]
pub struct ManualHost {
    now: Cell<Duration>,
    seq: Cell<u64>,
    queue: RefCell<BTreeMap<(Duration, u64), Job>>,
}

impl ManualHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time, measured from the host's creation.
    pub fn now(&self) -> Duration {
        self.now.get()
    }

    /// Number of jobs waiting to run.
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Run the earliest job, moving the clock to its due time.
    ///
    /// Returns `false` if nothing was queued.
    pub fn turn(&self) -> bool {
        let Some(((due, _), job)) = self.queue.borrow_mut().pop_first() else {
            return false;
        };
        if due > self.now.get() {
            self.now.set(due);
        }
        job();
        true
    }

    /// Run jobs until the queue is empty, including jobs scheduled by jobs.
    pub fn run_until_idle(&self) {
        while self.turn() {}
    }

    /// Move the clock forward by `by`, running every job due on the way.
    pub fn advance_by(&self, by: Duration) {
        let target = self.now.get() + by;
        loop {
            let due = self.queue.borrow().keys().next().map(|(due, _)| *due);
            match due {
                Some(due) if due <= target => {
                    self.turn();
                }
                _ => break,
            }
        }
        self.now.set(target);
    }
}

impl Host for ManualHost {
    fn schedule(&self, delay: Duration, job: Job) {
        let seq = self.seq.get();
        self.seq.set(seq + 1);
        self.queue
            .borrow_mut()
            .insert((self.now.get() + delay, seq), job);
    }
}

/// Records task invocations for later assertions.
///
/// Clones share the same log.
#[derive(Clone, Default)]
pub struct Recorder {
    calls: Rc<RefCell<Vec<(String, Args)>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A task that records `label` with its arguments, then suspends.
    pub fn task(&self, label: &str) -> impl Fn(&Continuation, Args) -> Step + use<> {
        let rec = self.clone();
        let label = label.to_string();
        move |_: &Continuation, args: Args| {
            rec.record(&label, args);
            Step::Suspend
        }
    }

    /// A task that records `label`, then continues with the arguments it got.
    pub fn continuing(&self, label: &str) -> impl Fn(&Continuation, Args) -> Step + use<> {
        let rec = self.clone();
        let label = label.to_string();
        move |_: &Continuation, args: Args| {
            rec.record(&label, args.clone());
            Step::Continue(args)
        }
    }

    pub fn record(&self, label: &str, args: Args) {
        self.calls.borrow_mut().push((label.to_string(), args));
    }

    /// Labels in invocation order.
    pub fn labels(&self) -> Vec<String> {
        self.calls.borrow().iter().map(|(l, _)| l.clone()).collect()
    }

    /// Arguments of every invocation recorded under `label`.
    pub fn args_of(&self, label: &str) -> Vec<Args> {
        self.calls
            .borrow()
            .iter()
            .filter(|(l, _)| l == label)
            .map(|(_, args)| args.clone())
            .collect()
    }

    pub fn count(&self, label: &str) -> usize {
        self.calls.borrow().iter().filter(|(l, _)| l == label).count()
    }

    pub fn calls(&self) -> Vec<(String, Args)> {
        self.calls.borrow().clone()
    }
}
