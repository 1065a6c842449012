//! Common test utilities shared across integration tests.

use rytm::testing::ManualHost;
use rytm::{Chain, Gate};
use std::cell::RefCell;
use std::rc::Rc;

/// A chain on a fresh virtual-clock host.
pub fn manual_chain() -> (Chain, Rc<ManualHost>) {
    let host = Rc::new(ManualHost::new());
    (Chain::with_host(host.clone()), host)
}

/// Shared storage for gates created inside tasks, so a test can fire them
/// after the task has returned.
#[derive(Clone, Default)]
pub struct GateStash(Rc<RefCell<Vec<Gate>>>);

impl GateStash {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keep(&self, gate: Gate) {
        self.0.borrow_mut().push(gate);
    }

    /// The `index`th stashed gate.
    ///
    /// # Panics
    ///
    /// Panics if fewer gates were stashed.
    pub fn get(&self, index: usize) -> Gate {
        self.0.borrow()[index].clone()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }
}
