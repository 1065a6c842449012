//! Execution engine.
//!
//! This module drives chains forward: the cursor-based engine, the
//! continuation handed to each running task, the join gates, the timing
//! helpers and the host seam they schedule deferred work on.

mod chain;
mod continuation;
mod host;
mod join;
mod timing;

pub use chain::{Chain, ChainBuilder, ChainError, labeled, task};
pub use continuation::Continuation;
pub use host::{Host, Job, TokioHost};
pub use join::Gate;
