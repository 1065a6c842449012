//! Task trait and step type.
//!
//! A `Task` is one link of a chain. It runs with a [`Continuation`] pinned to
//! its own node and decides, through the [`Step`] it returns or through the
//! gates it hands out, when the next task begins.

use crate::execution::Continuation;

use super::args::Args;

/// What the chain does after a task's callback returns.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub enum Step {
    /// Return control to the host. Something else (a gate, a timer, an
    /// explicit `advance`) resumes the chain later.
    Suspend,

    /// Advance immediately, passing these arguments to the next task.
    Continue(Args),
}

impl Step {
    /// Continue immediately with no arguments.
    pub fn next() -> Self {
        Step::Continue(Args::new())
    }

    /// Continue immediately, forwarding `args`.
    pub fn with(args: impl Into<Args>) -> Self {
        Step::Continue(args.into())
    }

    pub fn is_suspend(&self) -> bool {
        matches!(self, Step::Suspend)
    }
}

/// One unit of work in a chain.
///
/// Closures of shape `Fn(&Continuation, Args) -> Step` are appended directly
/// with `Chain::append`; implement this trait for tasks that carry state or
/// want a label in log output.
///
/// # Example
///
/// ```ignore
/// use rytm::{Args, Continuation, Step, Task};
///
/// struct Double;
///
/// impl Task for Double {
///     fn run(&self, _ctx: &Continuation, args: Args) -> Step {
///         let n = args.value(0).and_then(|v| v.as_i64()).unwrap_or(0);
///         Step::with(Args::one(n * 2))
///     }
///
///     fn label(&self) -> Option<&str> {
///         Some("double")
///     }
/// }
/// ```
pub trait Task {
    /// Run the task.
    ///
    /// # Arguments
    /// * `ctx` - Continuation pinned to this task's node
    /// * `args` - Arguments forwarded by whatever advanced the chain
    fn run(&self, ctx: &Continuation, args: Args) -> Step;

    /// Optional label for display/logging purposes.
    fn label(&self) -> Option<&str> {
        None
    }
}

/// Adapter that lets plain closures act as tasks.
pub(crate) struct FnTask<F>(pub(crate) F);

impl<F> Task for FnTask<F>
where
    F: Fn(&Continuation, Args) -> Step,
{
    fn run(&self, ctx: &Continuation, args: Args) -> Step {
        (self.0)(ctx, args)
    }
}

/// A closure task with a label attached.
pub(crate) struct Labeled<F> {
    pub(crate) label: String,
    pub(crate) run: F,
}

impl<F> Task for Labeled<F>
where
    F: Fn(&Continuation, Args) -> Step,
{
    fn run(&self, ctx: &Continuation, args: Args) -> Step {
        (self.run)(ctx, args)
    }

    fn label(&self) -> Option<&str> {
        Some(&self.label)
    }
}
