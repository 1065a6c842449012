//! Timing helpers: deferred advances and pauses.

use std::time::Duration;

use tracing::trace;

use crate::core::args::Args;
use crate::core::task::Step;

use super::chain::Chain;

impl Chain {
    /// Advance with `args` once `delay` has elapsed on the host.
    ///
    /// A scheduled advance cannot be cancelled.
    pub fn defer(&self, delay: Duration, args: Args) -> &Self {
        trace!(chain = %self.id(), ?delay, "advance deferred");
        let chain = self.clone();
        self.host().schedule(
            delay,
            Box::new(move || {
                chain.advance(args);
            }),
        );
        self
    }

    /// Advance with `args` on the next scheduler turn.
    pub fn defer_now(&self, args: Args) -> &Self {
        self.defer(Duration::ZERO, args)
    }

    /// Append a node that pauses for `delay`, then passes the arguments it
    /// received on to the following node unchanged.
    pub fn wait(&self, delay: Duration) -> &Self {
        self.append_labeled(format!("wait {delay:?}"), move |ctx, args| {
            ctx.defer(delay, args);
            Step::Suspend
        })
    }
}
