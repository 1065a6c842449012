//! Join primitives: single-shot gates and N-way joins.
//!
//! Both hand out [`Gate`] values that can be passed anywhere a plain
//! callback is expected. A gate only ever advances the chain while its
//! continuation is live, that is while the pinned node's successor is still
//! the next node to run. Whichever completion path starts that successor
//! first wins; every later firing is ignored.

use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, trace};

use crate::core::args::Args;
use crate::core::types::NodeId;

use super::chain::Chain;
use super::continuation::Continuation;

/// A callback that signals (partial) completion of a node's work.
#[derive(Clone)]
pub struct Gate {
    fire: Rc<dyn Fn(Args)>,
}

impl Gate {
    pub(crate) fn new(fire: impl Fn(Args) + 'static) -> Self {
        Self {
            fire: Rc::new(fire),
        }
    }

    /// A gate that does nothing.
    pub fn noop() -> Self {
        Self::new(|_| {})
    }

    pub fn fire(&self, args: Args) {
        (self.fire)(args)
    }

    /// Fire with no arguments.
    pub fn call(&self) {
        self.fire(Args::new())
    }

    /// Turn the gate into a plain closure for foreign callback slots.
    pub fn into_fn(self) -> impl Fn(Args) + Clone + 'static {
        move |args| self.fire(args)
    }
}

impl fmt::Debug for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Gate")
    }
}

impl Chain {
    /// A single-shot gate for the node the cursor would run next.
    ///
    /// Before the first advance this gate starts the chain.
    pub fn once(&self) -> Gate {
        self.context().once()
    }

    /// Register an unkeyed join token for the node the cursor would run next.
    pub fn all(&self) -> Gate {
        self.context().all()
    }

    pub fn all_keyed(&self, key: impl Into<Value>) -> Gate {
        self.context().all_keyed(key)
    }
}

impl Continuation {
    /// A gate that advances the chain the first time it fires.
    ///
    /// Firing is a no-op once the pinned node's successor has started, so
    /// the gate, its clones and any other gate for the same node advance
    /// the chain at most once between them.
    pub fn once(&self) -> Gate {
        let ctx = self.clone();
        Gate::new(move |args| {
            if !ctx.is_live() {
                trace!(chain = %ctx.chain().id(), "once gate ignored");
                return;
            }
            debug!(chain = %ctx.chain().id(), node = ?ctx.node_id(), "once gate fired");
            ctx.advance(args);
        })
    }

    /// Register an unkeyed join token.
    ///
    /// The chain advances once every token registered for this node has
    /// fired. The next task receives one [`Slot`](crate::Slot) per token,
    /// in registration order.
    pub fn all(&self) -> Gate {
        self.join(None)
    }

    /// Register a join token whose slot carries `key`.
    pub fn all_keyed(&self, key: impl Into<Value>) -> Gate {
        self.join(Some(key.into()))
    }

    fn join(&self, key: Option<Value>) -> Gate {
        let arm_on_register = !self.config().arm_joins;
        let registered = self.chain().with_nodes(|nodes| {
            let target = nodes.next_of(self.node_id())?;
            let join = &mut nodes.get_mut(target).join;
            let slot = join.register(key);
            let arming = join.begin_arming();
            if arming && arm_on_register {
                join.arm();
            }
            Some((target, slot, arming && !arm_on_register))
        });
        let Some((target, slot, schedule_arming)) = registered else {
            return Gate::noop();
        };

        if schedule_arming {
            let chain = self.chain().clone();
            self.chain().host().schedule(
                Duration::ZERO,
                Box::new(move || chain.with_nodes(|nodes| nodes.get_mut(target).join.arm())),
            );
        }
        trace!(chain = %self.chain().id(), node = %target, slot, "join token registered");

        let ctx = self.clone();
        Gate::new(move |args| ctx.fire_token(target, slot, args))
    }

    fn fire_token(&self, target: NodeId, slot: usize, args: Args) {
        let armed = self
            .chain()
            .with_nodes(|nodes| nodes.get(target).join.is_armed());
        if !armed {
            trace!(chain = %self.chain().id(), node = %target, slot, "join token fired before arming, re-queued");
            let ctx = self.clone();
            self.chain().host().schedule(
                Duration::ZERO,
                Box::new(move || ctx.fire_token(target, slot, args)),
            );
            return;
        }

        if !self.is_live() {
            self.chain()
                .with_nodes(|nodes| nodes.get_mut(target).join.abandon());
            trace!(chain = %self.chain().id(), node = %target, slot, "join token ignored");
            return;
        }

        let joined = self
            .chain()
            .with_nodes(|nodes| nodes.get_mut(target).join.record(slot, args));
        if let Some(args) = joined {
            debug!(chain = %self.chain().id(), node = %target, tokens = args.len(), "join complete");
            self.advance(args);
        }
    }
}
