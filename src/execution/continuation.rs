//! Continuation context handed to running tasks.
//!
//! Each time a node runs it gets a fresh [`Continuation`] pinned to that
//! node. The pin never moves: gates and peeks created from it keep resolving
//! against "their" node however far the shared cursor travels afterwards.
//! Anything that is not about the pinned node (the cursor, configuration,
//! the node list) is read from the parent [`Chain`].

use std::time::Duration;

use tracing::{debug, trace};

use crate::config::ChainConfig;
use crate::core::args::Args;
use crate::core::node::NodeInfo;
use crate::core::task::Step;
use crate::core::types::NodeId;

use super::chain::{Chain, ChainError};

/// Per-invocation handle pinned to one node of a chain.
#[derive(Clone)]
pub struct Continuation {
    chain: Chain,
    /// `None` pins to the position before the head.
    node: Option<NodeId>,
}

impl Continuation {
    pub(crate) fn new(chain: Chain, node: Option<NodeId>) -> Self {
        Self { chain, node }
    }

    /// The chain this continuation belongs to.
    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    pub fn config(&self) -> &ChainConfig {
        self.chain.config()
    }

    /// Id of the pinned node.
    pub fn node_id(&self) -> Option<NodeId> {
        self.node
    }

    /// Snapshot of the pinned node.
    pub fn current(&self) -> Option<NodeInfo> {
        let id = self.node?;
        self.chain.node(id)
    }

    /// Advance the chain. The cursor is shared, so this is the same as
    /// calling [`Chain::advance`].
    pub fn advance(&self, args: Args) -> &Self {
        self.chain.advance(args);
        self
    }

    pub fn try_advance(&self, args: Args) -> Result<(), ChainError> {
        self.chain.try_advance(args)
    }

    /// Advance with no arguments.
    pub fn go(&self) -> &Self {
        self.advance(Args::new())
    }

    /// Run the node after the pinned one right now, without moving the cursor.
    ///
    /// The peeked node is marked as started. The next `advance` skips it and
    /// runs the node after it. If the peeked callback returns
    /// [`Step::Continue`], the chain advances once as well.
    ///
    /// Returns `None` when there is no following node or it has already
    /// started.
    pub fn peek(&self, args: Args) -> Option<Step> {
        let (target, task) = self.chain.with_nodes(|nodes| {
            let target = nodes.next_of(self.node)?;
            let node = nodes.get_mut(target);
            if node.went {
                return None;
            }
            node.went = true;
            Some((target, node.task.clone()))
        })?;
        self.chain.add_pending_peek();

        debug!(chain = %self.chain.id(), node = %target, pending = self.chain.pending_peeks(), "peeking node");
        let step = self.chain.run_node(target, task, args);
        if let Step::Continue(args) = &step {
            self.chain.advance(args.clone());
        }
        Some(step)
    }

    /// Whether the pinned node's successor is still the next node to run.
    ///
    /// Peeked nodes the cursor has not stepped over yet count as already
    /// passed. False once anything (an advance, another gate, a peek) has
    /// started that successor.
    pub(crate) fn is_live(&self) -> bool {
        let cursor = self.chain.resolved_cursor();
        let live = self.chain.with_nodes(|nodes| match nodes.next_of(self.node) {
            Some(target) => cursor == Some(target) && !nodes.get(target).went,
            None => false,
        });
        if !live {
            trace!(chain = %self.chain.id(), node = ?self.node, "continuation is stale");
        }
        live
    }

    /// Append a pause of `delay` to the chain. See [`Chain::wait`].
    pub fn wait(&self, delay: Duration) -> &Self {
        self.chain.wait(delay);
        self
    }

    /// Advance after `delay`. See [`Chain::defer`].
    pub fn defer(&self, delay: Duration, args: Args) -> &Self {
        self.chain.defer(delay, args);
        self
    }

    /// Advance on the next scheduler turn.
    pub fn defer_now(&self, args: Args) -> &Self {
        self.chain.defer_now(args);
        self
    }
}

impl std::fmt::Debug for Continuation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Continuation")
            .field("chain", &self.chain.id())
            .field("node", &self.node)
            .finish()
    }
}
