//! Nodes and the append-only node arena.
//!
//! A chain owns its nodes in a `Vec`; links are [`NodeId`] indices into that
//! vector. `next` is written once, when the following node is appended, and
//! `prev` is a plain lookup used for introspection.

use std::rc::Rc;

use serde_json::Value;

use super::args::{Arg, Args, Slot};
use super::task::Task;
use super::types::NodeId;

/// Join bookkeeping for the node a set of `all()` tokens will launch.
#[derive(Default)]
pub(crate) struct JoinState {
    /// Slots registered but not fired yet.
    pending: Vec<usize>,
    /// Key per registered slot, in registration order.
    keys: Vec<Option<Value>>,
    /// Latest arguments per registered slot.
    captured: Vec<Option<Args>>,
    /// `None` until the first token asks for arming.
    armed: Option<bool>,
}

impl JoinState {
    /// Register a token and return its slot.
    pub(crate) fn register(&mut self, key: Option<Value>) -> usize {
        let slot = self.keys.len();
        self.keys.push(key);
        self.captured.push(None);
        self.pending.push(slot);
        slot
    }

    /// Start arming. Returns true only for the first caller.
    pub(crate) fn begin_arming(&mut self) -> bool {
        if self.armed.is_some() {
            return false;
        }
        self.armed = Some(false);
        true
    }

    pub(crate) fn arm(&mut self) {
        self.armed = Some(true);
    }

    pub(crate) fn is_armed(&self) -> bool {
        self.armed == Some(true)
    }

    pub(crate) fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Drop tokens still waiting; later firings find nothing to complete.
    pub(crate) fn abandon(&mut self) {
        self.pending.clear();
    }

    /// Record a firing.
    ///
    /// Returns the joined arguments, in registration order, when this firing
    /// was the last pending one.
    pub(crate) fn record(&mut self, slot: usize, args: Args) -> Option<Args> {
        if let Some(captured) = self.captured.get_mut(slot) {
            *captured = Some(args);
        }

        let position = self.pending.iter().position(|s| *s == slot)?;
        self.pending.remove(position);
        if !self.pending.is_empty() {
            return None;
        }

        let joined = self
            .keys
            .iter()
            .zip(self.captured.iter_mut())
            .map(|(key, captured)| {
                Arg::Slot(Slot {
                    key: key.clone(),
                    args: captured.take().unwrap_or_default(),
                })
            })
            .collect::<Vec<_>>();
        Some(Args::from(joined))
    }

    pub(crate) fn reset(&mut self) {
        self.pending.clear();
        self.keys.clear();
        self.captured.clear();
    }
}

/// A task plus its scheduling bookkeeping.
pub(crate) struct Node {
    pub(crate) task: Rc<dyn Task>,
    pub(crate) next: Option<NodeId>,
    pub(crate) prev: Option<NodeId>,
    pub(crate) join: JoinState,
    /// Monotone: once set the node never runs again.
    pub(crate) went: bool,
}

/// Read-only snapshot of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeInfo {
    pub id: NodeId,
    pub prev: Option<NodeId>,
    pub next: Option<NodeId>,
    /// Whether the node's callback has started.
    pub went: bool,
    /// Join tokens registered against this node and not fired yet.
    pub pending_tokens: usize,
    pub label: Option<String>,
}

/// Append-only arena of nodes. Slot 0 is the synthetic head.
pub(crate) struct NodeList {
    nodes: Vec<Node>,
}

impl NodeList {
    pub(crate) fn with_head(head: Rc<dyn Task>) -> Self {
        Self {
            nodes: vec![Node {
                task: head,
                next: None,
                prev: None,
                join: JoinState::default(),
                went: false,
            }],
        }
    }

    /// Append a node after the current tail.
    pub(crate) fn push(&mut self, task: Rc<dyn Task>) -> NodeId {
        let tail = self.tail();
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(Node {
            task,
            next: None,
            prev: Some(tail),
            join: JoinState::default(),
            went: false,
        });
        self.nodes[tail.index()].next = Some(id);
        id
    }

    pub(crate) fn tail(&self) -> NodeId {
        NodeId::new(self.nodes.len() - 1)
    }

    pub(crate) fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    /// Successor of `id`; `None` stands for the position before the head.
    pub(crate) fn next_of(&self, id: Option<NodeId>) -> Option<NodeId> {
        match id {
            Some(id) => self.get(id).next,
            None => Some(NodeId::HEAD),
        }
    }

    /// Number of nodes including the head.
    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn contains(&self, id: NodeId) -> bool {
        id.index() < self.nodes.len()
    }

    pub(crate) fn info(&self, id: NodeId) -> NodeInfo {
        let node = self.get(id);
        NodeInfo {
            id,
            prev: node.prev,
            next: node.next,
            went: node.went,
            pending_tokens: node.join.pending(),
            label: node.task.label().map(str::to_string),
        }
    }
}
