//! The chain and its execution engine.
//!
//! A [`Chain`] owns an append-only list of tasks and a single cursor naming
//! the next node eligible to run. Every trigger (`advance`, a gate, a timer)
//! runs at most one node and moves the cursor past it *before* invoking the
//! callback, so a callback that advances synchronously sees the right
//! position.
//!
//! Nodes run through `peek` leave a debt on the chain: the cursor is not
//! moved for them. The next `advance` repays that debt by stepping the cursor
//! over every peeked node before running anything.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use thiserror::Error;
use tracing::{debug, error, trace};

use crate::config::ChainConfig;
use crate::core::args::Args;
use crate::core::node::{NodeInfo, NodeList};
use crate::core::task::{FnTask, Labeled, Step, Task};
use crate::core::types::{ChainId, NodeId};

use super::continuation::Continuation;
use super::host::{Host, TokioHost};

/// Errors raised by the execution engine.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChainError {
    /// Repaying peek debt walked off the end of the chain.
    ///
    /// Only reachable when peeks ran further than the chain reaches; it
    /// means the chain's bookkeeping is corrupt.
    #[error("cursor overran the end of the chain with {pending} peeked node(s) unreconciled")]
    CursorOverrun { pending: usize },
}

struct Inner {
    id: ChainId,
    config: ChainConfig,
    host: Rc<dyn Host>,
    nodes: RefCell<NodeList>,
    /// Next node to run; `None` once the chain is exhausted.
    cursor: Cell<Option<NodeId>>,
    /// Nodes run by `peek` that the cursor has not stepped over yet.
    pending_peeks: Cell<usize>,
    last_finished: Cell<Option<NodeId>>,
}

/// An ordered chain of tasks sharing one cursor.
///
/// `Chain` is a cheap handle: clones share the same nodes and cursor. It is
/// single-threaded (`!Send`); run it on one thread, with a [`Host`] that
/// schedules deferred work on that same thread.
///
/// # Example
///
/// ```ignore
/// use rytm::{Args, Chain, Step};
///
/// let chain = Chain::new();
/// chain
///     .append(|_ctx, _args| Step::with(Args::one("hello")))
///     .append(|_ctx, args| {
///         println!("got {:?}", args.value(0));
///         Step::Suspend
///     })
///     .go();
/// ```
#[derive(Clone)]
pub struct Chain {
    inner: Rc<Inner>,
}

impl Chain {
    /// Create an empty chain with default configuration on the tokio host.
    pub fn new() -> Self {
        Self::with_config(ChainConfig::default(), Rc::new(TokioHost))
    }

    /// Create an empty chain on the given host.
    pub fn with_host(host: Rc<dyn Host>) -> Self {
        Self::with_config(ChainConfig::default(), host)
    }

    /// Create an empty chain with explicit configuration and host.
    pub fn with_config(config: ChainConfig, host: Rc<dyn Host>) -> Self {
        let head: Rc<dyn Task> = Rc::new(Labeled {
            label: "head".to_string(),
            run: |_: &Continuation, args: Args| Step::Continue(args),
        });
        let chain = Self {
            inner: Rc::new(Inner {
                id: ChainId::new(),
                config,
                host,
                nodes: RefCell::new(NodeList::with_head(head)),
                cursor: Cell::new(Some(NodeId::HEAD)),
                pending_peeks: Cell::new(0),
                last_finished: Cell::new(None),
            }),
        };
        trace!(chain = %chain.inner.id, name = %chain.inner.config.name, "chain created");
        chain
    }

    /// Start building a chain.
    pub fn builder() -> ChainBuilder {
        ChainBuilder::new()
    }

    /// Create a chain holding `tasks` in declaration order.
    pub fn from_tasks<I>(tasks: I) -> Self
    where
        I: IntoIterator<Item = Box<dyn Task>>,
    {
        let chain = Self::new();
        chain.extend(tasks);
        chain
    }

    pub fn id(&self) -> ChainId {
        self.inner.id
    }

    pub fn name(&self) -> &str {
        &self.inner.config.name
    }

    pub fn config(&self) -> &ChainConfig {
        &self.inner.config
    }

    pub(crate) fn host(&self) -> &Rc<dyn Host> {
        &self.inner.host
    }

    /// Append a task.
    ///
    /// If the chain was already exhausted, the cursor moves to the new node
    /// so the next `advance` resumes from it.
    pub fn append<F>(&self, task: F) -> &Self
    where
        F: Fn(&Continuation, Args) -> Step + 'static,
    {
        self.push(Rc::new(FnTask(task)))
    }

    /// Alias of [`append`](Self::append).
    pub fn beat<F>(&self, task: F) -> &Self
    where
        F: Fn(&Continuation, Args) -> Step + 'static,
    {
        self.append(task)
    }

    /// Append a task with a label shown in logs and [`NodeInfo`].
    pub fn append_labeled<F>(&self, label: impl Into<String>, task: F) -> &Self
    where
        F: Fn(&Continuation, Args) -> Step + 'static,
    {
        self.push(Rc::new(Labeled {
            label: label.into(),
            run: task,
        }))
    }

    /// Append a [`Task`] implementor.
    pub fn append_task(&self, task: impl Task + 'static) -> &Self {
        self.push(Rc::new(task))
    }

    /// Append several tasks in order.
    pub fn extend<I>(&self, tasks: I) -> &Self
    where
        I: IntoIterator<Item = Box<dyn Task>>,
    {
        for task in tasks {
            self.push(Rc::from(task));
        }
        self
    }

    fn push(&self, task: Rc<dyn Task>) -> &Self {
        let id = self.with_nodes(|nodes| nodes.push(task));
        if self.inner.cursor.get().is_none() {
            trace!(chain = %self.inner.id, node = %id, "chain resumed by append");
            self.inner.cursor.set(Some(id));
        }
        self
    }

    /// Advance with no arguments.
    pub fn go(&self) -> &Self {
        self.advance(Args::new())
    }

    /// Run the node under the cursor with `args`.
    ///
    /// A no-op once the chain is exhausted.
    ///
    /// # Panics
    ///
    /// Panics if the chain's peek bookkeeping is corrupt (see
    /// [`ChainError::CursorOverrun`]). Panics raised by task callbacks
    /// propagate unchanged.
    pub fn advance(&self, args: Args) -> &Self {
        if let Err(err) = self.try_advance(args) {
            error!(chain = %self.inner.id, error = %err, "chain invariant violated");
            panic!("{err}");
        }
        self
    }

    /// Like [`advance`](Self::advance), returning the invariant violation
    /// instead of panicking.
    pub fn try_advance(&self, mut args: Args) -> Result<(), ChainError> {
        // `Step::Continue` loops here rather than recursing, so chains of any
        // length run in constant stack.
        loop {
            let Some(start) = self.inner.cursor.get() else {
                trace!(chain = %self.inner.id, "advance past end of chain ignored");
                return Ok(());
            };

            let cursor = self.reconcile(start)?;
            self.inner.cursor.set(cursor);
            let Some(id) = cursor else {
                return Ok(());
            };

            let (task, next) = self.with_nodes(|nodes| {
                let node = nodes.get_mut(id);
                debug_assert!(!node.went, "node {id} under the cursor already ran");
                node.went = true;
                node.join.reset();
                (node.task.clone(), node.next)
            });
            self.inner.cursor.set(next);

            debug!(chain = %self.inner.id, node = %id, args = args.len(), "running node");
            match self.run_node(id, task, args) {
                Step::Continue(next_args) => args = next_args,
                Step::Suspend => return Ok(()),
            }
        }
    }

    /// Step the cursor over every node run by `peek` since the last advance.
    fn reconcile(&self, start: NodeId) -> Result<Option<NodeId>, ChainError> {
        let mut cursor = Some(start);
        while self.inner.pending_peeks.get() > 0 {
            let Some(id) = cursor else {
                return Err(ChainError::CursorOverrun {
                    pending: self.inner.pending_peeks.get(),
                });
            };
            self.inner.pending_peeks.set(self.inner.pending_peeks.get() - 1);
            cursor = self.with_nodes(|nodes| {
                let node = nodes.get_mut(id);
                node.went = true;
                node.next
            });
            trace!(chain = %self.inner.id, node = %id, "stepped over peeked node");
        }
        Ok(cursor)
    }

    /// Invoke a node's callback with a continuation pinned to it.
    pub(crate) fn run_node(&self, id: NodeId, task: Rc<dyn Task>, args: Args) -> Step {
        let ctx = Continuation::new(self.clone(), Some(id));
        let step = task.run(&ctx, args);
        self.inner.last_finished.set(Some(id));
        step
    }

    /// Record one node run through `peek`.
    pub(crate) fn add_pending_peek(&self) {
        self.inner.pending_peeks.set(self.inner.pending_peeks.get() + 1);
    }

    /// Run `f` with the node list borrowed mutably. `f` must not call back
    /// into task code.
    pub(crate) fn with_nodes<R>(&self, f: impl FnOnce(&mut NodeList) -> R) -> R {
        f(&mut self.inner.nodes.borrow_mut())
    }

    /// Node the next `advance` would run, once peek debt is repaid.
    ///
    /// `None` if that walk leaves the chain.
    pub(crate) fn resolved_cursor(&self) -> Option<NodeId> {
        let pending = self.inner.pending_peeks.get();
        let mut cursor = self.inner.cursor.get();
        self.with_nodes(|nodes| {
            for _ in 0..pending {
                cursor = nodes.get(cursor?).next;
            }
            cursor
        })
    }

    /// Continuation for chain-level operations, pinned to the node the
    /// cursor would advance from.
    pub(crate) fn context(&self) -> Continuation {
        let cursor = self.resolved_cursor();
        let pinned = self.with_nodes(|nodes| match cursor {
            Some(id) => nodes.get(id).prev,
            None => Some(nodes.tail()),
        });
        Continuation::new(self.clone(), pinned)
    }

    /// Run the task after the last started one without moving the cursor.
    ///
    /// See [`Continuation::peek`].
    pub fn peek(&self, args: Args) -> Option<Step> {
        self.context().peek(args)
    }

    /// The node whose callback most recently finished.
    pub fn current(&self) -> Option<NodeInfo> {
        let id = self.inner.last_finished.get()?;
        Some(self.with_nodes(|nodes| nodes.info(id)))
    }

    /// Number of tasks, not counting the synthetic head.
    pub fn len(&self) -> usize {
        self.with_nodes(|nodes| nodes.len() - 1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the cursor has run off the end of the chain.
    pub fn is_exhausted(&self) -> bool {
        self.inner.cursor.get().is_none()
    }

    /// Node the next `advance` would consider, before repaying peek debt.
    pub fn cursor(&self) -> Option<NodeId> {
        self.inner.cursor.get()
    }

    /// Nodes run through `peek` that the cursor has not stepped over yet.
    pub fn pending_peeks(&self) -> usize {
        self.inner.pending_peeks.get()
    }

    pub fn node(&self, id: NodeId) -> Option<NodeInfo> {
        self.with_nodes(|nodes| nodes.contains(id).then(|| nodes.info(id)))
    }

    /// Snapshot of every node, head first.
    pub fn nodes(&self) -> Vec<NodeInfo> {
        self.with_nodes(|nodes| {
            (0..nodes.len())
                .map(|i| nodes.info(NodeId::new(i)))
                .collect()
        })
    }
}

impl Default for Chain {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chain")
            .field("id", &self.inner.id)
            .field("name", &self.inner.config.name)
            .field("len", &self.len())
            .field("cursor", &self.inner.cursor.get())
            .field("pending_peeks", &self.inner.pending_peeks.get())
            .finish()
    }
}

/// Builder for [`Chain`].
pub struct ChainBuilder {
    config: ChainConfig,
    host: Option<Rc<dyn Host>>,
    tasks: Vec<Box<dyn Task>>,
}

impl ChainBuilder {
    pub fn new() -> Self {
        Self {
            config: ChainConfig::default(),
            host: None,
            tasks: Vec::new(),
        }
    }

    pub fn config(mut self, config: ChainConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the name used in log output.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    /// Schedule deferred work on `host` instead of [`TokioHost`].
    pub fn host(mut self, host: Rc<dyn Host>) -> Self {
        self.host = Some(host);
        self
    }

    pub fn task(mut self, task: Box<dyn Task>) -> Self {
        self.tasks.push(task);
        self
    }

    pub fn build(self) -> Chain {
        let host = self.host.unwrap_or_else(|| Rc::new(TokioHost));
        let chain = Chain::with_config(self.config, host);
        chain.extend(self.tasks);
        chain
    }
}

impl Default for ChainBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Box a closure as a [`Task`], for [`Chain::extend`] and friends.
pub fn task<F>(f: F) -> Box<dyn Task>
where
    F: Fn(&Continuation, Args) -> Step + 'static,
{
    Box::new(FnTask(f))
}

/// Box a labelled closure as a [`Task`].
pub fn labeled<F>(label: impl Into<String>, f: F) -> Box<dyn Task>
where
    F: Fn(&Continuation, Args) -> Step + 'static,
{
    Box::new(Labeled {
        label: label.into(),
        run: f,
    })
}
