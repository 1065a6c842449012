//! Core identifier types for chains and their nodes.
//!
//! These types provide type-safe identifiers for chain instances and the
//! nodes stored in a chain's arena.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Position of a node within its chain's arena.
///
/// Index 0 is always the synthetic head node; appended tasks get 1, 2, 3...
/// in append order. Ids are never reused because nodes are never removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(usize);

/// Unique identifier for a chain instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChainId(Uuid);

impl NodeId {
    /// The synthetic head node of every chain.
    pub const HEAD: NodeId = NodeId(0);

    /// Id for an arena index. The id need not exist in any chain.
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    /// Get the arena index. The head is 0, the first appended task is 1.
    pub fn index(&self) -> usize {
        self.0
    }

    /// Whether this is the synthetic head node.
    pub fn is_head(&self) -> bool {
        self.0 == 0
    }
}

impl ChainId {
    /// Generate a new random ChainId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a ChainId from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ChainId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_head() {
            write!(f, "head")
        } else {
            write!(f, "#{}", self.0)
        }
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
