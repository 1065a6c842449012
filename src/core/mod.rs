//! Core value types: identifiers, arguments, tasks and the node arena.

pub mod args;
pub mod node;
pub mod task;
pub mod types;
