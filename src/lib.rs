//! rytm - continuation chaining for single-threaded callback flows.
//!
//! A [`Chain`] holds an ordered list of tasks and runs them one at a time.
//! Each task decides when the next one starts: by returning
//! [`Step::Continue`], by advancing synchronously, or later through a
//! [`Gate`] handed to a timer or some other completion callback.
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use rytm::testing::ManualHost;
//! use rytm::{Args, Chain, Step};
//!
//! let host = Rc::new(ManualHost::new());
//! let chain = Chain::with_host(host.clone());
//! chain
//!     .append(|ctx, _| {
//!         let a = ctx.all_keyed("a");
//!         let b = ctx.all_keyed("b");
//!         a.fire(Args::one(1));
//!         b.fire(Args::one(2));
//!         Step::Suspend
//!     })
//!     .append(|_, args| {
//!         assert_eq!(args.len(), 2);
//!         Step::Suspend
//!     });
//!
//! chain.go();
//! host.run_until_idle();
//! ```

pub mod config;
pub mod core;
pub mod execution;
pub mod testing;

pub use config::{BeatConfig, ChainConfig, ConfigError, ScoreConfig, YamlLoader};
pub use core::args::{Arg, Args, Slot};
pub use core::node::NodeInfo;
pub use core::task::{Step, Task};
pub use core::types::{ChainId, NodeId};
pub use execution::{
    Chain, ChainBuilder, ChainError, Continuation, Gate, Host, Job, TokioHost, labeled, task,
};
