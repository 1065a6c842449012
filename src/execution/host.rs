//! Host event loop seam.
//!
//! A chain never sleeps or spawns on its own. Deferred advances, join arming
//! and re-queued token firings are handed to a [`Host`] as jobs to run after
//! a delay. [`TokioHost`] runs them on the current tokio `LocalSet`;
//! `testing::ManualHost` runs them on a virtual clock.

use std::time::Duration;

/// A unit of deferred work.
pub type Job = Box<dyn FnOnce() + 'static>;

/// Timer facility a chain schedules its deferred work on.
///
/// Jobs with equal delays should run in the order they were scheduled.
/// A zero delay means "on a later scheduler turn", never inline.
pub trait Host {
    /// Run `job` once `delay` has elapsed.
    fn schedule(&self, delay: Duration, job: Job);
}

/// Host backed by tokio's single-threaded `LocalSet`.
///
/// # Panics
///
/// Scheduling panics when called outside a `tokio::task::LocalSet`, since
/// chain jobs are `!Send`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioHost;

impl Host for TokioHost {
    fn schedule(&self, delay: Duration, job: Job) {
        tokio::task::spawn_local(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            job();
        });
    }
}
