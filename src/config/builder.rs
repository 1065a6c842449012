//! Chain builder from score configuration.
//!
//! This module turns a [`ScoreConfig`] into a runnable [`Chain`].

use std::rc::Rc;
use std::time::Duration;

use tracing::info;

use crate::core::args::Args;
use crate::core::task::Step;
use crate::execution::{Chain, Host};

use super::yaml::{BeatConfig, ScoreConfig};

impl ScoreConfig {
    /// Build a chain playing this score on `host`.
    ///
    /// Timers started by `all` and `once` beats fire with their own delay in
    /// milliseconds as the single argument.
    pub fn build(&self, host: Rc<dyn Host>) -> Chain {
        let chain = Chain::with_config(self.chain.clone(), host);
        for (index, beat) in self.beats.iter().enumerate() {
            append_beat(&chain, index, beat.clone());
        }
        chain
    }
}

fn append_beat(chain: &Chain, index: usize, beat: BeatConfig) {
    let label = format!("{} #{}", beat.kind(), index);
    match beat {
        BeatConfig::Log(text) => {
            chain.append_labeled(label, move |ctx, args| {
                info!(chain = %ctx.chain().name(), beat = index, args = %args.to_json(), "{}", text);
                Step::Continue(args)
            });
        }
        BeatConfig::Wait(ms) => {
            chain.wait(Duration::from_millis(ms));
        }
        BeatConfig::All(delays) => {
            chain.append_labeled(label, move |ctx, _| {
                info!(chain = %ctx.chain().name(), beat = index, timers = delays.len(), "waiting for all timers");
                for (slot, ms) in delays.iter().copied().enumerate() {
                    let token = ctx.all_keyed(slot);
                    ctx.chain().host().schedule(
                        Duration::from_millis(ms),
                        Box::new(move || token.fire(Args::one(ms))),
                    );
                }
                Step::Suspend
            });
        }
        BeatConfig::Once(delays) => {
            chain.append_labeled(label, move |ctx, _| {
                info!(chain = %ctx.chain().name(), beat = index, timers = delays.len(), "racing timers");
                let gate = ctx.once();
                for ms in delays.iter().copied() {
                    let gate = gate.clone();
                    ctx.chain().host().schedule(
                        Duration::from_millis(ms),
                        Box::new(move || gate.fire(Args::one(ms))),
                    );
                }
                Step::Suspend
            });
        }
        BeatConfig::Emit(value) => {
            chain.append_labeled(label, move |_, _| Step::Continue(Args::one(value.clone())));
        }
    }
}
