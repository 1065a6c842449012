//! Join gate integration tests.
//!
//! Tests that verify `once` and `all` gates fed from host timers and from
//! the test itself.

use crate::common::{GateStash, manual_chain};
use rytm::testing::Recorder;
use rytm::{Args, Host, Step};
use serde_json::json;
use std::time::Duration;

#[test]
fn test_all_preserves_registration_order() {
    let (chain, host) = manual_chain();
    let rec = Recorder::new();
    let gates = GateStash::new();
    let stash = gates.clone();
    chain
        .append(move |ctx, _| {
            stash.keep(ctx.all());
            stash.keep(ctx.all_keyed(1));
            stash.keep(ctx.all_keyed(2));
            Step::Suspend
        })
        .append(rec.task("next"));
    chain.go();
    host.run_until_idle();

    gates.get(2).fire(Args::from(vec![json!(2), json!(3)]));
    gates.get(0).fire(Args::from(vec![json!(0), json!(1)]));
    assert_eq!(rec.count("next"), 0);
    gates.get(1).fire(Args::from(vec![json!(1), json!(2)]));

    assert_eq!(rec.count("next"), 1);
    let args = &rec.args_of("next")[0];
    let recorded: Vec<Vec<serde_json::Value>> = (0..3)
        .map(|i| args.slot(i).unwrap().values().into_iter().cloned().collect())
        .collect();
    assert_eq!(
        recorded,
        vec![
            vec![json!(0), json!(1)],
            vec![json!(1), json!(2)],
            vec![json!(2), json!(3)],
        ]
    );
    let keys: Vec<_> = (0..3).map(|i| args.slot(i).unwrap().key.clone()).collect();
    assert_eq!(keys, vec![None, Some(json!(1)), Some(json!(2))]);
}

#[test]
fn test_once_invoked_twice_runs_downstream_once() {
    let (chain, host) = manual_chain();
    let rec = Recorder::new();
    chain
        .append(|ctx, _| {
            let gate = ctx.once();
            gate.fire(Args::one("first"));
            gate.fire(Args::one("second"));
            Step::Suspend
        })
        .append(rec.task("downstream"))
        .append(rec.task("after"));

    chain.go();
    host.run_until_idle();

    assert_eq!(rec.labels(), vec!["downstream"]);
    assert_eq!(rec.args_of("downstream")[0].value(0), Some(&json!("first")));
}

#[test]
fn test_all_with_fewer_firings_never_advances() {
    let (chain, host) = manual_chain();
    let rec = Recorder::new();
    let gates = GateStash::new();
    let stash = gates.clone();
    chain
        .append(move |ctx, _| {
            for _ in 0..4 {
                stash.keep(ctx.all());
            }
            Step::Suspend
        })
        .append(rec.task("next"));
    chain.go();
    host.run_until_idle();

    for i in 0..3 {
        gates.get(i).call();
        gates.get(i).call();
    }
    host.run_until_idle();
    assert_eq!(rec.count("next"), 0);

    gates.get(3).call();
    assert_eq!(rec.count("next"), 1);
    assert_eq!(gates.len(), 4);
}

#[test]
fn test_all_fed_by_host_timers() {
    let (chain, host) = manual_chain();
    let rec = Recorder::new();
    let timers = host.clone();
    chain
        .append(move |ctx, _| {
            for (key, ms) in [("slow", 40u64), ("fast", 10)] {
                let token = ctx.all_keyed(key).into_fn();
                timers.schedule(
                    Duration::from_millis(ms),
                    Box::new(move || token(Args::one(ms))),
                );
            }
            Step::Suspend
        })
        .append(rec.task("joined"));

    chain.go();
    host.advance_by(Duration::from_millis(39));
    assert_eq!(rec.count("joined"), 0);
    host.advance_by(Duration::from_millis(1));

    assert_eq!(
        rec.args_of("joined")[0].to_json(),
        json!([
            {"key": "slow", "args": [40]},
            {"key": "fast", "args": [10]},
        ])
    );
}

#[test]
fn test_once_races_timers_first_wins() {
    let (chain, host) = manual_chain();
    let rec = Recorder::new();
    let timers = host.clone();
    chain
        .append(move |ctx, _| {
            let gate = ctx.once();
            for ms in [30u64, 5, 20] {
                let gate = gate.clone();
                timers.schedule(
                    Duration::from_millis(ms),
                    Box::new(move || gate.fire(Args::one(ms))),
                );
            }
            Step::Suspend
        })
        .append(rec.task("winner"))
        .append(rec.task("never"));

    chain.go();
    host.run_until_idle();

    assert_eq!(rec.labels(), vec!["winner"]);
    assert_eq!(rec.args_of("winner")[0].value(0), Some(&json!(5)));
}

#[test]
fn test_explicit_advance_beats_pending_join() {
    let (chain, host) = manual_chain();
    let rec = Recorder::new();
    let gates = GateStash::new();
    let stash = gates.clone();
    chain
        .append(move |ctx, _| {
            stash.keep(ctx.all());
            stash.keep(ctx.all());
            Step::Suspend
        })
        .append(rec.task("b"))
        .append(rec.task("c"));
    chain.go();
    host.run_until_idle();

    chain.advance(Args::one("manual"));
    gates.get(0).call();
    gates.get(1).call();

    assert_eq!(rec.labels(), vec!["b"]);
    assert_eq!(rec.args_of("b")[0].value(0), Some(&json!("manual")));
}

#[test]
fn test_chain_level_join_starts_chain() {
    let (chain, host) = manual_chain();
    let rec = Recorder::new();
    chain.append(rec.task("first"));

    let left = chain.all_keyed("left");
    let right = chain.all_keyed("right");
    right.fire(Args::one(2));
    left.fire(Args::one(1));
    assert_eq!(rec.count("first"), 0);
    host.run_until_idle();

    assert_eq!(rec.count("first"), 1);
    let args = &rec.args_of("first")[0];
    assert_eq!(args.slot(0).unwrap().key, Some(json!("left")));
    assert_eq!(args.slot(1).unwrap().values(), vec![&json!(2)]);
}

#[test]
fn test_gates_from_stale_node_are_ignored() {
    let (chain, host) = manual_chain();
    let rec = Recorder::new();
    let gates = GateStash::new();
    let stash = gates.clone();
    chain
        .append(move |ctx, _| {
            stash.keep(ctx.once());
            Step::Suspend
        })
        .append(rec.task("b"))
        .append(rec.task("c"))
        .append(rec.task("d"));
    chain.go();
    chain.go();
    chain.go();

    gates.get(0).call();
    host.run_until_idle();

    assert_eq!(rec.labels(), vec!["b", "c"]);
}
