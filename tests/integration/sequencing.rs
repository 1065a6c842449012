//! Sequencing integration tests.
//!
//! Tests that verify one-step-per-trigger execution, implicit continuation
//! and live extension of an exhausted chain.

use crate::common::manual_chain;
use rytm::testing::Recorder;
use rytm::{Args, Chain, ChainConfig, NodeId, Step, labeled, task};
use serde_json::json;
use std::cell::RefCell;
use std::rc::Rc;

#[test]
fn test_sync_advance_runs_next_task_in_same_turn() {
    let (chain, host) = manual_chain();
    let rec = Recorder::new();
    chain
        .append(|ctx, _| {
            ctx.advance(Args::new());
            Step::Suspend
        })
        .append(rec.task("task 2"));

    chain.go();

    assert_eq!(rec.labels(), vec!["task 2"]);
    assert!(rec.args_of("task 2")[0].is_empty());
    assert_eq!(host.pending(), 0);
}

#[test]
fn test_n_advances_visit_first_n_nodes() {
    for n in 0..6 {
        let (chain, _) = manual_chain();
        let rec = Recorder::new();
        for i in 0..5 {
            chain.append(rec.task(&format!("t{}", i)));
        }

        for _ in 0..n {
            chain.go();
        }

        let expected: Vec<String> = (0..n.min(5)).map(|i| format!("t{}", i)).collect();
        assert_eq!(rec.labels(), expected);
    }
}

#[test]
fn test_continue_chains_run_to_completion() {
    let (chain, _) = manual_chain();
    chain
        .append(|_, _| Step::with(Args::one(1)))
        .append(|_, args| {
            let n = args.value(0).and_then(|v| v.as_i64()).unwrap_or_default();
            Step::with(Args::one(n + 1))
        })
        .append(|_, args| {
            let n = args.value(0).and_then(|v| v.as_i64()).unwrap_or_default();
            Step::with(Args::one(n * 10))
        });
    let rec = Recorder::new();
    chain.append(rec.task("sink"));

    chain.go();

    assert_eq!(rec.args_of("sink")[0].value(0), Some(&json!(20)));
    assert!(chain.is_exhausted());
}

#[test]
fn test_very_long_continue_chain() {
    let (chain, _) = manual_chain();
    for _ in 0..200_000 {
        chain.append(|_, args| {
            let n = args.value(0).and_then(|v| v.as_u64()).unwrap_or_default();
            Step::with(Args::one(n + 1))
        });
    }
    let rec = Recorder::new();
    chain.append(rec.task("sink"));

    chain.advance(Args::one(0));

    assert_eq!(rec.args_of("sink")[0].value(0), Some(&json!(200_000)));
    assert!(chain.is_exhausted());
}

#[test]
fn test_append_after_exhaustion_resumes() {
    let (chain, _) = manual_chain();
    let rec = Recorder::new();
    chain.append(rec.task("a"));
    chain.go();
    chain.go();
    assert!(chain.is_exhausted());

    chain.append(rec.task("b")).append(rec.task("c"));
    chain.advance(Args::one("resumed"));

    assert_eq!(rec.labels(), vec!["a", "b"]);
    assert_eq!(rec.args_of("b")[0].value(0), Some(&json!("resumed")));
    assert_eq!(chain.cursor(), Some(NodeId::new(3)));
}

#[test]
fn test_append_from_running_task_extends_chain() {
    let (chain, _) = manual_chain();
    let rec = Recorder::new();
    let late = rec.clone();
    chain.append(move |ctx, _| {
        ctx.chain().append(late.task("late"));
        Step::next()
    });

    chain.go();

    assert_eq!(rec.labels(), vec!["late"]);
    assert_eq!(chain.len(), 2);
}

#[test]
fn test_advance_past_end_is_ignored() {
    let (chain, _) = manual_chain();
    chain.append(|_, _| Step::Suspend);
    chain.go();
    chain.go();

    assert!(chain.try_advance(Args::one(1)).is_ok());
    assert!(chain.is_exhausted());
}

#[test]
fn test_from_tasks_keeps_declaration_order() {
    let rec = Recorder::new();
    let chain = Chain::builder()
        .host(Rc::new(rytm::testing::ManualHost::new()))
        .name("ordered")
        .build();
    chain.extend(vec![
        task(rec.continuing("one")),
        labeled("two", rec.continuing("two")),
        task(rec.task("three")),
    ]);

    chain.go();

    assert_eq!(rec.labels(), vec!["one", "two", "three"]);
    assert_eq!(chain.nodes()[2].label.as_deref(), Some("two"));
    assert_eq!(chain.current().unwrap().id, NodeId::new(3));
}

#[test]
fn test_chains_do_not_share_state() {
    let (first, _) = manual_chain();
    let (second, _) = manual_chain();
    first
        .append(|ctx, _| {
            ctx.peek(Args::new());
            Step::Suspend
        })
        .append(|_, _| Step::Suspend);
    second.append(|_, _| Step::Suspend);

    first.go();

    assert_eq!(first.pending_peeks(), 1);
    assert_eq!(second.pending_peeks(), 0);
    assert_eq!(second.cursor(), Some(NodeId::HEAD));
    assert_ne!(first.id(), second.id());
}

#[test]
fn test_custom_task_type() {
    struct Counter {
        hits: Rc<RefCell<u32>>,
    }

    impl rytm::Task for Counter {
        fn run(&self, _ctx: &rytm::Continuation, args: Args) -> Step {
            *self.hits.borrow_mut() += 1;
            Step::Continue(args)
        }

        fn label(&self) -> Option<&str> {
            Some("counter")
        }
    }

    let hits = Rc::new(RefCell::new(0));
    let chain = Chain::builder()
        .config(ChainConfig {
            name: "custom".into(),
            ..ChainConfig::default()
        })
        .host(Rc::new(rytm::testing::ManualHost::new()))
        .build();
    chain
        .append_task(Counter { hits: hits.clone() })
        .append_task(Counter { hits: hits.clone() });

    chain.go();

    assert_eq!(*hits.borrow(), 2);
    assert_eq!(chain.nodes()[1].label.as_deref(), Some("counter"));
    assert_eq!(chain.name(), "custom");
}
