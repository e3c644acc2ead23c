//! Dispatch envelope and graph walker tests.
//!
//! Tests covering hook pairing, partial-failure isolation, access denial,
//! successor conditions, gateways, the recursion guard and prestate flow.


use std::sync::Arc;

use eca_graph::adapter::{Configuration, StandardGateway};
use eca_graph::config::EngineConfig;
use eca_graph::graph::{Graph, GraphBuilder};
use eca_graph::guard::ExecutionHistory;
use eca_graph::hooks::{HooksAPI, OnAfterDispatch, OnBeforeDispatch, ProcessorEvent};
use eca_graph::node::{Condition, GatewayType};
use eca_graph::processor::Processor;
use serde_json::json;
use test_utils::{
    ArticleSaved, Behavior, BulkAction, Constant, ExecutionLog, Exploding, ExplodingGateway, On,
    PrestateFlag, ReadPrestate, TestAction, Tick, record_hooks,
};

/// Starts a graph whose `saved` event node leads to `successors`.
fn saved_graph(id: &str, successors: &[&str]) -> GraphBuilder {
    let mut builder = Graph::builder(id, format!("{id} rules"));
    let event = builder.add_event("saved", Arc::new(On::<ArticleSaved>::new("article_saved")));
    for successor in successors {
        event.then(*successor);
    }
    builder
}

fn processor_with(graphs: impl IntoIterator<Item = Graph>) -> Processor {
    let mut processor = Processor::new(EngineConfig::default());
    for graph in graphs {
        processor.load_graph(graph);
    }
    processor
}

fn key(key: &str) -> Configuration {
    let mut configuration = Configuration::new();
    configuration.insert("key".to_owned(), json!(key));
    configuration
}

// ═══════════════════════════════════════════════════════════════════════════════
// ENVELOPE
// ═══════════════════════════════════════════════════════════════════════════════

/// Two actions run in successor order and the dispatch reports success.
#[test]
fn actions_run_in_successor_order() {
    let log = ExecutionLog::default();
    let mut builder = Graph::builder("g", "Article rules");
    builder
        .add_event("saved", Arc::new(On::<ArticleSaved>::new("article_saved")))
        .then("notify")
        .then("publish");
    builder.add_action("notify", TestAction::new("notify", Behavior::Succeed, &log));
    builder.add_action("publish", TestAction::new("publish", Behavior::Succeed, &log));
    let processor = processor_with([builder.build().expect("valid graph")]);

    assert!(processor.process(&ArticleSaved::new(7), None));
    assert_eq!(log.entries(), ["notify:7", "publish:7"]);
}

/// Every dispatch is wrapped by exactly one before and one after hook, with
/// action hooks nested inside.
#[test]
fn hooks_pair_around_dispatch_and_actions() {
    let log = ExecutionLog::default();
    let hook_log = ExecutionLog::default();
    let hooks = HooksAPI::new();
    record_hooks(&hooks, &hook_log);

    let mut builder = saved_graph("g", &["notify"]);
    builder.add_action("notify", TestAction::new("notify", Behavior::Succeed, &log));
    let processor = processor_with([builder.build().expect("valid graph")]);

    assert!(processor.process(&ArticleSaved::new(1), Some(&hooks)));
    assert_eq!(
        hook_log.entries(),
        [
            "before_dispatch:saved",
            "before_action:notify",
            "after_action:notify:access=true:exception=false",
            "after_dispatch:saved:executed=true:exception=false",
        ]
    );
}

/// Events no node applies to fire no hooks and succeed.
#[test]
fn unmatched_events_are_a_no_op() {
    let hook_log = ExecutionLog::default();
    let hooks = HooksAPI::new();
    record_hooks(&hooks, &hook_log);
    let processor = processor_with([saved_graph("g", &[]).build().expect("valid graph")]);

    assert!(processor.process(&Tick, Some(&hooks)));
    assert!(hook_log.entries().is_empty());
}

/// Dispatch never mutates the graph.
#[test]
fn graphs_are_not_mutated_by_dispatch() {
    let log = ExecutionLog::default();
    let mut builder = saved_graph("g", &["explode", "notify"]);
    builder.add_action("explode", TestAction::new("explode", Behavior::Panic, &log));
    builder.add_action("notify", TestAction::new("notify", Behavior::Succeed, &log));
    let processor = processor_with([builder.build().expect("valid graph")]);

    let before = format!("{:?}", processor.graphs());
    processor.process(&ArticleSaved::new(1), None);
    processor.process(&ArticleSaved::new(2), None);
    assert_eq!(format!("{:?}", processor.graphs()), before);
}

// ═══════════════════════════════════════════════════════════════════════════════
// FAILURE ISOLATION
// ═══════════════════════════════════════════════════════════════════════════════

/// A failing action does not stop its siblings; the result reports failure.
#[test]
fn failing_action_does_not_abort_siblings() {
    let log = ExecutionLog::default();
    let hook_log = ExecutionLog::default();
    let hooks = HooksAPI::new();
    record_hooks(&hooks, &hook_log);

    let mut builder = saved_graph("g", &["explode", "publish"]);
    builder.add_action("explode", TestAction::new("explode", Behavior::Fail, &log));
    builder.add_action("publish", TestAction::new("publish", Behavior::Succeed, &log));
    let processor = processor_with([builder.build().expect("valid graph")]);

    assert!(!processor.process(&ArticleSaved::new(4), Some(&hooks)));
    assert_eq!(log.entries(), ["explode:4", "publish:4"]);

    let entries = hook_log.entries();
    assert!(entries.contains(&"after_action:explode:access=true:exception=true".to_owned()));
    assert!(entries.contains(&"after_action:publish:access=true:exception=false".to_owned()));
    assert_eq!(
        entries.last().map(String::as_str),
        Some("after_dispatch:saved:executed=true:exception=true")
    );
}

/// A panicking action is caught like an error.
#[test]
fn panicking_action_is_isolated() {
    let log = ExecutionLog::default();
    let mut builder = saved_graph("g", &["explode", "publish"]);
    builder.add_action("explode", TestAction::new("explode", Behavior::Panic, &log));
    builder.add_action("publish", TestAction::new("publish", Behavior::Succeed, &log));
    let processor = processor_with([builder.build().expect("valid graph")]);

    assert!(!processor.process(&ArticleSaved::new(9), None));
    assert_eq!(log.entries(), ["explode:9", "publish:9"]);
}

/// Access denial skips the target without counting as a failure.
#[test]
fn access_denial_is_not_an_exception() {
    let log = ExecutionLog::default();
    let hook_log = ExecutionLog::default();
    let hooks = HooksAPI::new();
    record_hooks(&hooks, &hook_log);

    let mut builder = saved_graph("g", &["guarded", "publish"]);
    builder.add_action("guarded", TestAction::new("guarded", Behavior::DenyAccess, &log));
    builder.add_action("publish", TestAction::new("publish", Behavior::Succeed, &log));
    let processor = processor_with([builder.build().expect("valid graph")]);

    assert!(processor.process(&ArticleSaved::new(2), Some(&hooks)));
    assert_eq!(log.entries(), ["publish:2"]);
    assert!(
        hook_log
            .entries()
            .contains(&"after_action:guarded:access=false:exception=false".to_owned())
    );
}

/// Targets of one action are isolated from each other.
#[test]
fn targets_are_executed_independently() {
    let log = ExecutionLog::default();
    let mut builder = saved_graph("g", &["bulk"]);
    let mut ids = Configuration::new();
    ids.insert("ids".to_owned(), json!([1, 0, 2, 3]));
    builder
        .add_action(
            "bulk",
            Arc::new(BulkAction {
                log: log.clone(),
                fail_on: Some(2),
            }),
        )
        .configure(ids);
    let processor = processor_with([builder.build().expect("valid graph")]);

    assert!(!processor.process(&ArticleSaved::new(5), None));
    assert_eq!(log.entries(), ["bulk:1", "bulk:2", "bulk:3"]);
}

/// The overall result is the conjunction of every dispatch, and a failing
/// graph does not prevent later graphs from running.
#[test]
fn result_is_conjunction_over_graphs() {
    let log = ExecutionLog::default();
    let mut failing = saved_graph("failing", &["explode"]);
    failing.add_action("explode", TestAction::new("explode", Behavior::Fail, &log));
    let mut passing = saved_graph("passing", &["publish"]);
    passing.add_action("publish", TestAction::new("publish", Behavior::Succeed, &log));

    let processor = processor_with([
        failing.build().expect("valid graph"),
        passing.build().expect("valid graph"),
    ]);

    assert!(!processor.process(&ArticleSaved::new(3), None));
    assert_eq!(log.entries(), ["explode:3", "publish:3"]);
}

/// A panicking access check fails only its own target: the after-hook still
/// fires and sibling actions still run.
#[test]
fn panicking_access_check_is_isolated() {
    let log = ExecutionLog::default();
    let hook_log = ExecutionLog::default();
    let hooks = HooksAPI::new();
    record_hooks(&hooks, &hook_log);

    let mut builder = saved_graph("g", &["guarded", "publish"]);
    builder.add_action("guarded", TestAction::new("guarded", Behavior::PanicOnAccess, &log));
    builder.add_action("publish", TestAction::new("publish", Behavior::Succeed, &log));
    let processor = processor_with([builder.build().expect("valid graph")]);

    assert!(!processor.process(&ArticleSaved::new(4), Some(&hooks)));
    assert_eq!(log.entries(), ["publish:4"]);

    let entries = hook_log.entries();
    assert!(entries.contains(&"after_action:guarded:access=false:exception=true".to_owned()));
    assert_eq!(
        entries.last().map(String::as_str),
        Some("after_dispatch:saved:executed=true:exception=true")
    );
}

/// A panic while resolving targets counts as a failure and the walk
/// continues past the action.
#[test]
fn panicking_target_resolution_is_isolated() {
    let log = ExecutionLog::default();
    let mut builder = saved_graph("g", &["resolve", "publish"]);
    builder
        .add_action("resolve", TestAction::new("resolve", Behavior::PanicOnTargets, &log))
        .then("notify");
    builder.add_action("notify", TestAction::new("notify", Behavior::Succeed, &log));
    builder.add_action("publish", TestAction::new("publish", Behavior::Succeed, &log));
    let processor = processor_with([builder.build().expect("valid graph")]);

    assert!(!processor.process(&ArticleSaved::new(6), None));
    assert_eq!(log.entries(), ["notify:6", "publish:6"]);
}

/// A panicking successor condition skips that successor only.
#[test]
fn panicking_condition_is_isolated() {
    let log = ExecutionLog::default();
    let mut builder = Graph::builder("g", "Article rules");
    builder
        .add_event("saved", Arc::new(On::<ArticleSaved>::new("article_saved")))
        .then_if("notify", Condition::new("exploding", Arc::new(Exploding)))
        .then("publish");
    builder.add_action("notify", TestAction::new("notify", Behavior::Succeed, &log));
    builder.add_action("publish", TestAction::new("publish", Behavior::Succeed, &log));
    let processor = processor_with([builder.build().expect("valid graph")]);

    assert!(!processor.process(&ArticleSaved::new(3), None));
    assert_eq!(log.entries(), ["publish:3"]);
}

/// A panicking gateway selects nothing and the dispatch still completes.
#[test]
fn panicking_gateway_is_isolated() {
    let log = ExecutionLog::default();
    let hook_log = ExecutionLog::default();
    let hooks = HooksAPI::new();
    record_hooks(&hooks, &hook_log);

    let mut builder = saved_graph("g", &["route", "publish"]);
    builder
        .add_gateway("route", GatewayType::PARALLEL, Arc::new(ExplodingGateway))
        .then("notify");
    builder.add_action("notify", TestAction::new("notify", Behavior::Succeed, &log));
    builder.add_action("publish", TestAction::new("publish", Behavior::Succeed, &log));
    let processor = processor_with([builder.build().expect("valid graph")]);

    assert!(!processor.process(&ArticleSaved::new(5), Some(&hooks)));
    assert_eq!(log.entries(), ["publish:5"]);
    assert_eq!(
        hook_log.entries().last().map(String::as_str),
        Some("after_dispatch:saved:executed=true:exception=true")
    );
}

// ═══════════════════════════════════════════════════════════════════════════════
// WALKER
// ═══════════════════════════════════════════════════════════════════════════════

/// Non-continuing actions do not walk their successors.
#[test]
fn halted_action_stops_the_walk() {
    let log = ExecutionLog::default();
    let mut builder = saved_graph("g", &["notify"]);
    builder
        .add_action("notify", TestAction::new("notify", Behavior::Succeed, &log))
        .then("publish")
        .halt();
    builder.add_action("publish", TestAction::new("publish", Behavior::Succeed, &log));
    let processor = processor_with([builder.build().expect("valid graph")]);

    assert!(processor.process(&ArticleSaved::new(1), None));
    assert_eq!(log.entries(), ["notify:1"]);
}

/// Successor conditions are evaluated against the prestate written by
/// before-dispatch hooks.
#[test]
fn successor_conditions_read_prestate() {
    let log = ExecutionLog::default();
    let mut builder = Graph::builder("g", "");
    builder
        .add_event("saved", Arc::new(On::<ArticleSaved>::new("article_saved")))
        .then_if(
            "notify",
            Condition::new("flag_set", Arc::new(PrestateFlag)).with_configuration(key("flag")),
        )
        .then_if(
            "publish",
            Condition::new("flag_unset", Arc::new(PrestateFlag))
                .with_configuration(key("flag"))
                .negated(),
        )
        .then_if("explode", Condition::new("broken", Arc::new(PrestateFlag)));
    builder.add_action("notify", TestAction::new("notify", Behavior::Succeed, &log));
    builder.add_action("publish", TestAction::new("publish", Behavior::Succeed, &log));
    builder.add_action("explode", TestAction::new("explode", Behavior::Fail, &log));
    let processor = processor_with([builder.build().expect("valid graph")]);

    assert!(processor.process(&ArticleSaved::new(1), None));
    assert_eq!(log.entries(), ["publish:1"]);

    let hooks = HooksAPI::new();
    hooks
        .register_mutator::<OnBeforeDispatch, _>("flag", |prestate, _| {
            prestate.insert("flag", true);
        })
        .expect("registration should succeed");
    assert!(processor.process(&ArticleSaved::new(2), Some(&hooks)));
    assert_eq!(log.entries(), ["publish:1", "notify:2"]);
}

fn gateway_graph(gateway_type: GatewayType, log: &ExecutionLog) -> Graph {
    let mut builder = saved_graph("g", &["route"]);
    builder
        .add_gateway("route", gateway_type, Arc::new(StandardGateway))
        .then_if("first", Condition::new("never", Arc::new(Constant("never", false))))
        .then_if("second", Condition::new("always", Arc::new(Constant("always", true))))
        .then("third");
    for id in ["first", "second", "third"] {
        builder.add_action(id, TestAction::new(id, Behavior::Succeed, log));
    }
    builder.build().expect("valid graph")
}

/// The standard gateway routes according to its type.
#[test]
fn gateways_select_branches_by_type() {
    let cases = [
        (GatewayType::EXCLUSIVE, vec!["second:1"]),
        (GatewayType::PARALLEL, vec!["first:1", "second:1", "third:1"]),
        (GatewayType::INCLUSIVE, vec!["second:1", "third:1"]),
        (GatewayType(7), vec![]),
    ];

    for (gateway_type, expected) in cases {
        let log = ExecutionLog::default();
        let processor = processor_with([gateway_graph(gateway_type, &log)]);
        assert!(processor.process(&ArticleSaved::new(1), None));
        assert_eq!(log.entries(), expected, "gateway type {gateway_type:?}");
    }
}

/// Event nodes reached through successors are dispatched in their own
/// envelope.
#[test]
fn event_successor_opens_nested_envelope() {
    let log = ExecutionLog::default();
    let hook_log = ExecutionLog::default();
    let hooks = HooksAPI::new();
    record_hooks(&hooks, &hook_log);

    let mut builder = saved_graph("g", &["notify"]);
    builder
        .add_action("notify", TestAction::new("notify", Behavior::Succeed, &log))
        .then("follow_up");
    builder
        .add_event("follow_up", Arc::new(On::<Tick>::new("tick")))
        .then("publish");
    builder.add_action("publish", TestAction::new("publish", Behavior::Succeed, &log));
    let processor = processor_with([builder.build().expect("valid graph")]);

    assert!(processor.process(&ArticleSaved::new(6), Some(&hooks)));
    assert_eq!(log.entries(), ["notify:6", "publish:6"]);
    assert_eq!(
        hook_log
            .entries()
            .iter()
            .filter(|entry| entry.starts_with("before_dispatch"))
            .count(),
        2
    );
}

/// Cycles that never pass an event node are cut at the walk depth limit.
#[test]
fn action_cycles_are_bounded_by_walk_depth() {
    let log = ExecutionLog::default();
    let mut builder = saved_graph("g", &["a"]);
    builder
        .add_action("a", TestAction::new("a", Behavior::Succeed, &log))
        .then("b");
    builder
        .add_action("b", TestAction::new("b", Behavior::Succeed, &log))
        .then("a");
    let mut processor = Processor::new(EngineConfig::default().with_max_walk_depth(5));
    processor.load_graph(builder.build().expect("valid graph"));

    assert!(processor.process(&ArticleSaved::new(1), None));
    assert_eq!(log.count("a:1"), 3);
    assert_eq!(log.count("b:1"), 2);
}

// ═══════════════════════════════════════════════════════════════════════════════
// RECURSION GUARD
// ═══════════════════════════════════════════════════════════════════════════════

fn retrigger_processor(threshold: usize, log: &ExecutionLog) -> Processor {
    let mut builder = Graph::builder("loop", "Self-triggering loop");
    builder
        .add_event("tick", Arc::new(On::<Tick>::new("tick")))
        .then("again");
    builder.add_action("again", TestAction::new("again", Behavior::Retrigger, log));

    let mut processor =
        Processor::new(EngineConfig::default().with_recursion_threshold(threshold));
    processor.load_graph(builder.build().expect("valid graph"));
    processor
}

/// A self-triggering action is cut off once the pair reaches the threshold,
/// and the chain still reports success.
#[test]
fn self_retrigger_is_cut_off_at_threshold() {
    let log = ExecutionLog::default();
    let hook_log = ExecutionLog::default();
    let hooks = HooksAPI::new();
    record_hooks(&hooks, &hook_log);
    let processor = retrigger_processor(3, &log);

    assert!(processor.process(&Tick, Some(&hooks)));
    assert_eq!(log.count("again"), 3);
    assert_eq!(log.count("again:triggered:true"), 3);

    let hooks_seen = hook_log.entries();
    assert_eq!(
        hooks_seen
            .iter()
            .filter(|entry| entry.starts_with("before_dispatch:tick"))
            .count(),
        4
    );
    assert_eq!(
        hooks_seen
            .iter()
            .filter(|entry| *entry == "after_dispatch:tick:executed=false:exception=false")
            .count(),
        1
    );
}

/// Every top-level call starts with an empty history.
#[test]
fn history_is_scoped_to_top_level_call() {
    let log = ExecutionLog::default();
    let processor = retrigger_processor(2, &log);

    assert!(processor.process(&Tick, None));
    assert!(processor.process(&Tick, None));
    assert_eq!(log.count("again"), 4);
}

/// A blocked dispatch still delivers the before-hook prestate to the
/// after-hook.
#[test]
fn blocked_dispatch_keeps_prestate() {
    let log = ExecutionLog::default();
    let processor = retrigger_processor(1, &log);
    let graph = Arc::clone(&processor.graphs()[0]);
    let event_node = graph.events().next().expect("event node");

    let seen = ExecutionLog::default();
    let hooks = HooksAPI::new();
    hooks
        .register_mutator::<OnBeforeDispatch, _>("snapshot", |prestate, _| {
            prestate.insert("snapshot", "taken");
        })
        .expect("registration should succeed");
    {
        let seen = seen.clone();
        hooks
            .register_mutator::<OnAfterDispatch, _>("check", move |prestate, event| {
                if let ProcessorEvent::AfterDispatch { executed, .. } = event {
                    seen.record(format!(
                        "executed={executed}:snapshot={}",
                        prestate.get("snapshot").is_some()
                    ));
                }
            })
            .expect("registration should succeed");
    }

    let mut history = ExecutionHistory::new();
    history.push("loop", "tick");
    assert!(processor.dispatch(&graph, event_node, &Tick, &mut history, Some(&hooks)));
    assert_eq!(seen.entries(), ["executed=false:snapshot=true"]);
    assert!(log.entries().is_empty());
}

/// Two event nodes raising each other's events: each pair is cut off at the
/// threshold.
fn ping_pong_processor(config: EngineConfig, log: &ExecutionLog) -> Processor {
    let mut builder = Graph::builder("ping_pong", "Mutually triggering events");
    builder
        .add_event("on_tick", Arc::new(On::<Tick>::new("tick")))
        .then("ping");
    builder
        .add_event("on_saved", Arc::new(On::<ArticleSaved>::new("article_saved")))
        .then("pong");
    builder.add_action("ping", TestAction::new("ping", Behavior::RaiseSaved, log));
    builder.add_action("pong", TestAction::new("pong", Behavior::Retrigger, log));

    let mut processor = Processor::new(config);
    processor.load_graph(builder.build().expect("valid graph"));
    processor
}

/// A cycle through two event nodes stops once either pair hits the threshold.
#[test]
fn mutual_retrigger_is_cut_off_at_threshold() {
    let log = ExecutionLog::default();
    let processor = ping_pong_processor(EngineConfig::default(), &log);

    assert!(processor.process(&Tick, None));
    assert_eq!(log.count("ping"), 3);
    assert_eq!(log.count("pong:1"), 3);
}

/// A history that fills up before any pair reaches the threshold still stops
/// the cycle.
#[test]
fn full_history_stops_mutual_retrigger() {
    let log = ExecutionLog::default();
    let config = EngineConfig::default()
        .with_recursion_threshold(3)
        .with_history_capacity(3);
    assert!(config.validate().is_ok());
    let processor = ping_pong_processor(config, &log);

    assert!(processor.process(&Tick, None));
    assert_eq!(log.count("ping"), 2);
    assert_eq!(log.count("pong:1"), 1);
}

/// An event node reached again through an action's successors counts toward
/// the same threshold as a re-raised event.
#[test]
fn successor_cycle_back_to_event_node_is_cut_off() {
    let log = ExecutionLog::default();
    let mut builder = saved_graph("g", &["notify"]);
    builder
        .add_action("notify", TestAction::new("notify", Behavior::Succeed, &log))
        .then("saved");
    let processor = processor_with([builder.build().expect("valid graph")]);

    assert!(processor.process(&ArticleSaved::new(7), None));
    assert_eq!(log.count("notify:7"), 3);
}

/// Once the history is full, remaining matches of the same event are skipped
/// even though none of them has run before.
#[test]
fn full_history_skips_remaining_matches() {
    let log = ExecutionLog::default();
    let graphs = ["first", "second", "third"].map(|id| {
        let mut builder = Graph::builder(id, format!("{id} rules"));
        builder
            .add_event("tick", Arc::new(On::<Tick>::new("tick")))
            .then("run");
        builder.add_action("run", TestAction::new(id, Behavior::Succeed, &log));
        builder.build().expect("valid graph")
    });
    let mut processor = Processor::new(
        EngineConfig::default()
            .with_recursion_threshold(1)
            .with_history_capacity(2),
    );
    for graph in graphs {
        processor.load_graph(graph);
    }

    assert!(processor.process(&Tick, None));
    assert_eq!(log.entries(), ["first", "second"]);
}

// ═══════════════════════════════════════════════════════════════════════════════
// PRESTATE
// ═══════════════════════════════════════════════════════════════════════════════

/// Prestate written before dispatch is visible to actions, and writes made by
/// actions are visible after dispatch.
#[test]
fn prestate_flows_from_before_to_after_hook() {
    let log = ExecutionLog::default();
    let mut builder = saved_graph("g", &["read"]);
    builder
        .add_action("read", Arc::new(ReadPrestate { log: log.clone() }))
        .configure(key("original_title"));
    let processor = processor_with([builder.build().expect("valid graph")]);

    let hooks = HooksAPI::new();
    hooks
        .register_mutator::<OnBeforeDispatch, _>("original_title", |prestate, event| {
            let title = event
                .event()
                .downcast_ref::<ArticleSaved>()
                .and_then(|saved| saved.article.as_ref())
                .and_then(|article| article.downcast_ref::<test_utils::Article>())
                .map(|article| article.title.clone());
            if let Some(title) = title {
                prestate.insert("original_title", title);
            }
        })
        .expect("registration should succeed");
    {
        let log = log.clone();
        hooks
            .register_mutator::<OnAfterDispatch, _>("after", move |prestate, _| {
                log.record(format!(
                    "after:seen_by_action={}",
                    prestate.get_as::<bool>("seen_by_action").unwrap_or(false)
                ));
            })
            .expect("registration should succeed");
    }

    assert!(processor.process(&ArticleSaved::new(8), Some(&hooks)));
    assert_eq!(
        log.entries(),
        [
            "prestate:original_title=\"Article 8\"",
            "after:seen_by_action=true"
        ]
    );
}

/// Each dispatch receives a fresh prestate.
#[test]
fn prestate_is_fresh_per_dispatch() {
    let log = ExecutionLog::default();
    let mut builder = saved_graph("g", &["read"]);
    builder
        .add_action("read", Arc::new(ReadPrestate { log: log.clone() }))
        .configure(key("seen_by_action"));
    let processor = processor_with([builder.build().expect("valid graph")]);

    assert!(processor.process(&ArticleSaved::new(1), None));
    assert!(processor.process(&ArticleSaved::new(2), None));
    assert_eq!(
        log.entries(),
        ["prestate:seen_by_action=missing", "prestate:seen_by_action=missing"]
    );
}
