//! Event matcher tests.
//!
//! Tests covering type matching, applicability predicates, the null subject
//! guard and match ordering across graphs.


use std::sync::Arc;

use eca_graph::adapter::Configuration;
use eca_graph::graph::Graph;
use eca_graph::matcher::EventMatcher;
use serde_json::json;
use test_utils::{ArticleSaved, Behavior, ExecutionLog, MinArticleId, On, TestAction, Tick};

fn min_id(value: serde_json::Value) -> Configuration {
    let mut configuration = Configuration::new();
    configuration.insert("min_id".to_owned(), value);
    configuration
}

fn article_graph(id: &str) -> Graph {
    let log = ExecutionLog::default();
    let mut builder = Graph::builder(id, id);
    builder
        .add_event("saved", Arc::new(On::<ArticleSaved>::new("article_saved")))
        .then("notify");
    builder.add_event("tick", Arc::new(On::<Tick>::new("tick")));
    builder
        .add_event("large_ids", Arc::new(MinArticleId))
        .configure(min_id(json!(10)));
    builder
        .add_event("misconfigured", Arc::new(MinArticleId))
        .configure(min_id(json!("ten")));
    builder.add_action("notify", TestAction::new("notify", Behavior::Succeed, &log));
    builder.build().expect("valid graph")
}

fn matched_ids(graphs: &[Arc<Graph>], event: &dyn eca_graph::RuntimeEvent) -> Vec<String> {
    EventMatcher::matches(graphs, event)
        .into_iter()
        .map(|found| format!("{}/{}", found.graph.id(), found.node.id()))
        .collect()
}

// ═══════════════════════════════════════════════════════════════════════════════
// APPLICABILITY
// ═══════════════════════════════════════════════════════════════════════════════

/// Verifies that only nodes declaring the event's concrete type apply.
#[test]
fn type_must_match() {
    let graphs = [Arc::new(article_graph("g"))];

    assert_eq!(matched_ids(&graphs, &Tick), ["g/tick"]);
    assert_eq!(matched_ids(&graphs, &ArticleSaved::new(3)), ["g/saved"]);
}

/// Verifies that the plugin predicate refines the type match.
#[test]
fn predicate_refines_match() {
    let graphs = [Arc::new(article_graph("g"))];

    assert_eq!(
        matched_ids(&graphs, &ArticleSaved::new(12)),
        ["g/saved", "g/large_ids"]
    );
}

/// Verifies that a predicate error is treated as a non-match.
#[test]
fn predicate_errors_do_not_apply() {
    let graph = article_graph("g");
    let misconfigured = graph
        .get("misconfigured")
        .and_then(|node| node.as_event())
        .expect("event node");

    assert!(!EventMatcher::applies(misconfigured, &ArticleSaved::new(50)));
}

/// Verifies that events reporting a null subject never match.
#[test]
fn null_subject_never_matches() {
    let graphs = [Arc::new(article_graph("g"))];

    assert!(matched_ids(&graphs, &ArticleSaved::null()).is_empty());
}

/// Verifies that events without a subject concept are not affected by the
/// null subject guard.
#[test]
fn absent_subject_matches() {
    let graph = article_graph("g");
    assert_eq!(EventMatcher::match_graph(&graph, &Tick).len(), 1);
}

// ═══════════════════════════════════════════════════════════════════════════════
// ORDERING
// ═══════════════════════════════════════════════════════════════════════════════

/// Verifies that matches follow graph load order, then node insertion order.
#[test]
fn matches_are_ordered_by_graph_then_node() {
    let graphs = [
        Arc::new(article_graph("second")),
        Arc::new(article_graph("first")),
    ];

    assert_eq!(
        matched_ids(&graphs, &ArticleSaved::new(20)),
        [
            "second/saved",
            "second/large_ids",
            "first/saved",
            "first/large_ids"
        ]
    );
}

/// Verifies that matching is side-effect free and repeatable.
#[test]
fn matching_is_repeatable() {
    let graphs = [Arc::new(article_graph("g"))];
    let event = ArticleSaved::new(11);

    assert_eq!(matched_ids(&graphs, &event), matched_ids(&graphs, &event));
}
