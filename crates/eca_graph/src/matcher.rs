//! Event node applicability.
//!
//! An event node applies to a runtime event when all of the following hold:
//!
//! 1. the event's concrete type is the type the node's plugin declares
//! 2. the plugin's `applies` predicate returns `Ok(true)`
//! 3. the event does not report a null subject
//!
//! Matching has no side effects and never fails. Predicate errors are logged
//! at `debug` and count as "does not apply".

use std::sync::Arc;

use crate::event::RuntimeEvent;
use crate::graph::Graph;
use crate::node::EventNode;

/// An event node that applies to a runtime event.
#[derive(Debug, Clone, Copy)]
pub struct EventMatch<'g> {
    /// The graph owning the node.
    pub graph: &'g Graph,
    /// The applying event node.
    pub node: &'g EventNode,
}

/// Selects the event nodes that apply to a runtime event.
#[derive(Debug, Clone, Copy, Default)]
pub struct EventMatcher;

impl EventMatcher {
    /// Returns whether `node` applies to `event`.
    #[must_use]
    pub fn applies(node: &EventNode, event: &dyn RuntimeEvent) -> bool {
        if node.plugin.event_type() != event.event_type() {
            return false;
        }
        if event.subject().is_null() {
            tracing::debug!(
                node_id = node.id(),
                event_name = event.name(),
                "event subject is null, node does not apply"
            );
            return false;
        }
        match node
            .plugin
            .applies(&node.data.id, &node.data.configuration, event)
        {
            Ok(applies) => applies,
            Err(err) => {
                tracing::debug!(
                    node_id = node.id(),
                    event_name = event.name(),
                    error = %err,
                    "event predicate failed, node does not apply"
                );
                false
            }
        }
    }

    /// Returns the applying event nodes of one graph, in insertion order.
    #[must_use]
    pub fn match_graph<'g>(graph: &'g Graph, event: &dyn RuntimeEvent) -> Vec<EventMatch<'g>> {
        graph
            .events()
            .filter(|node| Self::applies(node, event))
            .map(|node| EventMatch { graph, node })
            .collect()
    }

    /// Returns the applying event nodes of all graphs, in graph order and
    /// then node insertion order.
    #[must_use]
    pub fn matches<'g>(graphs: &'g [Arc<Graph>], event: &dyn RuntimeEvent) -> Vec<EventMatch<'g>> {
        graphs
            .iter()
            .flat_map(|graph| Self::match_graph(graph, event))
            .collect()
    }
}
