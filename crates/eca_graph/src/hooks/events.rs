//! Unified event enum for processor hooks.
//!
//! All hooks receive `&ProcessorEvent` and match on variants for typed
//! access. Variants borrow from the running dispatch, so hooks may inspect
//! the graph, the nodes and the runtime event without cloning.
//!
//! # Example
//!
//! ```ignore
//! fn handle_event(event: &ProcessorEvent<'_>) {
//!     match event {
//!         ProcessorEvent::AfterDispatch { graph, executed: false, .. } => {
//!             println!("{} was skipped", graph.label());
//!         }
//!         ProcessorEvent::AfterActionExecution { action, exception_thrown: true, .. } => {
//!             println!("{} failed", action.id());
//!         }
//!         _ => {}
//!     }
//! }
//! ```

use crate::event::{BoxedTarget, RuntimeEvent};
use crate::graph::Graph;
use crate::node::{ActionNode, EventNode, NodeData};

/// Unified event enum for all processor hooks.
#[derive(Debug, Clone, Copy)]
pub enum ProcessorEvent<'a> {
    // ─────────────────────────────────────────────────────────────────────────
    // Dispatch Events
    // ─────────────────────────────────────────────────────────────────────────
    /// Emitted before an event node is dispatched.
    BeforeDispatch {
        /// The graph being dispatched.
        graph: &'a Graph,
        /// The applying event node.
        event_node: &'a EventNode,
        /// The runtime event.
        event: &'a dyn RuntimeEvent,
    },

    /// Emitted after an event node was dispatched.
    AfterDispatch {
        /// The graph that was dispatched.
        graph: &'a Graph,
        /// The applying event node.
        event_node: &'a EventNode,
        /// The runtime event.
        event: &'a dyn RuntimeEvent,
        /// False if the recursion guard skipped the walk.
        executed: bool,
        /// True if any action failed during the walk.
        exception_thrown: bool,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Action Events
    // ─────────────────────────────────────────────────────────────────────────
    /// Emitted before an action runs on one target.
    BeforeActionExecution {
        /// The graph containing the action.
        graph: &'a Graph,
        /// The action node.
        action: &'a ActionNode,
        /// The target about to be processed.
        target: &'a BoxedTarget,
        /// The runtime event.
        event: &'a dyn RuntimeEvent,
        /// The node the walk came from.
        predecessor: &'a NodeData,
    },

    /// Emitted after an action ran on one target.
    AfterActionExecution {
        /// The graph containing the action.
        graph: &'a Graph,
        /// The action node.
        action: &'a ActionNode,
        /// The processed target.
        target: &'a BoxedTarget,
        /// The runtime event.
        event: &'a dyn RuntimeEvent,
        /// False if the access check denied the target.
        access_granted: bool,
        /// True if the action returned an error or panicked.
        exception_thrown: bool,
    },
}

impl<'a> ProcessorEvent<'a> {
    /// Returns the variant name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            ProcessorEvent::BeforeDispatch { .. } => "BeforeDispatch",
            ProcessorEvent::AfterDispatch { .. } => "AfterDispatch",
            ProcessorEvent::BeforeActionExecution { .. } => "BeforeActionExecution",
            ProcessorEvent::AfterActionExecution { .. } => "AfterActionExecution",
        }
    }

    /// Returns the graph the event belongs to.
    #[must_use]
    pub fn graph(&self) -> &'a Graph {
        match *self {
            ProcessorEvent::BeforeDispatch { graph, .. }
            | ProcessorEvent::AfterDispatch { graph, .. }
            | ProcessorEvent::BeforeActionExecution { graph, .. }
            | ProcessorEvent::AfterActionExecution { graph, .. } => graph,
        }
    }

    /// Returns the runtime event being processed.
    #[must_use]
    pub fn event(&self) -> &'a dyn RuntimeEvent {
        match *self {
            ProcessorEvent::BeforeDispatch { event, .. }
            | ProcessorEvent::AfterDispatch { event, .. }
            | ProcessorEvent::BeforeActionExecution { event, .. }
            | ProcessorEvent::AfterActionExecution { event, .. } => event,
        }
    }
}
