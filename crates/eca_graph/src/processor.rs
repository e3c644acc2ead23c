//! Dispatch envelope and graph walker.
//!
//! The [`Processor`] owns the loaded graphs and the engine configuration.
//! [`Processor::process`] is the entry point for a runtime event:
//!
//! 1. the [`EventMatcher`] selects the applying event nodes
//! 2. every match is dispatched inside an envelope that fires
//!    `OnBeforeDispatch`, consults the recursion guard, walks the successor
//!    chain and fires `OnAfterDispatch`
//! 3. the result is `true` unless a plugin failed somewhere
//!
//! Every plugin call made by the walker (targets, access, execute, conditions
//! and gateways) runs inside a failure boundary: errors and panics are logged
//! and recorded, and the walk continues with the next target and successor.
//!
//! # Re-entrancy
//!
//! An action may raise a follow-up event through
//! [`ActionContext::trigger`]. The nested dispatch shares the
//! [`ExecutionHistory`] of the top-level call, which is how the recursion
//! guard bounds self-triggering chains.

use core::any::Any;
use std::backtrace::Backtrace;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use eca_system::plugin::{Schedule, ScheduleId};
use eca_system::server::Server;

use crate::adapter::{BranchContext, Configuration};
use crate::config::EngineConfig;
use crate::definition::GraphDefinition;
use crate::event::{BoxedTarget, RuntimeEvent};
use crate::graph::{Graph, GraphError};
use crate::guard::{ExecutionHistory, exceeds_threshold};
use crate::hooks::{
    HooksAPI, OnAfterActionExecution, OnAfterDispatch, OnBeforeActionExecution, OnBeforeDispatch,
    ProcessorEvent,
};
use crate::matcher::EventMatcher;
use crate::node::{ActionNode, EventNode, Node, NodeData, NodeIndex, Successor};
use crate::prestate::Prestate;
use crate::registry::PluginRegistry;

// ─────────────────────────────────────────────────────────────────────────────
// Processor
// ─────────────────────────────────────────────────────────────────────────────

/// Runs runtime events through the loaded rule graphs.
#[derive(Debug, Default)]
pub struct Processor {
    graphs: Vec<Arc<Graph>>,
    config: EngineConfig,
}

impl Processor {
    /// Creates a processor without graphs.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            graphs: Vec::new(),
            config,
        }
    }

    /// Creates a processor using the [`EngineConfig`] published on `server`,
    /// or the default configuration if none is present.
    #[must_use]
    pub fn from_server(server: &Server) -> Self {
        Self::new(server.get_global::<EngineConfig>().cloned().unwrap_or_default())
    }

    /// Returns the engine configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns the loaded graphs in load order.
    #[must_use]
    pub fn graphs(&self) -> &[Arc<Graph>] {
        &self.graphs
    }

    /// Loads a graph, replacing a loaded graph with the same id in place.
    pub fn load_graph(&mut self, graph: impl Into<Arc<Graph>>) -> &mut Self {
        let graph = graph.into();
        match self
            .graphs
            .iter_mut()
            .find(|loaded| loaded.id() == graph.id())
        {
            Some(loaded) => {
                tracing::debug!(graph_id = graph.id(), "replacing loaded graph");
                *loaded = graph;
            }
            None => {
                tracing::debug!(graph_id = graph.id(), "loading graph");
                self.graphs.push(graph);
            }
        }
        self
    }

    /// Compiles `definition` against `registry` and loads the result.
    ///
    /// # Errors
    ///
    /// Returns the [`GraphError`] raised by [`GraphDefinition::compile`]; the
    /// loaded graphs are left untouched in that case.
    pub fn load_definition(
        &mut self,
        definition: &GraphDefinition,
        registry: &PluginRegistry,
    ) -> Result<&mut Self, GraphError> {
        let graph = definition.compile(registry)?;
        Ok(self.load_graph(graph))
    }

    /// Removes the graph with the given id.
    pub fn unload_graph(&mut self, id: &str) -> Option<Arc<Graph>> {
        let position = self.graphs.iter().position(|graph| graph.id() == id)?;
        Some(self.graphs.remove(position))
    }

    /// Processes a runtime event against every loaded graph.
    ///
    /// Returns `false` if any action failed during any dispatch. Events no
    /// node applies to return `true`.
    pub fn process(&self, event: &dyn RuntimeEvent, hooks: Option<&HooksAPI>) -> bool {
        let mut history = ExecutionHistory::with_capacity(self.config.history_capacity);
        self.process_with_history(event, hooks, &mut history)
    }

    /// Like [`process`](Self::process), continuing an existing history.
    pub fn process_with_history(
        &self,
        event: &dyn RuntimeEvent,
        hooks: Option<&HooksAPI>,
        history: &mut ExecutionHistory,
    ) -> bool {
        Dispatcher {
            processor: self,
            hooks,
        }
        .process(event, history)
    }

    /// Dispatches a single event node of `graph`, bypassing the matcher.
    pub fn dispatch(
        &self,
        graph: &Graph,
        event_node: &EventNode,
        event: &dyn RuntimeEvent,
        history: &mut ExecutionHistory,
        hooks: Option<&HooksAPI>,
    ) -> bool {
        Dispatcher {
            processor: self,
            hooks,
        }
        .dispatch(graph, event_node, event, history)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ActionContext
// ─────────────────────────────────────────────────────────────────────────────

/// What an action sees while it executes.
pub struct ActionContext<'a> {
    dispatcher: &'a Dispatcher<'a>,
    walk: Walk<'a>,
    action: &'a ActionNode,
    history: &'a mut ExecutionHistory,
    prestate: &'a mut Prestate,
}

impl<'a> ActionContext<'a> {
    /// The runtime event being processed.
    #[must_use]
    pub fn event(&self) -> &'a dyn RuntimeEvent {
        self.walk.event
    }

    /// The executing node's configuration.
    #[must_use]
    pub fn configuration(&self) -> &'a Configuration {
        &self.action.data.configuration
    }

    /// The executing node's id.
    #[must_use]
    pub fn action_id(&self) -> &'a str {
        self.action.id()
    }

    /// The graph being walked.
    #[must_use]
    pub fn graph(&self) -> &'a Graph {
        self.walk.graph
    }

    /// The event node that started this traversal.
    #[must_use]
    pub fn origin(&self) -> &'a EventNode {
        self.walk.origin
    }

    /// The prestate of the current dispatch.
    #[must_use]
    pub fn prestate(&self) -> &Prestate {
        &*self.prestate
    }

    /// Mutable access to the prestate of the current dispatch.
    pub fn prestate_mut(&mut self) -> &mut Prestate {
        &mut *self.prestate
    }

    /// The history of the current top-level `process` call.
    #[must_use]
    pub fn history(&self) -> &ExecutionHistory {
        &*self.history
    }

    /// Processes a follow-up event synchronously, sharing this call's
    /// history and hooks. Returns the follow-up's result.
    pub fn trigger(&mut self, event: &dyn RuntimeEvent) -> bool {
        self.dispatcher.process(event, &mut *self.history)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Dispatcher
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Clone, Copy)]
struct Walk<'a> {
    graph: &'a Graph,
    origin: &'a EventNode,
    event: &'a dyn RuntimeEvent,
}

struct Dispatcher<'p> {
    processor: &'p Processor,
    hooks: Option<&'p HooksAPI>,
}

impl Dispatcher<'_> {
    fn invoke<S: Schedule>(&self, prestate: &mut Prestate, event: &ProcessorEvent<'_>) {
        if let Some(hooks) = self.hooks {
            hooks.invoke(ScheduleId::of::<S>(), prestate, event);
        }
    }

    fn process(&self, event: &dyn RuntimeEvent, history: &mut ExecutionHistory) -> bool {
        let matches = EventMatcher::matches(&self.processor.graphs, event);
        if matches.is_empty() {
            tracing::debug!(event_name = event.name(), "no event node applies");
            return true;
        }

        let mut succeeded = true;
        for found in matches {
            succeeded &= self.dispatch(found.graph, found.node, event, history);
        }
        succeeded
    }

    fn dispatch(
        &self,
        graph: &Graph,
        event_node: &EventNode,
        event: &dyn RuntimeEvent,
        history: &mut ExecutionHistory,
    ) -> bool {
        let span = tracing::debug_span!(
            "dispatch",
            graph_id = graph.id(),
            event_node = event_node.id(),
            event_name = event.name()
        );
        let _entered = span.enter();

        let mut prestate = Prestate::new();
        self.invoke::<OnBeforeDispatch>(
            &mut prestate,
            &ProcessorEvent::BeforeDispatch {
                graph,
                event_node,
                event,
            },
        );

        let threshold = self.processor.config.recursion_threshold;
        let (executed, exception_thrown) =
            if exceeds_threshold(graph.id(), event_node.id(), history, threshold) {
                if history.is_full() {
                    tracing::warn!(
                        graph_id = graph.id(),
                        graph_label = graph.label(),
                        event_name = event.name(),
                        capacity = history.capacity(),
                        "execution history full, skipping dispatch"
                    );
                } else {
                    tracing::warn!(
                        graph_id = graph.id(),
                        graph_label = graph.label(),
                        event_name = event.name(),
                        threshold,
                        "recursion threshold reached, skipping dispatch"
                    );
                }
                (false, false)
            } else {
                history.push(graph.id(), event_node.id());
                let walk = Walk {
                    graph,
                    origin: event_node,
                    event,
                };
                let thrown = self.walk(
                    walk,
                    &event_node.data,
                    &event_node.data.successors,
                    history,
                    &mut prestate,
                    0,
                );
                (true, thrown)
            };

        self.invoke::<OnAfterDispatch>(
            &mut prestate,
            &ProcessorEvent::AfterDispatch {
                graph,
                event_node,
                event,
                executed,
                exception_thrown,
            },
        );

        !exception_thrown
    }

    /// Visits every successor whose condition holds. Returns whether any
    /// plugin failed.
    fn walk(
        &self,
        walk: Walk<'_>,
        from: &NodeData,
        successors: &[Successor],
        history: &mut ExecutionHistory,
        prestate: &mut Prestate,
        depth: usize,
    ) -> bool {
        let mut exception_thrown = false;
        for successor in successors {
            let context = BranchContext {
                event: walk.event,
                prestate: &*prestate,
            };
            let Some(satisfied) =
                contain(walk, &from.id, "condition", || successor.is_satisfied(&context))
            else {
                exception_thrown = true;
                continue;
            };
            if !satisfied {
                tracing::debug!(
                    graph_id = walk.graph.id(),
                    from = %from.id,
                    to = %successor.target,
                    "successor condition does not hold"
                );
                continue;
            }
            exception_thrown |= self.visit(walk, from, successor.target, history, prestate, depth);
        }
        exception_thrown
    }

    fn visit(
        &self,
        walk: Walk<'_>,
        from: &NodeData,
        index: NodeIndex,
        history: &mut ExecutionHistory,
        prestate: &mut Prestate,
        depth: usize,
    ) -> bool {
        let max_depth = self.processor.config.max_walk_depth;
        if depth >= max_depth {
            tracing::warn!(
                graph_id = walk.graph.id(),
                graph_label = walk.graph.label(),
                from = %from.id,
                max_depth,
                "maximum walk depth reached, not following successor"
            );
            return false;
        }
        let Some(node) = walk.graph.node(index) else {
            return false;
        };

        match node {
            Node::Action(action) => self.execute(walk, from, action, history, prestate, depth),
            Node::Gateway(gateway) => {
                let context = BranchContext {
                    event: walk.event,
                    prestate: &*prestate,
                };
                let Some(selected) = contain(walk, &gateway.data.id, "select_branches", || {
                    gateway.plugin.select_branches(
                        gateway.gateway_type,
                        &gateway.data.successors,
                        &context,
                    )
                }) else {
                    return true;
                };
                tracing::debug!(
                    graph_id = walk.graph.id(),
                    gateway_id = %gateway.data.id,
                    selected = selected.len(),
                    "gateway selected branches"
                );
                let mut exception_thrown = false;
                for target in selected {
                    exception_thrown |=
                        self.visit(walk, &gateway.data, target, history, prestate, depth + 1);
                }
                exception_thrown
            }
            Node::Event(event_node) => !self.dispatch(walk.graph, event_node, walk.event, history),
        }
    }

    fn execute(
        &self,
        walk: Walk<'_>,
        from: &NodeData,
        action: &ActionNode,
        history: &mut ExecutionHistory,
        prestate: &mut Prestate,
        depth: usize,
    ) -> bool {
        let mut exception_thrown = false;
        let targets = contain(walk, action.id(), "targets", || {
            action.plugin.targets(walk.event, &action.data.configuration)
        })
        .unwrap_or_else(|| {
            exception_thrown = true;
            Vec::new()
        });
        if targets.is_empty() {
            tracing::debug!(action_id = action.id(), "action resolved no targets");
        }

        for target in &targets {
            self.invoke::<OnBeforeActionExecution>(
                prestate,
                &ProcessorEvent::BeforeActionExecution {
                    graph: walk.graph,
                    action,
                    target,
                    event: walk.event,
                    predecessor: from,
                },
            );

            let (access_granted, failed) = match contain(walk, action.id(), "access", || {
                action.plugin.access(target.as_ref(), walk.event)
            }) {
                Some(true) => (true, !self.run(walk, action, target, history, prestate)),
                Some(false) => {
                    tracing::warn!(
                        actor = walk.event.actor().unwrap_or("anonymous"),
                        action_id = action.id(),
                        graph_label = walk.graph.label(),
                        event_name = walk.event.name(),
                        "access denied, skipping target"
                    );
                    (false, false)
                }
                None => (false, true),
            };

            self.invoke::<OnAfterActionExecution>(
                prestate,
                &ProcessorEvent::AfterActionExecution {
                    graph: walk.graph,
                    action,
                    target,
                    event: walk.event,
                    access_granted,
                    exception_thrown: failed,
                },
            );
            exception_thrown |= failed;
        }

        if action.continues {
            exception_thrown |= self.walk(
                walk,
                &action.data,
                &action.data.successors,
                history,
                prestate,
                depth + 1,
            );
        }
        exception_thrown
    }

    /// Executes one target. Returns `true` on success.
    fn run(
        &self,
        walk: Walk<'_>,
        action: &ActionNode,
        target: &BoxedTarget,
        history: &mut ExecutionHistory,
        prestate: &mut Prestate,
    ) -> bool {
        let mut context = ActionContext {
            dispatcher: self,
            walk,
            action,
            history,
            prestate,
        };

        match contain(walk, action.id(), "execute", || {
            action.plugin.execute(target, &mut context)
        }) {
            Some(Ok(())) => {
                tracing::debug!(action_id = action.id(), "action executed");
                true
            }
            Some(Err(err)) => {
                tracing::error!(
                    action_id = action.id(),
                    graph_id = walk.graph.id(),
                    event_name = walk.event.name(),
                    actor = walk.event.actor().unwrap_or("anonymous"),
                    error = %err,
                    debug = ?err,
                    "action failed"
                );
                false
            }
            None => false,
        }
    }
}

/// Runs one plugin call inside the failure boundary. Returns `None`, after
/// logging, if the plugin panicked.
fn contain<T>(
    walk: Walk<'_>,
    node_id: &str,
    call: &'static str,
    f: impl FnOnce() -> T,
) -> Option<T> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => Some(value),
        Err(payload) => {
            tracing::error!(
                node_id,
                call,
                graph_id = walk.graph.id(),
                event_name = walk.event.name(),
                actor = walk.event.actor().unwrap_or("anonymous"),
                error = panic_message(&*payload),
                backtrace = %Backtrace::capture(),
                "plugin panicked"
            );
            None
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}
