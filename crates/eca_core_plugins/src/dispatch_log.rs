//! Audit trail for rule execution.
//!
//! [`DispatchLogPlugin`] observes every processor lifecycle event and
//! reports it through `tracing` under the `eca::audit` target. It also
//! publishes [`DispatchStats`], a set of counters hosts can poll.
//!
//! # Example
//!
//! ```ignore
//! let mut server = Server::new();
//! server
//!     .add_plugins(EcaPlugin::default())
//!     .add_plugins(DispatchLogPlugin);
//! server.finish();
//!
//! processor.process(&event, server.api::<HooksAPI>());
//! let stats = server.api::<DispatchStats>().expect("stats");
//! println!("{} dispatches, {} failed actions", stats.dispatches(), stats.failed_actions());
//! ```

use core::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use eca_graph::hooks::{
    HooksAPI, OnAfterActionExecution, OnAfterDispatch, OnBeforeActionExecution, OnBeforeDispatch,
    ProcessorEvent,
};
use eca_graph::plugin::EcaPlugin;
use eca_system::api::API;
use eca_system::plugin::{Plugin, PluginId};
use eca_system::server::Server;

/// Name the audit observer is registered under.
const HOOK_NAME: &str = "dispatch_log";

// ─────────────────────────────────────────────────────────────────────────────
// DispatchStats
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct Counters {
    dispatches: AtomicU64,
    skipped_dispatches: AtomicU64,
    actions: AtomicU64,
    failed_actions: AtomicU64,
    denied_targets: AtomicU64,
}

/// Running totals of the dispatches seen by [`DispatchLogPlugin`].
///
/// Clones share the same counters.
#[derive(Debug, Clone, Default)]
pub struct DispatchStats {
    counters: Arc<Counters>,
}

impl API for DispatchStats {}

impl DispatchStats {
    /// Dispatches that completed, including skipped ones.
    #[must_use]
    pub fn dispatches(&self) -> u64 {
        self.counters.dispatches.load(Ordering::Relaxed)
    }

    /// Dispatches the recursion guard refused to walk.
    #[must_use]
    pub fn skipped_dispatches(&self) -> u64 {
        self.counters.skipped_dispatches.load(Ordering::Relaxed)
    }

    /// Action executions, one per target.
    #[must_use]
    pub fn actions(&self) -> u64 {
        self.counters.actions.load(Ordering::Relaxed)
    }

    /// Action executions that returned an error or panicked.
    #[must_use]
    pub fn failed_actions(&self) -> u64 {
        self.counters.failed_actions.load(Ordering::Relaxed)
    }

    /// Targets the access check rejected.
    #[must_use]
    pub fn denied_targets(&self) -> u64 {
        self.counters.denied_targets.load(Ordering::Relaxed)
    }

    fn record(&self, event: &ProcessorEvent<'_>) {
        let counters = &self.counters;
        match *event {
            ProcessorEvent::AfterDispatch { executed, .. } => {
                counters.dispatches.fetch_add(1, Ordering::Relaxed);
                if !executed {
                    counters.skipped_dispatches.fetch_add(1, Ordering::Relaxed);
                }
            }
            ProcessorEvent::AfterActionExecution {
                access_granted,
                exception_thrown,
                ..
            } => {
                counters.actions.fetch_add(1, Ordering::Relaxed);
                if !access_granted {
                    counters.denied_targets.fetch_add(1, Ordering::Relaxed);
                }
                if exception_thrown {
                    counters.failed_actions.fetch_add(1, Ordering::Relaxed);
                }
            }
            ProcessorEvent::BeforeDispatch { .. }
            | ProcessorEvent::BeforeActionExecution { .. } => {}
        }
    }
}

fn audit(event: &ProcessorEvent<'_>) {
    match *event {
        ProcessorEvent::BeforeDispatch {
            graph,
            event_node,
            event,
        } => {
            tracing::debug!(
                target: "eca::audit",
                graph = graph.id(),
                event_node = event_node.id(),
                event = event.name(),
                "dispatch started"
            );
        }
        ProcessorEvent::AfterDispatch {
            graph,
            event_node,
            event,
            executed,
            exception_thrown,
        } => {
            tracing::info!(
                target: "eca::audit",
                graph = graph.id(),
                label = graph.label(),
                event_node = event_node.id(),
                event = event.name(),
                executed,
                exception_thrown,
                "dispatch finished"
            );
        }
        ProcessorEvent::BeforeActionExecution {
            graph,
            action,
            target,
            predecessor,
            ..
        } => {
            tracing::debug!(
                target: "eca::audit",
                graph = graph.id(),
                action = action.id(),
                predecessor = %predecessor.id,
                target = ?target,
                "action starting"
            );
        }
        ProcessorEvent::AfterActionExecution {
            graph,
            action,
            target,
            access_granted,
            exception_thrown,
            ..
        } => {
            if exception_thrown {
                tracing::warn!(
                    target: "eca::audit",
                    graph = graph.id(),
                    action = action.id(),
                    target = ?target,
                    "action failed"
                );
            } else {
                tracing::info!(
                    target: "eca::audit",
                    graph = graph.id(),
                    action = action.id(),
                    target = ?target,
                    access_granted,
                    "action finished"
                );
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// DispatchLogPlugin
// ─────────────────────────────────────────────────────────────────────────────

/// Logs every dispatch and action execution and counts them in
/// [`DispatchStats`].
///
/// Requires [`EcaPlugin`] for the [`HooksAPI`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DispatchLogPlugin;

impl Plugin for DispatchLogPlugin {
    fn build(&self, server: &mut Server) {
        let stats = DispatchStats::default();
        let Some(hooks) = server.api::<HooksAPI>() else {
            panic!("DispatchLogPlugin requires the HooksAPI published by EcaPlugin");
        };

        let observed = stats.clone();
        hooks
            .register_observer::<(
                OnBeforeDispatch,
                OnAfterDispatch,
                OnBeforeActionExecution,
                OnAfterActionExecution,
            ), _>(HOOK_NAME, move |event| {
                observed.record(event);
                audit(event);
            })
            .unwrap_or_else(|err| panic!("DispatchLogPlugin could not register its hook: {err}"));

        server.insert_api(stats);
    }

    fn dependencies(&self) -> Vec<PluginId> {
        vec![PluginId::of::<EcaPlugin>()]
    }
}
