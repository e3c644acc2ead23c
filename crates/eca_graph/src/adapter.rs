//! Capability traits implemented by the host.
//!
//! The engine never implements event, condition or action semantics itself.
//! It calls into plugins registered in the
//! [`PluginRegistry`](crate::registry::PluginRegistry):
//!
//! - [`EventPlugin`] declares which runtime event type a node reacts to
//! - [`ConditionPlugin`] guards successor references
//! - [`ActionPlugin`] does the work, once per resolved target
//! - [`GatewayPlugin`] chooses which successors of a gateway to follow
//!
//! [`StandardGateway`] ships with the engine and understands the
//! [`GatewayType`] constants.

use std::sync::Arc;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::event::{BoxedTarget, EventType, RuntimeEvent, Subject, Target, Unbound};
use crate::node::{GatewayType, NodeIndex, Successor};
use crate::prestate::Prestate;
use crate::processor::ActionContext;

/// Free-form node configuration.
pub type Configuration = Map<String, Value>;

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

/// Failure reported by an event or condition plugin.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PluginError {
    /// The node configuration is missing a key or has the wrong shape.
    #[error("invalid configuration for '{plugin}': {message}")]
    InvalidConfiguration {
        /// Plugin id.
        plugin: String,
        /// What was wrong.
        message: String,
    },
    /// Any other failure.
    #[error("{0}")]
    Failed(String),
}

/// Failure reported by an action plugin.
#[derive(Debug, Error)]
pub enum ActionError {
    /// The resolved target is not of the type the action works on.
    #[error("target type mismatch: expected {expected}")]
    TargetMismatch {
        /// Name of the expected target type.
        expected: &'static str,
    },
    /// The action could not be carried out.
    #[error("{0}")]
    Failed(String),
    /// A plugin-level failure, such as invalid configuration.
    #[error(transparent)]
    Plugin(#[from] PluginError),
}

impl ActionError {
    /// Creates an [`ActionError::TargetMismatch`] for `T`.
    #[must_use]
    pub fn mismatch<T: ?Sized>() -> Self {
        ActionError::TargetMismatch {
            expected: core::any::type_name::<T>(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Plugin traits
// ─────────────────────────────────────────────────────────────────────────────

/// Declares the runtime event an event node reacts to.
pub trait EventPlugin: Send + Sync + 'static {
    /// Registry id.
    fn id(&self) -> &str;

    /// Concrete runtime event type this plugin matches.
    fn event_type(&self) -> EventType;

    /// Optional predicate refining the type match.
    ///
    /// Errors are treated as "does not apply".
    fn applies(
        &self,
        _node_id: &str,
        _configuration: &Configuration,
        _event: &dyn RuntimeEvent,
    ) -> Result<bool, PluginError> {
        Ok(true)
    }
}

/// Executes work against the targets of a runtime event.
pub trait ActionPlugin: Send + Sync + 'static {
    /// Registry id.
    fn id(&self) -> &str;

    /// Resolves the objects to execute against.
    ///
    /// Defaults to the event subject: a present subject is the single target,
    /// a null subject yields no targets and an event without a subject
    /// concept yields one [`Unbound`] target.
    fn targets(&self, event: &dyn RuntimeEvent, _configuration: &Configuration) -> Vec<BoxedTarget> {
        match event.subject() {
            Subject::Present(target) => vec![target],
            Subject::Null => Vec::new(),
            Subject::Absent => vec![Arc::new(Unbound)],
        }
    }

    /// Whether the event's actor may run this action on `target`.
    fn access(&self, target: &dyn Target, event: &dyn RuntimeEvent) -> bool;

    /// Runs the action on one target.
    fn execute(&self, target: &BoxedTarget, context: &mut ActionContext<'_>)
    -> Result<(), ActionError>;
}

/// Evaluates a guard on a successor reference.
pub trait ConditionPlugin: Send + Sync + 'static {
    /// Registry id.
    fn id(&self) -> &str;

    /// Returns whether the condition holds for `event`.
    fn evaluate(
        &self,
        configuration: &Configuration,
        event: &dyn RuntimeEvent,
        prestate: &Prestate,
    ) -> Result<bool, PluginError>;
}

/// State visible while choosing branches.
#[derive(Clone, Copy)]
pub struct BranchContext<'a> {
    /// The event being processed.
    pub event: &'a dyn RuntimeEvent,
    /// The prestate of the current dispatch.
    pub prestate: &'a Prestate,
}

/// Chooses which successors of a gateway are followed.
pub trait GatewayPlugin: Send + Sync + 'static {
    /// Registry id.
    fn id(&self) -> &str;

    /// Returns the selected successor targets, in walk order.
    ///
    /// Must be deterministic for the same inputs.
    fn select_branches(
        &self,
        gateway_type: GatewayType,
        successors: &[Successor],
        context: &BranchContext<'_>,
    ) -> Vec<NodeIndex>;
}

// ─────────────────────────────────────────────────────────────────────────────
// StandardGateway
// ─────────────────────────────────────────────────────────────────────────────

/// Built-in gateway understanding exclusive, parallel and inclusive routing.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardGateway;

impl StandardGateway {
    /// Registry id of the standard gateway.
    pub const ID: &'static str = "standard";
}

impl GatewayPlugin for StandardGateway {
    fn id(&self) -> &str {
        Self::ID
    }

    fn select_branches(
        &self,
        gateway_type: GatewayType,
        successors: &[Successor],
        context: &BranchContext<'_>,
    ) -> Vec<NodeIndex> {
        match gateway_type {
            GatewayType::EXCLUSIVE => successors
                .iter()
                .find(|successor| successor.is_satisfied(context))
                .map(|successor| successor.target)
                .into_iter()
                .collect(),
            GatewayType::PARALLEL => successors.iter().map(|successor| successor.target).collect(),
            GatewayType::INCLUSIVE => successors
                .iter()
                .filter(|successor| successor.is_satisfied(context))
                .map(|successor| successor.target)
                .collect(),
            GatewayType(other) => {
                tracing::warn!(
                    gateway_type = other,
                    event_name = context.event.name(),
                    "unknown gateway type, no branch selected"
                );
                Vec::new()
            }
        }
    }
}
