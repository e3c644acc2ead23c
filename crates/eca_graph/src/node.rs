//! Node types for rule graphs.
//!
//! A rule graph has three kinds of vertices: event nodes anchor a traversal,
//! gateway nodes route it, and action nodes do the work. Every node shares a
//! [`NodeData`] part holding its identity, label, configuration and ordered
//! successor references.

use core::fmt;
use std::sync::Arc;

use crate::adapter::{
    ActionPlugin, BranchContext, ConditionPlugin, Configuration, EventPlugin, GatewayPlugin,
};

/// Position of a node in its graph's node arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIndex(pub(crate) usize);

impl NodeIndex {
    /// Creates a node index.
    #[must_use]
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the raw arena position.
    #[must_use]
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node_{}", self.0)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Successors and conditions
// ─────────────────────────────────────────────────────────────────────────────

/// A condition guarding a successor reference.
#[derive(Clone)]
pub struct Condition {
    /// Identifier of the condition within its graph.
    pub id: String,
    /// The plugin evaluating the condition.
    pub plugin: Arc<dyn ConditionPlugin>,
    /// Configuration passed to the plugin.
    pub configuration: Configuration,
    /// Inverts the plugin result.
    pub negate: bool,
}

impl Condition {
    /// Creates a condition with an empty configuration.
    #[must_use]
    pub fn new(id: impl Into<String>, plugin: Arc<dyn ConditionPlugin>) -> Self {
        Self {
            id: id.into(),
            plugin,
            configuration: Configuration::new(),
            negate: false,
        }
    }

    /// Sets the configuration passed to the plugin.
    #[must_use]
    pub fn with_configuration(mut self, configuration: Configuration) -> Self {
        self.configuration = configuration;
        self
    }

    /// Inverts the result of the condition.
    #[must_use]
    pub fn negated(mut self) -> Self {
        self.negate = !self.negate;
        self
    }

    /// Evaluates the condition. Evaluation errors count as `false`.
    #[must_use]
    pub fn holds(&self, context: &BranchContext<'_>) -> bool {
        match self
            .plugin
            .evaluate(&self.configuration, context.event, context.prestate)
        {
            Ok(result) => result != self.negate,
            Err(err) => {
                tracing::warn!(
                    condition_id = %self.id,
                    plugin = self.plugin.id(),
                    event_name = context.event.name(),
                    error = %err,
                    "condition evaluation failed, treating as false"
                );
                false
            }
        }
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Condition")
            .field("id", &self.id)
            .field("plugin", &self.plugin.id())
            .field("negate", &self.negate)
            .finish_non_exhaustive()
    }
}

/// A reference from one node to the next.
#[derive(Debug, Clone)]
pub struct Successor {
    /// The node to continue with.
    pub target: NodeIndex,
    /// Optional guard that must hold for the successor to be followed.
    pub condition: Option<Condition>,
}

impl Successor {
    /// Creates an unconditional successor.
    #[must_use]
    pub fn new(target: NodeIndex) -> Self {
        Self {
            target,
            condition: None,
        }
    }

    /// Creates a successor guarded by `condition`.
    #[must_use]
    pub fn guarded(target: NodeIndex, condition: Condition) -> Self {
        Self {
            target,
            condition: Some(condition),
        }
    }

    /// Returns true if the successor has no condition or its condition holds.
    #[must_use]
    pub fn is_satisfied(&self, context: &BranchContext<'_>) -> bool {
        self.condition
            .as_ref()
            .is_none_or(|condition| condition.holds(context))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Nodes
// ─────────────────────────────────────────────────────────────────────────────

/// Part shared by every node kind.
#[derive(Debug, Clone)]
pub struct NodeData {
    /// Identifier, unique within the graph.
    pub id: String,
    /// Informational label.
    pub label: String,
    /// Free-form configuration handed to the node's plugin.
    pub configuration: Configuration,
    /// Ordered successor references.
    pub successors: Vec<Successor>,
}

/// Discriminant of a [`Node`] without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// An [`EventNode`].
    Event,
    /// An [`ActionNode`].
    Action,
    /// A [`GatewayNode`].
    Gateway,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NodeKind::Event => "event",
            NodeKind::Action => "action",
            NodeKind::Gateway => "gateway",
        })
    }
}

/// A vertex of a rule graph.
#[derive(Debug)]
pub enum Node {
    /// Anchors a traversal when a runtime event applies.
    Event(EventNode),
    /// Executes an action plugin against resolved targets.
    Action(ActionNode),
    /// Selects a subset of its successors.
    Gateway(GatewayNode),
}

impl Node {
    /// Returns the shared node part.
    #[must_use]
    pub fn data(&self) -> &NodeData {
        match self {
            Node::Event(n) => &n.data,
            Node::Action(n) => &n.data,
            Node::Gateway(n) => &n.data,
        }
    }

    /// Returns the node's identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.data().id
    }

    /// Returns the node's label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.data().label
    }

    /// Returns the node's ordered successors.
    #[must_use]
    pub fn successors(&self) -> &[Successor] {
        &self.data().successors
    }

    /// Returns the node kind.
    #[must_use]
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Event(_) => NodeKind::Event,
            Node::Action(_) => NodeKind::Action,
            Node::Gateway(_) => NodeKind::Gateway,
        }
    }

    /// Returns the event node, if this is one.
    #[must_use]
    pub fn as_event(&self) -> Option<&EventNode> {
        match self {
            Node::Event(n) => Some(n),
            _ => None,
        }
    }

    /// Returns the action node, if this is one.
    #[must_use]
    pub fn as_action(&self) -> Option<&ActionNode> {
        match self {
            Node::Action(n) => Some(n),
            _ => None,
        }
    }
}

/// A node that reacts to a runtime event.
pub struct EventNode {
    /// Shared node part.
    pub data: NodeData,
    /// Declares the event type and applicability predicate.
    pub plugin: Arc<dyn EventPlugin>,
}

impl EventNode {
    /// Returns the node's identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.data.id
    }
}

impl fmt::Debug for EventNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventNode")
            .field("data", &self.data)
            .field("plugin", &self.plugin.id())
            .finish()
    }
}

/// A node that executes an action plugin.
pub struct ActionNode {
    /// Shared node part.
    pub data: NodeData,
    /// The action to execute.
    pub plugin: Arc<dyn ActionPlugin>,
    /// Whether successors are walked after the action ran.
    pub continues: bool,
}

impl ActionNode {
    /// Returns the node's identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.data.id
    }
}

impl fmt::Debug for ActionNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionNode")
            .field("data", &self.data)
            .field("plugin", &self.plugin.id())
            .field("continues", &self.continues)
            .finish()
    }
}

/// Integer discriminant selecting a gateway's routing behaviour.
///
/// The meaning of a value is up to the [`GatewayPlugin`]; the constants below
/// are understood by [`StandardGateway`](crate::adapter::StandardGateway).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GatewayType(pub i32);

impl GatewayType {
    /// Follows the first successor whose condition holds.
    pub const EXCLUSIVE: Self = Self(0);
    /// Follows every successor, ignoring conditions.
    pub const PARALLEL: Self = Self(1);
    /// Follows every successor whose condition holds.
    pub const INCLUSIVE: Self = Self(2);
}

impl Default for GatewayType {
    fn default() -> Self {
        Self::EXCLUSIVE
    }
}

/// A node that routes the walk to a subset of its successors.
pub struct GatewayNode {
    /// Shared node part.
    pub data: NodeData,
    /// Routing discriminant.
    pub gateway_type: GatewayType,
    /// Selects the branches to follow.
    pub plugin: Arc<dyn GatewayPlugin>,
}

impl fmt::Debug for GatewayNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayNode")
            .field("data", &self.data)
            .field("gateway_type", &self.gateway_type)
            .field("plugin", &self.plugin.id())
            .finish()
    }
}
