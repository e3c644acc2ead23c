//! Graph structure and builder API.
//!
//! A [`Graph`] is an immutable arena of [`Node`]s. Successor references are
//! arena indices, so a graph can be shared across threads as `Arc<Graph>`
//! and is rebuilt wholesale when its definition changes.
//!
//! Graphs are assembled with a [`GraphBuilder`], which refers to nodes by
//! their string ids and resolves them when [`GraphBuilder::build`] runs:
//!
//! ```ignore
//! let mut builder = Graph::builder("publish_flow", "Publish on save");
//! builder.add_event("on_save", Arc::new(SaveEvent)).then("publish");
//! builder.add_action("publish", Arc::new(PublishAction)).label("Publish");
//! let graph = builder.build()?;
//! ```

use std::sync::Arc;

use hashbrown::{HashMap, HashSet};
use thiserror::Error;

use crate::adapter::{ActionPlugin, Configuration, EventPlugin, GatewayPlugin};
use crate::node::{
    ActionNode, Condition, EventNode, GatewayNode, GatewayType, Node, NodeData, NodeIndex,
    Successor,
};
use crate::registry::PluginKind;

// ─────────────────────────────────────────────────────────────────────────────
// GraphError
// ─────────────────────────────────────────────────────────────────────────────

/// Errors detected while building or compiling a graph.
#[derive(Debug, Error)]
pub enum GraphError {
    /// The graph id is empty.
    #[error("graph id must not be empty")]
    EmptyGraphId,
    /// A node id is empty.
    #[error("graph '{graph}' contains a node with an empty id")]
    EmptyNodeId {
        /// Graph id.
        graph: String,
    },
    /// Two nodes share an id.
    #[error("graph '{graph}' contains duplicate node '{node}'")]
    DuplicateNode {
        /// Graph id.
        graph: String,
        /// Duplicate node id.
        node: String,
    },
    /// A successor refers to a node that does not exist.
    #[error("node '{node}' in graph '{graph}' refers to unknown successor '{successor}'")]
    UnknownSuccessor {
        /// Graph id.
        graph: String,
        /// Referring node id.
        node: String,
        /// Missing successor id.
        successor: String,
    },
    /// A successor refers to a condition that is not defined.
    #[error("node '{node}' in graph '{graph}' refers to unknown condition '{condition}'")]
    UnknownCondition {
        /// Graph id.
        graph: String,
        /// Referring node id.
        node: String,
        /// Missing condition id.
        condition: String,
    },
    /// A plugin id is not registered.
    #[error("{kind} plugin '{plugin}' used by '{node}' in graph '{graph}' is not registered")]
    MissingPlugin {
        /// Graph id.
        graph: String,
        /// Node or condition id using the plugin.
        node: String,
        /// Capability kind.
        kind: PluginKind,
        /// Unregistered plugin id.
        plugin: String,
    },
    /// A definition could not be parsed.
    #[error("invalid graph definition: {0}")]
    Parse(#[from] serde_json::Error),
}

// ─────────────────────────────────────────────────────────────────────────────
// Graph
// ─────────────────────────────────────────────────────────────────────────────

/// An immutable rule graph.
#[derive(Debug)]
pub struct Graph {
    id: String,
    label: String,
    nodes: Vec<Node>,
    index: HashMap<String, NodeIndex>,
    events: Vec<NodeIndex>,
}

impl Graph {
    /// Starts building a graph.
    #[must_use]
    pub fn builder(id: impl Into<String>, label: impl Into<String>) -> GraphBuilder {
        GraphBuilder::new(id, label)
    }

    /// Returns the graph id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the graph label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns all nodes in insertion order.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Returns the node at `index`.
    #[must_use]
    pub fn node(&self, index: NodeIndex) -> Option<&Node> {
        self.nodes.get(index.0)
    }

    /// Returns the index of the node with the given id.
    #[must_use]
    pub fn find(&self, id: &str) -> Option<NodeIndex> {
        self.index.get(id).copied()
    }

    /// Returns the node with the given id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Node> {
        self.find(id).and_then(|index| self.node(index))
    }

    /// Iterates over the event nodes in insertion order.
    pub fn events(&self) -> impl Iterator<Item = &EventNode> {
        self.events
            .iter()
            .filter_map(|index| self.nodes.get(index.0).and_then(Node::as_event))
    }

    /// Returns the number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the graph has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// GraphBuilder
// ─────────────────────────────────────────────────────────────────────────────

enum DraftKind {
    Event(Arc<dyn EventPlugin>),
    Action {
        plugin: Arc<dyn ActionPlugin>,
        continues: bool,
    },
    Gateway {
        gateway_type: GatewayType,
        plugin: Arc<dyn GatewayPlugin>,
    },
}

/// A node under construction, returned by the `add_*` methods of
/// [`GraphBuilder`].
pub struct NodeDraft {
    id: String,
    label: String,
    configuration: Configuration,
    kind: DraftKind,
    successors: Vec<(String, Option<Condition>)>,
}

impl NodeDraft {
    /// Sets the label.
    pub fn label(&mut self, label: impl Into<String>) -> &mut Self {
        self.label = label.into();
        self
    }

    /// Sets the configuration handed to the node's plugin.
    pub fn configure(&mut self, configuration: Configuration) -> &mut Self {
        self.configuration = configuration;
        self
    }

    /// Appends an unconditional successor.
    pub fn then(&mut self, successor: impl Into<String>) -> &mut Self {
        self.successors.push((successor.into(), None));
        self
    }

    /// Appends a successor guarded by `condition`.
    pub fn then_if(&mut self, successor: impl Into<String>, condition: Condition) -> &mut Self {
        self.successors.push((successor.into(), Some(condition)));
        self
    }

    /// Stops the walk after this action. Has no effect on other node kinds.
    pub fn halt(&mut self) -> &mut Self {
        if let DraftKind::Action { continues, .. } = &mut self.kind {
            *continues = false;
        }
        self
    }
}

/// Assembles a [`Graph`] from nodes referring to each other by id.
pub struct GraphBuilder {
    id: String,
    label: String,
    drafts: Vec<NodeDraft>,
}

impl GraphBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            drafts: Vec::new(),
        }
    }

    fn push(&mut self, id: String, kind: DraftKind) -> &mut NodeDraft {
        self.drafts.push(NodeDraft {
            id,
            label: String::new(),
            configuration: Configuration::new(),
            kind,
            successors: Vec::new(),
        });
        let last = self.drafts.len() - 1;
        &mut self.drafts[last]
    }

    /// Adds an event node.
    pub fn add_event(
        &mut self,
        id: impl Into<String>,
        plugin: Arc<dyn EventPlugin>,
    ) -> &mut NodeDraft {
        self.push(id.into(), DraftKind::Event(plugin))
    }

    /// Adds an action node that continues to its successors.
    pub fn add_action(
        &mut self,
        id: impl Into<String>,
        plugin: Arc<dyn ActionPlugin>,
    ) -> &mut NodeDraft {
        self.push(
            id.into(),
            DraftKind::Action {
                plugin,
                continues: true,
            },
        )
    }

    /// Adds a gateway node.
    pub fn add_gateway(
        &mut self,
        id: impl Into<String>,
        gateway_type: GatewayType,
        plugin: Arc<dyn GatewayPlugin>,
    ) -> &mut NodeDraft {
        self.push(
            id.into(),
            DraftKind::Gateway {
                gateway_type,
                plugin,
            },
        )
    }

    /// Validates the drafts and produces the graph.
    ///
    /// # Errors
    ///
    /// Returns a [`GraphError`] for empty or duplicate ids and for
    /// successors that name no node.
    pub fn build(self) -> Result<Graph, GraphError> {
        if self.id.is_empty() {
            return Err(GraphError::EmptyGraphId);
        }

        let mut index = HashMap::with_capacity(self.drafts.len());
        for (position, draft) in self.drafts.iter().enumerate() {
            if draft.id.is_empty() {
                return Err(GraphError::EmptyNodeId { graph: self.id });
            }
            if index.insert(draft.id.clone(), NodeIndex(position)).is_some() {
                return Err(GraphError::DuplicateNode {
                    graph: self.id,
                    node: draft.id.clone(),
                });
            }
        }

        let mut nodes = Vec::with_capacity(self.drafts.len());
        let mut events = Vec::new();
        for (position, draft) in self.drafts.into_iter().enumerate() {
            let mut successors = Vec::with_capacity(draft.successors.len());
            for (successor, condition) in draft.successors {
                let Some(&target) = index.get(&successor) else {
                    return Err(GraphError::UnknownSuccessor {
                        graph: self.id,
                        node: draft.id,
                        successor,
                    });
                };
                successors.push(Successor { target, condition });
            }

            let data = NodeData {
                id: draft.id,
                label: draft.label,
                configuration: draft.configuration,
                successors,
            };
            nodes.push(match draft.kind {
                DraftKind::Event(plugin) => {
                    events.push(NodeIndex(position));
                    Node::Event(EventNode { data, plugin })
                }
                DraftKind::Action { plugin, continues } => Node::Action(ActionNode {
                    data,
                    plugin,
                    continues,
                }),
                DraftKind::Gateway {
                    gateway_type,
                    plugin,
                } => Node::Gateway(GatewayNode {
                    data,
                    gateway_type,
                    plugin,
                }),
            });
        }

        Ok(Graph {
            id: self.id,
            label: self.label,
            nodes,
            index,
            events,
        })
    }
}

/// Returns the ids of nodes that no event node can reach.
///
/// Unreachable nodes are legal but never execute; the compiler logs them.
#[must_use]
pub fn unreachable_nodes(graph: &Graph) -> Vec<&str> {
    let mut seen = HashSet::with_capacity(graph.node_count());
    let mut stack: Vec<NodeIndex> = graph.events.clone();
    while let Some(index) = stack.pop() {
        if !seen.insert(index) {
            continue;
        }
        if let Some(node) = graph.node(index) {
            stack.extend(node.successors().iter().map(|successor| successor.target));
        }
    }
    graph
        .nodes
        .iter()
        .enumerate()
        .filter(|(position, _)| !seen.contains(&NodeIndex(*position)))
        .map(|(_, node)| node.id())
        .collect()
}
