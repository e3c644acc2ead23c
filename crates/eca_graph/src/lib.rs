//! Rule graphs and their execution for the ECA engine (Layer 2).
//!
//! `eca_graph` interprets Event–Condition–Action graphs: given a runtime
//! event it finds the event nodes that apply, wraps each match in a
//! before/after dispatch envelope, walks the successor chain through
//! gateways and actions, and bounds re-entrant chains with a recursion
//! guard.
//!
//! # Core Concepts
//!
//! - [`Graph`] - Immutable, compiled rule graph (events, gateways, actions)
//! - [`RuntimeEvent`] - Opaque typed payload that triggers processing
//! - [`adapter`] - Capability traits supplied by the host (event, action,
//!   condition, gateway plugins)
//! - [`PluginRegistry`] - Startup-time registry resolving plugin ids
//! - [`Processor`] - Matcher, envelope, walker and guard wired together
//! - [`hooks`] - Lifecycle notifications carrying the mutable [`Prestate`]
//!
//! # Example
//!
//! ```ignore
//! use eca_graph::{GraphDefinition, PluginRegistry, Processor, EngineConfig};
//!
//! let registry = PluginRegistry::with_standard_gateways();
//! registry.register_event(Arc::new(PresaveEvent))?;
//! registry.register_action(Arc::new(PublishAction))?;
//!
//! let definition = GraphDefinition::from_json(RAW)?;
//! let mut processor = Processor::new(EngineConfig::default());
//! processor.load_definition(&definition, &registry)?;
//!
//! let ok = processor.process(&NodePresave::new(node), Some(&hooks));
//! ```
//!
//! # Architecture
//!
//! - **Layer 1** (`eca_system`): plugin orchestration
//! - **Layer 2** (`eca_graph`): rule graphs and execution (this crate)
//! - **Layer 3** (`eca_core_plugins`): tracing and audit plugins

/// Capability traits implemented by host plugins.
pub mod adapter;

/// Engine configuration.
pub mod config;

/// Declarative graph definitions and their compilation.
pub mod definition;

/// Runtime events, subjects and targets.
pub mod event;

/// Graph structure and builder API.
pub mod graph;

/// Recursion guard and execution history.
pub mod guard;

/// Lifecycle hooks for dispatch and action execution.
pub mod hooks;

/// Event node applicability.
pub mod matcher;

/// Node types for graph vertices.
pub mod node;

/// Server plugin publishing the engine APIs.
pub mod plugin;

/// Mutable per-dispatch state bag.
pub mod prestate;

/// Dispatch envelope and graph walker.
pub mod processor;

/// Capability plugin registry.
pub mod registry;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::adapter::{
        ActionError, ActionPlugin, BranchContext, ConditionPlugin, Configuration, EventPlugin,
        GatewayPlugin, PluginError, StandardGateway,
    };
    pub use crate::config::{ConfigError, EngineConfig};
    pub use crate::definition::GraphDefinition;
    pub use crate::event::{BoxedTarget, EventType, RuntimeEvent, Subject, Target, Unbound};
    pub use crate::graph::{Graph, GraphBuilder, GraphError};
    pub use crate::guard::{ExecutionHistory, exceeds_threshold};
    pub use crate::hooks::{HooksAPI, ProcessorEvent};
    pub use crate::matcher::{EventMatch, EventMatcher};
    pub use crate::node::{
        ActionNode, Condition, EventNode, GatewayNode, GatewayType, Node, NodeData, NodeIndex,
        Successor,
    };
    pub use crate::plugin::EcaPlugin;
    pub use crate::prestate::Prestate;
    pub use crate::processor::{ActionContext, Processor};
    pub use crate::registry::{PluginKind, PluginRegistry, RegistrationError};
}

pub use config::EngineConfig;
pub use definition::GraphDefinition;
pub use event::RuntimeEvent;
pub use graph::{Graph, GraphError};
pub use prestate::Prestate;
pub use processor::Processor;
pub use registry::PluginRegistry;
