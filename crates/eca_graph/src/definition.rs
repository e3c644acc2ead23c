//! Declarative graph definitions.
//!
//! A [`GraphDefinition`] is the serialized form of a rule graph: events,
//! conditions, gateways and actions listed by id, referring to plugins by
//! their registry id. [`GraphDefinition::compile`] resolves every plugin
//! once and hands the result to the [`GraphBuilder`].
//!
//! ```json
//! {
//!   "id": "publish_flow",
//!   "label": "Publish on save",
//!   "events": [
//!     { "id": "on_save", "plugin": "article_presave",
//!       "successors": [{ "id": "publish", "condition": "is_draft" }] }
//!   ],
//!   "conditions": [{ "id": "is_draft", "plugin": "field_equals",
//!                    "configuration": { "field": "status", "value": 0 } }],
//!   "actions": [{ "id": "publish", "plugin": "publish_article" }]
//! }
//! ```

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::adapter::{Configuration, StandardGateway};
use crate::graph::{Graph, GraphBuilder, GraphError, NodeDraft, unreachable_nodes};
use crate::node::{Condition, GatewayType};
use crate::registry::{PluginKind, PluginRegistry};

/// Reference from a node to its successor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuccessorDefinition {
    /// Id of the successor node.
    pub id: String,
    /// Id of a condition guarding the reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

/// Serialized event node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDefinition {
    /// Node id.
    pub id: String,
    /// Informational label.
    #[serde(default)]
    pub label: String,
    /// Event plugin id.
    pub plugin: String,
    /// Plugin configuration.
    #[serde(default)]
    pub configuration: Configuration,
    /// Ordered successors.
    #[serde(default)]
    pub successors: Vec<SuccessorDefinition>,
}

/// Serialized condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionDefinition {
    /// Condition id.
    pub id: String,
    /// Condition plugin id.
    pub plugin: String,
    /// Plugin configuration.
    #[serde(default)]
    pub configuration: Configuration,
    /// Inverts the result.
    #[serde(default)]
    pub negate: bool,
}

/// Serialized gateway node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayDefinition {
    /// Node id.
    pub id: String,
    /// Informational label.
    #[serde(default)]
    pub label: String,
    /// Routing discriminant.
    #[serde(rename = "type", default)]
    pub gateway_type: i32,
    /// Gateway plugin id.
    #[serde(default = "standard_gateway")]
    pub plugin: String,
    /// Plugin configuration.
    #[serde(default)]
    pub configuration: Configuration,
    /// Ordered successors.
    #[serde(default)]
    pub successors: Vec<SuccessorDefinition>,
}

/// Serialized action node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionDefinition {
    /// Node id.
    pub id: String,
    /// Informational label.
    #[serde(default)]
    pub label: String,
    /// Action plugin id.
    pub plugin: String,
    /// Plugin configuration.
    #[serde(default)]
    pub configuration: Configuration,
    /// Ordered successors.
    #[serde(default)]
    pub successors: Vec<SuccessorDefinition>,
    /// Whether successors are walked after the action.
    #[serde(default = "continues")]
    pub continues: bool,
}

fn standard_gateway() -> String {
    StandardGateway::ID.to_owned()
}

fn continues() -> bool {
    true
}

/// Serialized rule graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphDefinition {
    /// Graph id.
    pub id: String,
    /// Informational label.
    #[serde(default)]
    pub label: String,
    /// Event nodes, in match order.
    #[serde(default)]
    pub events: Vec<EventDefinition>,
    /// Conditions referenced by successors.
    #[serde(default)]
    pub conditions: Vec<ConditionDefinition>,
    /// Gateway nodes.
    #[serde(default)]
    pub gateways: Vec<GatewayDefinition>,
    /// Action nodes.
    #[serde(default)]
    pub actions: Vec<ActionDefinition>,
}

impl GraphDefinition {
    /// Parses a definition from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Parse`] if the input is not a valid definition.
    pub fn from_json(input: &str) -> Result<Self, GraphError> {
        Ok(serde_json::from_str(input)?)
    }

    /// Resolves plugin ids against `registry` and builds the graph.
    ///
    /// Nodes are inserted events first, then gateways, then actions, each
    /// in definition order.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::MissingPlugin`] for unregistered plugin ids,
    /// [`GraphError::UnknownCondition`] for undefined condition references,
    /// and any [`GraphBuilder::build`] error.
    pub fn compile(&self, registry: &PluginRegistry) -> Result<Graph, GraphError> {
        let missing = |node: &str, kind: PluginKind, plugin: &str| GraphError::MissingPlugin {
            graph: self.id.clone(),
            node: node.to_owned(),
            kind,
            plugin: plugin.to_owned(),
        };

        let mut conditions = HashMap::with_capacity(self.conditions.len());
        for definition in &self.conditions {
            let plugin = registry
                .condition(&definition.plugin)
                .ok_or_else(|| missing(&definition.id, PluginKind::Condition, &definition.plugin))?;
            let mut condition = Condition::new(definition.id.clone(), plugin)
                .with_configuration(definition.configuration.clone());
            condition.negate = definition.negate;
            if conditions.insert(definition.id.as_str(), condition).is_some() {
                return Err(GraphError::DuplicateNode {
                    graph: self.id.clone(),
                    node: definition.id.clone(),
                });
            }
        }

        let link = |draft: &mut NodeDraft,
                    node: &str,
                    successors: &[SuccessorDefinition]|
         -> Result<(), GraphError> {
            for successor in successors {
                match &successor.condition {
                    None => {
                        draft.then(successor.id.clone());
                    }
                    Some(condition_id) => {
                        let condition = conditions.get(condition_id.as_str()).ok_or_else(|| {
                            GraphError::UnknownCondition {
                                graph: self.id.clone(),
                                node: node.to_owned(),
                                condition: condition_id.clone(),
                            }
                        })?;
                        draft.then_if(successor.id.clone(), condition.clone());
                    }
                }
            }
            Ok(())
        };

        let mut builder = GraphBuilder::new(self.id.clone(), self.label.clone());

        for event in &self.events {
            let plugin = registry
                .event(&event.plugin)
                .ok_or_else(|| missing(&event.id, PluginKind::Event, &event.plugin))?;
            let draft = builder.add_event(event.id.clone(), plugin);
            draft
                .label(event.label.clone())
                .configure(event.configuration.clone());
            link(draft, &event.id, &event.successors)?;
        }

        for gateway in &self.gateways {
            let plugin = registry
                .gateway(&gateway.plugin)
                .ok_or_else(|| missing(&gateway.id, PluginKind::Gateway, &gateway.plugin))?;
            let draft =
                builder.add_gateway(gateway.id.clone(), GatewayType(gateway.gateway_type), plugin);
            draft
                .label(gateway.label.clone())
                .configure(gateway.configuration.clone());
            link(draft, &gateway.id, &gateway.successors)?;
        }

        for action in &self.actions {
            let plugin = registry
                .action(&action.plugin)
                .ok_or_else(|| missing(&action.id, PluginKind::Action, &action.plugin))?;
            let draft = builder.add_action(action.id.clone(), plugin);
            draft
                .label(action.label.clone())
                .configure(action.configuration.clone());
            if !action.continues {
                draft.halt();
            }
            link(draft, &action.id, &action.successors)?;
        }

        let graph = builder.build()?;
        let unreachable = unreachable_nodes(&graph);
        if !unreachable.is_empty() {
            tracing::debug!(
                graph_id = graph.id(),
                nodes = ?unreachable,
                "graph contains nodes no event can reach"
            );
        }
        Ok(graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_applied() {
        let definition = GraphDefinition::from_json(
            r#"{
                "id": "g",
                "gateways": [{ "id": "gw" }],
                "actions": [{ "id": "a", "plugin": "noop" }]
            }"#,
        )
        .expect("valid definition");

        assert_eq!(definition.label, "");
        assert!(definition.events.is_empty());
        assert_eq!(definition.gateways[0].gateway_type, 0);
        assert_eq!(definition.gateways[0].plugin, StandardGateway::ID);
        assert!(definition.actions[0].continues);
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            GraphDefinition::from_json(r#"{ "label": "no id" }"#),
            Err(GraphError::Parse(_))
        ));
    }

    #[test]
    fn missing_plugins_are_reported() {
        let definition = GraphDefinition::from_json(
            r#"{ "id": "g", "actions": [{ "id": "a", "plugin": "unknown" }] }"#,
        )
        .expect("valid definition");

        let err = definition
            .compile(&PluginRegistry::with_standard_gateways())
            .expect_err("plugin is not registered");
        assert!(matches!(
            err,
            GraphError::MissingPlugin { kind: PluginKind::Action, ref plugin, .. } if plugin == "unknown"
        ));
    }
}
