//! Startup-time registry of capability plugins.
//!
//! The [`PluginRegistry`] maps plugin ids to shared plugin instances, one
//! table per capability kind. It is published as an [`API`] by
//! [`EcaPlugin`](crate::plugin::EcaPlugin); host plugins register their
//! capabilities in `ready()` and graph definitions are compiled against it.
//!
//! ```ignore
//! fn ready(&self, server: &mut Server) {
//!     let registry = server.api::<PluginRegistry>().expect("EcaPlugin added");
//!     registry.register_action(Arc::new(PublishAction))?;
//! }
//! ```

use core::fmt;
use std::sync::Arc;

use eca_system::api::API;
use hashbrown::HashMap;
use parking_lot::RwLock;
use thiserror::Error;

use crate::adapter::{ActionPlugin, ConditionPlugin, EventPlugin, GatewayPlugin, StandardGateway};

/// Capability kind of a registered plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PluginKind {
    /// [`EventPlugin`].
    Event,
    /// [`ActionPlugin`].
    Action,
    /// [`ConditionPlugin`].
    Condition,
    /// [`GatewayPlugin`].
    Gateway,
}

impl fmt::Display for PluginKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PluginKind::Event => "event",
            PluginKind::Action => "action",
            PluginKind::Condition => "condition",
            PluginKind::Gateway => "gateway",
        })
    }
}

/// Errors that can occur during plugin registration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    /// A plugin with this id is already registered for the kind.
    #[error("{kind} plugin '{id}' is already registered")]
    DuplicateId {
        /// The capability kind.
        kind: PluginKind,
        /// The duplicate id.
        id: String,
    },
}

type Table<P> = RwLock<HashMap<String, Arc<P>>>;

/// Registry of event, action, condition and gateway plugins keyed by id.
#[derive(Default)]
pub struct PluginRegistry {
    events: Table<dyn EventPlugin>,
    actions: Table<dyn ActionPlugin>,
    conditions: Table<dyn ConditionPlugin>,
    gateways: Table<dyn GatewayPlugin>,
}

impl API for PluginRegistry {}

fn register<P: ?Sized>(
    table: &Table<P>,
    kind: PluginKind,
    id: &str,
    plugin: Arc<P>,
) -> Result<(), RegistrationError> {
    let mut entries = table.write();
    if entries.contains_key(id) {
        return Err(RegistrationError::DuplicateId {
            kind,
            id: id.to_owned(),
        });
    }
    entries.insert(id.to_owned(), plugin);
    Ok(())
}

impl PluginRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with [`StandardGateway`] registered.
    #[must_use]
    pub fn with_standard_gateways() -> Self {
        let registry = Self::new();
        registry
            .gateways
            .write()
            .insert(StandardGateway::ID.to_owned(), Arc::new(StandardGateway));
        registry
    }

    /// Registers an event plugin under its id.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::DuplicateId`] if the id is taken.
    pub fn register_event(&self, plugin: Arc<dyn EventPlugin>) -> Result<&Self, RegistrationError> {
        let id = plugin.id().to_owned();
        register(&self.events, PluginKind::Event, &id, plugin)?;
        Ok(self)
    }

    /// Registers an action plugin under its id.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::DuplicateId`] if the id is taken.
    pub fn register_action(
        &self,
        plugin: Arc<dyn ActionPlugin>,
    ) -> Result<&Self, RegistrationError> {
        let id = plugin.id().to_owned();
        register(&self.actions, PluginKind::Action, &id, plugin)?;
        Ok(self)
    }

    /// Registers a condition plugin under its id.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::DuplicateId`] if the id is taken.
    pub fn register_condition(
        &self,
        plugin: Arc<dyn ConditionPlugin>,
    ) -> Result<&Self, RegistrationError> {
        let id = plugin.id().to_owned();
        register(&self.conditions, PluginKind::Condition, &id, plugin)?;
        Ok(self)
    }

    /// Registers a gateway plugin under its id.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::DuplicateId`] if the id is taken.
    pub fn register_gateway(
        &self,
        plugin: Arc<dyn GatewayPlugin>,
    ) -> Result<&Self, RegistrationError> {
        let id = plugin.id().to_owned();
        register(&self.gateways, PluginKind::Gateway, &id, plugin)?;
        Ok(self)
    }

    /// Looks up an event plugin.
    #[must_use]
    pub fn event(&self, id: &str) -> Option<Arc<dyn EventPlugin>> {
        self.events.read().get(id).cloned()
    }

    /// Looks up an action plugin.
    #[must_use]
    pub fn action(&self, id: &str) -> Option<Arc<dyn ActionPlugin>> {
        self.actions.read().get(id).cloned()
    }

    /// Looks up a condition plugin.
    #[must_use]
    pub fn condition(&self, id: &str) -> Option<Arc<dyn ConditionPlugin>> {
        self.conditions.read().get(id).cloned()
    }

    /// Looks up a gateway plugin.
    #[must_use]
    pub fn gateway(&self, id: &str) -> Option<Arc<dyn GatewayPlugin>> {
        self.gateways.read().get(id).cloned()
    }

    /// Returns true if a plugin of `kind` is registered under `id`.
    #[must_use]
    pub fn contains(&self, kind: PluginKind, id: &str) -> bool {
        match kind {
            PluginKind::Event => self.events.read().contains_key(id),
            PluginKind::Action => self.actions.read().contains_key(id),
            PluginKind::Condition => self.conditions.read().contains_key(id),
            PluginKind::Gateway => self.gateways.read().contains_key(id),
        }
    }

    /// Returns the number of plugins registered for `kind`.
    #[must_use]
    pub fn count(&self, kind: PluginKind) -> usize {
        match kind {
            PluginKind::Event => self.events.read().len(),
            PluginKind::Action => self.actions.read().len(),
            PluginKind::Condition => self.conditions.read().len(),
            PluginKind::Gateway => self.gateways.read().len(),
        }
    }
}

impl fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("events", &self.count(PluginKind::Event))
            .field("actions", &self.count(PluginKind::Action))
            .field("conditions", &self.count(PluginKind::Condition))
            .field("gateways", &self.count(PluginKind::Gateway))
            .finish()
    }
}
