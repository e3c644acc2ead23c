//! Plugin system for extensible server functionality.
//!
//! Plugins are the unit of composition for a host embedding the rule engine.
//! The engine itself ships as a plugin (`EcaPlugin`), as do its logging and
//! audit layers, and host applications contribute their own capability
//! plugins (events, actions, conditions) the same way.
//!
//! # Example
//!
//! ```
//! use eca_system::plugin::{Plugin, PluginId};
//! use eca_system::server::Server;
//!
//! # struct LoggingPlugin;
//! # impl Plugin for LoggingPlugin {
//! #     fn build(&self, _server: &mut Server) {}
//! # }
//! struct ContentPlugin {
//!     bundle: String,
//! }
//!
//! struct ContentBundle(String);
//! impl eca_system::resource::GlobalResource for ContentBundle {}
//!
//! impl Plugin for ContentPlugin {
//!     fn build(&self, server: &mut Server) {
//!         server.insert_global(ContentBundle(self.bundle.clone()));
//!     }
//!
//!     fn dependencies(&self) -> Vec<PluginId> {
//!         vec![PluginId::of::<LoggingPlugin>()]
//!     }
//! }
//!
//! Server::new()
//!     .add_plugins(LoggingPlugin)
//!     .add_plugins(ContentPlugin { bundle: "article".into() })
//!     .run();
//! ```

mod schedule;

pub use schedule::{IntoScheduleIds, Schedule, ScheduleId};

use core::any::TypeId;

use crate::server::Server;

// ─────────────────────────────────────────────────────────────────────────────
// PluginId
// ─────────────────────────────────────────────────────────────────────────────

/// Unique identifier for a plugin type.
///
/// Used for dependency resolution and duplicate detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PluginId {
    type_id: TypeId,
    type_name: &'static str,
}

impl PluginId {
    /// Creates a `PluginId` for the given plugin type.
    #[must_use]
    pub fn of<P: Plugin>() -> Self {
        Self {
            type_id: TypeId::of::<P>(),
            type_name: core::any::type_name::<P>(),
        }
    }

    /// Returns the underlying `TypeId`.
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Returns the type name for debugging.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Plugin Trait
// ─────────────────────────────────────────────────────────────────────────────

/// A unit of functionality added to a [`Server`].
///
/// Plugins follow a strict lifecycle managed by the server:
///
/// 1. **Build Phase** - `build()` is called in dependency order
/// 2. **Ready Phase** - `ready()` is called in dependency order
/// 3. **Cleanup Phase** - `cleanup()` is called in reverse dependency order
///
/// Capability registration (event, action, condition plugins) belongs in
/// `ready()`, once the registries published during `build()` exist.
pub trait Plugin: Send + Sync + 'static {
    /// Configures the server. Called once when the plugin is built.
    fn build(&self, server: &mut Server);

    /// Called after all plugins have been built.
    fn ready(&self, _server: &mut Server) {}

    /// Called when the server is shutting down, in reverse dependency order.
    fn cleanup(&self, _server: &mut Server) {}

    /// Returns the plugin's name for debugging and error messages.
    fn name(&self) -> &str {
        core::any::type_name::<Self>()
    }

    /// Declares plugins that must be added before this one.
    ///
    /// The server panics in [`Server::finish`] if a dependency is missing.
    fn dependencies(&self) -> Vec<PluginId> {
        Vec::new()
    }

    /// Returns true if this plugin can only be added once.
    fn is_unique(&self) -> bool {
        true
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Plugins Trait (for add_plugins polymorphism)
// ─────────────────────────────────────────────────────────────────────────────

/// Trait for types that can be added to a server as plugins.
///
/// Implemented for single plugins and for [`PluginGroupBuilder`].
pub trait Plugins {
    /// Adds these plugins to the server.
    fn add_to_server(self, server: &mut Server);
}

impl<P: Plugin> Plugins for P {
    fn add_to_server(self, server: &mut Server) {
        let id = PluginId::of::<P>();
        server.add_plugin_boxed(id, Box::new(self));
    }
}

impl Plugins for PluginGroupBuilder {
    fn add_to_server(self, server: &mut Server) {
        for boxed in self.plugins {
            server.add_plugin_boxed(boxed.id, boxed.plugin);
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// PluginGroup Trait
// ─────────────────────────────────────────────────────────────────────────────

/// A collection of plugins that can be added together.
///
/// ```ignore
/// Server::new()
///     .add_plugins(DefaultPlugins.build().disable::<DispatchLogPlugin>())
///     .run();
/// ```
pub trait PluginGroup {
    /// Returns the plugins in this group.
    fn build(self) -> PluginGroupBuilder;
}

/// A boxed plugin with its captured [`PluginId`].
pub(crate) struct BoxedPlugin {
    pub(crate) id: PluginId,
    pub(crate) plugin: Box<dyn Plugin>,
}

impl BoxedPlugin {
    pub(crate) fn name(&self) -> &str {
        self.plugin.name()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// PluginGroupBuilder
// ─────────────────────────────────────────────────────────────────────────────

/// Builder for customizing plugin groups.
#[derive(Default)]
pub struct PluginGroupBuilder {
    pub(crate) plugins: Vec<BoxedPlugin>,
}

impl PluginGroupBuilder {
    /// Creates a new empty plugin group builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            plugins: Vec::new(),
        }
    }

    /// Adds a plugin to the end of the group.
    #[must_use]
    #[expect(
        clippy::should_implement_trait,
        reason = "This is a builder method, not std::ops::Add"
    )]
    pub fn add<P: Plugin>(mut self, plugin: P) -> Self {
        self.plugins.push(BoxedPlugin {
            id: PluginId::of::<P>(),
            plugin: Box::new(plugin),
        });
        self
    }

    /// Adds a plugin after another plugin in the group.
    ///
    /// If `Target` is not found, the plugin is added at the end.
    #[must_use]
    pub fn add_after<P: Plugin, Target: Plugin>(mut self, plugin: P) -> Self {
        let target_name = core::any::type_name::<Target>();
        let position = self
            .plugins
            .iter()
            .position(|p| p.name() == target_name)
            .map_or(self.plugins.len(), |i| i + 1);
        self.plugins.insert(
            position,
            BoxedPlugin {
                id: PluginId::of::<P>(),
                plugin: Box::new(plugin),
            },
        );
        self
    }

    /// Removes a plugin from the group by type. No-op if absent.
    #[must_use]
    pub fn disable<P: Plugin>(mut self) -> Self {
        let target_name = core::any::type_name::<P>();
        self.plugins.retain(|p| p.name() != target_name);
        self
    }

    /// Returns the number of plugins in the group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Returns true if the group contains no plugins.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}
