//! Server runtime for plugin orchestration.
//!
//! The [`Server`] collects plugins, resolves their dependencies, and runs
//! their lifecycle. It owns the APIs and global resources plugins publish,
//! which is how the rule processor finds its capability registry, hook table,
//! and configuration.
//!
//! # Lifecycle
//!
//! 1. **Dependency Resolution** - Validate and topologically sort plugins
//! 2. **Build Phase** - Call `plugin.build()` in dependency order
//! 3. **Ready Phase** - Call `plugin.ready()` in dependency order
//! 4. **Cleanup Phase** - Call `plugin.cleanup()` in reverse order

use crate::api::API;
use crate::plugin::{Plugin, PluginId, Plugins};
use crate::resource::{GlobalResource, Resources};
use core::any::TypeId;
use hashbrown::{HashMap, HashSet};

/// Type-erased API for dynamic storage.
type BoxedAPI = Box<dyn core::any::Any + Send + Sync>;

/// Build state of the server: `NotStarted` → `Building` → `Built`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum BuildState {
    #[default]
    NotStarted,
    Building,
    Built,
}

/// The runtime that orchestrates plugins and holds what they publish.
///
/// # Example
///
/// ```ignore
/// let mut server = Server::new();
/// server
///     .add_plugins(TracingPlugin::default())
///     .add_plugins(EcaPlugin::default())
///     .add_plugins(ContentEventsPlugin);
/// server.finish();
///
/// let mut processor = Processor::from_server(&server);
/// processor.load_graph(graph);
/// ```
pub struct Server {
    /// Global resources (server-lifetime, read-only).
    global: Resources,
    /// Capability registries published by plugins.
    apis: HashMap<TypeId, BoxedAPI>,
    /// Plugins pending build (not yet sorted).
    pending_plugins: Vec<PluginEntry>,
    /// Plugins that have been built, in sorted order.
    built_plugins: Vec<PluginEntry>,
    /// Plugin IDs added so far (for duplicate detection).
    plugin_ids: HashSet<PluginId>,
    build_state: BuildState,
}

/// Internal entry for a registered plugin.
struct PluginEntry {
    plugin: Box<dyn Plugin>,
    /// Cached for error messages and dependency lookup.
    name: String,
}

impl Default for Server {
    fn default() -> Self {
        Self::new()
    }
}

impl Server {
    /// Creates a new empty server.
    #[must_use]
    pub fn new() -> Self {
        Self {
            global: Resources::new(),
            apis: HashMap::new(),
            pending_plugins: Vec::new(),
            built_plugins: Vec::new(),
            plugin_ids: HashSet::new(),
            build_state: BuildState::NotStarted,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Plugin Management
    // ─────────────────────────────────────────────────────────────────────────

    /// Adds one or more plugins to the server.
    ///
    /// # Panics
    ///
    /// Panics if a unique plugin is added twice.
    pub fn add_plugins<P: Plugins>(&mut self, plugins: P) -> &mut Self {
        plugins.add_to_server(self);
        self
    }

    /// Adds a boxed plugin with its captured ID.
    pub(crate) fn add_plugin_boxed(&mut self, id: PluginId, plugin: Box<dyn Plugin>) {
        let name = plugin.name().to_string();

        if plugin.is_unique() && self.plugin_ids.contains(&id) {
            panic!(
                "Plugin '{}' is unique and was already added.\n\
                 If you intended to add this plugin multiple times, \
                 set `is_unique()` to return `false`.",
                name
            );
        }
        self.plugin_ids.insert(id);

        let entry = PluginEntry { plugin, name };

        // Plugins added by another plugin's build() are built immediately.
        if self.build_state == BuildState::Building {
            entry.plugin.build(self);
            self.built_plugins.push(entry);
        } else {
            self.pending_plugins.push(entry);
        }
    }

    /// Returns true if a plugin of the given type has been added.
    #[must_use]
    pub fn has_plugin<P: Plugin>(&self) -> bool {
        self.plugin_ids.contains(&PluginId::of::<P>())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Global Resources
    // ─────────────────────────────────────────────────────────────────────────

    /// Inserts a global resource, replacing and returning any previous value.
    pub fn insert_global<R: GlobalResource>(&mut self, resource: R) -> Option<R> {
        self.global.insert(resource)
    }

    /// Gets a reference to a global resource.
    #[must_use]
    pub fn get_global<R: GlobalResource>(&self) -> Option<&R> {
        self.global.get::<R>()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // API Access
    // ─────────────────────────────────────────────────────────────────────────

    /// Inserts an API, replacing and returning any previous value.
    pub fn insert_api<A: API>(&mut self, api: A) -> Option<A> {
        let boxed: BoxedAPI = Box::new(api);
        self.apis
            .insert(TypeId::of::<A>(), boxed)
            .and_then(|old| old.downcast::<A>().ok())
            .map(|b| *b)
    }

    /// Gets a reference to an API.
    #[must_use]
    pub fn api<A: API>(&self) -> Option<&A> {
        self.apis
            .get(&TypeId::of::<A>())
            .and_then(|boxed| boxed.downcast_ref::<A>())
    }

    /// Returns true if an API of type `A` exists.
    #[must_use]
    pub fn contains_api<A: API>(&self) -> bool {
        self.apis.contains_key(&TypeId::of::<A>())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Lifecycle Methods
    // ─────────────────────────────────────────────────────────────────────────

    /// Returns whether [`finish()`](Self::finish) has completed.
    #[must_use]
    pub fn is_built(&self) -> bool {
        self.build_state == BuildState::Built
    }

    /// Builds all plugins and prepares the server.
    ///
    /// # Panics
    ///
    /// - If a plugin's dependency is not satisfied
    /// - If there is a circular dependency between plugins
    /// - If called more than once
    pub fn finish(&mut self) {
        if self.build_state != BuildState::NotStarted {
            panic!("Server::finish() was already called. Cannot build twice.");
        }

        let sorted_plugins = self.sort_plugins_by_dependencies();

        self.build_state = BuildState::Building;
        for entry in sorted_plugins {
            entry.plugin.build(self);
            self.built_plugins.push(entry);
        }

        // Plugins are detached while ready() runs so each one can take `&mut self`.
        // Anything added during ready() is built immediately and lands in the fresh list.
        let plugins = core::mem::take(&mut self.built_plugins);
        for entry in &plugins {
            entry.plugin.ready(self);
        }
        let added = core::mem::replace(&mut self.built_plugins, plugins);
        self.built_plugins.extend(added);

        self.build_state = BuildState::Built;
    }

    /// Convenience alias for [`finish()`](Self::finish).
    pub fn run(&mut self) {
        self.finish();
    }

    /// Cleans up all plugins in reverse dependency order.
    pub fn cleanup(&mut self) {
        let plugins = core::mem::take(&mut self.built_plugins);
        for entry in plugins.iter().rev() {
            entry.plugin.cleanup(self);
        }
        self.built_plugins = plugins;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internal: Dependency Resolution
    // ─────────────────────────────────────────────────────────────────────────

    /// Sorts pending plugins by dependencies (Kahn's algorithm).
    ///
    /// Plugins without ordering constraints keep their insertion order.
    fn sort_plugins_by_dependencies(&mut self) -> Vec<PluginEntry> {
        let pending = core::mem::take(&mut self.pending_plugins);
        let n = pending.len();
        if n == 0 {
            return Vec::new();
        }

        let name_to_index: HashMap<String, usize> = pending
            .iter()
            .enumerate()
            .map(|(i, entry)| (entry.name.clone(), i))
            .collect();

        let mut in_degree = vec![0usize; n];
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); n];

        for (i, entry) in pending.iter().enumerate() {
            for dep_id in entry.plugin.dependencies() {
                let dep_name = dep_id.type_name();
                if let Some(&dep_idx) = name_to_index.get(dep_name) {
                    dependents[dep_idx].push(i);
                    in_degree[i] += 1;
                } else if !self.built_plugins.iter().any(|p| p.name == dep_name) {
                    panic!(
                        "Plugin '{}' requires '{}' which was not added.\n\
                         Add {} before {}, or use a plugin group that includes it.",
                        entry.name, dep_name, dep_name, entry.name
                    );
                }
            }
        }

        let mut ready: Vec<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();
        let mut sorted_indices: Vec<usize> = Vec::with_capacity(n);

        while !ready.is_empty() {
            // Lowest index first keeps insertion order among independent plugins.
            ready.sort_unstable_by(|a, b| b.cmp(a));
            let Some(idx) = ready.pop() else { break };
            sorted_indices.push(idx);

            for &dependent_idx in &dependents[idx] {
                in_degree[dependent_idx] -= 1;
                if in_degree[dependent_idx] == 0 {
                    ready.push(dependent_idx);
                }
            }
        }

        if sorted_indices.len() != n {
            let in_cycle: Vec<&str> = in_degree
                .iter()
                .enumerate()
                .filter(|(_, deg)| **deg > 0)
                .map(|(i, _)| pending[i].name.as_str())
                .collect();

            panic!(
                "Circular dependency detected among plugins: {:?}\n\
                 Break the cycle by extracting shared functionality into a separate plugin.",
                in_cycle
            );
        }

        let mut slots: Vec<Option<PluginEntry>> = pending.into_iter().map(Some).collect();
        sorted_indices
            .into_iter()
            .filter_map(|idx| slots[idx].take())
            .collect()
    }
}
