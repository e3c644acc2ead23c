//! API trait for capability registration.
//!
//! APIs are registries that plugins use to expose capabilities to other
//! plugins and to the rule processor. The rule engine publishes two of them:
//! the lifecycle hook table and the capability plugin registry.
//!
//! # API vs Resource
//!
//! | Aspect | API | Resource |
//! |--------|-----|----------|
//! | **Purpose** | Registration tables | Read-only configuration |
//! | **Mutability** | Interior (`&self` registration) | None after insertion |
//! | **Access method** | `server.api::<A>()` | `server.get_global::<R>()` |
//!
//! # Interior Mutability Pattern
//!
//! APIs that accept registrations use interior mutability so that any plugin
//! holding `&Server` can register:
//!
//! ```ignore
//! pub struct ActionCatalog {
//!     actions: RwLock<HashMap<String, Arc<dyn ActionPlugin>>>,
//! }
//!
//! impl API for ActionCatalog {}
//!
//! impl ActionCatalog {
//!     pub fn register(&self, action: Arc<dyn ActionPlugin>) {
//!         self.actions.write().insert(action.id().to_string(), action);
//!     }
//! }
//! ```

/// Marker trait for capability APIs.
///
/// # Usage in Plugins
///
/// ```ignore
/// impl Plugin for RegistryPlugin {
///     fn build(&self, server: &mut Server) {
///         server.insert_api(PluginRegistry::new());
///     }
/// }
///
/// impl Plugin for ContentActionsPlugin {
///     fn ready(&self, server: &mut Server) {
///         let registry = server.api::<PluginRegistry>()
///             .expect("PluginRegistry required");
///         registry.register_action(Arc::new(SaveEntity));
///     }
/// }
/// ```
pub trait API: Send + Sync + 'static {}
