//! Global resource storage.
//!
//! Global resources are server-lifetime, read-only values shared with every
//! consumer of the server: engine configuration, tracing configuration, and
//! similar settings. They are inserted during the build phase and never
//! mutated afterwards.

use core::any::{Any, TypeId};
use hashbrown::HashMap;

/// Marker trait for global, read-only resources.
///
/// # Example
///
/// ```
/// use eca_system::resource::{GlobalResource, Resources};
///
/// struct SiteName(&'static str);
/// impl GlobalResource for SiteName {}
///
/// let mut resources = Resources::new();
/// resources.insert(SiteName("intranet"));
/// assert_eq!(resources.get::<SiteName>().map(|s| s.0), Some("intranet"));
/// ```
pub trait GlobalResource: Send + Sync + 'static {}

/// Type-keyed container of [`GlobalResource`] values.
#[derive(Default)]
pub struct Resources {
    entries: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl Resources {
    /// Creates an empty container.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a resource, returning the previous value of the same type.
    pub fn insert<R: GlobalResource>(&mut self, resource: R) -> Option<R> {
        self.entries
            .insert(TypeId::of::<R>(), Box::new(resource))
            .and_then(|old| old.downcast::<R>().ok())
            .map(|boxed| *boxed)
    }

    /// Returns a reference to the resource of type `R`, if present.
    #[must_use]
    pub fn get<R: GlobalResource>(&self) -> Option<&R> {
        self.entries
            .get(&TypeId::of::<R>())
            .and_then(|boxed| boxed.downcast_ref::<R>())
    }

    /// Returns true if a resource of type `R` is present.
    #[must_use]
    pub fn contains<R: GlobalResource>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<R>())
    }

    /// Removes and returns the resource of type `R`.
    pub fn remove<R: GlobalResource>(&mut self) -> Option<R> {
        self.entries
            .remove(&TypeId::of::<R>())
            .and_then(|old| old.downcast::<R>().ok())
            .map(|boxed| *boxed)
    }

    /// Returns the number of stored resources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no resources are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl core::fmt::Debug for Resources {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Resources")
            .field("len", &self.entries.len())
            .finish()
    }
}
