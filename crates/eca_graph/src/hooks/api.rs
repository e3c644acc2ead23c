//! Hook registration API for the processor.
//!
//! The [`HooksAPI`] is a registry of lifecycle callbacks keyed by schedule.
//!
//! # Observer vs Mutator
//!
//! - **Observers** ([`register_observer`](HooksAPI::register_observer)): React to
//!   events without touching the prestate. Use for logging and auditing.
//! - **Mutators** ([`register_mutator`](HooksAPI::register_mutator)): Receive the
//!   dispatch's [`Prestate`] mutably. Use for snapshotting state that actions
//!   and after-hooks compare against.
//!
//! # Multi-Schedule Registration
//!
//! ```ignore
//! hooks.register_observer::<(OnBeforeDispatch, OnAfterDispatch), _>(
//!     "audit",
//!     |event: &ProcessorEvent| tracing::info!(graph = event.graph().id(), "{}", event.name()),
//! )?;
//! ```
//!
//! # Example: Mutator
//!
//! ```ignore
//! hooks.register_mutator::<OnBeforeDispatch, _>("original_status", |prestate, event| {
//!     if let Some(saved) = event.event().downcast_ref::<ArticlePresave>() {
//!         prestate.insert("status", saved.original_status());
//!     }
//! })?;
//! ```

use std::sync::Arc;

use eca_system::api::API;
use eca_system::plugin::{IntoScheduleIds, ScheduleId};
use hashbrown::HashMap;
use parking_lot::RwLock;
use thiserror::Error;

use super::events::ProcessorEvent;
use crate::prestate::Prestate;

// ─────────────────────────────────────────────────────────────────────────────
// BoxedHook
// ─────────────────────────────────────────────────────────────────────────────

/// Type-erased hook receiving the prestate and the event.
///
/// Most users should use [`HooksAPI::register_observer`] or
/// [`HooksAPI::register_mutator`] instead of creating `BoxedHook` directly.
pub struct BoxedHook {
    handler: Box<dyn Fn(&mut Prestate, &ProcessorEvent<'_>) + Send + Sync>,
}

impl BoxedHook {
    /// Wraps a handler.
    #[must_use]
    pub fn new(handler: impl Fn(&mut Prestate, &ProcessorEvent<'_>) + Send + Sync + 'static) -> Self {
        Self {
            handler: Box::new(handler),
        }
    }

    /// Invokes the hook.
    pub fn invoke(&self, prestate: &mut Prestate, event: &ProcessorEvent<'_>) {
        (self.handler)(prestate, event);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// HookRegistrationError
// ─────────────────────────────────────────────────────────────────────────────

/// Errors that can occur during hook registration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HookRegistrationError {
    /// A hook with this name already exists on the schedule.
    #[error("hook '{name}' already registered for schedule '{}'", .schedule.type_name())]
    DuplicateName {
        /// The schedule where the duplicate was found.
        schedule: ScheduleId,
        /// The duplicate hook name.
        name: String,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// HooksAPI
// ─────────────────────────────────────────────────────────────────────────────

struct HookEntry {
    name: String,
    hook: Arc<BoxedHook>,
}

/// API for registering and invoking processor lifecycle hooks.
///
/// Registration takes a write lock; invocation snapshots the hooks of one
/// schedule and calls them without holding the lock, so hooks may re-enter
/// the processor.
#[derive(Default)]
pub struct HooksAPI {
    hooks: RwLock<HashMap<ScheduleId, Vec<HookEntry>>>,
}

impl API for HooksAPI {}

fn hook_name(name: &str, schedule: ScheduleId, schedule_count: usize) -> String {
    if schedule_count > 1 {
        format!("{}@{}", name, schedule.type_name())
    } else {
        name.to_owned()
    }
}

impl HooksAPI {
    /// Creates a new empty hooks registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an observer hook for one or more schedules.
    ///
    /// When registered on several schedules the hook is stored once per
    /// schedule as `"{name}@{schedule}"`.
    ///
    /// # Errors
    ///
    /// Returns [`HookRegistrationError::DuplicateName`] if the name is taken
    /// on any of the schedules.
    pub fn register_observer<S, F>(
        &self,
        name: impl Into<String>,
        hook: F,
    ) -> Result<&Self, HookRegistrationError>
    where
        S: IntoScheduleIds,
        F: Fn(&ProcessorEvent<'_>) + Send + Sync + 'static,
    {
        let hook = Arc::new(hook);
        self.register_each::<S>(name.into(), move || {
            let hook = Arc::clone(&hook);
            BoxedHook::new(move |_prestate, event| hook(event))
        })
    }

    /// Registers a hook that may read and modify the dispatch's prestate.
    ///
    /// # Errors
    ///
    /// Returns [`HookRegistrationError::DuplicateName`] if the name is taken
    /// on any of the schedules.
    pub fn register_mutator<S, F>(
        &self,
        name: impl Into<String>,
        hook: F,
    ) -> Result<&Self, HookRegistrationError>
    where
        S: IntoScheduleIds,
        F: Fn(&mut Prestate, &ProcessorEvent<'_>) + Send + Sync + 'static,
    {
        let hook = Arc::new(hook);
        self.register_each::<S>(name.into(), move || {
            let hook = Arc::clone(&hook);
            BoxedHook::new(move |prestate, event| hook(prestate, event))
        })
    }

    fn register_each<S: IntoScheduleIds>(
        &self,
        name: String,
        make: impl Fn() -> BoxedHook,
    ) -> Result<&Self, HookRegistrationError> {
        let schedules = S::schedule_ids();
        for schedule in &schedules {
            self.register_boxed(*schedule, hook_name(&name, *schedule, schedules.len()), make())?;
        }
        Ok(self)
    }

    /// Registers a pre-built [`BoxedHook`] for the given schedule.
    ///
    /// # Errors
    ///
    /// Returns [`HookRegistrationError::DuplicateName`] if the name is taken.
    pub fn register_boxed(
        &self,
        schedule: ScheduleId,
        name: impl Into<String>,
        hook: BoxedHook,
    ) -> Result<(), HookRegistrationError> {
        let name = name.into();

        let mut hooks = self.hooks.write();
        let entries = hooks.entry(schedule).or_default();

        if entries.iter().any(|entry| entry.name == name) {
            return Err(HookRegistrationError::DuplicateName { schedule, name });
        }

        entries.push(HookEntry {
            name,
            hook: Arc::new(hook),
        });
        Ok(())
    }

    /// Invokes all hooks registered for the given schedule, in registration
    /// order.
    pub fn invoke(&self, schedule: ScheduleId, prestate: &mut Prestate, event: &ProcessorEvent<'_>) {
        let snapshot: Vec<Arc<BoxedHook>> = {
            let hooks = self.hooks.read();
            match hooks.get(&schedule) {
                Some(entries) => entries.iter().map(|entry| Arc::clone(&entry.hook)).collect(),
                None => return,
            }
        };

        for hook in snapshot {
            hook.invoke(prestate, event);
        }
    }

    /// Returns the number of hooks registered for the given schedule.
    #[must_use]
    pub fn hook_count(&self, schedule: ScheduleId) -> usize {
        let hooks = self.hooks.read();
        hooks.get(&schedule).map_or(0, Vec::len)
    }

    /// Checks if a hook with the given name exists on the schedule.
    #[must_use]
    pub fn contains_hook(&self, schedule: ScheduleId, name: &str) -> bool {
        let hooks = self.hooks.read();
        hooks
            .get(&schedule)
            .is_some_and(|entries| entries.iter().any(|entry| entry.name == name))
    }
}
