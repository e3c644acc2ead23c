//! Runtime events and the objects they act on.
//!
//! A [`RuntimeEvent`] is the opaque, typed payload that starts processing.
//! Event plugins declare the concrete type they react to through an
//! [`EventType`]; the matcher compares it with [`RuntimeEvent::event_type`].
//!
//! Events may carry a *subject*, the object the event is about (a saved
//! entity, a logged-in user). Action plugins execute once per resolved
//! [`Target`], and by default the subject is the single target.
//!
//! # Example
//!
//! ```ignore
//! #[derive(Debug)]
//! struct Article { title: String }
//! impl Target for Article {}
//!
//! #[derive(Debug)]
//! struct ArticlePresave { article: BoxedTarget }
//!
//! impl RuntimeEvent for ArticlePresave {
//!     fn name(&self) -> &str { "article:presave" }
//!     fn subject(&self) -> Subject { Subject::Present(Arc::clone(&self.article)) }
//! }
//! ```

use core::any::TypeId;
use core::fmt;
use std::sync::Arc;

use downcast_rs::{DowncastSync, impl_downcast};

// ─────────────────────────────────────────────────────────────────────────────
// Targets
// ─────────────────────────────────────────────────────────────────────────────

/// An object an action is executed against.
///
/// Implementors are downcast by action plugins to their concrete type.
pub trait Target: DowncastSync + fmt::Debug {}
impl_downcast!(sync Target);

/// Shared, type-erased target.
pub type BoxedTarget = Arc<dyn Target>;

/// Placeholder target used for events that have no subject concept.
///
/// Actions reacting to such events (cron, user login) still execute once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Unbound;

impl Target for Unbound {}

/// The subject an event reports.
#[derive(Debug, Clone)]
pub enum Subject {
    /// The event has no subject concept.
    Absent,
    /// The event has a subject concept but it is currently null.
    Null,
    /// The event refers to this object.
    Present(BoxedTarget),
}

impl Subject {
    /// Returns true if the event declares a subject that is null.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Subject::Null)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// EventType
// ─────────────────────────────────────────────────────────────────────────────

/// Identifies the concrete Rust type of a runtime event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventType {
    type_id: TypeId,
    type_name: &'static str,
}

impl EventType {
    /// Returns the event type of `E`.
    #[must_use]
    pub fn of<E: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<E>(),
            type_name: core::any::type_name::<E>(),
        }
    }

    /// Returns the underlying `TypeId`.
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Returns the full type name.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let short = self.type_name.rsplit("::").next().unwrap_or(self.type_name);
        f.write_str(short)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// RuntimeEvent
// ─────────────────────────────────────────────────────────────────────────────

/// A typed payload that triggers rule processing.
pub trait RuntimeEvent: DowncastSync + fmt::Debug {
    /// Human-readable event name, used in logs (`"article:presave"`).
    fn name(&self) -> &str;

    /// The object this event is about.
    ///
    /// Events without a subject concept keep the default [`Subject::Absent`].
    fn subject(&self) -> Subject {
        Subject::Absent
    }

    /// The identity on whose behalf the event was raised, if known.
    fn actor(&self) -> Option<&str> {
        None
    }

    /// The concrete type of this event.
    fn event_type(&self) -> EventType {
        EventType::of::<Self>()
    }
}
impl_downcast!(sync RuntimeEvent);
