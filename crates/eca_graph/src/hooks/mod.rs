//! Lifecycle hooks for event processing.
//!
//! Hooks let plugins observe and extend the processor without changing
//! graphs. They fire synchronously, in registration order, around every
//! dispatch and around every action execution on a target.
//!
//! # Architecture
//!
//! - **Schedule markers** ([`schedule`]): Empty types that identify hook points
//! - **Events** ([`events`]): [`ProcessorEvent`] enum carrying context to hooks
//! - **API** ([`api`]): Registration and invocation mechanism
//!
//! Every hook receives the [`Prestate`](crate::prestate::Prestate) of the
//! dispatch it fires in. Observers ignore it, mutators may write to it.

pub mod api;
pub mod events;
pub mod schedule;

pub use api::{BoxedHook, HookRegistrationError, HooksAPI};
pub use events::ProcessorEvent;
pub use schedule::{
    OnAfterActionExecution, OnAfterDispatch, OnBeforeActionExecution, OnBeforeDispatch,
};
