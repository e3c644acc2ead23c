//! Schedule markers for processor lifecycle events.
//!
//! These marker types identify when hooks are invoked. Use them with
//! [`ScheduleId::of::<T>()`](eca_system::plugin::ScheduleId::of) or with the
//! typed registration methods such as
//! [`register_observer::<OnBeforeDispatch>`](super::HooksAPI::register_observer).
//! Event data is carried by [`ProcessorEvent`](super::events::ProcessorEvent).

use eca_system::plugin::Schedule;

// ─────────────────────────────────────────────────────────────────────────────
// Dispatch Schedules
// ─────────────────────────────────────────────────────────────────────────────

/// Marker type for hooks called before an event node is dispatched.
///
/// Fires for every dispatch, including dispatches the recursion guard skips.
/// Listeners typically record the state of the event subject into the
/// prestate.
///
/// Event data: [`ProcessorEvent::BeforeDispatch`](super::events::ProcessorEvent::BeforeDispatch)
pub struct OnBeforeDispatch;
impl Schedule for OnBeforeDispatch {}

/// Marker type for hooks called after an event node was dispatched.
///
/// Event data: [`ProcessorEvent::AfterDispatch`](super::events::ProcessorEvent::AfterDispatch)
pub struct OnAfterDispatch;
impl Schedule for OnAfterDispatch {}

// ─────────────────────────────────────────────────────────────────────────────
// Action Schedules
// ─────────────────────────────────────────────────────────────────────────────

/// Marker type for hooks called before an action runs on one target.
///
/// Fires before the access check.
///
/// Event data: [`ProcessorEvent::BeforeActionExecution`](super::events::ProcessorEvent::BeforeActionExecution)
pub struct OnBeforeActionExecution;
impl Schedule for OnBeforeActionExecution {}

/// Marker type for hooks called after an action ran on one target.
///
/// Fires even when access was denied or the action failed.
///
/// Event data: [`ProcessorEvent::AfterActionExecution`](super::events::ProcessorEvent::AfterActionExecution)
pub struct OnAfterActionExecution;
impl Schedule for OnAfterActionExecution {}
