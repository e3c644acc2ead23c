//! Event-condition-action rule execution for Rust hosts.
//!

pub use eca_internal::*;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use eca_internal::prelude::*;
}
