//! # ECA Internal Library
//!
//! Re-exports the core ECA crates for convenience.

/// Layer 1: Plugin orchestration.
pub use eca_system;

/// Layer 2: Rule graphs and the processor.
pub use eca_graph;

/// Layer 3: Infrastructure plugins.
pub use eca_core_plugins;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use eca_core_plugins::{DefaultPlugins, DispatchLogPlugin, DispatchStats, TracingPlugin};
    pub use eca_graph::prelude::*;
    pub use eca_system::prelude::*;
}
