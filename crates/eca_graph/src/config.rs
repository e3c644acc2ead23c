//! Engine configuration.
//!
//! [`EngineConfig`] is a [`GlobalResource`] inserted by
//! [`EcaPlugin`](crate::plugin::EcaPlugin). It can be built in code or read
//! from JSON, where missing keys take their defaults:
//!
//! ```ignore
//! let config = EngineConfig::from_json(r#"{ "recursion_threshold": 5 }"#)?;
//! assert_eq!(config.history_capacity, 256);
//! ```

use eca_system::resource::GlobalResource;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::guard::DEFAULT_HISTORY_CAPACITY;

/// Default number of times a `(graph, event node)` pair may be dispatched
/// within one top-level `process` call.
pub const DEFAULT_RECURSION_THRESHOLD: usize = 3;

/// Default maximum successor depth followed from an event node.
pub const DEFAULT_MAX_WALK_DEPTH: usize = 64;

/// Errors raised by [`EngineConfig::validate`] and [`EngineConfig::from_json`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The threshold is zero, which blocks every dispatch.
    #[error("recursion threshold must be at least 1")]
    ZeroThreshold,
    /// The history fills up before a single pair can reach the threshold.
    #[error("history capacity {capacity} is below the recursion threshold {threshold}")]
    CapacityBelowThreshold {
        /// Configured history capacity.
        capacity: usize,
        /// Configured recursion threshold.
        threshold: usize,
    },
    /// The walk depth is zero, which skips every action.
    #[error("maximum walk depth must be at least 1")]
    ZeroWalkDepth,
    /// The JSON input could not be parsed.
    #[error("invalid engine configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Runtime bounds of the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// How often the same `(graph, event node)` pair may be dispatched within
    /// one top-level `process` call before further dispatches are skipped.
    pub recursion_threshold: usize,
    /// Maximum number of dispatches recorded within one top-level `process`
    /// call. Once reached, further dispatches are skipped.
    pub history_capacity: usize,
    /// Maximum successor depth followed from an event node. Bounds cycles
    /// that do not pass through an event node.
    pub max_walk_depth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            recursion_threshold: DEFAULT_RECURSION_THRESHOLD,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            max_walk_depth: DEFAULT_MAX_WALK_DEPTH,
        }
    }
}

impl GlobalResource for EngineConfig {}

impl EngineConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the recursion threshold.
    #[must_use]
    pub fn with_recursion_threshold(mut self, threshold: usize) -> Self {
        self.recursion_threshold = threshold;
        self
    }

    /// Sets the history capacity.
    #[must_use]
    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }

    /// Sets the maximum walk depth.
    #[must_use]
    pub fn with_max_walk_depth(mut self, depth: usize) -> Self {
        self.max_walk_depth = depth;
        self
    }

    /// Parses and validates a JSON configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed input and the
    /// [`validate`](Self::validate) errors for out-of-range values.
    pub fn from_json(input: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that the bounds are usable.
    ///
    /// # Errors
    ///
    /// Returns an error if the threshold or walk depth is zero, or if the
    /// history would fill up before one pair reaches `recursion_threshold`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.recursion_threshold == 0 {
            return Err(ConfigError::ZeroThreshold);
        }
        if self.max_walk_depth == 0 {
            return Err(ConfigError::ZeroWalkDepth);
        }
        if self.history_capacity < self.recursion_threshold {
            return Err(ConfigError::CapacityBelowThreshold {
                capacity: self.history_capacity,
                threshold: self.recursion_threshold,
            });
        }
        Ok(())
    }
}
