//! Decision gate configuration

use serde::{Deserialize, Serialize};

/// Canonical auto-creation threshold
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.8;

/// Configuration for the decision gate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Lowest confidence that may create a record without review
    pub confidence_threshold: f64,

    /// Skip requests whose absence type is missing or inactive in the catalog
    pub require_active_type: bool,

    /// Longest calendar span accepted, in days; `None` for no limit
    pub max_span_days: Option<u32>,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            require_active_type: true,
            max_span_days: Some(366),
        }
    }
}

impl GateConfig {
    /// Create a strict configuration (high threshold, short spans)
    pub fn strict() -> Self {
        Self {
            confidence_threshold: 0.9,
            require_active_type: true,
            max_span_days: Some(31),
        }
    }

    /// Create a permissive configuration (lower threshold, no span limit)
    pub fn permissive() -> Self {
        Self {
            confidence_threshold: 0.6,
            require_active_type: false,
            max_span_days: None,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err("confidence_threshold must be in [0, 1]".to_string());
        }
        if self.max_span_days == Some(0) {
            return Err("max_span_days must be greater than 0".to_string());
        }
        Ok(())
    }
}
