//! Per-model token pricing

use serde::{Deserialize, Serialize};

/// Cost table for one provider model, in USD per 1000 tokens
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenPricing {
    /// Cost of 1000 prompt tokens
    #[serde(default)]
    pub input_cost_per_1k: f64,

    /// Cost of 1000 completion tokens
    #[serde(default)]
    pub output_cost_per_1k: f64,
}

impl TokenPricing {
    /// Create a cost table
    pub fn new(input_cost_per_1k: f64, output_cost_per_1k: f64) -> Self {
        Self {
            input_cost_per_1k,
            output_cost_per_1k,
        }
    }

    /// Cost of one call
    pub fn cost(&self, prompt_tokens: u32, completion_tokens: u32) -> f64 {
        (prompt_tokens as f64 / 1000.0) * self.input_cost_per_1k
            + (completion_tokens as f64 / 1000.0) * self.output_cost_per_1k
    }

    /// Whether both rates are finite and non-negative
    pub fn is_valid(&self) -> bool {
        [self.input_cost_per_1k, self.output_cost_per_1k]
            .iter()
            .all(|rate| rate.is_finite() && *rate >= 0.0)
    }
}
