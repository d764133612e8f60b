//! Calculator configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::models::Direction;

/// Defaults restored on reset and timing for debounced recalculation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculatorConfig {
    /// Leverage text shown on first start and after a reset
    pub default_leverage: String,

    /// Direction selected on first start and after a reset
    pub default_direction: Direction,

    /// Quiet period after the last edit before recalculating (milliseconds)
    pub debounce_ms: u64,
}

impl CalculatorConfig {
    pub fn debounce_delay(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for CalculatorConfig {
    fn default() -> Self {
        Self {
            default_leverage: "20".to_string(),
            default_direction: Direction::Long,
            debounce_ms: 300,
        }
    }
}
