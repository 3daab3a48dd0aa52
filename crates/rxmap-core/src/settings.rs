use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Batch and review policy for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    pub batch_size: usize,
    /// Pause after every record, in milliseconds.
    pub rate_limit_delay_ms: u64,
    /// Successful mappings below this confidence still need review.
    pub review_threshold: u8,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            batch_size: 10,
            rate_limit_delay_ms: 1000,
            review_threshold: 7,
        }
    }
}

impl PipelineSettings {
    pub fn rate_limit_delay(&self) -> Duration {
        Duration::from_millis(self.rate_limit_delay_ms)
    }
}
