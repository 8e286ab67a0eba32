use serde::{Deserialize, Serialize};

use super::tokenizer::DEFAULT_ENCODING;
use super::types::ChunkingError;

/// Tuning knobs for a chunking run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Target tokens per chunk. Must be at least 1.
    pub size: usize,
    /// Tokens re-emitted from the tail of the previous chunk. Must stay
    /// below `size`.
    pub overlap: usize,
    /// Model or encoding name used to resolve the tokenizer.
    pub encoding_model: String,
    /// Capacity for the shared token-count cache. `Some(0)` disables it,
    /// `None` leaves the handle as configured.
    pub cache_capacity: Option<usize>,
    /// Collect trace events for ladder descent and postprocessing.
    pub capture_trace: bool,
}

impl ChunkingConfig {
    pub fn new(size: usize, overlap: usize, encoding_model: impl Into<String>) -> Self {
        Self {
            size,
            overlap,
            encoding_model: encoding_model.into(),
            ..Self::default()
        }
    }

    /// Reject invalid settings before any work happens.
    pub fn validate(&self) -> Result<(), ChunkingError> {
        if self.size == 0 {
            return Err(ChunkingError::InvalidConfig {
                reason: "size must be at least 1 token".to_string(),
            });
        }
        if self.overlap >= self.size {
            return Err(ChunkingError::InvalidConfig {
                reason: format!(
                    "overlap {} must be smaller than size {}",
                    self.overlap, self.size
                ),
            });
        }
        if self.encoding_model.is_empty() {
            return Err(ChunkingError::InvalidConfig {
                reason: "encoding_model must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            size: 512,
            overlap: 64,
            encoding_model: DEFAULT_ENCODING.to_string(),
            cache_capacity: None,
            capture_trace: false,
        }
    }
}
