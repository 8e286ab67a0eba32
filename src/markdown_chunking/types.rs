use serde::{Deserialize, Serialize};

/// A labeled input slice. Slice text is never mutated.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChunkSlice {
    pub document_id: String,
    pub text: String,
}

impl ChunkSlice {
    pub fn new(document_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            text: text.into(),
        }
    }
}

/// A packed chunk ready for downstream retrieval.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub token_count: usize,
    pub document_ids: Vec<String>,
}

/// Aggregate result returned by a chunker, including optional trace data.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChunkingOutcome {
    pub chunks: Vec<Chunk>,
    pub trace: Option<ChunkingTrace>,
    pub stats: ChunkingStats,
}

impl ChunkingOutcome {
    pub fn empty() -> Self {
        Self {
            chunks: Vec::new(),
            trace: None,
            stats: ChunkingStats::default(),
        }
    }
}

/// Basic runtime stats for diagnostics.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ChunkingStats {
    pub total_fragments: usize,
    pub total_chunks: usize,
    pub average_tokens: f32,
}

/// Trace data is useful for debugging ladder descent and postprocessing.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ChunkingTrace {
    pub events: Vec<TraceEvent>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TraceEvent {
    pub label: String,
    pub level: Option<usize>,
    pub index: Option<usize>,
}

impl TraceEvent {
    pub fn new(label: impl Into<String>, level: Option<usize>, index: Option<usize>) -> Self {
        Self {
            label: label.into(),
            level,
            index,
        }
    }
}

/// Event collector that stays inert unless tracing was requested.
#[derive(Debug, Default)]
pub(crate) struct TraceSink {
    events: Option<Vec<TraceEvent>>,
}

impl TraceSink {
    pub fn new(enabled: bool) -> Self {
        Self {
            events: enabled.then(Vec::new),
        }
    }

    pub fn push(&mut self, label: &str, level: Option<usize>, index: Option<usize>) {
        if let Some(events) = &mut self.events {
            events.push(TraceEvent::new(label, level, index));
        }
    }

    pub fn into_trace(self) -> Option<ChunkingTrace> {
        self.events.map(|events| ChunkingTrace { events })
    }
}

/// A run of input characters tagged as matched separator or content.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Fragment<'a> {
    pub content: &'a str,
    pub is_separator: bool,
}

/// Errors that the chunker can surface to callers.
#[derive(thiserror::Error, Debug)]
pub enum ChunkingError {
    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },
    #[error("tokenizer failure: {reason}")]
    Tokenizer { reason: String },
}
