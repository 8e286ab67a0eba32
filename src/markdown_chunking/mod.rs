//! Token-budgeted chunking primitives for Markdown sources.

pub mod cache;
pub mod config;
pub mod markdown;
pub mod normalize;
pub mod separators;
pub mod service;
pub mod splitter;
pub mod tokenizer;
pub mod types;

mod assembly;
mod packer;
mod provenance;

pub use config::ChunkingConfig;
pub use markdown::MarkdownChunker;
pub use normalize::normalize_newlines;
pub use separators::{ladder, SeparatorSet};
pub use service::{
    ChunkRequest, ChunkResponse, ChunkSource, ChunkTelemetry, ChunkingService,
    ChunkingServiceBuilder,
};
pub use splitter::split_to_fragments;
pub use tokenizer::{MockTokenizer, SharedTokenizer, TiktokenTokenizer, TokenId, Tokenizer};
pub use types::{
    Chunk, ChunkSlice, ChunkingError, ChunkingOutcome, ChunkingStats, ChunkingTrace, Fragment,
    TraceEvent,
};

/// Implemented by concrete chunkers.
pub trait Chunker {
    type Source;

    fn chunk(
        &self,
        source: Self::Source,
        cfg: &ChunkingConfig,
    ) -> Result<ChunkingOutcome, ChunkingError>;

    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Chunk labeled slices with a tokenizer resolved from the registry.
pub fn chunk(slices: &[ChunkSlice], config: &ChunkingConfig) -> Result<Vec<Chunk>, ChunkingError> {
    config.validate()?;
    let chunker = MarkdownChunker::for_model(&config.encoding_model);
    Ok(chunker.chunk_slices(slices, config)?.chunks)
}

/// Estimate tokens using the default encoding.
pub fn estimate_tokens(text: &str) -> usize {
    tokenizer::get(tokenizer::DEFAULT_ENCODING).count(text)
}

#[cfg(test)]
mod tests;
