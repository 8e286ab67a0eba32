use super::assembly;
use super::cache::CacheHandle;
use super::config::ChunkingConfig;
use super::packer::pack_stream;
use super::provenance::SliceMap;
use super::tokenizer::{self, SharedTokenizer, TokenCounter};
use super::types::{ChunkSlice, ChunkingError, ChunkingOutcome, TraceSink};
use super::Chunker;

/// Token-budgeted chunker for Markdown slices.
///
/// Concatenates the normalized slice texts into one stream, packs it against
/// the separator ladder, then reshapes chunk boundaries: image-only chunks
/// merge into their predecessor and overlap tails are prepended.
pub struct MarkdownChunker {
    tokenizer: SharedTokenizer,
    cache: CacheHandle,
}

impl MarkdownChunker {
    pub fn new(tokenizer: SharedTokenizer) -> Self {
        Self {
            tokenizer,
            cache: CacheHandle::new(),
        }
    }

    /// Construct with a tokenizer resolved from the registry.
    pub fn for_model(encoding_model: &str) -> Self {
        Self::new(tokenizer::get(encoding_model))
    }

    pub fn with_cache_capacity(self, capacity: usize) -> Self {
        self.cache.apply_capacity(Some(capacity));
        self
    }

    pub fn without_cache(self) -> Self {
        self.cache.disable();
        self
    }

    pub fn with_cache_handle(mut self, cache: CacheHandle) -> Self {
        self.cache = cache;
        self
    }

    pub fn cache_handle(&self) -> CacheHandle {
        self.cache.clone()
    }

    pub fn tokenizer(&self) -> &SharedTokenizer {
        &self.tokenizer
    }

    fn configure_cache(&self, cfg: &ChunkingConfig) {
        self.cache.apply_capacity(cfg.cache_capacity);
    }

    pub fn chunk_slices(
        &self,
        slices: &[ChunkSlice],
        cfg: &ChunkingConfig,
    ) -> Result<ChunkingOutcome, ChunkingError> {
        cfg.validate()?;
        self.configure_cache(cfg);
        let span = tracing::debug_span!("markdown_chunk", chunker = %Chunker::name(self));
        let _entered = span.enter();

        let (stream, slice_map) = SliceMap::build(slices);
        if stream.is_empty() {
            return Ok(ChunkingOutcome::empty());
        }

        let counter = TokenCounter::new(self.tokenizer.clone(), self.cache.clone());
        let mut trace = TraceSink::new(cfg.capture_trace);
        let packed = pack_stream(&stream, cfg.size, &counter, &mut trace);
        let mut raw = packed.chunks;

        assembly::merge_image_chunks(&mut raw, &mut trace);
        assembly::apply_overlap(&mut raw, cfg.overlap, self.tokenizer.as_ref(), &mut trace)?;
        let chunks = assembly::finalize(raw, &slice_map, &counter);
        let stats = assembly::compute_stats(&chunks, packed.fragments);
        tracing::debug!(
            chunks = chunks.len(),
            fragments = packed.fragments,
            "packed markdown stream"
        );

        Ok(ChunkingOutcome {
            chunks,
            trace: trace.into_trace(),
            stats,
        })
    }
}

impl Chunker for MarkdownChunker {
    type Source = Vec<ChunkSlice>;

    fn chunk(
        &self,
        source: Self::Source,
        cfg: &ChunkingConfig,
    ) -> Result<ChunkingOutcome, ChunkingError> {
        self.chunk_slices(&source, cfg)
    }
}
