use std::path::PathBuf;
use std::time::Instant;

use tokio::fs;
use tracing::{field, info_span};

use super::cache::{CacheHandle, CacheMetrics};
use super::config::ChunkingConfig;
use super::markdown::MarkdownChunker;
use super::types::{ChunkSlice, ChunkingError, ChunkingOutcome};

/// Request-level facade over [`MarkdownChunker`] that resolves sources,
/// shares one count cache across requests, and reports telemetry per run.
pub struct ChunkingService {
    defaults: ChunkingConfig,
    cache: CacheHandle,
}

impl ChunkingService {
    pub fn builder() -> ChunkingServiceBuilder {
        ChunkingServiceBuilder::new()
    }

    pub fn default_config(&self) -> &ChunkingConfig {
        &self.defaults
    }

    pub async fn chunk_document(
        &self,
        request: ChunkRequest,
    ) -> Result<ChunkResponse, ChunkingError> {
        let resolved = self.resolve_source(request.source).await?;
        let config = request
            .config
            .unwrap_or_else(|| self.defaults.clone());
        config.validate()?;

        let span = info_span!(
            "markdown_chunking",
            source = %resolved.label,
            encoding = field::Empty,
            duration_ms = field::Empty,
            cache_hits = field::Empty,
            cache_misses = field::Empty,
            chunks = field::Empty,
        );
        let _entered = span.enter();

        let start = Instant::now();
        let before = self.cache.metrics();
        let chunker = MarkdownChunker::for_model(&config.encoding_model)
            .with_cache_handle(self.cache.clone());
        let outcome = chunker.chunk_slices(&resolved.slices, &config)?;
        let after = self.cache.metrics();

        let (cache_hits, cache_misses) = Self::metrics_diff(before, after);
        let duration_ms = start.elapsed().as_millis();

        span.record("encoding", field::display(&config.encoding_model));
        span.record("duration_ms", field::display(duration_ms));
        span.record("cache_hits", field::display(cache_hits));
        span.record("cache_misses", field::display(cache_misses));
        span.record("chunks", field::display(outcome.chunks.len()));

        let telemetry = ChunkTelemetry {
            source: resolved.label,
            encoding_model: config.encoding_model.clone(),
            duration_ms,
            cache_hits,
            cache_misses,
            chunk_count: outcome.chunks.len(),
            average_tokens: outcome.stats.average_tokens,
        };

        Ok(ChunkResponse { outcome, telemetry })
    }

    async fn resolve_source(&self, source: ChunkSource) -> Result<ResolvedSource, ChunkingError> {
        match source {
            ChunkSource::Slices(slices) => Ok(ResolvedSource {
                slices,
                label: "slices:inline".to_string(),
            }),
            ChunkSource::Text(text) => Ok(ResolvedSource {
                slices: vec![ChunkSlice::new("inline", text)],
                label: "text:inline".to_string(),
            }),
            ChunkSource::FilePath(path) => self.load_from_path(path).await,
        }
    }

    async fn load_from_path(&self, path: PathBuf) -> Result<ResolvedSource, ChunkingError> {
        let text = fs::read_to_string(&path)
            .await
            .map_err(|err| ChunkingError::InvalidInput {
                reason: format!("failed to read {}: {err}", path.display()),
            })?;
        let document_id = path.display().to_string();
        Ok(ResolvedSource {
            slices: vec![ChunkSlice::new(document_id.clone(), text)],
            label: format!("file:{document_id}"),
        })
    }

    fn metrics_diff(before: Option<CacheMetrics>, after: Option<CacheMetrics>) -> (usize, usize) {
        match (before, after) {
            (Some(prev), Some(next)) => (
                next.hits.saturating_sub(prev.hits),
                next.misses.saturating_sub(prev.misses),
            ),
            _ => (0, 0),
        }
    }
}

pub struct ChunkingServiceBuilder {
    defaults: ChunkingConfig,
}

impl ChunkingServiceBuilder {
    fn new() -> Self {
        Self {
            defaults: ChunkingConfig::default(),
        }
    }

    pub fn with_defaults(mut self, config: ChunkingConfig) -> Self {
        self.defaults = config;
        self
    }

    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.defaults.cache_capacity = Some(capacity);
        self
    }

    pub fn without_cache(mut self) -> Self {
        self.defaults.cache_capacity = Some(0);
        self
    }

    pub fn build(self) -> ChunkingService {
        let cache = CacheHandle::from_capacity(self.defaults.cache_capacity);
        ChunkingService {
            defaults: self.defaults,
            cache,
        }
    }
}

/// Where the markdown comes from.
#[derive(Clone)]
pub enum ChunkSource {
    Slices(Vec<ChunkSlice>),
    Text(String),
    FilePath(PathBuf),
}

#[derive(Clone)]
pub struct ChunkRequest {
    pub source: ChunkSource,
    pub config: Option<ChunkingConfig>,
}

impl ChunkRequest {
    pub fn new(source: ChunkSource) -> Self {
        Self {
            source,
            config: None,
        }
    }

    pub fn with_config(mut self, config: ChunkingConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn update_config<F>(mut self, f: F) -> Self
    where
        F: FnOnce(&mut ChunkingConfig),
    {
        let mut config = self.config.take().unwrap_or_default();
        f(&mut config);
        self.config = Some(config);
        self
    }
}

#[derive(Debug)]
pub struct ChunkResponse {
    pub outcome: ChunkingOutcome,
    pub telemetry: ChunkTelemetry,
}

#[derive(Clone, Debug)]
pub struct ChunkTelemetry {
    pub source: String,
    pub encoding_model: String,
    pub duration_ms: u128,
    pub cache_hits: usize,
    pub cache_misses: usize,
    pub chunk_count: usize,
    pub average_tokens: f32,
}

struct ResolvedSource {
    slices: Vec<ChunkSlice>,
    label: String,
}
