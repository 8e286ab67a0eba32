use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use tiktoken_rs::{cl100k_base, get_bpe_from_model, o200k_base, p50k_base, r50k_base, CoreBPE};

use super::cache::CacheHandle;
use super::types::ChunkingError;

/// Token id produced by an encoder.
pub type TokenId = u32;

/// Encoding used when a model name cannot be resolved.
pub const DEFAULT_ENCODING: &str = "cl100k_base";

/// Encode, decode, and count capability consumed by the chunker.
pub trait Tokenizer: Send + Sync {
    fn name(&self) -> &str;

    fn encode(&self, text: &str) -> Vec<TokenId>;

    fn decode(&self, ids: &[TokenId]) -> Result<String, ChunkingError>;

    fn count(&self, text: &str) -> usize {
        self.encode(text).len()
    }
}

/// Shared reference type alias for tokenizers.
pub type SharedTokenizer = Arc<dyn Tokenizer>;

/// Tiktoken-backed tokenizer.
pub struct TiktokenTokenizer {
    name: String,
    bpe: CoreBPE,
}

impl TiktokenTokenizer {
    pub fn new(name: impl Into<String>, bpe: CoreBPE) -> Self {
        Self {
            name: name.into(),
            bpe,
        }
    }

    /// Resolve a model or encoding name. Unknown keys fall back to the
    /// default encoding, so construction always succeeds.
    pub fn for_model(encoding_model: &str) -> Self {
        let bpe = match encoding_model {
            "cl100k_base" => cl100k_base(),
            "o200k_base" => o200k_base(),
            "p50k_base" => p50k_base(),
            "r50k_base" => r50k_base(),
            model => get_bpe_from_model(model).or_else(|_| cl100k_base()),
        }
        .expect("bundled encoding data loads");
        Self::new(encoding_model, bpe)
    }
}

impl Tokenizer for TiktokenTokenizer {
    fn name(&self) -> &str {
        &self.name
    }

    fn encode(&self, text: &str) -> Vec<TokenId> {
        self.bpe.encode_with_special_tokens(text)
    }

    fn decode(&self, ids: &[TokenId]) -> Result<String, ChunkingError> {
        self.bpe
            .decode(ids.to_vec())
            .map_err(|err| ChunkingError::Tokenizer {
                reason: err.to_string(),
            })
    }
}

/// Deterministic per-character tokenizer for tests and offline runs. Every
/// character encodes to its scalar value, so decode is an exact inverse.
#[derive(Clone, Default)]
pub struct MockTokenizer;

impl MockTokenizer {
    pub fn new() -> Self {
        Self
    }
}

impl Tokenizer for MockTokenizer {
    fn name(&self) -> &str {
        "mock"
    }

    fn encode(&self, text: &str) -> Vec<TokenId> {
        text.chars().map(|ch| ch as TokenId).collect()
    }

    fn decode(&self, ids: &[TokenId]) -> Result<String, ChunkingError> {
        ids.iter()
            .map(|id| {
                char::from_u32(*id).ok_or_else(|| ChunkingError::Tokenizer {
                    reason: format!("invalid token id {id}"),
                })
            })
            .collect()
    }
}

static REGISTRY: OnceLock<Mutex<HashMap<String, SharedTokenizer>>> = OnceLock::new();

fn registry() -> &'static Mutex<HashMap<String, SharedTokenizer>> {
    REGISTRY.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Fetch the tokenizer registered for a model or encoding name, constructing
/// and caching a tiktoken entry on first use. Lookup never fails; unknown
/// keys resolve to the default encoding.
pub fn get(encoding_model: &str) -> SharedTokenizer {
    let mut guard = registry().lock().expect("tokenizer registry poisoned");
    if let Some(tokenizer) = guard.get(encoding_model) {
        return tokenizer.clone();
    }
    let tokenizer: SharedTokenizer = Arc::new(TiktokenTokenizer::for_model(encoding_model));
    guard.insert(encoding_model.to_string(), tokenizer.clone());
    tokenizer
}

/// Register a custom tokenizer under `name`, replacing any existing entry.
pub fn register(name: impl Into<String>, tokenizer: SharedTokenizer) {
    registry()
        .lock()
        .expect("tokenizer registry poisoned")
        .insert(name.into(), tokenizer);
}

/// Counting front end that memoizes results through a shared cache handle.
/// Entries are keyed by the tokenizer's name, so counters for different
/// encoders can share one cache without cross-talk.
pub struct TokenCounter {
    tokenizer: SharedTokenizer,
    cache: CacheHandle,
}

impl TokenCounter {
    pub fn new(tokenizer: SharedTokenizer, cache: CacheHandle) -> Self {
        Self { tokenizer, cache }
    }

    pub fn tokenizer(&self) -> &SharedTokenizer {
        &self.tokenizer
    }

    pub fn count(&self, text: &str) -> usize {
        {
            let mut guard = self.cache.lock();
            if let Some(cache) = guard.as_mut() {
                if let Some(count) = cache.get(self.tokenizer.name(), text) {
                    return count;
                }
            }
        }
        let count = self.tokenizer.count(text);
        if let Some(cache) = self.cache.lock().as_mut() {
            cache.insert(self.tokenizer.name(), text, count);
        }
        count
    }
}
