use std::sync::Arc;

use super::config::ChunkingConfig;
use super::markdown::MarkdownChunker;
use super::tokenizer::{self, MockTokenizer, Tokenizer};
use super::types::{ChunkSlice, ChunkingError};
use super::{chunk, estimate_tokens, Chunker};

const ARTICLE_FIXTURE: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/tests/markdown_chunking/article.md"
));
const IMAGES_FIXTURE: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/tests/markdown_chunking/images.md"
));

fn mock_chunker() -> MarkdownChunker {
    MarkdownChunker::new(Arc::new(MockTokenizer::new()))
}

fn config(size: usize, overlap: usize) -> ChunkingConfig {
    ChunkingConfig::new(size, overlap, "cl100k_base")
}

fn doc(text: &str) -> Vec<ChunkSlice> {
    vec![ChunkSlice::new("doc-1", text)]
}

fn texts(outcome: &super::ChunkingOutcome) -> Vec<&str> {
    outcome
        .chunks
        .iter()
        .map(|chunk| chunk.text.as_str())
        .collect()
}

#[test]
fn short_text_fits_one_chunk() {
    let outcome = mock_chunker()
        .chunk_slices(&doc("Short text"), &config(100, 20))
        .unwrap();
    assert_eq!(texts(&outcome), vec!["Short text"]);
    assert_eq!(outcome.chunks[0].token_count, 10);
    assert_eq!(outcome.chunks[0].document_ids, vec!["doc-1"]);
}

#[test]
fn paragraphs_flush_at_the_budget() {
    let outcome = mock_chunker()
        .chunk_slices(&doc("Para one is here.\n\nPara two is here."), &config(30, 0))
        .unwrap();
    assert_eq!(
        texts(&outcome),
        vec!["Para one is here.\n\n", "Para two is here."]
    );
    assert_eq!(outcome.chunks[0].token_count, 19);
    assert_eq!(outcome.chunks[1].token_count, 17);
    assert_eq!(outcome.stats.total_fragments, 3);
    assert_eq!(outcome.stats.total_chunks, 2);
    assert_eq!(outcome.stats.average_tokens, 18.0);
}

#[test]
fn oversize_runs_fall_back_to_characters() {
    let outcome = mock_chunker()
        .chunk_slices(&doc("abcdefghij"), &config(3, 0))
        .unwrap();
    assert_eq!(texts(&outcome), vec!["abc", "def", "ghi", "j"]);
}

#[test]
fn overlap_prefixes_follow_the_final_previous_text() {
    let outcome = mock_chunker()
        .chunk_slices(&doc("abcdefghij"), &config(3, 2))
        .unwrap();
    assert_eq!(texts(&outcome), vec!["abc", "bc def", "ef ghi", "hi j"]);
    let counts: Vec<usize> = outcome
        .chunks
        .iter()
        .map(|chunk| chunk.token_count)
        .collect();
    assert_eq!(counts, vec![3, 6, 6, 4]);
}

#[test]
fn isolated_image_merges_into_previous_chunk() {
    let text = "Intro paragraph text.\n\n![chart](c.png)\n\nClosing remarks follow here.";
    let outcome = mock_chunker()
        .chunk_slices(&doc(text), &config(30, 0))
        .unwrap();
    assert_eq!(
        texts(&outcome),
        vec![
            "Intro paragraph text.\n\n![chart](c.png)\n\n",
            "Closing remarks follow here."
        ]
    );
    let rebuilt: String = texts(&outcome).concat();
    assert_eq!(rebuilt, text);
}

#[test]
fn merged_tail_feeds_overlap() {
    let text = "Intro paragraph text.\n\n![chart](c.png)\n\nClosing remarks follow here.";
    let outcome = mock_chunker()
        .chunk_slices(&doc(text), &config(30, 5))
        .unwrap();
    assert_eq!(outcome.chunks.len(), 2);
    assert_eq!(outcome.chunks[1].text, "ng)\n\nClosing remarks follow here.");
    assert_eq!(outcome.chunks[1].token_count, 33);
}

#[test]
fn leading_image_chunk_stays_first() {
    let text = "![logo](l.png)\n\nThe opening image stays put.";
    let outcome = mock_chunker()
        .chunk_slices(&doc(text), &config(30, 0))
        .unwrap();
    assert_eq!(outcome.chunks.len(), 2);
    assert!(outcome.chunks[0].text.starts_with("!["));
    assert!(!outcome.chunks[1].text.trim_start().starts_with("!["));
}

#[test]
fn chunks_spanning_slices_carry_both_documents() {
    let slices = vec![
        ChunkSlice::new("alpha-doc", "alpha, beta, "),
        ChunkSlice::new("empty-doc", ""),
        ChunkSlice::new("gamma-doc", "gamma, delta"),
    ];
    let outcome = mock_chunker()
        .chunk_slices(&slices, &config(20, 0))
        .unwrap();
    assert_eq!(texts(&outcome), vec!["alpha, beta, gamma, ", "delta"]);
    assert_eq!(
        outcome.chunks[0].document_ids,
        vec!["alpha-doc", "gamma-doc"]
    );
    assert_eq!(outcome.chunks[1].document_ids, vec!["gamma-doc"]);

    let mut union: Vec<&str> = outcome
        .chunks
        .iter()
        .flat_map(|chunk| chunk.document_ids.iter().map(String::as_str))
        .collect();
    union.sort_unstable();
    union.dedup();
    assert_eq!(union, vec!["alpha-doc", "gamma-doc"]);
}

#[test]
fn empty_input_yields_no_chunks() {
    let outcome = mock_chunker().chunk_slices(&[], &config(10, 0)).unwrap();
    assert!(outcome.chunks.is_empty());
    assert_eq!(outcome.stats.total_chunks, 0);

    let blank = vec![ChunkSlice::new("a", ""), ChunkSlice::new("b", "")];
    let outcome = mock_chunker().chunk_slices(&blank, &config(10, 0)).unwrap();
    assert!(outcome.chunks.is_empty());
}

#[test]
fn invalid_configs_are_rejected_before_work() {
    let chunker = mock_chunker();
    let slices = doc("text");
    for cfg in [
        config(0, 0),
        config(10, 10),
        config(10, 11),
        ChunkingConfig::new(10, 2, ""),
    ] {
        let err = chunker.chunk_slices(&slices, &cfg).unwrap_err();
        assert!(matches!(err, ChunkingError::InvalidConfig { .. }));
    }
}

#[test]
fn carriage_returns_normalize_before_packing() {
    let outcome = mock_chunker()
        .chunk_slices(&doc("line one\r\nline two\r\n\r\nnext para"), &config(100, 0))
        .unwrap();
    assert_eq!(texts(&outcome), vec!["line one\nline two\n\nnext para"]);
    assert_eq!(outcome.chunks[0].token_count, 28);
}

#[test]
fn trace_capture_is_opt_in() {
    let chunker = mock_chunker();
    let outcome = chunker
        .chunk_slices(&doc("abcdefghij"), &config(3, 0))
        .unwrap();
    assert!(outcome.trace.is_none());

    let mut cfg = config(3, 0);
    cfg.capture_trace = true;
    let outcome = chunker.chunk_slices(&doc("abcdefghij"), &cfg).unwrap();
    let labels: Vec<String> = outcome
        .trace
        .unwrap()
        .events
        .into_iter()
        .map(|event| event.label)
        .collect();
    assert!(labels.iter().any(|label| label == "char_fallback"));
}

#[test]
fn trait_and_free_function_agree() {
    let cfg = config(100, 0);
    let via_free = chunk(&doc("Same text either way."), &cfg).unwrap();
    let chunker = MarkdownChunker::for_model(&cfg.encoding_model);
    let via_trait = chunker.chunk(doc("Same text either way."), &cfg).unwrap();
    assert_eq!(via_free, via_trait.chunks);
    assert!(Chunker::name(&chunker).contains("MarkdownChunker"));
}

#[test]
fn estimate_tokens_counts_something() {
    assert!(estimate_tokens("hello chunked world") >= 3);
}

#[test]
fn article_reconstructs_without_loss() {
    let cfg = config(100, 0);
    let chunker = MarkdownChunker::for_model(&cfg.encoding_model);
    let outcome = chunker
        .chunk_slices(&[ChunkSlice::new("article.md", ARTICLE_FIXTURE)], &cfg)
        .unwrap();

    assert!(outcome.chunks.len() >= 2);
    let rebuilt: String = texts(&outcome).concat();
    assert_eq!(rebuilt, ARTICLE_FIXTURE);
    for chunk in &outcome.chunks {
        assert_eq!(chunk.document_ids, vec!["article.md"]);
    }
    for chunk in &outcome.chunks[1..] {
        assert!(!chunk.text.trim_start().starts_with("!["));
    }
}

#[test]
fn budget_holds_with_slack_on_plain_prose() {
    let size = 40;
    let text = "Chunk budgets bound every passage. Retrieval quality depends on it! \
        Does the packer honor the limit? Mostly, and always within slack. "
        .repeat(12);
    let chunks = chunk(&doc(&text), &config(size, 0)).unwrap();

    assert!(chunks.len() >= 2);
    for chunk in &chunks {
        assert!(
            chunk.token_count <= size * 3 / 2,
            "chunk of {} tokens exceeds the slack budget",
            chunk.token_count
        );
    }
    let rebuilt: String = chunks.iter().map(|chunk| chunk.text.as_str()).collect();
    assert_eq!(rebuilt, text);
}

#[test]
fn image_heavy_document_keeps_images_attached() {
    let cfg = config(50, 0);
    let chunker = MarkdownChunker::for_model(&cfg.encoding_model);
    let outcome = chunker
        .chunk_slices(&[ChunkSlice::new("images.md", IMAGES_FIXTURE)], &cfg)
        .unwrap();

    assert!(!outcome.chunks.is_empty());
    for chunk in &outcome.chunks[1..] {
        assert!(!chunk.text.trim_start().starts_with("!["));
    }
    let joined: String = texts(&outcome).concat();
    assert!(joined.contains("![volume](charts/volume.png)"));
    assert!(joined.contains("![latency](charts/latency.png)"));
    assert_eq!(joined, IMAGES_FIXTURE);
}

#[test]
fn chunker_cache_configuration_is_respected() {
    let chunker = mock_chunker().with_cache_capacity(64);
    chunker
        .chunk_slices(&doc("Para one is here.\n\nPara two is here."), &config(30, 0))
        .unwrap();
    let metrics = chunker.cache_handle().metrics().unwrap();
    assert!(metrics.misses > 0);

    let disabled = mock_chunker().without_cache();
    disabled
        .chunk_slices(&doc("Short text"), &config(30, 0))
        .unwrap();
    assert!(disabled.cache_handle().metrics().is_none());
}

#[test]
fn titled_document_with_image_splits_cleanly() {
    let text = format!(
        "# Title\n\nAlice met Bob.\n\n![image](path)\n\n{}",
        "This paragraph provides plenty of narrative content for chunking purposes. "
            .repeat(4)
    );
    let chunks = chunk(&doc(&text), &config(60, 10)).unwrap();

    assert!(chunks.len() >= 2);
    for chunk in &chunks[1..] {
        assert!(!chunk.text.trim_start().starts_with("!["));
    }
    assert!(chunks.iter().any(|chunk| chunk.text.contains("![image](path)")));
}

#[test]
fn overlap_relation_holds_with_a_real_encoder() {
    let overlap = 20;
    let text = "Token overlap ensures continuity across generated segments. ".repeat(20);
    let cfg = config(80, overlap);
    let chunks = chunk(&doc(&text), &cfg).unwrap();
    assert!(chunks.len() >= 2);

    let encoder = tokenizer::get(&cfg.encoding_model);
    for pair in chunks.windows(2) {
        let ids = encoder.encode(&pair[0].text);
        let tail_start = ids.len().saturating_sub(overlap);
        let expected = encoder.decode(&ids[tail_start..]).unwrap();
        assert!(pair[1]
            .text
            .trim_start()
            .starts_with(expected.trim_start()));
    }
}

#[test]
fn repeated_runs_are_bitwise_identical() {
    let cfg = config(64, 8);
    let slices = [ChunkSlice::new("article.md", ARTICLE_FIXTURE)];
    let chunker = MarkdownChunker::for_model(&cfg.encoding_model);
    let first = chunker.chunk_slices(&slices, &cfg).unwrap();
    let second = chunker.chunk_slices(&slices, &cfg).unwrap();
    assert_eq!(first.chunks, second.chunks);
    assert_eq!(first.stats.total_fragments, second.stats.total_fragments);
}
