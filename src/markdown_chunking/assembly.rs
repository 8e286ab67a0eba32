use super::packer::RawChunk;
use super::provenance::SliceMap;
use super::tokenizer::{TokenCounter, Tokenizer};
use super::types::{Chunk, ChunkingError, ChunkingStats, TraceSink};

/// Fold chunks whose trimmed text opens with an image reference into their
/// predecessor, so no chunk after the first leads with a bare image. The
/// original inter-chunk whitespace is preserved by plain concatenation.
pub(crate) fn merge_image_chunks(chunks: &mut Vec<RawChunk>, trace: &mut TraceSink) {
    loop {
        let mut changed = false;
        let mut index = 1;
        while index < chunks.len() {
            if chunks[index].text.trim_start().starts_with("![") {
                let merged = chunks.remove(index);
                let previous = &mut chunks[index - 1];
                previous.text.push_str(&merged.text);
                previous.tokens += merged.tokens;
                previous.span.end = merged.span.end;
                trace.push("image_merge", None, Some(index));
                changed = true;
            } else {
                index += 1;
            }
        }
        if !changed {
            break;
        }
    }
}

/// Prepend the decoded tail of each chunk's predecessor. Runs front to back
/// in place, so the tail is taken from the predecessor's final text. A single
/// space is inserted when neither side brings whitespace to the join.
pub(crate) fn apply_overlap(
    chunks: &mut [RawChunk],
    overlap: usize,
    tokenizer: &dyn Tokenizer,
    trace: &mut TraceSink,
) -> Result<(), ChunkingError> {
    if overlap == 0 || chunks.len() < 2 {
        return Ok(());
    }
    for index in 1..chunks.len() {
        let previous_ids = tokenizer.encode(&chunks[index - 1].text);
        if previous_ids.is_empty() {
            continue;
        }
        let tail_start = previous_ids.len().saturating_sub(overlap);
        let prefix = tokenizer.decode(&previous_ids[tail_start..])?;
        if prefix.is_empty() {
            continue;
        }

        let current = &mut chunks[index];
        let needs_space = prefix.chars().next_back().is_some_and(|ch| !ch.is_whitespace())
            && current.text.chars().next().is_some_and(|ch| !ch.is_whitespace());
        let mut text = String::with_capacity(prefix.len() + current.text.len() + 1);
        text.push_str(&prefix);
        if needs_space {
            text.push(' ');
        }
        text.push_str(&current.text);
        current.text = text;
        trace.push("overlap_prefix", None, Some(index));
    }
    Ok(())
}

/// Recount tokens on the final text and attach document provenance.
pub(crate) fn finalize(raw: Vec<RawChunk>, slices: &SliceMap, counter: &TokenCounter) -> Vec<Chunk> {
    raw.into_iter()
        .map(|chunk| {
            let token_count = counter.count(&chunk.text);
            let document_ids = slices.document_ids(&chunk.span);
            Chunk {
                text: chunk.text,
                token_count,
                document_ids,
            }
        })
        .collect()
}

/// Compute aggregate statistics for finished chunks.
pub(crate) fn compute_stats(chunks: &[Chunk], total_fragments: usize) -> ChunkingStats {
    let total_chunks = chunks.len();
    let token_sum: usize = chunks.iter().map(|chunk| chunk.token_count).sum();
    let average_tokens = if total_chunks == 0 {
        0.0
    } else {
        token_sum as f32 / total_chunks as f32
    };

    ChunkingStats {
        total_fragments,
        total_chunks,
        average_tokens,
    }
}
