use std::ops::Range;

use super::normalize::normalize_newlines;
use super::types::ChunkSlice;

/// Byte-range ownership of the packed stream, one run per contributing slice.
#[derive(Clone, Debug)]
pub(crate) struct SliceMap {
    runs: Vec<SliceRun>,
}

#[derive(Clone, Debug)]
struct SliceRun {
    span: Range<usize>,
    document_id: String,
}

impl SliceMap {
    /// Concatenate normalized slice texts into one stream and record which
    /// byte range each document owns. Slices that normalize to empty text
    /// contribute no run.
    pub fn build(slices: &[ChunkSlice]) -> (String, SliceMap) {
        let mut stream = String::new();
        let mut runs = Vec::new();
        for slice in slices {
            let normalized = normalize_newlines(&slice.text);
            if normalized.is_empty() {
                continue;
            }
            let start = stream.len();
            stream.push_str(&normalized);
            runs.push(SliceRun {
                span: start..stream.len(),
                document_id: slice.document_id.clone(),
            });
        }
        (stream, SliceMap { runs })
    }

    /// Document ids whose runs intersect `span`, deduplicated in stream order.
    pub fn document_ids(&self, span: &Range<usize>) -> Vec<String> {
        let mut ids: Vec<String> = Vec::new();
        for run in &self.runs {
            if run.span.start < span.end
                && run.span.end > span.start
                && !ids.iter().any(|id| id == &run.document_id)
            {
                ids.push(run.document_id.clone());
            }
        }
        ids
    }
}
