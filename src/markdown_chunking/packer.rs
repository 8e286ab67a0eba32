use std::ops::Range;

use super::separators;
use super::splitter::split_to_fragments;
use super::tokenizer::TokenCounter;
use super::types::TraceSink;

/// A packed chunk before postprocessing, with its span in the stream.
#[derive(Clone, Debug)]
pub(crate) struct RawChunk {
    pub text: String,
    pub tokens: usize,
    pub span: Range<usize>,
}

pub(crate) struct PackOutput {
    pub chunks: Vec<RawChunk>,
    pub fragments: usize,
}

/// Pack the normalized stream into budget-sized chunks, descending the
/// separator ladder wherever a single fragment exceeds the budget.
pub(crate) fn pack_stream(
    stream: &str,
    size: usize,
    counter: &TokenCounter,
    trace: &mut TraceSink,
) -> PackOutput {
    let mut packer = Packer {
        size,
        counter,
        trace,
        chunks: Vec::new(),
        fragments: 0,
    };
    packer.pack(stream, 0, 0);
    PackOutput {
        chunks: packer.chunks,
        fragments: packer.fragments,
    }
}

struct Packer<'a> {
    size: usize,
    counter: &'a TokenCounter,
    trace: &'a mut TraceSink,
    chunks: Vec<RawChunk>,
    fragments: usize,
}

impl Packer<'_> {
    /// `base` is the absolute offset of `text` within the stream; fragment
    /// spans stay stream-relative through every descent.
    fn pack(&mut self, text: &str, base: usize, level: usize) {
        let ladder = separators::ladder();
        let patterns = ladder.get(level).map(|set| set.patterns.as_slice());

        let mut buffer = Buffer::default();
        let mut offset = base;
        for fragment in split_to_fragments(text, patterns) {
            let start = offset;
            offset += fragment.content.len();
            if fragment.content.is_empty() {
                continue;
            }
            self.fragments += 1;
            let tokens = self.counter.count(fragment.content);

            if buffer.tokens + tokens <= self.size {
                buffer.push(fragment.content, tokens, start);
            } else if tokens > self.size {
                // The buffer is not resumed after a descent; sub-chunks are
                // emitted in place.
                buffer.flush_into(&mut self.chunks);
                if level < ladder.len() {
                    let label = if level + 1 == ladder.len() {
                        "char_fallback"
                    } else {
                        "ladder_descend"
                    };
                    tracing::debug!(
                        label,
                        level = level + 1,
                        offset = start,
                        "fragment over budget, splitting deeper"
                    );
                    self.trace.push(label, Some(level + 1), Some(start));
                    self.pack(fragment.content, start, level + 1);
                } else {
                    // A single character can still cost more than the budget;
                    // it becomes its own chunk.
                    tracing::debug!(offset = start, "single character exceeds the budget");
                    self.trace.push("char_overflow", None, Some(start));
                    self.chunks.push(RawChunk {
                        text: fragment.content.to_string(),
                        tokens,
                        span: start..start + fragment.content.len(),
                    });
                }
            } else {
                buffer.flush_into(&mut self.chunks);
                buffer.push(fragment.content, tokens, start);
            }
        }
        buffer.flush_into(&mut self.chunks);
    }
}

#[derive(Default)]
struct Buffer {
    text: String,
    tokens: usize,
    start: usize,
    end: usize,
}

impl Buffer {
    fn push(&mut self, content: &str, tokens: usize, at: usize) {
        if self.text.is_empty() {
            self.start = at;
        }
        self.text.push_str(content);
        self.tokens += tokens;
        self.end = at + content.len();
    }

    fn flush_into(&mut self, chunks: &mut Vec<RawChunk>) {
        if self.text.is_empty() {
            return;
        }
        chunks.push(RawChunk {
            text: std::mem::take(&mut self.text),
            tokens: self.tokens,
            span: self.start..self.end,
        });
        self.tokens = 0;
    }
}
