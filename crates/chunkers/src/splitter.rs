use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

/// Separators tried in order, coarsest first. Text that cannot be broken on
/// any of them falls back to grapheme windows.
const SEPARATORS: [&str; 3] = ["\n\n", "\n", " "];

/// Size/overlap policy for one source kind, in bytes of UTF-8 text.
/// Policy values are configuration constants, never computed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SplitPolicy {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl SplitPolicy {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
        }
    }
}

/// Recursive character splitter: breaks text on paragraph, then line, then
/// word boundaries, greedily packing pieces up to the policy's chunk size.
#[derive(Debug, Clone, Copy)]
pub struct TextSplitter {
    policy: SplitPolicy,
}

impl TextSplitter {
    pub fn new(policy: SplitPolicy) -> Self {
        Self { policy }
    }

    pub fn split(&self, text: &str) -> Vec<String> {
        self.split_level(text.trim(), &SEPARATORS)
            .into_iter()
            .map(|piece| piece.trim().to_string())
            .filter(|piece| !piece.is_empty())
            .collect()
    }

    fn split_level(&self, text: &str, separators: &[&str]) -> Vec<String> {
        if text.len() <= self.policy.chunk_size {
            return vec![text.to_string()];
        }

        let Some((separator, finer)) = separators.split_first() else {
            return self.split_graphemes(text);
        };
        if !text.contains(separator) {
            return self.split_level(text, finer);
        }

        let mut chunks = Vec::new();
        let mut buffer = String::new();

        for part in text.split(separator) {
            let extra = if buffer.is_empty() {
                part.len()
            } else {
                separator.len() + part.len()
            };

            if !buffer.is_empty() && buffer.len() + extra > self.policy.chunk_size {
                self.flush(&buffer, finer, &mut chunks);
                buffer = self.overlap_tail(&buffer);
            }

            if !buffer.is_empty() {
                buffer.push_str(separator);
            }
            buffer.push_str(part);
        }

        if !buffer.is_empty() {
            self.flush(&buffer, finer, &mut chunks);
        }

        chunks
    }

    /// Emit a packed buffer, re-splitting it at a finer level when a single
    /// piece overshot the chunk size.
    fn flush(&self, buffer: &str, finer: &[&str], chunks: &mut Vec<String>) {
        if buffer.len() > self.policy.chunk_size {
            chunks.extend(self.split_level(buffer, finer));
        } else {
            chunks.push(buffer.to_string());
        }
    }

    /// Grapheme windows for text with no usable separators.
    fn split_graphemes(&self, text: &str) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current = String::new();

        for grapheme in text.graphemes(true) {
            if !current.is_empty() && current.len() + grapheme.len() > self.policy.chunk_size {
                let tail = self.overlap_tail(&current);
                chunks.push(current);
                current = tail;
            }
            current.push_str(grapheme);
        }
        if !current.is_empty() {
            chunks.push(current);
        }

        chunks
    }

    /// Trailing slice of at most `chunk_overlap` bytes, cut on a grapheme
    /// boundary, carried into the next chunk.
    fn overlap_tail(&self, text: &str) -> String {
        let overlap = self.policy.chunk_overlap;
        if overlap == 0 {
            return String::new();
        }
        if text.len() <= overlap {
            return text.to_string();
        }

        let mut boundary = text.len();
        for (idx, _) in text.grapheme_indices(true).rev() {
            if text.len() - idx > overlap {
                break;
            }
            boundary = idx;
        }
        text[boundary..].to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_a_single_chunk() {
        let splitter = TextSplitter::new(SplitPolicy::new(500, 0));
        assert_eq!(splitter.split("Just one chunk."), vec!["Just one chunk."]);
    }

    #[test]
    fn small_policy_splits_on_words() {
        let splitter = TextSplitter::new(SplitPolicy::new(10, 0));
        assert_eq!(
            splitter.split("Alpha. Beta. Gamma."),
            vec!["Alpha.", "Beta.", "Gamma."]
        );
    }

    #[test]
    fn paragraph_boundaries_are_preferred() {
        let splitter = TextSplitter::new(SplitPolicy::new(12, 0));
        assert_eq!(
            splitter.split("para one\n\npara two"),
            vec!["para one", "para two"]
        );
    }

    #[test]
    fn chunks_never_exceed_the_policy_size() {
        let splitter = TextSplitter::new(SplitPolicy::new(8, 0));
        for chunk in splitter.split("abcdefghijklmnopqrstuvwxyz0123456789") {
            assert!(chunk.len() <= 8, "oversized chunk: {chunk:?}");
        }
    }

    #[test]
    fn overlap_carries_the_tail_of_the_previous_chunk() {
        let splitter = TextSplitter::new(SplitPolicy::new(10, 4));
        let chunks = splitter.split("aaaa bbbb cccc");
        assert_eq!(chunks, vec!["aaaa bbbb", "bbbb cccc"]);
    }

    #[test]
    fn empty_input_yields_no_chunks() {
        let splitter = TextSplitter::new(SplitPolicy::new(10, 0));
        assert!(splitter.split("   ").is_empty());
    }
}
