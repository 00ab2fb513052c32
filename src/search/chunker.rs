use crate::config::ChunkingConfig;
use crate::types::Chunk;

/// Sentence boundary signal: a period followed by a space.
pub const SENTENCE_DELIMITER: &str = ". ";
const DELIMITER_CHARS: usize = 2;

/// Greedy sentence-aligned splitter.
///
/// Sentences are packed into a buffer until the next one would push it past
/// `max_chars`; a single sentence longer than `max_chars` becomes its own
/// oversized chunk rather than being cut. Chunks of `min_chars` characters or
/// fewer are dropped and the survivors are numbered from 0.
pub struct Chunker {
    max_chars: usize,
    min_chars: usize,
    overlap_chars: usize,
}

impl Default for Chunker {
    fn default() -> Self {
        Self::new(1000, 50)
    }
}

impl Chunker {
    pub fn new(max_chars: usize, min_chars: usize) -> Self {
        Self {
            max_chars,
            min_chars,
            overlap_chars: 0,
        }
    }

    pub fn from_config(config: &ChunkingConfig) -> Self {
        Self::new(config.chunk_size, config.min_chunk_chars).with_overlap(config.chunk_overlap)
    }

    /// Carry trailing sentences totalling at most `overlap_chars` into the next chunk.
    pub fn with_overlap(mut self, overlap_chars: usize) -> Self {
        self.overlap_chars = overlap_chars;
        self
    }

    pub fn split(&self, text: &str, document_id: &str) -> Vec<Chunk> {
        let text = text.trim();
        if text.is_empty() {
            return Vec::new();
        }

        let mut pieces: Vec<String> = Vec::new();
        let mut current: Vec<&str> = Vec::new();
        let mut current_len = 0;

        let sentences = text
            .split(SENTENCE_DELIMITER)
            .map(str::trim)
            .filter(|s| !s.is_empty());

        for sentence in sentences {
            let sentence_len = sentence.chars().count();

            if current.is_empty() || current_len + DELIMITER_CHARS + sentence_len <= self.max_chars
            {
                current_len = appended_len(current_len, current.is_empty(), sentence_len);
                current.push(sentence);
                continue;
            }

            pieces.push(current.join(SENTENCE_DELIMITER));

            current = self.overlap_tail(&current);
            current_len = joined_len(&current);
            if !current.is_empty() && current_len + DELIMITER_CHARS + sentence_len > self.max_chars
            {
                current.clear();
                current_len = 0;
            }

            current_len = appended_len(current_len, current.is_empty(), sentence_len);
            current.push(sentence);
        }

        if !current.is_empty() {
            pieces.push(current.join(SENTENCE_DELIMITER));
        }

        pieces
            .into_iter()
            .filter(|piece| piece.chars().count() > self.min_chars)
            .enumerate()
            .map(|(chunk_index, content)| Chunk {
                document_id: document_id.to_string(),
                chunk_index,
                size: content.chars().count(),
                content,
                vector_position: None,
            })
            .collect()
    }

    fn overlap_tail<'a>(&self, sentences: &[&'a str]) -> Vec<&'a str> {
        if self.overlap_chars == 0 || sentences.len() < 2 {
            return Vec::new();
        }

        let mut tail: Vec<&str> = Vec::new();
        let mut len = 0;
        // Never carry the whole previous chunk.
        for sentence in sentences[1..].iter().rev() {
            let next = appended_len(len, tail.is_empty(), sentence.chars().count());
            if next > self.overlap_chars {
                break;
            }
            len = next;
            tail.push(*sentence);
        }
        tail.reverse();
        tail
    }
}

fn appended_len(current_len: usize, is_empty: bool, sentence_len: usize) -> usize {
    if is_empty {
        sentence_len
    } else {
        current_len + DELIMITER_CHARS + sentence_len
    }
}

fn joined_len(sentences: &[&str]) -> usize {
    sentences
        .iter()
        .fold((0, true), |(len, empty), s| {
            (appended_len(len, empty, s.chars().count()), false)
        })
        .0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sentence(word: &str, repeat: usize) -> String {
        vec![word; repeat].join(" ")
    }

    #[test]
    fn test_empty_and_blank_input() {
        let chunker = Chunker::default();
        assert!(chunker.split("", "doc").is_empty());
        assert!(chunker.split("   \n\t ", "doc").is_empty());
    }

    #[test]
    fn test_short_text_dropped() {
        let chunker = Chunker::default();
        assert!(chunker.split("Too short to index.", "doc").is_empty());
    }

    #[test]
    fn test_packs_sentences_up_to_limit() {
        let chunker = Chunker::new(120, 10);
        let a = sentence("alpha", 10); // 59 chars
        let b = sentence("bravo", 10);
        let c = sentence("charl", 10);
        let text = format!("{}. {}. {}", a, b, c);

        let chunks = chunker.split(&text, "doc-1");
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].content, format!("{}. {}", a, b));
        assert_eq!(chunks[1].content, c);
        assert!(chunks.iter().all(|c| c.size <= 120));
        assert!(chunks.iter().all(|c| c.document_id == "doc-1"));
    }

    #[test]
    fn test_oversized_sentence_kept_whole() {
        let chunker = Chunker::new(50, 10);
        let long = sentence("lengthy", 20);
        let text = format!("Opening sentence here. {}. Closing sentence is here", long);

        let chunks = chunker.split(&text, "doc");
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[1].content, long);
        assert!(chunks[1].size > 50);
    }

    #[test]
    fn test_indices_contiguous_after_filter() {
        let chunker = Chunker::new(70, 50);
        let long_a = sentence("first", 11);
        let long_b = sentence("third", 11);
        let text = format!("{}. tiny bit. {}", long_a, long_b);

        let chunks = chunker.split(&text, "doc");
        let indices: Vec<usize> = chunks.iter().map(|c| c.chunk_index).collect();
        assert_eq!(indices, vec![0, 1]);
        assert!(chunks.iter().all(|c| c.size > 50));
    }

    #[test]
    fn test_rejoining_reconstructs_input() {
        let chunker = Chunker::new(200, 50);
        let text = (0..12)
            .map(|i| format!("Sentence number {} talks about gradient descent", i))
            .collect::<Vec<_>>()
            .join(". ")
            + ".";

        let chunks = chunker.split(&text, "doc");
        assert!(chunks.len() > 1);
        let rebuilt = chunks
            .iter()
            .map(|c| c.content.as_str())
            .collect::<Vec<_>>()
            .join(SENTENCE_DELIMITER);
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn test_overlap_carries_trailing_sentence() {
        let chunker = Chunker::new(100, 10).with_overlap(40);
        let text = "First sentence is fairly plain. Second one mentions vectors. \
                    Third continues the thought. Fourth wraps things up nicely";

        let chunks = chunker.split(text, "doc");
        assert!(chunks.len() >= 2);
        assert!(chunks[1].content.starts_with("Third continues the thought"));
        assert!(chunks[0].content.ends_with("Third continues the thought"));
    }

    #[test]
    fn test_size_counts_characters() {
        let chunker = Chunker::new(1000, 5);
        let chunks = chunker.split("머신러닝은 데이터에서 패턴을 학습합니다", "doc");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].size, chunks[0].content.chars().count());
    }
}
