use serde::{Deserialize, Serialize};

use crate::types::DocumentRecord;

/// Characters of context kept on each side of the first match.
pub const PREVIEW_WINDOW: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordHit {
    pub document_id: String,
    /// Non-overlapping, case-insensitive occurrences of the query.
    pub keyword_count: usize,
    pub preview: String,
}

/// Case-insensitive substring matcher over whole document texts.
pub struct KeywordMatcher {
    window: usize,
}

impl Default for KeywordMatcher {
    fn default() -> Self {
        Self::new(PREVIEW_WINDOW)
    }
}

impl KeywordMatcher {
    pub fn new(window: usize) -> Self {
        Self { window }
    }

    /// Rank documents containing `query` by occurrence count, highest first.
    /// Equal counts keep the input document order. The query is matched as
    /// given; callers trim it.
    pub fn search(&self, documents: &[DocumentRecord], query: &str, top_k: usize) -> Vec<KeywordHit> {
        let needle = fold(query);
        if needle.text.is_empty() {
            return Vec::new();
        }
        let needle_chars = query.chars().count();

        let mut hits: Vec<KeywordHit> = documents
            .iter()
            .filter_map(|doc| {
                let text = doc.content()?;
                let haystack = fold(text);
                let first = haystack.text.find(&needle.text)?;

                let first_char = haystack.text[..first].chars().count();
                let start = haystack.origin[first_char];

                Some(KeywordHit {
                    document_id: doc.id.clone(),
                    keyword_count: haystack.text.matches(needle.text.as_str()).count(),
                    preview: self.preview(text, start, needle_chars),
                })
            })
            .collect();

        hits.sort_by(|a, b| b.keyword_count.cmp(&a.keyword_count));
        hits.truncate(top_k);
        hits
    }

    /// Slice of `text` from `window` characters before the match at char
    /// offset `start` to `window` characters after its end, clamped.
    pub fn preview(&self, text: &str, start: usize, match_chars: usize) -> String {
        let from = start.saturating_sub(self.window);
        let to = start + match_chars + self.window;
        text.chars().skip(from).take(to - from).collect()
    }
}

/// Lower-cased text plus, for every lower-cased char, the index of the
/// original char it came from.
struct Folded {
    text: String,
    origin: Vec<usize>,
}

fn fold(text: &str) -> Folded {
    let mut folded = String::with_capacity(text.len());
    let mut origin = Vec::with_capacity(text.len());
    for (index, ch) in text.chars().enumerate() {
        for lower in ch.to_lowercase() {
            folded.push(lower);
            origin.push(index);
        }
    }
    Folded {
        text: folded,
        origin,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: &str, text: Option<&str>) -> DocumentRecord {
        let mut doc = DocumentRecord::new("c1", &format!("{}.txt", id), "tester");
        doc.id = id.to_string();
        doc.text = text.map(str::to_string);
        doc
    }

    #[test]
    fn test_counts_case_insensitively() {
        let docs = vec![doc("a", Some("Rust is fast. RUST is safe. rust!"))];
        let hits = KeywordMatcher::default().search(&docs, "rust", 5);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].keyword_count, 3);
    }

    #[test]
    fn test_non_overlapping_count() {
        let docs = vec![doc("a", Some("aaaa")), doc("b", Some("aaa"))];
        let hits = KeywordMatcher::default().search(&docs, "aa", 5);
        assert_eq!(hits[0].document_id, "a");
        assert_eq!(hits[0].keyword_count, 2);
        assert_eq!(hits[1].keyword_count, 1);
    }

    #[test]
    fn test_orders_by_count_with_stable_ties() {
        let docs = vec![
            doc("one", Some("graph")),
            doc("three", Some("graph graph graph")),
            doc("one-again", Some("a graph")),
            doc("none", Some("tree")),
        ];
        let hits = KeywordMatcher::default().search(&docs, "graph", 10);
        let ids: Vec<&str> = hits.iter().map(|h| h.document_id.as_str()).collect();
        assert_eq!(ids, vec!["three", "one", "one-again"]);
    }

    #[test]
    fn test_top_k_truncates() {
        let docs = vec![doc("a", Some("x")), doc("b", Some("xx")), doc("c", Some("xxx"))];
        let hits = KeywordMatcher::default().search(&docs, "x", 2);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].document_id, "c");
    }

    #[test]
    fn test_skips_documents_without_text() {
        let docs = vec![doc("empty", None), doc("blank", Some("   ")), doc("hit", Some("needle"))];
        let hits = KeywordMatcher::default().search(&docs, "needle", 5);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].document_id, "hit");
    }

    #[test]
    fn test_no_match_or_blank_query_is_empty() {
        let docs = vec![doc("a", Some("some text"))];
        let matcher = KeywordMatcher::default();
        assert!(matcher.search(&docs, "absent", 5).is_empty());
        assert!(matcher.search(&docs, "  ", 5).is_empty());
    }

    #[test]
    fn test_preview_starts_window_before_match() {
        let pad = "p".repeat(150);
        let tail = "t".repeat(150);
        let text = format!("{}KEYWORD{}", pad, tail);
        let docs = vec![doc("a", Some(&text))];

        let hits = KeywordMatcher::default().search(&docs, "keyword", 5);
        let preview = &hits[0].preview;
        assert_eq!(preview.chars().count(), 100 + 7 + 100);
        assert_eq!(&preview[..100], &"p".repeat(100));
        assert_eq!(&preview[100..107], "KEYWORD");
        assert!(preview.ends_with(&"t".repeat(100)));
    }

    #[test]
    fn test_preview_spans_untrimmed_query() {
        let text = format!("{}a keyword here{}", "p".repeat(150), "t".repeat(150));
        let docs = vec![doc("a", Some(&text))];

        let hits = KeywordMatcher::new(10).search(&docs, " keyword ", 5);
        assert_eq!(hits.len(), 1);
        let preview = &hits[0].preview;
        assert_eq!(preview.chars().count(), 10 + 9 + 10);
        assert_eq!(preview, &format!("{}a keyword here{}", "p".repeat(9), "t".repeat(6)));
    }

    #[test]
    fn test_preview_length_counts_original_query_chars() {
        // 'İ' folds to two chars; the window still ends one char past it.
        let docs = vec![doc("a", Some("xxİyy"))];
        let hits = KeywordMatcher::new(1).search(&docs, "İ", 5);
        assert_eq!(hits[0].preview, "xİy");
    }

    #[test]
    fn test_preview_clamped_at_text_start() {
        let text = format!("short KEYWORD {}", "z".repeat(300));
        let docs = vec![doc("a", Some(&text))];

        let hits = KeywordMatcher::default().search(&docs, "keyword", 5);
        assert!(hits[0].preview.starts_with("short KEYWORD"));
        assert_eq!(hits[0].preview.chars().count(), 6 + 7 + 100);
    }

    #[test]
    fn test_preview_uses_original_char_positions() {
        // 'İ' lower-cases to two chars, which must not shift the window.
        let text = format!("İİİ{}Lernen", "x".repeat(5));
        let docs = vec![doc("a", Some(&text))];

        let hits = KeywordMatcher::new(3).search(&docs, "lernen", 5);
        assert_eq!(hits[0].preview, "xxxLernen");
    }
}
