use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());
static HTML_SKIPPED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<(script|style)[^>]*>.*?</(script|style)>").unwrap());

/// Outcome of pulling plain text out of an uploaded file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Extraction {
    pub success: bool,
    pub text: String,
    pub error: Option<String>,
    pub page_count: usize,
    pub word_count: usize,
}

impl Extraction {
    pub fn ok(text: String, page_count: usize) -> Self {
        let word_count = text.split_whitespace().count();
        Self {
            success: true,
            text,
            error: None,
            page_count,
            word_count,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Default::default()
        }
    }
}

/// Turns a stored upload into plain text.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    fn is_supported(&self, file_path: &Path) -> bool;
    async fn extract(&self, file_path: &Path) -> Extraction;
}

/// Extractor for text-like formats: plain text, markdown, CSV and HTML.
#[derive(Debug, Default, Clone)]
pub struct PlainTextExtractor;

impl PlainTextExtractor {
    pub const SUPPORTED_EXTENSIONS: &'static [&'static str] =
        &["txt", "md", "markdown", "csv", "html", "htm"];

    pub fn new() -> Self {
        Self
    }

    fn extension(file_path: &Path) -> Option<String> {
        file_path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
    }
}

#[async_trait]
impl TextExtractor for PlainTextExtractor {
    fn is_supported(&self, file_path: &Path) -> bool {
        Self::extension(file_path)
            .map(|ext| Self::SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
            .unwrap_or(false)
    }

    async fn extract(&self, file_path: &Path) -> Extraction {
        let Some(ext) = Self::extension(file_path).filter(|_| self.is_supported(file_path)) else {
            return Extraction::failed(format!(
                "unsupported file format: {}",
                file_path.display()
            ));
        };

        let bytes = match tokio::fs::read(file_path).await {
            Ok(bytes) => bytes,
            Err(e) => return Extraction::failed(format!("{}: {}", file_path.display(), e)),
        };
        let raw = String::from_utf8_lossy(&bytes);

        let text = match ext.as_str() {
            "html" | "htm" => strip_html(&raw),
            "csv" => raw
                .lines()
                .map(|row| row.split(',').map(str::trim).collect::<Vec<_>>().join(" "))
                .collect::<Vec<_>>()
                .join("\n"),
            _ => raw.into_owned(),
        };

        let text = clean_text(&text);
        if text.is_empty() {
            return Extraction::failed(format!("no text found in {}", file_path.display()));
        }

        Extraction::ok(text, 1)
    }
}

/// Collapse whitespace runs to single spaces and trim.
pub fn clean_text(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}

fn strip_html(html: &str) -> String {
    let without_code = HTML_SKIPPED.replace_all(html, " ");
    let without_tags = HTML_TAG.replace_all(&without_code, " ");
    without_tags
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_is_supported() {
        let extractor = PlainTextExtractor::new();
        assert!(extractor.is_supported(Path::new("notes/Week1.TXT")));
        assert!(extractor.is_supported(Path::new("syllabus.md")));
        assert!(!extractor.is_supported(Path::new("slides.pptx")));
        assert!(!extractor.is_supported(Path::new("README")));
    }

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text("  a \n\n b\t\tc  "), "a b c");
    }

    #[tokio::test]
    async fn test_extract_text_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lecture.txt");
        fs::write(&path, "Backpropagation computes\n\ngradients efficiently.").unwrap();

        let result = PlainTextExtractor::new().extract(&path).await;
        assert!(result.success);
        assert_eq!(result.text, "Backpropagation computes gradients efficiently.");
        assert_eq!(result.word_count, 4);
        assert_eq!(result.page_count, 1);
    }

    #[tokio::test]
    async fn test_extract_html_strips_markup() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("page.html");
        fs::write(
            &path,
            "<html><style>p { color: red; }</style><body><h1>Title</h1><p>Fish &amp; chips</p></body></html>",
        )
        .unwrap();

        let result = PlainTextExtractor::new().extract(&path).await;
        assert_eq!(result.text, "Title Fish & chips");
    }

    #[tokio::test]
    async fn test_extract_csv_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("grades.csv");
        fs::write(&path, "name,score\nkim,90\n").unwrap();

        let result = PlainTextExtractor::new().extract(&path).await;
        assert_eq!(result.text, "name score kim 90");
    }

    #[tokio::test]
    async fn test_missing_or_empty_file_fails() {
        let dir = TempDir::new().unwrap();
        let extractor = PlainTextExtractor::new();

        let missing = extractor.extract(&dir.path().join("nope.txt")).await;
        assert!(!missing.success);
        assert!(missing.error.is_some());

        let empty_path = dir.path().join("empty.md");
        fs::write(&empty_path, "   \n").unwrap();
        let empty = extractor.extract(&empty_path).await;
        assert!(!empty.success);
    }

    #[tokio::test]
    async fn test_unsupported_format_fails() {
        let result = PlainTextExtractor::new().extract(Path::new("deck.pptx")).await;
        assert!(!result.success);
        assert!(result.error.unwrap().contains("unsupported"));
    }
}
