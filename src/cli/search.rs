use anyhow::{bail, Result};
use console::{style, Emoji};

use crate::config::Config;
use crate::types::{SearchHit, SearchMode, SearchReport};

use super::open_engine;

static SEARCH: Emoji<'_, '_> = Emoji("🔍 ", "");
static FILE: Emoji<'_, '_> = Emoji("📄 ", "");

const CONTENT_PREVIEW_CHARS: usize = 200;

pub struct SearchArgs<'a> {
    pub collection: &'a str,
    pub query: &'a str,
    pub mode: &'a str,
    pub top_k: Option<usize>,
    pub min_similarity: Option<f32>,
    pub user: Option<&'a str>,
    pub json: bool,
}

pub async fn run_search(config: &Config, args: SearchArgs<'_>) -> Result<SearchReport> {
    let engine = open_engine(config, true).await?;

    let mut request = engine.request(args.collection, args.query).mode(args.mode);
    if let Some(top_k) = args.top_k {
        request = request.top_k(top_k);
    }
    if let Some(min_similarity) = args.min_similarity {
        request = request.min_similarity(min_similarity);
    }
    if let Some(user) = args.user {
        request = request.actor(user);
    }

    let report = engine.search(&request).await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(report);
    }

    if !report.success {
        bail!(
            "Search failed: {}",
            report.error.as_deref().unwrap_or("unknown error")
        );
    }

    if report.results.is_empty() {
        println!("No results found for: {}", style(&report.query).italic());
        return Ok(report);
    }

    println!(
        "\n{}Found {} {} results for: {}\n",
        SEARCH,
        style(report.result_count).cyan(),
        report.mode,
        style(&report.query).yellow().bold()
    );

    for (i, hit) in report.results.iter().enumerate() {
        print_hit(i + 1, hit);
    }

    Ok(report)
}

fn print_hit(rank: usize, hit: &SearchHit) {
    let location = match hit.chunk_index {
        Some(index) => format!("(chunk {})", index),
        None => String::new(),
    };
    println!(
        "{} {}. {} {}",
        FILE,
        style(rank).dim(),
        style(&hit.filename).green(),
        style(location).dim()
    );

    let score = match hit.mode {
        SearchMode::Keyword => format!("{} matches", hit.keyword_count.unwrap_or(0)),
        _ => format!("{:.3}", hit.score()),
    };
    println!(
        "   Score: {} | Uploaded by {} on {}",
        style(score).cyan(),
        hit.uploader,
        hit.uploaded_at.format("%Y-%m-%d")
    );

    let text = hit.content.trim();
    if !text.is_empty() {
        let truncated = if text.chars().count() > CONTENT_PREVIEW_CHARS {
            let cut: String = text.chars().take(CONTENT_PREVIEW_CHARS).collect();
            format!("{}...", cut)
        } else {
            text.to_string()
        };
        println!("   {}", style(truncated).dim());
    }
    println!();
}

pub async fn run_suggest(config: &Config, collection: &str, query: &str, limit: usize) -> Result<Vec<String>> {
    let engine = open_engine(config, false).await?;
    let words = engine.suggest(collection, query, limit).await;

    if words.is_empty() {
        println!("No suggestions for: {}", style(query).italic());
    }
    for word in &words {
        println!("{}", word);
    }

    Ok(words)
}
