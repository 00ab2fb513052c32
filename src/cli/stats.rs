use anyhow::Result;
use console::{style, Emoji};

use crate::config::Config;
use crate::types::CollectionStats;

use super::open_engine;

static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "");

pub async fn run_stats(config: &Config, collection: &str, json: bool) -> Result<CollectionStats> {
    let engine = open_engine(config, false).await?;
    let stats = engine.collection_stats(collection).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(stats);
    }

    let index = &stats.vector_stats;
    println!("\n{}Collection: {}\n", INFO, style(collection).yellow().bold());
    println!("  Documents:       {}", style(stats.total_documents).green());
    println!(
        "  Processed:       {} ({:.1}%)",
        stats.processed_documents, stats.processing_rate
    );
    println!(
        "  Vectorized:      {} ({:.1}%)",
        stats.vectorized_documents, stats.vectorization_rate
    );
    println!("  Vectors:         {}", style(index.vector_count).cyan());
    if index.vector_count > 0 {
        println!("  Model:           {} ({} dims)", index.embedding_model, index.dimension);
        println!(
            "  Index size:      {} KB",
            style(index.storage_size() / 1024).yellow()
        );
    }
    if let Some(updated) = index.updated_at {
        println!(
            "  Last updated:    {}",
            style(updated.format("%Y-%m-%d %H:%M:%S")).dim()
        );
    }

    Ok(stats)
}
