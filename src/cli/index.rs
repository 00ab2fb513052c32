use anyhow::{bail, Result};
use console::{style, Emoji};
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::Config;
use crate::types::IndexReport;

use super::open_engine;

static INDEXING: Emoji<'_, '_> = Emoji("📊 ", "");
static SUCCESS: Emoji<'_, '_> = Emoji("✅ ", "");
static ERROR: Emoji<'_, '_> = Emoji("❌ ", "");
static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "");

pub async fn run_index(config: &Config, collection: &str, force: bool) -> Result<IndexReport> {
    let engine = open_engine(config, true).await?;

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    let verb = if force { "Rebuilding" } else { "Indexing" };
    pb.set_message(format!("{}{} {}...", INDEXING, verb, collection));
    pb.enable_steady_tick(std::time::Duration::from_millis(100));

    let report = engine.index_collection(collection, force).await;

    pb.finish_and_clear();

    if !report.success {
        if report.total_count == 0 && report.error_count == 0 {
            println!("{}{}", INFO, report.message);
            return Ok(report);
        }
        bail!("{}", report.message);
    }

    println!("\n{}Indexing complete!\n", SUCCESS);
    println!(
        "  Documents processed: {} of {}",
        style(report.processed_count).green(),
        report.total_count
    );
    println!("  Chunks indexed:      {}", style(report.chunk_count).cyan());
    if report.error_count > 0 {
        println!(
            "  {}Failed:             {}",
            ERROR,
            style(report.error_count).red()
        );
    }
    println!(
        "  Time:                {}",
        style(format!("{:.2}s", report.processing_time)).dim()
    );

    Ok(report)
}

pub async fn run_clear(config: &Config, collection: &str) -> Result<()> {
    let engine = open_engine(config, false).await?;

    if engine.delete_collection(collection).await? {
        println!("{}Index for {} cleared.", SUCCESS, style(collection).yellow());
    } else {
        println!("{}No index found for {}.", INFO, style(collection).yellow());
    }

    Ok(())
}
