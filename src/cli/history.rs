use anyhow::Result;
use console::style;

use crate::config::Config;
use crate::types::QueryLogEntry;

use super::open_engine;

pub async fn run_history(config: &Config, user: &str, limit: usize) -> Result<Vec<QueryLogEntry>> {
    let engine = open_engine(config, false).await?;
    let entries = engine.search_history(user, limit).await;

    if entries.is_empty() {
        println!("No searches recorded for {}", style(user).yellow());
        return Ok(entries);
    }

    for entry in &entries {
        println!(
            "{}  {:<8} {:<12} {} {}",
            style(entry.created_at.format("%Y-%m-%d %H:%M")).dim(),
            entry.mode.as_str(),
            entry.collection_id,
            style(&entry.query).bold(),
            style(format!("({} results)", entry.result_count)).dim()
        );
    }

    Ok(entries)
}
