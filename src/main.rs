use anyhow::Result;
use clap::Parser;

use coursedex::cli::{self, Args, Command, SearchArgs};
use coursedex::{logging, Config};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::load(&args.config)?;
    logging::init(&config.logging, args.verbose);

    match args.command {
        Command::Add {
            collection,
            path,
            uploader,
        } => {
            cli::run_add(&config, &collection, &path, &uploader).await?;
        }
        Command::Index { collection, force } => {
            cli::run_index(&config, &collection, force).await?;
        }
        Command::Search {
            collection,
            query,
            mode,
            top_k,
            min_similarity,
            user,
            json,
        } => {
            cli::run_search(
                &config,
                SearchArgs {
                    collection: &collection,
                    query: &query,
                    mode: &mode,
                    top_k,
                    min_similarity,
                    user: user.as_deref(),
                    json,
                },
            )
            .await?;
        }
        Command::Stats { collection, json } => {
            cli::run_stats(&config, &collection, json).await?;
        }
        Command::History { user, limit } => {
            cli::run_history(&config, &user, limit).await?;
        }
        Command::Suggest {
            collection,
            query,
            limit,
        } => {
            cli::run_suggest(&config, &collection, &query, limit).await?;
        }
        Command::Clear { collection } => {
            cli::run_clear(&config, &collection).await?;
        }
    }

    Ok(())
}
