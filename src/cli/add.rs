use anyhow::{bail, Context, Result};
use console::{style, Emoji};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::catalog::DocumentStore;
use crate::config::Config;
use crate::types::DocumentRecord;

use super::open_catalog;

static UPLOAD: Emoji<'_, '_> = Emoji("📥 ", "");
static FILE: Emoji<'_, '_> = Emoji("📄 ", "");

/// Register `path` (a file, or every regular file below a directory) as
/// documents of `collection`. Returns the number of documents added.
pub async fn run_add(config: &Config, collection: &str, path: &Path, uploader: &str) -> Result<usize> {
    if !path.exists() {
        bail!("Path not found: {}", path.display());
    }

    let files = collect_files(path)?;
    if files.is_empty() {
        println!("No files found under {}", style(path.display()).yellow());
        return Ok(0);
    }

    let catalog = open_catalog(config)?;
    println!(
        "\n{}Adding {} file(s) to {}\n",
        UPLOAD,
        style(files.len()).cyan(),
        style(collection).yellow().bold()
    );

    for file in &files {
        let absolute = file
            .canonicalize()
            .with_context(|| format!("Failed to resolve {}", file.display()))?;
        let doc = DocumentRecord::new(collection, &absolute.to_string_lossy(), uploader);
        println!("  {}{} {}", FILE, style(&doc.filename).green(), style(&doc.id).dim());
        catalog.add_document(doc).await?;
    }

    println!(
        "\nRun `coursedex index {}` to make them searchable.",
        collection
    );
    Ok(files.len())
}

fn collect_files(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(path)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name()))
    {
        let entry = entry.with_context(|| format!("Failed to walk {}", path.display()))?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}
