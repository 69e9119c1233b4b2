//! Scan command: the column keys of every table export in a directory.

use std::io::{self, Write};

use anyhow::Result;
use tracing::info;

use crate::{
    ScanCommand,
    batch::run_batch,
    discovery::{DiscoveryOptions, discover_tables, ensure_directory},
    extraction::TableDescriptor,
    output::{render_json, render_text},
};

pub async fn run(args: ScanCommand) -> Result<()> {
    let tables = scan(&args).await?;

    let mut out = io::stdout();
    if args.read.format.resolves_to_json() {
        render_json(&tables, &mut out)?;
    } else {
        render_text(&tables, &mut out)?;
    }
    out.flush()?;
    Ok(())
}

/// Discovers the tables in `args.dir` and extracts all of their keys.
pub async fn scan(args: &ScanCommand) -> Result<Vec<TableDescriptor>> {
    ensure_directory(&args.dir).await?;
    let discovery = DiscoveryOptions::with_pattern(&args.pattern)?;
    let discovered = discover_tables(&args.dir, &discovery).await?;
    info!(dir = %args.dir, tables = discovered.len(), "scanning tables");

    let items = discovered
        .into_iter()
        .map(|table| table.into_batch_item(args.read.chunk_size))
        .collect();

    Ok(run_batch(items, &args.batch_options()).await?)
}
