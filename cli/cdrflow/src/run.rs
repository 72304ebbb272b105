//! Main execution logic for the cdrflow CLI.

use anyhow::{Context, Result};
use cdrflow_pipeline::{date_prefixes, RunSummary};
use cdrflow_reader::load_cell_set;
use cdrflow_store::LocalStore;
use cdrflow_types::RunConfig;
use std::sync::Arc;
use tracing::info;

use crate::args::Cli;

/// Execute one extraction run with the provided arguments.
pub fn execute(args: Cli) -> Result<RunSummary> {
    let mut config = RunConfig::new(args.date)
        .with_workers(args.workers)
        .with_writers(args.writers)
        .with_section_size(args.section_size)
        .with_spread(args.spread)
        .with_transfer_capacity(args.capacity)
        .with_foreigners_only(args.foreigners)
        .with_epoch_time(args.epoch)
        .with_source_prefixes(date_prefixes(args.date, &args.cdr_types))
        .with_output_root(&args.output_root);

    if let Some(subdir) = args.output_subdir {
        config = config.with_output_subdir(subdir);
    }

    if let Some(ref region_file) = args.region_file {
        let bytes = std::fs::read(region_file)
            .with_context(|| format!("reading region file {}", region_file.display()))?;
        let cells = load_cell_set(&bytes, &region_file.to_string_lossy())?;
        info!(cells = cells.len(), "Restricting output to region cells");
        config = config.with_valid_cells(cells);
    }

    let source = LocalStore::new(&args.source);
    let dest = LocalStore::new(&args.dest);
    let summary = cdrflow_pipeline::run(config, Arc::new(source), Arc::new(dest))?;
    Ok(summary)
}
