//! Implementation of the `query_sample` sub command.

use std::io::Write;

use super::{query_sample, DEFAULT_SAMPLE_COLUMNS};
use crate::common;
use crate::output::{DefaultRowFormat, RowFormat};
use crate::query::parse_selections;
use crate::store::{sqlite::SqliteStore, VariantStore};

/// Command line arguments for `query_sample` sub command.
#[derive(Debug, clap::Parser)]
#[command(author, version, about = "Query heterozygous variants of one sample", long_about = None)]
pub struct Args {
    /// Path to the GEMINI database.
    pub path_db: String,
    /// Name of the sample.
    #[arg(long)]
    pub sample: String,
    /// Comma-separated columns to print before the sample genotype.
    #[arg(long, default_value = DEFAULT_SAMPLE_COLUMNS)]
    pub cols: String,
    /// Minimal number of heterozygous samples.
    #[arg(long = "gt_count", default_value_t = 0)]
    pub gt_count: usize,
}

/// Write the heterozygous variants of the sample, one row per line.
pub fn write_sample_variants(
    store: &dyn VariantStore,
    args: &Args,
    out: &mut dyn Write,
) -> Result<usize, anyhow::Error> {
    let columns = parse_selections(&args.cols)?;
    let rows = query_sample(store, &args.sample, &columns, args.gt_count, None)?;
    let format = DefaultRowFormat;
    for row in &rows {
        writeln!(out, "{}", format.format(row)?)?;
    }
    Ok(rows.len())
}

/// Main entry point for `query_sample` sub command.
pub fn run(args_common: &common::Args, args: &Args) -> Result<(), anyhow::Error> {
    let before_anything = std::time::Instant::now();
    tracing::info!("args_common = {:?}", &args_common);
    tracing::info!("args = {:?}", &args);

    let store = SqliteStore::open(&args.path_db)?;
    let count = write_sample_variants(&store, args, &mut std::io::stdout().lock())?;
    tracing::info!("... wrote {} variants of {}", count, &args.sample);

    tracing::info!(
        "All of `query_sample` completed in {:?}",
        before_anything.elapsed()
    );
    Ok(())
}
