//! Implementation of the `amplicons` sub command.

use std::io::Write;

use indexmap::IndexMap;

use crate::common;
use crate::err::Error;
use crate::query::{parse_selections, CountOp, GenotypeType, GtFilter, Query, Selection, Table};
use crate::samples::list_samples;
use crate::store::{sqlite::SqliteStore, VariantStore};

/// Genotype filter for variants of `sample` that count towards amplicons.
///
/// These are heterozygous calls shared by more than one sample, or
/// homozygous alternative calls.
pub fn amplicon_gt_filter(sample: &str) -> GtFilter {
    GtFilter::Or(vec![
        GtFilter::And(vec![
            GtFilter::count(GenotypeType::Het, CountOp::Gt, 1),
            GtFilter::sample(sample, GenotypeType::Het),
        ]),
        GtFilter::sample(sample, GenotypeType::HomAlt),
    ])
}

/// Number of variants per amplicon for one sample, in first-seen order.
pub fn count_amplicons(
    store: &dyn VariantStore,
    sample: &str,
) -> Result<IndexMap<String, usize>, Error> {
    let mut selections = parse_selections("gene, amplicon")?;
    selections.push(Selection::Genotype(sample.to_string()));
    let query =
        Query::new(Table::Variants, selections).with_gt_filter(amplicon_gt_filter(sample));
    tracing::debug!("{}", &query);

    let mut counts = IndexMap::new();
    for row in store.run(&query)? {
        let amplicon = row
            .get("amplicon")
            .map(|value| value.to_string())
            .unwrap_or_default();
        // overlapping amplicons are comma-separated
        for name in amplicon.split(',') {
            *counts.entry(name.to_string()).or_insert(0) += 1;
        }
    }
    Ok(counts)
}

/// Write `<sample> <amplicon> <count>` for each amplicon carrying more than
/// one variant, or `<sample> None 0` if there is none.
pub fn write_amplicons(
    store: &dyn VariantStore,
    out: &mut dyn Write,
) -> Result<(), anyhow::Error> {
    for sample in list_samples(store)? {
        let counts = count_amplicons(store, &sample)?;
        let mut any = false;
        for (amplicon, count) in counts.iter().filter(|(_, count)| **count > 1) {
            writeln!(out, "{} {} {}", sample, amplicon, count)?;
            any = true;
        }
        if !any {
            writeln!(out, "{} None 0", sample)?;
        }
    }
    Ok(())
}

/// Command line arguments for `amplicons` sub command.
#[derive(Debug, clap::Parser)]
#[command(author, version, about = "Find amplicons with multiple variants per sample", long_about = None)]
pub struct Args {
    /// Path to the GEMINI database.
    pub path_db: String,
}

/// Main entry point for `amplicons` sub command.
pub fn run(args_common: &common::Args, args: &Args) -> Result<(), anyhow::Error> {
    let before_anything = std::time::Instant::now();
    tracing::info!("args_common = {:?}", &args_common);
    tracing::info!("args = {:?}", &args);

    let store = SqliteStore::open(&args.path_db)?;
    write_amplicons(&store, &mut std::io::stdout().lock())?;

    tracing::info!(
        "All of `amplicons` completed in {:?}",
        before_anything.elapsed()
    );
    Ok(())
}
