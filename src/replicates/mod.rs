//! Implementation of the `compare_replicates` sub command.
//!
//! Replicate samples are sequenced twice, once in the first batch and once
//! as repeat, and named accordingly.  For each pair, variants seen in either
//! sample are classified by whether both calls agree.

use std::io::Write;

use crate::common;
use crate::err::Error;
use crate::query::{parse_selections, GenotypeType, GtFilter, Query, Selection, Table};
use crate::samples::list_samples;
use crate::store::{sqlite::SqliteStore, Row, Value, VariantStore};

/// Marker in the names of repeated samples.
pub const REPEATS_MARKER: &str = "_Repeats_";
/// Marker in the names of first batch samples.
pub const FIRST_BATCH_MARKER: &str = "_FirstBatch_";

/// Agreement of the genotype calls of one variant in a replicate pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum Concordance {
    /// Identical genotype strings.
    Shared,
    /// Differing calls explainable by cytosine deamination (`C>T`, `G>A`).
    Deamination,
    Unique,
}

impl Concordance {
    pub fn classify(reference: &str, original_gt: &str, repeat_gt: &str) -> Self {
        let either_is = |gt: &str| original_gt == gt || repeat_gt == gt;
        if original_gt == repeat_gt {
            Concordance::Shared
        } else if (reference == "C" && either_is("C/T")) || (reference == "G" && either_is("G/A")) {
            Concordance::Deamination
        } else {
            Concordance::Unique
        }
    }
}

/// Counts per concordance class for one replicate pair.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReplicateCounts {
    pub original: String,
    pub repeat: String,
    pub shared: usize,
    pub deamination: usize,
    pub unique: usize,
}

impl ReplicateCounts {
    fn add(&mut self, concordance: Concordance) {
        match concordance {
            Concordance::Shared => self.shared += 1,
            Concordance::Deamination => self.deamination += 1,
            Concordance::Unique => self.unique += 1,
        }
    }
}

impl std::fmt::Display for ReplicateCounts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.original, self.shared, self.deamination, self.unique
        )
    }
}

/// Pairs of `(original, repeat)` sample names.
///
/// Repeats without first batch counterpart are skipped.
pub fn replicate_pairs(samples: &[String]) -> Vec<(String, String)> {
    samples
        .iter()
        .filter(|sample| sample.contains(REPEATS_MARKER))
        .filter_map(|repeat| {
            let original = repeat.replace(REPEATS_MARKER, FIRST_BATCH_MARKER);
            if samples.contains(&original) {
                Some((original, repeat.clone()))
            } else {
                tracing::debug!("no first batch sample {} for {}", original, repeat);
                None
            }
        })
        .collect()
}

fn text<'a>(row: &'a Row, name: &str) -> Result<&'a str, Error> {
    match row.get(name) {
        Some(Value::Text(s)) => Ok(s),
        Some(Value::Null) => Ok(""),
        _ => Err(Error::Format(format!("no text column {} in row: {}", name, row))),
    }
}

/// Classify the variants of one replicate pair.
pub fn compare_pair(
    store: &dyn VariantStore,
    original: &str,
    repeat: &str,
) -> Result<ReplicateCounts, Error> {
    let mut selections = parse_selections("chrom, start, ref, alt, gene")?;
    selections.push(Selection::Genotype(original.to_string()));
    selections.push(Selection::Genotype(repeat.to_string()));
    let query = Query::new(Table::Variants, selections).with_gt_filter(GtFilter::any_of(
        &[original, repeat],
        &[GenotypeType::Het, GenotypeType::HomAlt],
    ));
    tracing::debug!("{}", &query);

    let original_gts = format!("gts.{}", original);
    let repeat_gts = format!("gts.{}", repeat);
    let mut counts = ReplicateCounts {
        original: original.to_string(),
        repeat: repeat.to_string(),
        ..Default::default()
    };
    for row in store.run(&query)? {
        let concordance = Concordance::classify(
            text(&row, "ref")?,
            text(&row, &original_gts)?,
            text(&row, &repeat_gts)?,
        );
        tracing::trace!("{} => {}", &row, concordance);
        counts.add(concordance);
    }
    Ok(counts)
}

/// Classify the variants of all replicate pairs in the store.
pub fn compare_replicates(store: &dyn VariantStore) -> Result<Vec<ReplicateCounts>, Error> {
    replicate_pairs(&list_samples(store)?)
        .iter()
        .map(|(original, repeat)| compare_pair(store, original, repeat))
        .collect()
}

/// Command line arguments for `compare_replicates` sub command.
#[derive(Debug, clap::Parser)]
#[command(author, version, about = "Compare variants of replicate samples", long_about = None)]
pub struct Args {
    /// Path to the GEMINI database.
    pub path_db: String,
}

/// Main entry point for `compare_replicates` sub command.
pub fn run(args_common: &common::Args, args: &Args) -> Result<(), anyhow::Error> {
    let before_anything = std::time::Instant::now();
    tracing::info!("args_common = {:?}", &args_common);
    tracing::info!("args = {:?}", &args);

    let store = SqliteStore::open(&args.path_db)?;
    let mut stdout = std::io::stdout().lock();
    for counts in compare_replicates(&store)? {
        writeln!(stdout, "{}", counts)?;
    }

    tracing::info!(
        "All of `compare_replicates` completed in {:?}",
        before_anything.elapsed()
    );
    Ok(())
}
