//! Implementation of the `find_somatic` sub command.

pub mod aggregate;
pub mod clauses;
pub mod sorting;

use std::io::Write;
use std::path::Path;

use itertools::Itertools;
use thousands::Separable;

use self::aggregate::{compute_somatic_variants, SomaticResult};
use crate::common::{self, io::open_write_maybe_gz};
use crate::err::Error;
use crate::output::{RowFormat, VcfRowFormat};
use crate::query::{Column, Query};
use crate::store::{sqlite::SqliteStore, VariantStore};

/// Thresholds of the somatic variant classification.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct SomaticParams {
    /// Alternate allele frequency at and above which a variant counts as
    /// common in a reference population.
    pub max_aaf: f64,
    /// Minimal allele balance of hotspot variants.
    pub hotspot_min_allele_bal: f64,
    /// Minimal allele balance of novel variants.
    pub novel_min_allele_bal: f64,
}

impl Default for SomaticParams {
    fn default() -> Self {
        Self {
            max_aaf: clauses::DEFAULT_MAX_AAF,
            hotspot_min_allele_bal: clauses::DEFAULT_HOTSPOT_MIN_ALLELE_BAL,
            novel_min_allele_bal: clauses::DEFAULT_NOVEL_MIN_ALLELE_BAL,
        }
    }
}

/// Load parameters from a JSON string or, with `@` prefix, a JSON file.
fn load_params(params: Option<&str>) -> Result<SomaticParams, anyhow::Error> {
    match params {
        None => Ok(SomaticParams::default()),
        Some(param) if param.starts_with('@') => {
            let path = param.trim_start_matches('@');
            let file = std::fs::File::open(path)
                .map_err(|e| anyhow::anyhow!("failed to open params file {}: {}", path, e))?;
            serde_json::from_reader(std::io::BufReader::new(file))
                .map_err(|e| anyhow::anyhow!("failed to parse params file {}: {}", path, e))
        }
        Some(param) => serde_json::from_str(param)
            .map_err(|e| anyhow::anyhow!("failed to parse params: {}", e)),
    }
}

/// Parse the comma-separated annotation list.
///
/// A blank list yields no annotations; blank entries within a list are an
/// error.
pub fn parse_annotations(raw: &str) -> Result<Vec<Column>, Error> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    raw.split(',').map(|name| Column::new(name.trim())).collect()
}

/// Command line arguments for `find_somatic` sub command.
#[derive(Debug, clap::Parser)]
#[command(author, version, about = "Find hotspot and novel somatic variants", long_about = None)]
pub struct Args {
    /// Path to the GEMINI database.
    pub path_db: String,
    /// Comma-separated annotation columns marking hotspots.
    #[arg(long)]
    pub annotations: String,
    /// Path to the output VCF file, gzip compressed with `.gz` suffix.
    #[arg(long = "output_vcf")]
    pub output_vcf: String,
    /// Print a header before the summary line.
    #[arg(long)]
    pub header: bool,
    /// Thresholds as JSON, or @ with path to JSON file.
    #[arg(long)]
    pub params: Option<String>,
}

/// Name of the database for the summary line, the file name without extension.
fn db_name(path_db: &str) -> String {
    Path::new(path_db)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path_db.to_string())
}

/// Run the classification and write VCF output and the summary.
#[allow(clippy::too_many_arguments)]
pub fn find_somatic(
    store: &dyn VariantStore,
    db_name: &str,
    annotations: &[Column],
    params: &SomaticParams,
    format: &dyn RowFormat,
    header: bool,
    out_vcf: &mut dyn Write,
    out_summary: &mut dyn Write,
) -> Result<SomaticResult, anyhow::Error> {
    writeln!(out_vcf, "{}", format.header(&Query::base_variants()))?;

    let mut result = compute_somatic_variants(store, annotations, params, format)?;
    sorting::sort_by_position(&mut result.variants)?;

    if header {
        writeln!(
            out_summary,
            "#Sample {}",
            result.classes.iter().map(|c| c.label()).join(" ")
        )?;
    }
    writeln!(out_summary, "{} {}", db_name, result.counts.iter().join(" "))?;

    for variant in &result.variants {
        writeln!(out_vcf, "{}", variant)?;
    }

    Ok(result)
}

/// Main entry point for `find_somatic` sub command.
pub fn run(args_common: &common::Args, args: &Args) -> Result<(), anyhow::Error> {
    let before_anything = std::time::Instant::now();
    tracing::info!("args_common = {:?}", &args_common);
    tracing::info!("args = {:?}", &args);

    let annotations = parse_annotations(&args.annotations)?;
    if annotations.is_empty() {
        tracing::warn!("no annotations given, novel variants will not exclude any");
    }
    let params = load_params(args.params.as_deref())?;
    tracing::info!("params = {:?}", &params);

    tracing::info!("opening database...");
    let store = SqliteStore::open(&args.path_db)?;
    let format = VcfRowFormat::new(&args.path_db);
    let mut out_vcf = open_write_maybe_gz(&args.output_vcf)
        .map_err(|e| anyhow::anyhow!("could not open output file {}: {}", &args.output_vcf, e))?;

    tracing::info!("querying variants...");
    let result = find_somatic(
        &store,
        &db_name(&args.path_db),
        &annotations,
        &params,
        &format,
        args.header,
        &mut out_vcf,
        &mut std::io::stdout().lock(),
    )?;
    out_vcf.flush()?;
    tracing::info!(
        "... wrote {} distinct variants from {} records",
        result.variants.len().separate_with_commas(),
        result.counts.iter().sum::<usize>().separate_with_commas()
    );

    tracing::info!(
        "All of `find_somatic` completed in {:?}",
        before_anything.elapsed()
    );
    Ok(())
}
