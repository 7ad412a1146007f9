//! GEMINI database operations main executable

pub mod amplicons;
pub mod common;
pub mod err;
pub mod output;
pub mod query;
pub mod replicates;
pub mod samples;
pub mod somatic;
pub mod store;

use clap::{Parser, Subcommand};
use console::{Emoji, Term};

/// CLI parser based on clap.
#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Operations on GEMINI variant databases",
    long_about = "This tool finds somatic variants and summarizes samples in GEMINI databases"
)]
struct Cli {
    /// Commonly used arguments
    #[command(flatten)]
    common: common::Args,

    /// The sub command to run
    #[command(subcommand)]
    command: Commands,
}

/// Enum supporting the parsing of top-level commands.
#[derive(Debug, Subcommand)]
enum Commands {
    /// Find hotspot and novel somatic variants.
    #[command(name = "find_somatic")]
    FindSomatic(somatic::Args),
    /// Print sample names.
    #[command(name = "print_samples")]
    PrintSamples(samples::print::Args),
    /// Query heterozygous variants of one sample.
    #[command(name = "query_sample")]
    QuerySample(samples::query::Args),
    /// Compare first batch and repeated samples.
    #[command(name = "compare_replicates")]
    CompareReplicates(replicates::Args),
    /// Report amplicons with more than one variant.
    #[command(name = "amplicons")]
    Amplicons(amplicons::Args),
}

fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    // Build a tracing subscriber according to the configuration in `cli.common`.
    let collector = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(common::tracing_level(&cli.common))
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    // Install collector and go into sub commands.
    let term = Term::stderr();
    tracing::subscriber::with_default(collector, || {
        match &cli.command {
            Commands::FindSomatic(args) => somatic::run(&cli.common, args)?,
            Commands::PrintSamples(args) => samples::print::run(&cli.common, args)?,
            Commands::QuerySample(args) => samples::query::run(&cli.common, args)?,
            Commands::CompareReplicates(args) => replicates::run(&cli.common, args)?,
            Commands::Amplicons(args) => amplicons::run(&cli.common, args)?,
        }

        Ok::<(), anyhow::Error>(())
    })?;
    term.write_line(&format!("All done. Have a nice day!{}", Emoji(" 😃", "")))?;

    Ok(())
}
