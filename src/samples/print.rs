//! Implementation of the `print_samples` sub command.

use std::io::Write;

use super::list_samples;
use crate::common;
use crate::store::{sqlite::SqliteStore, VariantStore};

/// Command line arguments for `print_samples` sub command.
#[derive(Debug, clap::Parser)]
#[command(author, version, about = "Print the samples of a GEMINI database", long_about = None)]
pub struct Args {
    /// Path to the GEMINI database.
    pub path_db: String,
}

/// Write one sample name per line.
pub fn print_samples(
    store: &dyn VariantStore,
    out: &mut dyn Write,
) -> Result<usize, anyhow::Error> {
    let samples = list_samples(store)?;
    for sample in &samples {
        writeln!(out, "{}", sample)?;
    }
    Ok(samples.len())
}

/// Main entry point for `print_samples` sub command.
pub fn run(args_common: &common::Args, args: &Args) -> Result<(), anyhow::Error> {
    let before_anything = std::time::Instant::now();
    tracing::info!("args_common = {:?}", &args_common);
    tracing::info!("args = {:?}", &args);

    let store = SqliteStore::open(&args.path_db)?;
    let count = print_samples(&store, &mut std::io::stdout().lock())?;
    tracing::info!("... printed {} samples", count);

    tracing::info!(
        "All of `print_samples` completed in {:?}",
        before_anything.elapsed()
    );
    Ok(())
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::store::sqlite::fixture::create;

    #[test]
    fn print_from_database() -> Result<(), anyhow::Error> {
        let tmpdir = temp_testdir::TempDir::default();
        let path = tmpdir.join("samples.db");
        create(&path, &["NATCH_FirstBatch_1", "NATCH_Repeats_1"], &[])?;

        let mut out = Vec::new();
        let count = print_samples(&SqliteStore::open(&path)?, &mut out)?;

        assert_eq!(count, 2);
        assert_eq!(
            String::from_utf8(out)?,
            "NATCH_FirstBatch_1\nNATCH_Repeats_1\n"
        );

        Ok(())
    }
}
