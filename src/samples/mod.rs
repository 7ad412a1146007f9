//! Sample listing and per-sample variant queries.

pub mod print;
pub mod query;

use crate::err::Error;
use crate::query::{
    parse_selections, Column, CountOp, Expr, GenotypeType, GtFilter, Query, Selection, Table,
};
use crate::store::{Row, VariantStore};

/// Columns selected by `query_sample()` if none are given.
pub const DEFAULT_SAMPLE_COLUMNS: &str = "chrom, start, end, ref, alt, gene, cosmic_ids";

fn name_column() -> Column {
    Column::from_static("name".to_string())
}

/// Names of all samples in the store, in store order.
pub fn list_samples(store: &dyn VariantStore) -> Result<Vec<String>, Error> {
    let query = Query::new(Table::Samples, vec![Selection::Field(name_column())]);
    Ok(store
        .run(&query)?
        .iter()
        .filter_map(|row| row.get("name").map(|name| name.to_string()))
        .collect())
}

/// Whether the store has a sample called `name`.
pub fn has_sample(store: &dyn VariantStore, name: &str) -> Result<bool, Error> {
    let query = Query::new(Table::Samples, vec![Selection::Field(name_column())])
        .with_filter(Expr::eq(name_column(), name));
    Ok(!store.run(&query)?.is_empty())
}

/// Query the variants for which `sample` is heterozygous and at least
/// `min_het_count` samples are heterozygous overall.
///
/// The rows hold `columns` followed by the genotype of `sample`.
pub fn query_sample(
    store: &dyn VariantStore,
    sample: &str,
    columns: &[Selection],
    min_het_count: usize,
    extra_gt_filter: Option<GtFilter>,
) -> Result<Vec<Row>, Error> {
    if !has_sample(store, sample)? {
        return Err(Error::Configuration(format!("unknown sample {:?}", sample)));
    }

    let mut selections = if columns.is_empty() {
        parse_selections(DEFAULT_SAMPLE_COLUMNS)?
    } else {
        columns.to_vec()
    };
    selections.push(Selection::Genotype(sample.to_string()));

    let mut gt_filter = vec![
        GtFilter::sample(sample, GenotypeType::Het),
        GtFilter::count(GenotypeType::Het, CountOp::Ge, min_het_count),
    ];
    gt_filter.extend(extra_gt_filter);

    let query = Query::new(Table::Variants, selections).with_gt_filter(GtFilter::And(gt_filter));
    tracing::debug!("{}", &query);
    store.run(&query)
}
