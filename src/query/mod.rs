//! Typed queries against a GEMINI variant store.

pub mod expr;
pub mod gt_filter;

use itertools::Itertools;

use crate::err::Error;

pub use self::expr::{Column, Expr};
pub use self::gt_filter::{CountOp, GenotypeType, GtFilter};

/// Columns selected by default for variant records.
pub const BASE_VARIANT_COLUMNS: &[&str] = &["chrom", "start", "end", "ref", "alt"];

/// The tables of a GEMINI database that we query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Table {
    Variants,
    Samples,
}

/// One selected output column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// A plain table column.
    Field(Column),
    /// Genotype string of one sample, `gts.<sample>`.
    Genotype(String),
    /// Genotype type code of one sample, `gt_types.<sample>`.
    GenotypeType(String),
}

impl std::str::FromStr for Selection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(sample) = s.strip_prefix("gts.") {
            Ok(Selection::Genotype(sample.to_string()))
        } else if let Some(sample) = s.strip_prefix("gt_types.") {
            Ok(Selection::GenotypeType(sample.to_string()))
        } else {
            Ok(Selection::Field(Column::new(s)?))
        }
    }
}

impl std::fmt::Display for Selection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Selection::Field(column) => write!(f, "{}", column),
            Selection::Genotype(sample) => write!(f, "gts.{}", sample),
            Selection::GenotypeType(sample) => write!(f, "gt_types.{}", sample),
        }
    }
}

/// Parse a comma-separated column list such as `chrom, start, gts.S1`.
pub fn parse_selections(raw: &str) -> Result<Vec<Selection>, Error> {
    raw.split(',').map(|s| s.parse()).collect()
}

/// A query: selected columns, an optional row predicate and an optional
/// genotype filter.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub table: Table,
    pub selections: Vec<Selection>,
    pub filter: Option<Expr>,
    pub gt_filter: Option<GtFilter>,
}

impl Query {
    pub fn new(table: Table, selections: Vec<Selection>) -> Self {
        Self {
            table,
            selections,
            filter: None,
            gt_filter: None,
        }
    }

    /// Query the `chrom, start, end, ref, alt` columns of the variants table.
    pub fn base_variants() -> Self {
        Self::new(
            Table::Variants,
            BASE_VARIANT_COLUMNS
                .iter()
                .map(|name| Selection::Field(Column::from_static(name.to_string())))
                .collect(),
        )
    }

    pub fn with_filter(mut self, filter: Expr) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_gt_filter(mut self, gt_filter: GtFilter) -> Self {
        self.gt_filter = Some(gt_filter);
        self
    }

    /// Plain table columns that must be fetched.
    pub fn fields(&self) -> Vec<&Column> {
        self.selections
            .iter()
            .filter_map(|s| match s {
                Selection::Field(column) => Some(column),
                _ => None,
            })
            .unique()
            .collect()
    }

    /// Whether per-sample genotype arrays are needed to answer the query.
    pub fn needs_genotypes(&self) -> bool {
        self.gt_filter.is_some()
            || self
                .selections
                .iter()
                .any(|s| !matches!(s, Selection::Field(_)))
    }
}

impl std::fmt::Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "select {} from {}",
            self.selections.iter().join(", "),
            self.table
        )?;
        if let Some(filter) = &self.filter {
            write!(f, " WHERE {}", filter)?;
        }
        if let Some(gt_filter) = &self.gt_filter {
            write!(f, " [gt-filter: {}]", gt_filter)?;
        }
        Ok(())
    }
}
