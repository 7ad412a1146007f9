//! Access to variant stores.

#[cfg(test)]
pub mod memory;
pub mod sqlite;

use std::io::Read;

use indexmap::{IndexMap, IndexSet};

use crate::err::Error;
use crate::query::{GenotypeType, Query, Selection};

/// A value as produced by the store.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl Value {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            Value::Text(s) => s.parse().ok(),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Real(value)
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => f.write_str("None"),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Real(x) => write!(f, "{}", x),
            Value::Text(s) => f.write_str(s),
        }
    }
}

/// One result row, columns in selection order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    pub columns: Vec<(String, Value)>,
}

impl Row {
    /// Value of the first column called `name`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }
}

/// Tab-separated values, GEMINI's default row format.
impl std::fmt::Display for Row {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, (_, value)) in self.columns.iter().enumerate() {
            if i > 0 {
                f.write_str("\t")?;
            }
            write!(f, "{}", value)?;
        }
        Ok(())
    }
}

/// A queryable variant database.
///
/// Implementations fully materialize the result of each query.
pub trait VariantStore {
    fn run(&self, query: &Query) -> Result<Vec<Row>, Error>;
}

/// Raw per-sample list as found in the `gts` and `gt_types` columns.
#[derive(Debug, Clone, Copy)]
pub enum EncodedList<'a> {
    /// Comma-separated text.
    Text(&'a str),
    /// Zlib-compressed comma-separated text.
    Zlib(&'a [u8]),
}

impl<'a> EncodedList<'a> {
    pub fn decode(&self, column: &str) -> Result<Vec<String>, Error> {
        let text = match self {
            EncodedList::Text(text) => text.to_string(),
            EncodedList::Zlib(bytes) => {
                let mut text = String::new();
                flate2::read::ZlibDecoder::new(*bytes)
                    .read_to_string(&mut text)
                    .map_err(|e| Error::Decode {
                        column: column.to_string(),
                        message: e.to_string(),
                    })?;
                text
            }
        };
        if text.is_empty() {
            return Ok(Vec::new());
        }
        Ok(text.split(',').map(|s| s.trim().to_string()).collect())
    }
}

/// Decoded genotypes of one variant, in sample order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Genotypes {
    pub gts: Vec<String>,
    pub gt_types: Vec<GenotypeType>,
}

impl Genotypes {
    pub fn decode(gts: EncodedList, gt_types: EncodedList) -> Result<Self, Error> {
        let gts = gts.decode("gts")?;
        let gt_types = gt_types
            .decode("gt_types")?
            .iter()
            .map(|code| {
                code.parse::<i64>()
                    .ok()
                    .and_then(GenotypeType::from_code)
                    .ok_or_else(|| Error::Decode {
                        column: "gt_types".into(),
                        message: format!("invalid genotype type code {:?}", code),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        if gts.len() != gt_types.len() {
            return Err(Error::Decode {
                column: "gts".into(),
                message: format!(
                    "{} genotypes but {} genotype types",
                    gts.len(),
                    gt_types.len()
                ),
            });
        }
        Ok(Self { gts, gt_types })
    }
}

/// Apply the genotype filter of `query` to a fetched record and build the
/// output row from its selections.
///
/// Returns `None` if the genotype filter rejects the record. `record` must
/// hold all plain fields of the query.
pub(crate) fn project(
    query: &Query,
    samples: &IndexSet<String>,
    record: &IndexMap<String, Value>,
    genotypes: Option<&Genotypes>,
) -> Result<Option<Row>, Error> {
    let no_genotypes = || Error::query(&query.to_string(), "no genotype columns in store");
    let sample_idx = |sample: &str| {
        samples.get_index_of(sample).ok_or_else(|| {
            Error::Configuration(format!("unknown sample {:?}", sample))
        })
    };

    if let Some(gt_filter) = &query.gt_filter {
        let genotypes = genotypes.ok_or_else(no_genotypes)?;
        if !gt_filter.eval(samples, &genotypes.gt_types)? {
            return Ok(None);
        }
    }

    let mut columns = Vec::with_capacity(query.selections.len());
    for selection in &query.selections {
        let value = match selection {
            Selection::Field(column) => record
                .get(column.name())
                .cloned()
                .ok_or_else(|| {
                    Error::query(&query.to_string(), format!("no such column: {}", column))
                })?,
            Selection::Genotype(sample) => {
                let idx = sample_idx(sample.as_str())?;
                let genotypes = genotypes.ok_or_else(no_genotypes)?;
                genotypes
                    .gts
                    .get(idx)
                    .map(|gt| Value::Text(gt.clone()))
                    .unwrap_or(Value::Null)
            }
            Selection::GenotypeType(sample) => {
                let idx = sample_idx(sample.as_str())?;
                let genotypes = genotypes.ok_or_else(no_genotypes)?;
                genotypes
                    .gt_types
                    .get(idx)
                    .map(|t| Value::Integer(t.code()))
                    .unwrap_or(Value::Null)
            }
        };
        columns.push((selection.to_string(), value));
    }

    Ok(Some(Row { columns }))
}

#[cfg(test)]
mod test {
    use std::io::Write;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::query::{Column, GtFilter, Table};

    #[test]
    fn row_display_is_tab_separated() {
        let row = Row {
            columns: vec![
                ("chrom".into(), "chr1".into()),
                ("start".into(), Value::Integer(100)),
                ("aaf".into(), Value::Real(0.25)),
                ("gene".into(), Value::Null),
            ],
        };
        assert_eq!(row.to_string(), "chr1\t100\t0.25\tNone");
        assert_eq!(row.get("start"), Some(&Value::Integer(100)));
        assert_eq!(row.get("nope"), None);
    }

    #[test]
    fn decode_zlib_genotypes() -> Result<(), anyhow::Error> {
        let mut encoder =
            flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(b"C/T,C/C")?;
        let gts = encoder.finish()?;

        let genotypes = Genotypes::decode(EncodedList::Zlib(&gts), EncodedList::Text("1,0"))?;
        assert_eq!(genotypes.gts, vec!["C/T", "C/C"]);
        assert_eq!(
            genotypes.gt_types,
            vec![GenotypeType::Het, GenotypeType::HomRef]
        );

        assert!(Genotypes::decode(EncodedList::Text("C/T"), EncodedList::Text("1,0")).is_err());
        assert!(Genotypes::decode(EncodedList::Text("C/T"), EncodedList::Text("7")).is_err());

        Ok(())
    }

    #[test]
    fn project_selections_and_gt_filter() -> Result<(), anyhow::Error> {
        let samples: IndexSet<String> = ["A", "B"].iter().map(|s| s.to_string()).collect();
        let record: IndexMap<String, Value> = [("chrom".to_string(), Value::from("chr2"))]
            .into_iter()
            .collect();
        let genotypes = Genotypes {
            gts: vec!["G/G".into(), "G/A".into()],
            gt_types: vec![GenotypeType::HomRef, GenotypeType::Het],
        };

        let query = Query::new(
            Table::Variants,
            vec![
                Selection::Field(Column::new("chrom")?),
                Selection::Genotype("B".into()),
                Selection::GenotypeType("B".into()),
            ],
        )
        .with_gt_filter(GtFilter::sample("B", GenotypeType::Het));
        let row = project(&query, &samples, &record, Some(&genotypes))?;
        assert_eq!(
            row.map(|r| r.to_string()),
            Some("chr2\tG/A\t1".to_string())
        );

        let query = query.with_gt_filter(GtFilter::sample("A", GenotypeType::Het));
        assert_eq!(project(&query, &samples, &record, Some(&genotypes))?, None);
        assert!(project(&query, &samples, &record, None).is_err());

        Ok(())
    }
}
