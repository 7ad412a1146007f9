//! In-memory variant store evaluating predicates directly on records.

use indexmap::{IndexMap, IndexSet};

use super::{project, Genotypes, Row, Value, VariantStore};
use crate::err::Error;
use crate::query::{GenotypeType, Query, Table};

#[derive(Debug, Default)]
pub struct MemoryStore {
    samples: IndexSet<String>,
    variants: Vec<(IndexMap<String, Value>, Option<Genotypes>)>,
}

impl MemoryStore {
    pub fn new(samples: &[&str]) -> Self {
        Self {
            samples: samples.iter().map(|s| s.to_string()).collect(),
            variants: Vec::new(),
        }
    }

    pub fn push(&mut self, fields: Vec<(&str, Value)>) -> &mut Self {
        let fields = fields
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        self.variants.push((fields, None));
        self
    }

    pub fn push_with_genotypes(
        &mut self,
        fields: Vec<(&str, Value)>,
        gts: &[&str],
        gt_types: &[GenotypeType],
    ) -> &mut Self {
        self.push(fields);
        if let Some((_, genotypes)) = self.variants.last_mut() {
            *genotypes = Some(Genotypes {
                gts: gts.iter().map(|s| s.to_string()).collect(),
                gt_types: gt_types.to_vec(),
            });
        }
        self
    }

    fn sample_records(&self) -> Vec<(IndexMap<String, Value>, Option<Genotypes>)> {
        self.samples
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let record = [
                    ("sample_id".to_string(), Value::Integer(i as i64 + 1)),
                    ("name".to_string(), Value::Text(name.clone())),
                ]
                .into_iter()
                .collect();
                (record, None)
            })
            .collect()
    }
}

impl VariantStore for MemoryStore {
    fn run(&self, query: &Query) -> Result<Vec<Row>, Error> {
        let sample_records;
        let records = match query.table {
            Table::Variants => &self.variants,
            Table::Samples => {
                sample_records = self.sample_records();
                &sample_records
            }
        };

        let mut result = Vec::new();
        for (record, genotypes) in records {
            if let Some(filter) = &query.filter {
                let missing = filter
                    .columns()
                    .into_iter()
                    .find(|c| !record.contains_key(c.name()));
                if let Some(column) = missing {
                    return Err(Error::query(
                        &query.to_string(),
                        format!("no such column: {}", column),
                    ));
                }
                if filter.eval(&|name| record.get(name)) != Some(true) {
                    continue;
                }
            }
            if let Some(row) = project(query, &self.samples, record, genotypes.as_ref())? {
                result.push(row);
            }
        }
        Ok(result)
    }
}
