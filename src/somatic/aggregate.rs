//! Collection of hotspot and novel variants with cross-class deduplication.

use indexmap::IndexSet;
use strum::IntoEnumIterator;

use super::clauses::{hotspot_variant, novel_variant, VariantType};
use super::SomaticParams;
use crate::err::Error;
use crate::output::RowFormat;
use crate::query::{Column, Query};
use crate::store::{Row, VariantStore};

/// The classes variants are queried for, in query order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariantClass {
    /// Variants carrying the given annotation.
    Hotspot(Column),
    /// Variants carrying none of the annotations.
    Novel(VariantType),
}

impl VariantClass {
    /// Column label for the summary header.
    pub fn label(&self) -> String {
        match self {
            VariantClass::Hotspot(annotation) => annotation.to_string(),
            VariantClass::Novel(VariantType::Snp) => "Novel_SNPS".to_string(),
            VariantClass::Novel(VariantType::Indel) => "Novel_Indels".to_string(),
        }
    }
}

/// Result of `compute_somatic_variants()`.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SomaticResult {
    /// The queried classes, parallel to `counts`.
    pub classes: Vec<VariantClass>,
    /// Number of records returned per class, before deduplication.
    pub counts: Vec<usize>,
    /// Formatted records, deduplicated across classes, in first-seen order.
    pub variants: Vec<String>,
}

/// Build the query for one variant class.
pub fn class_query(
    class: &VariantClass,
    annotations: &[Column],
    params: &SomaticParams,
) -> Query {
    let filter = match class {
        VariantClass::Hotspot(annotation) => {
            hotspot_variant(annotation, params.hotspot_min_allele_bal, params.max_aaf)
        }
        VariantClass::Novel(variant_type) => novel_variant(
            annotations,
            *variant_type,
            params.novel_min_allele_bal,
            params.max_aaf,
        ),
    };
    Query::base_variants().with_filter(filter)
}

/// Accumulates formatted records, remembering first-seen order.
struct Collector<'a> {
    format: &'a dyn RowFormat,
    seen: IndexSet<String>,
}

impl<'a> Collector<'a> {
    /// Add the records of one result set and return its size.
    ///
    /// Records already seen are not added again but still counted.
    fn add(&mut self, rows: &[Row]) -> Result<usize, Error> {
        for row in rows {
            let record = self.format.format(row)?;
            if !self.seen.insert(record.clone()) {
                tracing::trace!("record seen before: {}", record);
            }
        }
        Ok(rows.len())
    }
}

/// Query hotspot variants for each annotation, then novel SNPs and indels.
///
/// Queries run strictly one after another; the first failing query aborts
/// the aggregation.
pub fn compute_somatic_variants(
    store: &dyn VariantStore,
    annotations: &[Column],
    params: &SomaticParams,
    format: &dyn RowFormat,
) -> Result<SomaticResult, Error> {
    let classes = annotations
        .iter()
        .cloned()
        .map(VariantClass::Hotspot)
        .chain(VariantType::iter().map(VariantClass::Novel))
        .collect::<Vec<_>>();

    let mut collector = Collector {
        format,
        seen: IndexSet::new(),
    };
    let mut counts = Vec::with_capacity(classes.len());
    for class in &classes {
        let query = class_query(class, annotations, params);
        tracing::debug!("{}: {}", class.label(), &query);
        let rows = store.run(&query)?;
        let count = collector.add(&rows)?;
        tracing::debug!("... {} records", count);
        counts.push(count);
    }

    Ok(SomaticResult {
        classes,
        counts,
        variants: collector.seen.into_iter().collect(),
    })
}

#[cfg(test)]
mod test {
    use std::cell::RefCell;
    use std::collections::VecDeque;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::output::DefaultRowFormat;
    use crate::query::GenotypeType;
    use crate::store::memory::MemoryStore;
    use crate::store::Value;

    /// Store returning canned result sets in order, recording the queries.
    #[derive(Default)]
    struct ScriptedStore {
        responses: RefCell<VecDeque<Result<Vec<Row>, Error>>>,
        queries: RefCell<Vec<String>>,
    }

    impl VariantStore for ScriptedStore {
        fn run(&self, query: &Query) -> Result<Vec<Row>, Error> {
            self.queries.borrow_mut().push(query.to_string());
            self.responses
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    fn record(name: &str) -> Row {
        Row {
            columns: vec![("name".into(), Value::from(name))],
        }
    }

    fn records(names: &[&str]) -> Vec<Row> {
        names.iter().map(|name| record(name)).collect()
    }

    #[test]
    fn counts_are_pre_dedup_and_list_is_first_seen() -> Result<(), anyhow::Error> {
        let store = ScriptedStore::default();
        store.responses.borrow_mut().extend([
            Ok(records(&["A", "B", "A", "C"])),
            Ok(records(&["B", "D"])),
            Ok(Vec::new()),
        ]);

        let result = compute_somatic_variants(
            &store,
            &[Column::new("TCGA_LUAD")?],
            &SomaticParams::default(),
            &DefaultRowFormat,
        )?;

        assert_eq!(result.counts, vec![4, 2, 0]);
        assert_eq!(result.variants, vec!["A", "B", "C", "D"]);
        assert_eq!(
            result.classes.iter().map(|c| c.label()).collect::<Vec<_>>(),
            vec!["TCGA_LUAD", "Novel_SNPS", "Novel_Indels"]
        );

        Ok(())
    }

    #[test]
    fn queries_run_in_class_order() -> Result<(), anyhow::Error> {
        let store = ScriptedStore::default();
        let annotations = vec![Column::new("TCGA_A")?, Column::new("TCGA_B")?];

        let result = compute_somatic_variants(
            &store,
            &annotations,
            &SomaticParams::default(),
            &DefaultRowFormat,
        )?;

        assert_eq!(result.counts, vec![0, 0, 0, 0]);
        let queries = store.queries.borrow();
        assert_eq!(queries.len(), 4);
        assert!(queries[0].contains("TCGA_A = 1"));
        assert!(queries[1].contains("TCGA_B = 1"));
        assert!(queries[2].contains("type = 'snp'"));
        assert!(queries[2].contains("TCGA_A = 0 AND TCGA_B = 0"));
        assert!(queries[3].contains("type = 'indel'"));

        Ok(())
    }

    #[test]
    fn no_annotations_only_novel_classes() -> Result<(), anyhow::Error> {
        let store = ScriptedStore::default();
        let result = compute_somatic_variants(
            &store,
            &[],
            &SomaticParams::default(),
            &DefaultRowFormat,
        )?;

        assert_eq!(result.counts, vec![0, 0]);
        assert!(!store.queries.borrow()[0].contains(" = 0 AND"));

        Ok(())
    }

    #[test]
    fn query_failure_aborts() -> Result<(), anyhow::Error> {
        let store = ScriptedStore::default();
        store.responses.borrow_mut().extend([
            Ok(records(&["A"])),
            Err(Error::query("select", "no such column: TCGA_B")),
        ]);

        let result = compute_somatic_variants(
            &store,
            &[Column::new("TCGA_A")?, Column::new("TCGA_B")?],
            &SomaticParams::default(),
            &DefaultRowFormat,
        );

        assert!(matches!(result, Err(Error::Query { .. })));
        assert_eq!(store.queries.borrow().len(), 2);

        Ok(())
    }

    fn variant(
        chrom: &str,
        start: i64,
        var_type: &str,
        tcga: i64,
        impact: &str,
    ) -> Vec<(&'static str, Value)> {
        vec![
            ("chrom", Value::from(chrom)),
            ("start", Value::Integer(start)),
            ("end", Value::Integer(start + 1)),
            ("ref", Value::from("C")),
            ("alt", Value::from("T")),
            ("type", Value::from(var_type)),
            ("allele_bal", Value::Real(0.3)),
            ("TCGA_X", Value::Integer(tcga)),
            ("in_1kg", Value::Integer(0)),
            ("aaf_1kg_all", Value::Null),
            ("in_exac", Value::Integer(0)),
            ("aaf_exac_all", Value::Null),
            ("in_esp", Value::Integer(0)),
            ("aaf_esp_all", Value::Null),
            ("impact_severity", Value::from(impact)),
            ("sift_pred", Value::Null),
            ("polyphen_pred", Value::Null),
        ]
    }

    #[test]
    fn evaluated_against_memory_store() -> Result<(), anyhow::Error> {
        let mut store = MemoryStore::new(&["S1"]);
        // three hotspot records, two of them identical
        store.push(variant("chr10", 500, "snp", 1, "LOW"));
        store.push(variant("chr2", 300, "snp", 1, "LOW"));
        store.push(variant("chr2", 300, "snp", 1, "LOW"));
        // one novel snp with high impact, one filtered for low impact
        store.push_with_genotypes(
            variant("chr1", 100, "snp", 0, "HIGH"),
            &["C/T"],
            &[GenotypeType::Het],
        );
        store.push(variant("chr1", 200, "snp", 0, "LOW"));
        // common indel, excluded
        let mut common = variant("chr3", 50, "indel", 0, "HIGH");
        common[8] = ("in_1kg", Value::Integer(1));
        common[9] = ("aaf_1kg_all", Value::Real(0.3));
        store.push(common);

        let mut result = compute_somatic_variants(
            &store,
            &[Column::new("TCGA_X")?],
            &SomaticParams::default(),
            &DefaultRowFormat,
        )?;
        crate::somatic::sorting::sort_by_position(&mut result.variants)?;

        assert_eq!(result.counts, vec![3, 1, 0]);
        assert_eq!(
            result.variants,
            vec![
                "chr1\t100\t101\tC\tT",
                "chr2\t300\t301\tC\tT",
                "chr10\t500\t501\tC\tT",
            ]
        );

        Ok(())
    }
}
