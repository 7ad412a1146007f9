//! Genotype filters in the GEMINI `--gt-filter` dialect.
//!
//! GEMINI stores genotypes as per-sample arrays, so these filters cannot be
//! pushed down into SQL and are evaluated on the decoded arrays instead.

use indexmap::IndexSet;

use crate::err::Error;

/// GEMINI genotype type codes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::EnumIter,
)]
pub enum GenotypeType {
    #[strum(serialize = "HOM_REF")]
    HomRef,
    #[strum(serialize = "HET")]
    Het,
    #[strum(serialize = "UNKNOWN")]
    Unknown,
    #[strum(serialize = "HOM_ALT")]
    HomAlt,
}

impl GenotypeType {
    /// Numeric code as stored in the `gt_types` column.
    pub fn code(self) -> i64 {
        match self {
            GenotypeType::HomRef => 0,
            GenotypeType::Het => 1,
            GenotypeType::Unknown => 2,
            GenotypeType::HomAlt => 3,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(GenotypeType::HomRef),
            1 => Some(GenotypeType::Het),
            2 => Some(GenotypeType::Unknown),
            3 => Some(GenotypeType::HomAlt),
            _ => None,
        }
    }
}

/// Comparison for counting genotypes across all samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum CountOp {
    #[strum(serialize = ">")]
    Gt,
    #[strum(serialize = ">=")]
    Ge,
}

/// A filter on the genotypes of a variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GtFilter {
    /// `gt_types.<sample> == <gt_type>`
    Sample {
        sample: String,
        gt_type: GenotypeType,
    },
    /// `(gt_types).(*).(==<gt_type>).(count <op> <count>)`
    Count {
        gt_type: GenotypeType,
        op: CountOp,
        count: usize,
    },
    And(Vec<GtFilter>),
    Or(Vec<GtFilter>),
}

impl GtFilter {
    pub fn sample(sample: &str, gt_type: GenotypeType) -> Self {
        GtFilter::Sample {
            sample: sample.to_string(),
            gt_type,
        }
    }

    pub fn count(gt_type: GenotypeType, op: CountOp, count: usize) -> Self {
        GtFilter::Count { gt_type, op, count }
    }

    /// Match if any of the samples has any of the genotype types.
    pub fn any_of(samples: &[&str], gt_types: &[GenotypeType]) -> Self {
        GtFilter::Or(
            gt_types
                .iter()
                .flat_map(|gt_type| {
                    samples
                        .iter()
                        .map(move |sample| GtFilter::sample(sample, *gt_type))
                })
                .collect(),
        )
    }

    /// Sample names referenced by the filter.
    pub fn samples(&self) -> Vec<&str> {
        match self {
            GtFilter::Sample { sample, .. } => vec![sample.as_str()],
            GtFilter::Count { .. } => Vec::new(),
            GtFilter::And(children) | GtFilter::Or(children) => {
                children.iter().flat_map(|c| c.samples()).collect()
            }
        }
    }

    /// Evaluate the filter against the genotype types of one variant.
    ///
    /// `samples` gives the sample order of `gt_types`.
    pub fn eval(
        &self,
        samples: &IndexSet<String>,
        gt_types: &[GenotypeType],
    ) -> Result<bool, Error> {
        Ok(match self {
            GtFilter::Sample { sample, gt_type } => {
                let idx = samples.get_index_of(sample).ok_or_else(|| {
                    Error::Configuration(format!("unknown sample {:?} in genotype filter", sample))
                })?;
                let actual = gt_types.get(idx).ok_or_else(|| Error::Decode {
                    column: "gt_types".into(),
                    message: format!("no genotype for sample #{}", idx),
                })?;
                actual == gt_type
            }
            GtFilter::Count { gt_type, op, count } => {
                let n = gt_types.iter().filter(|t| *t == gt_type).count();
                match op {
                    CountOp::Gt => n > *count,
                    CountOp::Ge => n >= *count,
                }
            }
            GtFilter::And(children) => {
                for child in children {
                    if !child.eval(samples, gt_types)? {
                        return Ok(false);
                    }
                }
                true
            }
            GtFilter::Or(children) => {
                for child in children {
                    if child.eval(samples, gt_types)? {
                        return Ok(true);
                    }
                }
                false
            }
        })
    }
}

impl std::fmt::Display for GtFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GtFilter::Sample { sample, gt_type } => write!(f, "gt_types.{} == {}", sample, gt_type),
            GtFilter::Count { gt_type, op, count } => {
                write!(f, "(gt_types).(*).(=={}).(count {} {})", gt_type, op, count)
            }
            GtFilter::And(children) | GtFilter::Or(children) => {
                let sep = if matches!(self, GtFilter::And(_)) {
                    " and "
                } else {
                    " or "
                };
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        f.write_str(sep)?;
                    }
                    match child {
                        GtFilter::And(_) | GtFilter::Or(_) => write!(f, "({})", child)?,
                        _ => write!(f, "{}", child)?,
                    }
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod test {
    use indexmap::IndexSet;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use strum::IntoEnumIterator;

    use super::*;

    fn samples() -> IndexSet<String> {
        ["s1", "s2", "s3"].iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn codes_round_trip() {
        for gt_type in GenotypeType::iter() {
            assert_eq!(GenotypeType::from_code(gt_type.code()), Some(gt_type));
        }
        assert_eq!(GenotypeType::from_code(4), None);
        assert_eq!("HOM_ALT".parse::<GenotypeType>().ok(), Some(GenotypeType::HomAlt));
    }

    #[test]
    fn render_amplicon_filter() {
        let filter = GtFilter::Or(vec![
            GtFilter::And(vec![
                GtFilter::count(GenotypeType::Het, CountOp::Gt, 1),
                GtFilter::sample("s1", GenotypeType::Het),
            ]),
            GtFilter::sample("s1", GenotypeType::HomAlt),
        ]);

        insta::assert_snapshot!(
            filter.to_string(),
            @"((gt_types).(*).(==HET).(count > 1) and gt_types.s1 == HET) or gt_types.s1 == HOM_ALT"
        );
        assert_eq!(filter.samples(), vec!["s1", "s1"]);
    }

    #[rstest]
    #[case(&[GenotypeType::Het, GenotypeType::HomRef, GenotypeType::Het], true)]
    #[case(&[GenotypeType::Het, GenotypeType::HomRef, GenotypeType::HomRef], false)]
    #[case(&[GenotypeType::HomRef, GenotypeType::Het, GenotypeType::Het], false)]
    #[case(&[GenotypeType::HomAlt, GenotypeType::HomRef, GenotypeType::HomRef], true)]
    fn eval_het_count_or_hom_alt(#[case] gt_types: &[GenotypeType], #[case] expected: bool) {
        let filter = GtFilter::Or(vec![
            GtFilter::And(vec![
                GtFilter::count(GenotypeType::Het, CountOp::Gt, 1),
                GtFilter::sample("s1", GenotypeType::Het),
            ]),
            GtFilter::sample("s1", GenotypeType::HomAlt),
        ]);

        assert_eq!(filter.eval(&samples(), gt_types).unwrap(), expected);
    }

    #[test]
    fn any_of_expands_all_combinations() {
        let filter = GtFilter::any_of(&["s1", "s2"], &[GenotypeType::Het, GenotypeType::HomAlt]);
        assert_eq!(
            filter.to_string(),
            "gt_types.s1 == HET or gt_types.s2 == HET or gt_types.s1 == HOM_ALT or gt_types.s2 == HOM_ALT"
        );
    }

    #[test]
    fn unknown_sample_is_an_error() {
        let filter = GtFilter::sample("nope", GenotypeType::Het);
        assert!(filter.eval(&samples(), &[GenotypeType::Het; 3]).is_err());
    }
}
