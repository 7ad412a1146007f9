//! Code for sorting formatted variant records by chromosome number and position.

use crate::err::Error;

/// Extract `(chromosome number, position)` from a tab-separated record whose
/// first two fields are `chrN` and an integer position.
pub fn position_key(record: &str) -> Result<(u32, u64), Error> {
    let mut fields = record.split('\t');
    let chrom = fields.next().unwrap_or_default();
    let number = chrom
        .strip_prefix("chr")
        .and_then(|n| n.parse::<u32>().ok())
        .ok_or_else(|| {
            Error::Format(format!(
                "chromosome {:?} is not of the form chrN: {}",
                chrom, record
            ))
        })?;
    let pos = fields
        .next()
        .and_then(|pos| pos.parse::<u64>().ok())
        .ok_or_else(|| Error::Format(format!("no integer position in record: {}", record)))?;
    Ok((number, pos))
}

/// Helper wrapper that allows to sort records by position.
#[derive(Debug)]
pub struct ByPosition {
    pub key: (u32, u64),
    pub record: String,
}

impl TryFrom<String> for ByPosition {
    type Error = Error;

    fn try_from(record: String) -> Result<Self, Self::Error> {
        Ok(Self {
            key: position_key(&record)?,
            record,
        })
    }
}

impl PartialEq for ByPosition {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for ByPosition {}

impl PartialOrd for ByPosition {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ByPosition {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.key.cmp(&other.key)
    }
}

/// Stable sort of `records` by numeric chromosome, then position.
///
/// Fails without modifying `records` if any key cannot be extracted.
pub fn sort_by_position(records: &mut Vec<String>) -> Result<(), Error> {
    let mut keyed = records
        .iter()
        .cloned()
        .map(ByPosition::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    keyed.sort();
    *records = keyed.into_iter().map(|k| k.record).collect();
    Ok(())
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("chr1\t100\tA", Some((1, 100)))]
    #[case("chr22\t5", Some((22, 5)))]
    #[case("chrX\t100", None)]
    #[case("1\t100", None)]
    #[case("chr1", None)]
    #[case("chr1\tabc", None)]
    #[case("", None)]
    fn extract_key(#[case] record: &str, #[case] expected: Option<(u32, u64)>) {
        assert_eq!(position_key(record).ok(), expected);
    }

    #[test]
    fn numeric_not_lexicographic() -> Result<(), anyhow::Error> {
        let mut records = vec![
            "chr2\t100\tb".to_string(),
            "chr10\t100\tc".to_string(),
            "chr1\t100\ta".to_string(),
        ];
        sort_by_position(&mut records)?;
        assert_eq!(records, vec!["chr1\t100\ta", "chr2\t100\tb", "chr10\t100\tc"]);
        Ok(())
    }

    #[test]
    fn stable_for_equal_keys() -> Result<(), anyhow::Error> {
        let mut records = vec![
            "chr1\t200\tx".to_string(),
            "chr1\t20\tfirst".to_string(),
            "chr1\t20\tsecond".to_string(),
        ];
        sort_by_position(&mut records)?;
        assert_eq!(records, vec!["chr1\t20\tfirst", "chr1\t20\tsecond", "chr1\t200\tx"]);
        Ok(())
    }

    #[test]
    fn malformed_chromosome_fails() {
        let mut records = vec!["chr1\t1".to_string(), "chrY\t1".to_string()];
        let err = sort_by_position(&mut records).unwrap_err();
        assert!(matches!(err, Error::Format(_)));
        assert_eq!(records, vec!["chr1\t1", "chrY\t1"]);
    }
}
