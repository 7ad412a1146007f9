//! Formatting of result rows for output.

use itertools::Itertools;

use crate::err::Error;
use crate::query::Query;
use crate::store::{Row, Value};

/// Turns result rows into output lines.
pub trait RowFormat {
    /// Header lines written before any row, without trailing newline.
    fn header(&self, query: &Query) -> String;
    /// A single output line, without trailing newline.
    fn format(&self, row: &Row) -> Result<String, Error>;
}

/// Tab-separated column values.
#[derive(Debug, Default, Clone)]
pub struct DefaultRowFormat;

impl RowFormat for DefaultRowFormat {
    fn header(&self, query: &Query) -> String {
        query.selections.iter().join("\t")
    }

    fn format(&self, row: &Row) -> Result<String, Error> {
        Ok(row.to_string())
    }
}

/// Minimal VCF lines built from `chrom, start, end, ref, alt`.
///
/// GEMINI coordinates are 0-based half-open, so `POS` is `start + 1`.
/// Additional columns are written to `INFO` as `key=value`.
#[derive(Debug, Clone)]
pub struct VcfRowFormat {
    /// Path of the source database, recorded in the header.
    pub source_db: String,
}

impl VcfRowFormat {
    pub fn new(source_db: &str) -> Self {
        Self {
            source_db: source_db.to_string(),
        }
    }
}

const VCF_CORE_COLUMNS: &[&str] = &["chrom", "start", "end", "ref", "alt"];

fn required<'a>(row: &'a Row, name: &str) -> Result<&'a Value, Error> {
    row.get(name)
        .ok_or_else(|| Error::Format(format!("column {} missing for VCF output: {}", name, row)))
}

impl RowFormat for VcfRowFormat {
    fn header(&self, _query: &Query) -> String {
        [
            "##fileformat=VCFv4.1".to_string(),
            format!("##source=gemini-ops {}", crate::common::VERSION),
            format!("##gemini_db={}", self.source_db),
            "##INFO=<ID=END,Number=1,Type=Integer,Description=\"End position of the variant\">"
                .to_string(),
            "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO".to_string(),
        ]
        .join("\n")
    }

    fn format(&self, row: &Row) -> Result<String, Error> {
        let start = required(row, "start")?
            .as_i64()
            .ok_or_else(|| Error::Format(format!("non-integer start in {}", row)))?;
        let info = std::iter::once(format!("END={}", required(row, "end")?))
            .chain(
                row.columns
                    .iter()
                    .filter(|(key, _)| !VCF_CORE_COLUMNS.contains(&key.as_str()))
                    .map(|(key, value)| format!("{}={}", key, value)),
            )
            .join(";");

        Ok([
            required(row, "chrom")?.to_string(),
            (start + 1).to_string(),
            ".".to_string(),
            required(row, "ref")?.to_string(),
            required(row, "alt")?.to_string(),
            ".".to_string(),
            "PASS".to_string(),
            info,
        ]
        .join("\t"))
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;

    fn row() -> Row {
        Row {
            columns: vec![
                ("chrom".into(), Value::from("chr7")),
                ("start".into(), Value::Integer(55249070)),
                ("end".into(), Value::Integer(55249071)),
                ("ref".into(), Value::from("C")),
                ("alt".into(), Value::from("T")),
                ("gene".into(), Value::from("EGFR")),
            ],
        }
    }

    #[test]
    fn default_format() -> Result<(), anyhow::Error> {
        assert_eq!(
            DefaultRowFormat.format(&row())?,
            "chr7\t55249070\t55249071\tC\tT\tEGFR"
        );
        assert_eq!(
            DefaultRowFormat.header(&Query::base_variants()),
            "chrom\tstart\tend\tref\talt"
        );
        Ok(())
    }

    #[test]
    fn vcf_format() -> Result<(), anyhow::Error> {
        let format = VcfRowFormat::new("sample.db");
        assert_eq!(
            format.format(&row())?,
            "chr7\t55249071\t.\tC\tT\t.\tPASS\tEND=55249071;gene=EGFR"
        );
        assert!(format
            .header(&Query::base_variants())
            .ends_with("#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO"));
        Ok(())
    }

    #[test]
    fn vcf_format_requires_core_columns() {
        let mut row = row();
        row.columns.retain(|(key, _)| key != "alt");
        assert!(matches!(
            VcfRowFormat::new("x").format(&row),
            Err(Error::Format(_))
        ));
    }
}
