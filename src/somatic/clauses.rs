//! Predicates classifying hotspot and novel variants.

use crate::query::{Column, Expr};

/// Reference population databases used to identify common variants.
pub const COMMON_DATABASES: &[&str] = &["1kg", "exac", "esp"];

/// Default alternate allele frequency at and above which a variant is common.
pub const DEFAULT_MAX_AAF: f64 = 0.01;
/// Default minimal allele balance for hotspot variants.
pub const DEFAULT_HOTSPOT_MIN_ALLELE_BAL: f64 = 0.02;
/// Default minimal allele balance for novel variants.
pub const DEFAULT_NOVEL_MIN_ALLELE_BAL: f64 = 0.1;

/// Impact severity accepted for novel SNPs without further evidence.
pub const IMPACT_SEVERITY_HIGH: &str = "HIGH";
/// Impact severity accepted for novel SNPs with damaging predictions.
pub const IMPACT_SEVERITY_MED: &str = "MED";
/// SIFT prediction required for medium impact novel SNPs.
pub const SIFT_DELETERIOUS: &str = "deleterious";
/// PolyPhen prediction required for medium impact novel SNPs.
pub const POLYPHEN_PROBABLY_DAMAGING: &str = "probably_damaging";

/// The variant types for which novel variants are queried, in query order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum VariantType {
    Snp,
    Indel,
}

fn column(name: &str) -> Column {
    Column::from_static(name.to_string())
}

/// `NOT in_<db> OR aaf_<db>_all < aaf`: the variant is absent from or rare in `db`.
pub fn rare_or_absent(db: &str, aaf: f64) -> Expr {
    Expr::any([
        Expr::negate(Expr::flag(column(&format!("in_{}", db)))),
        Expr::lt(column(&format!("aaf_{}_all", db)), aaf),
    ])
}

/// True iff the variant is rare or absent in all of `COMMON_DATABASES`.
pub fn common_variant_exclusion(aaf: f64) -> Expr {
    Expr::all(COMMON_DATABASES.iter().map(|db| rare_or_absent(db, aaf)))
}

/// `<annotation> = 1` if `present`, else `<annotation> = 0`.
pub fn annotation_presence(annotation: &Column, present: bool) -> Expr {
    Expr::eq(annotation.clone(), if present { 1i64 } else { 0i64 })
}

/// The annotation is (or is not) set and the variant is not common.
pub fn annotation_and_not_common(annotation: &Column, present: bool, aaf: f64) -> Expr {
    Expr::all([
        annotation_presence(annotation, present),
        common_variant_exclusion(aaf),
    ])
}

/// High impact, or medium impact with damaging SIFT and PolyPhen predictions.
pub fn damaging_impact() -> Expr {
    Expr::any([
        Expr::eq(column("impact_severity"), IMPACT_SEVERITY_HIGH),
        Expr::all([
            Expr::eq(column("impact_severity"), IMPACT_SEVERITY_MED),
            Expr::eq(column("sift_pred"), SIFT_DELETERIOUS),
            Expr::eq(column("polyphen_pred"), POLYPHEN_PROBABLY_DAMAGING),
        ]),
    ])
}

/// Novel variants of `variant_type`: none of `annotations` set, allele balance
/// of at least `min_allele_bal`, not common.
///
/// SNPs additionally have to pass `damaging_impact()`. An empty `annotations`
/// list applies no annotation restriction at all.
pub fn novel_variant(
    annotations: &[Column],
    variant_type: VariantType,
    min_allele_bal: f64,
    aaf: f64,
) -> Expr {
    let mut conjuncts = vec![
        Expr::eq(column("type"), variant_type.to_string().as_str()),
        Expr::ge(column("allele_bal"), min_allele_bal),
        Expr::all(
            annotations
                .iter()
                .map(|annotation| annotation_presence(annotation, false)),
        ),
        common_variant_exclusion(aaf),
    ];
    if variant_type == VariantType::Snp {
        conjuncts.push(damaging_impact());
    }
    Expr::all(conjuncts)
}

/// Hotspot variants: `annotation` set, allele balance of at least
/// `min_allele_bal`, not common.
pub fn hotspot_variant(annotation: &Column, min_allele_bal: f64, aaf: f64) -> Expr {
    Expr::all([
        Expr::ge(column("allele_bal"), min_allele_bal),
        annotation_and_not_common(annotation, true, aaf),
    ])
}
