//! Classification of raw VCF records into `ClassifiedVariant` values.

use indexmap::IndexMap;

use super::schema::{field, AnnotationSchema};

/// INFO key conventionally holding the VEP annotation payload.
pub const DEFAULT_ANNOTATION_KEY: &str = "CSQ";

/// One VCF record as handed out by the reader.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawVariant {
    /// Chromosome label as written in the file.
    pub chrom: String,
    /// 1-based position.
    pub pos: usize,
    /// Reference allele.
    pub reference: String,
    /// Alternate alleles, empty for no-call sites.
    pub alternatives: Vec<String>,
    /// Quality score.
    pub qual: Option<f32>,
    /// INFO values as decoded strings, one entry per value of the field.
    /// Flags have no entries.
    pub info: IndexMap<String, Vec<String>>,
}

/// Structural type derived from allele lengths.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    serde::Serialize,
    serde::Deserialize,
    strum::Display,
    strum::AsRefStr,
    strum::EnumString,
)]
pub enum VariantType {
    #[strum(serialize = "SNP")]
    #[serde(rename = "SNP")]
    Snp,
    #[strum(serialize = "INDEL")]
    #[serde(rename = "INDEL")]
    Indel,
}

impl VariantType {
    /// SNP iff both the reference and the first alternate allele have
    /// length one; a missing alternate counts as length zero.
    pub fn from_alleles(reference: &str, alternatives: &[String]) -> Self {
        let alt_len = alternatives.first().map(|alt| alt.len()).unwrap_or(0);
        if reference.len() == 1 && alt_len == 1 {
            VariantType::Snp
        } else {
            VariantType::Indel
        }
    }
}

/// Options for `classify`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifyOptions {
    /// INFO key holding the annotation payload.
    pub annotation_key: String,
    /// Keep empty annotation values instead of mapping them to `None`.
    pub keep_empty: bool,
}

impl Default for ClassifyOptions {
    fn default() -> Self {
        Self {
            annotation_key: DEFAULT_ANNOTATION_KEY.to_string(),
            keep_empty: false,
        }
    }
}

/// Normalized per-variant annotation, immutable once built.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ClassifiedVariant {
    pub chrom: String,
    pub pos: usize,
    pub qual: Option<f32>,
    pub variant_type: VariantType,
    pub consequence: Option<String>,
    pub molecular_type: Option<String>,
    pub impact: Option<String>,
    pub gene: Option<String>,
    /// Input file the variant came from; `None` for single-file runs.
    pub source: Option<String>,
}

/// Return the first annotation payload of `raw`, if any.
///
/// Only the first of several per-transcript payloads is used.  Empty and
/// missing (`.`) payloads count as absent.
fn first_payload<'a>(raw: &'a RawVariant, annotation_key: &str) -> Option<&'a str> {
    raw.info
        .get(annotation_key)
        .and_then(|values| values.first())
        .map(|payload| payload.as_str())
        .filter(|payload| !payload.is_empty() && *payload != ".")
}

/// Classify `raw` using `schema`, tagging the result with `source`.
///
/// Fields missing from the schema are read as `None`.
pub fn classify(
    raw: &RawVariant,
    schema: &AnnotationSchema,
    source: Option<&str>,
    options: &ClassifyOptions,
) -> ClassifiedVariant {
    let payload = first_payload(raw, &options.annotation_key);
    let lookup = |name: &str| -> Option<String> {
        schema
            .get(name)?
            .segment(payload?)
            .filter(|value| options.keep_empty || !value.is_empty())
            .map(|value| value.to_string())
    };

    ClassifiedVariant {
        chrom: raw.chrom.clone(),
        pos: raw.pos,
        qual: raw.qual,
        variant_type: VariantType::from_alleles(&raw.reference, &raw.alternatives),
        consequence: lookup(field::CONSEQUENCE),
        molecular_type: lookup(field::MOLECULAR_TYPE),
        impact: lookup(field::IMPACT),
        gene: lookup(field::GENE),
        source: source.map(|s| s.to_string()),
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::annotation::schema::FieldSpec;

    fn raw(reference: &str, alternatives: &[&str], csq: Option<&str>) -> RawVariant {
        let mut info = IndexMap::new();
        if let Some(csq) = csq {
            info.insert(
                "CSQ".to_string(),
                csq.split(',').map(|s| s.to_string()).collect(),
            );
        }
        RawVariant {
            chrom: "chr17".into(),
            pos: 43_045_712,
            reference: reference.into(),
            alternatives: alternatives.iter().map(|s| s.to_string()).collect(),
            qual: Some(50.0),
            info,
        }
    }

    fn schema() -> AnnotationSchema {
        AnnotationSchema::new(vec![
            FieldSpec::new(field::CONSEQUENCE, 1, None),
            FieldSpec::new(field::IMPACT, 2, None),
            FieldSpec::new(field::GENE, 3, None),
        ])
        .unwrap()
    }

    #[rstest::rstest]
    #[case("A", &["G"], VariantType::Snp)]
    #[case("A", &["GT"], VariantType::Indel)]
    #[case("AT", &["A"], VariantType::Indel)]
    #[case("AT", &["GC"], VariantType::Indel)]
    #[case("A", &[], VariantType::Indel)]
    #[case("A", &["G", "TT"], VariantType::Snp)]
    #[case("A", &["TT", "G"], VariantType::Indel)]
    fn variant_type(
        #[case] reference: &str,
        #[case] alternatives: &[&str],
        #[case] expected: VariantType,
    ) {
        let actual = classify(
            &raw(reference, alternatives, None),
            &schema(),
            None,
            &Default::default(),
        );
        assert_eq!(actual.variant_type, expected);
    }

    #[test]
    fn annotation_fields() {
        let actual = classify(
            &raw("A", &["G"], Some("X|missense_variant|MODERATE|BRCA1")),
            &schema(),
            Some("a.vcf"),
            &Default::default(),
        );

        assert_eq!(
            actual,
            ClassifiedVariant {
                chrom: "chr17".into(),
                pos: 43_045_712,
                qual: Some(50.0),
                variant_type: VariantType::Snp,
                consequence: Some("missense_variant".into()),
                molecular_type: None,
                impact: Some("MODERATE".into()),
                gene: Some("BRCA1".into()),
                source: Some("a.vcf".into()),
            }
        );
    }

    #[test]
    fn short_payload() {
        let actual = classify(
            &raw("A", &["G"], Some("X|intron_variant")),
            &schema(),
            None,
            &Default::default(),
        );
        assert_eq!(actual.consequence.as_deref(), Some("intron_variant"));
        assert_eq!(actual.impact, None);
        assert_eq!(actual.gene, None);
    }

    #[rstest::rstest]
    #[case(None)]
    #[case(Some(""))]
    #[case(Some("."))]
    fn missing_payload(#[case] csq: Option<&str>) {
        let actual = classify(&raw("A", &["G"], csq), &schema(), None, &Default::default());
        assert_eq!(actual.consequence, None);
        assert_eq!(actual.impact, None);
        assert_eq!(actual.gene, None);
        assert_eq!(actual.source, None);
    }

    #[test]
    fn only_first_payload_used() {
        let actual = classify(
            &raw(
                "A",
                &["G"],
                Some("G|missense_variant|MODERATE|BRCA1,G|intron_variant|MODIFIER|NBR2"),
            ),
            &schema(),
            None,
            &Default::default(),
        );
        assert_eq!(actual.consequence.as_deref(), Some("missense_variant"));
        assert_eq!(actual.gene.as_deref(), Some("BRCA1"));
    }

    #[test]
    fn payload_with_decoded_comma() {
        let mut variant = raw("A", &["G"], None);
        variant.info.insert(
            "CSQ".into(),
            vec![
                "G|missense_variant|MODERATE|KIF1B,ALT".into(),
                "G|intron_variant|MODIFIER|PGD".into(),
            ],
        );
        let actual = classify(&variant, &schema(), None, &Default::default());
        assert_eq!(actual.consequence.as_deref(), Some("missense_variant"));
        assert_eq!(actual.gene.as_deref(), Some("KIF1B,ALT"));
    }

    #[rstest::rstest]
    #[case(false, None)]
    #[case(true, Some(""))]
    fn empty_gene(#[case] keep_empty: bool, #[case] expected: Option<&str>) {
        let options = ClassifyOptions {
            keep_empty,
            ..Default::default()
        };
        let actual = classify(
            &raw("A", &["G"], Some("G|intergenic_variant|MODIFIER|")),
            &schema(),
            None,
            &options,
        );
        assert_eq!(actual.gene.as_deref(), expected);
        assert_eq!(actual.impact.as_deref(), Some("MODIFIER"));
    }

    #[test]
    fn molecular_type_when_configured() {
        let schema = schema().with_field(FieldSpec::new(field::MOLECULAR_TYPE, 4, None));
        let actual = classify(
            &raw("A", &["G"], Some("G|missense_variant|MODERATE|BRCA1|SNV")),
            &schema,
            None,
            &Default::default(),
        );
        assert_eq!(actual.molecular_type.as_deref(), Some("SNV"));
    }

    #[test]
    fn custom_annotation_key() {
        let mut variant = raw("A", &["G"], None);
        variant
            .info
            .insert("ANN".into(), vec!["G|stop_gained|HIGH|TP53".into()]);
        let options = ClassifyOptions {
            annotation_key: "ANN".into(),
            ..Default::default()
        };
        let actual = classify(&variant, &schema(), None, &options);
        assert_eq!(actual.consequence.as_deref(), Some("stop_gained"));
        assert_eq!(actual.impact.as_deref(), Some("HIGH"));
    }

    #[test]
    fn variant_type_display() {
        assert_eq!(VariantType::Snp.to_string(), "SNP");
        assert_eq!(VariantType::Indel.as_ref(), "INDEL");
        assert_eq!("SNP".parse::<VariantType>().unwrap(), VariantType::Snp);
    }
}
