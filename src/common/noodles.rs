//! Common utility code for noodles.
//!
//! Wraps the noodles VCF reader into a source of `RawVariant` values.

use std::{io::BufRead, path::Path};

use noodles_vcf as vcf;
use vcf::variant::record_buf::info::field::{value::Array, Value};

use super::io::open_read_maybe_gz;
use crate::annotation::RawVariant;

/// A stream of raw variants from one input file.
///
/// The underlying file handle is owned by the source and released when the
/// source is dropped, also when iteration stops on an error.
pub trait VariantSource: Iterator<Item = Result<RawVariant, std::io::Error>> {
    /// Description of INFO field `key` as declared in the header, if any.
    fn info_description(&self, key: &str) -> Option<String>;
}

/// `VariantSource` reading plain, gzip, or BGZF compressed VCF files.
pub struct VcfSource {
    reader: vcf::io::Reader<Box<dyn BufRead>>,
    header: vcf::Header,
    record: vcf::Record,
}

impl VcfSource {
    /// Open the file at `path` and read its header.
    pub fn open<P>(path: P) -> Result<Self, std::io::Error>
    where
        P: AsRef<Path>,
    {
        tracing::debug!("opening VCF file {:?}", path.as_ref());
        let mut reader = vcf::io::Reader::new(open_read_maybe_gz(path)?);
        let header = reader.read_header()?;
        Ok(Self {
            reader,
            header,
            record: vcf::Record::default(),
        })
    }

}

impl Iterator for VcfSource {
    type Item = Result<RawVariant, std::io::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.reader.read_record(&mut self.record) {
            Ok(0) => None,
            Ok(_) => Some(raw_variant_from_record(&self.header, &self.record)),
            Err(e) => Some(Err(e)),
        }
    }
}

impl VariantSource for VcfSource {
    fn info_description(&self, key: &str) -> Option<String> {
        self.header
            .infos()
            .get(key)
            .map(|info| info.description().to_string())
    }
}

/// Convert one lazily parsed record into a `RawVariant`.
fn raw_variant_from_record(
    header: &vcf::Header,
    record: &vcf::Record,
) -> Result<RawVariant, std::io::Error> {
    let record = vcf::variant::RecordBuf::try_from_variant_record(header, record)?;

    let info = record
        .info()
        .as_ref()
        .iter()
        .filter_map(|(key, value)| {
            value
                .as_ref()
                .map(|value| (key.clone(), info_value_to_strings(value)))
        })
        .collect();

    Ok(RawVariant {
        chrom: record.reference_sequence_name().to_string(),
        pos: record.variant_start().map(usize::from).unwrap_or_default(),
        reference: record.reference_bases().to_string(),
        alternatives: record.alternate_bases().as_ref().to_vec(),
        qual: record.quality_score(),
        info,
    })
}

/// Render an INFO value as the decoded text of its elements.
///
/// Flags have no elements, missing array entries become `"."`.
fn info_value_to_strings(value: &Value) -> Vec<String> {
    fn elements<T: ToString>(values: &[Option<T>]) -> Vec<String> {
        values
            .iter()
            .map(|value| match value {
                Some(value) => value.to_string(),
                None => ".".to_string(),
            })
            .collect()
    }

    match value {
        Value::Integer(value) => vec![value.to_string()],
        Value::Float(value) => vec![value.to_string()],
        Value::Flag => Vec::new(),
        Value::Character(value) => vec![value.to_string()],
        Value::String(value) => vec![value.clone()],
        Value::Array(Array::Integer(values)) => elements(values),
        Value::Array(Array::Float(values)) => elements(values),
        Value::Array(Array::Character(values)) => elements(values),
        Value::Array(Array::String(values)) => elements(values),
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::{info_value_to_strings, Array, Value, VariantSource, VcfSource};

    #[rstest::rstest]
    #[case("tests/data/compare_b.vcf")]
    #[case("tests/data/compare_b.vcf.gz")]
    fn read_plain_and_gzip(#[case] path: &str) -> Result<(), anyhow::Error> {
        let records = VcfSource::open(path)?.collect::<Result<Vec<_>, _>>()?;

        assert_eq!(records.len(), 4);
        assert_eq!(
            records
                .iter()
                .map(|r| (r.chrom.as_str(), r.pos))
                .collect::<Vec<_>>(),
            vec![("chr2", 150), ("chrX", 250), ("chr1", 350), ("chr2", 450)]
        );

        Ok(())
    }

    #[test]
    fn read_record_fields() -> Result<(), anyhow::Error> {
        let records = VcfSource::open("tests/data/single.vcf")?.collect::<Result<Vec<_>, _>>()?;
        assert_eq!(records.len(), 10);

        let first = &records[0];
        assert_eq!(first.chrom, "chr2");
        assert_eq!(first.pos, 100);
        assert_eq!(first.reference, "A");
        assert_eq!(first.alternatives, vec!["G".to_string()]);
        assert_eq!(first.qual, Some(50.0));
        assert_eq!(first.info.get("DP"), Some(&vec!["10".to_string()]));
        assert!(first
            .info
            .get("CSQ")
            .and_then(|csq| csq.first())
            .map(|csq| csq.starts_with("G|missense_variant|MODERATE|BRCA2|"))
            .unwrap_or(false));

        // missing QUAL
        assert_eq!(records[3].qual, None);
        // two stacked payloads are kept apart
        assert_eq!(records[4].info.get("CSQ").map(|csq| csq.len()), Some(2));
        // no CSQ at all
        assert_eq!(records[5].info.get("CSQ"), None);
        // ALT of "." yields no alternate alleles
        assert!(records[6].alternatives.is_empty());

        Ok(())
    }

    #[test]
    fn string_array_elements_are_kept_whole() {
        let value = Value::Array(Array::String(vec![
            Some("G|missense_variant|MODERATE|KIF1B,ALT".into()),
            None,
        ]));
        assert_eq!(
            info_value_to_strings(&value),
            vec!["G|missense_variant|MODERATE|KIF1B,ALT", "."]
        );
        assert!(info_value_to_strings(&Value::Flag).is_empty());
        assert_eq!(info_value_to_strings(&Value::Integer(7)), vec!["7"]);
    }

    #[test]
    fn info_description() -> Result<(), anyhow::Error> {
        let source = VcfSource::open("tests/data/single.vcf")?;

        let description = source.info_description("CSQ").expect("CSQ declared");
        assert!(description.starts_with("Consequence annotations from Ensembl VEP. Format: "));
        assert_eq!(source.info_description("ANN"), None);

        Ok(())
    }

    #[test]
    fn empty_file() -> Result<(), anyhow::Error> {
        let records = VcfSource::open("tests/data/empty.vcf")?.collect::<Result<Vec<_>, _>>()?;
        assert!(records.is_empty());

        Ok(())
    }

    #[test]
    fn broken_record_is_error() -> Result<(), anyhow::Error> {
        let mut source = VcfSource::open("tests/data/broken.vcf")?;
        assert!(matches!(source.next(), Some(Err(_))));

        Ok(())
    }

    #[test]
    fn missing_file_is_error() {
        assert!(VcfSource::open("tests/data/no-such-file.vcf").is_err());
    }
}
