//! Display order of chromosome labels.

/// Prefix stripped from chromosome labels before ordering.
pub const CHROM_PREFIX: &str = "chr";

/// Sort key for chromosome labels.
///
/// Numeric chromosomes come first in numeric order, then X and Y, then all
/// other labels in lexical order.  The variant order of the enum is the tier
/// order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ChromKey {
    /// Numeric chromosome; the text breaks ties such as `01` vs. `1`.
    Numeric(u64, String),
    /// `X` is 0, `Y` is 1.
    Sex(u8),
    Other(String),
}

/// Compute the sort key of `label` after stripping `prefix`.
pub fn chrom_key_with_prefix(label: &str, prefix: &str) -> ChromKey {
    let name = label.strip_prefix(prefix).unwrap_or(label);
    if !name.is_empty() && name.bytes().all(|b| b.is_ascii_digit()) {
        // labels too long for u64 are not chromosome numbers
        if let Ok(value) = name.parse::<u64>() {
            return ChromKey::Numeric(value, name.to_string());
        }
    }
    match name {
        "X" => ChromKey::Sex(0),
        "Y" => ChromKey::Sex(1),
        _ => ChromKey::Other(name.to_string()),
    }
}

/// Compute the sort key of `label`, stripping a leading `chr`.
pub fn chrom_key(label: &str) -> ChromKey {
    chrom_key_with_prefix(label, CHROM_PREFIX)
}

/// Sort chromosome labels in display order; the sort is stable.
pub fn sort_chroms<S>(labels: &mut [S])
where
    S: AsRef<str>,
{
    labels.sort_by_cached_key(|label| chrom_key(label.as_ref()));
}
