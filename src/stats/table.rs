//! Count tables over classified variants and their top-N rankings.

use indexmap::IndexMap;

use crate::{
    annotation::{schema::field, ClassifiedVariant},
    err::Error,
};

/// Axis along which classified variants are counted.
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
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Dimension {
    Chromosome,
    /// SNP/INDEL from allele lengths.
    VariantType,
    Consequence,
    /// Molecular type as emitted by the annotator.
    MolecularType,
    Impact,
    Gene,
    /// Input file of the variant.
    Source,
}

impl Dimension {
    /// Annotation schema field the dimension is read from, if any.
    pub fn schema_field(&self) -> Option<&'static str> {
        match self {
            Dimension::Consequence => Some(field::CONSEQUENCE),
            Dimension::MolecularType => Some(field::MOLECULAR_TYPE),
            Dimension::Impact => Some(field::IMPACT),
            Dimension::Gene => Some(field::GENE),
            Dimension::Chromosome | Dimension::VariantType | Dimension::Source => None,
        }
    }

    /// Project `variant` onto this dimension.
    pub fn value<'a>(&self, variant: &'a ClassifiedVariant) -> Option<&'a str> {
        match self {
            Dimension::Chromosome => Some(variant.chrom.as_str()),
            Dimension::VariantType => Some(variant.variant_type.as_ref()),
            Dimension::Consequence => variant.consequence.as_deref(),
            Dimension::MolecularType => variant.molecular_type.as_deref(),
            Dimension::Impact => variant.impact.as_deref(),
            Dimension::Gene => variant.gene.as_deref(),
            Dimension::Source => variant.source.as_deref(),
        }
    }
}

/// Counts keyed by one value per dimension.
///
/// Keys are kept in the order in which they were first observed, which is the
/// tie-break order of all rankings derived from the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountTable {
    dimensions: Vec<Dimension>,
    counts: IndexMap<Vec<String>, usize>,
}

impl CountTable {
    /// Create an empty table over `dimensions`.
    pub fn new(dimensions: &[Dimension]) -> Self {
        Self {
            dimensions: dimensions.to_vec(),
            counts: IndexMap::new(),
        }
    }

    /// Add `count` to `key`, appending the key if it is new.
    ///
    /// `key` holds one value per dimension.
    fn add(&mut self, key: Vec<String>, count: usize) {
        *self.counts.entry(key).or_insert(0) += count;
    }

    /// Count `variant` unless one of its projected values is missing.
    ///
    /// Returns whether the variant was counted.
    pub fn observe(&mut self, variant: &ClassifiedVariant) -> bool {
        let key = self
            .dimensions
            .iter()
            .map(|dimension| dimension.value(variant).map(|s| s.to_string()))
            .collect::<Option<Vec<_>>>();
        match key {
            Some(key) => {
                self.add(key, 1);
                true
            }
            None => false,
        }
    }

    /// Count stored for `key`, zero if never observed.
    pub fn get(&self, key: &[&str]) -> usize {
        let key = key.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        self.counts.get(&key).copied().unwrap_or(0)
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all counts.
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    /// Iterate keys and counts in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&[String], usize)> {
        self.counts.iter().map(|(key, count)| (key.as_slice(), *count))
    }

    /// Position of `dimension` within the keys.
    pub fn axis(&self, dimension: Dimension) -> Result<usize, Error> {
        self.dimensions
            .iter()
            .position(|d| *d == dimension)
            .ok_or_else(|| Error::UnknownDimension(dimension.to_string()))
    }

    /// Add all counts of `other` into `self`.
    ///
    /// Keys new to `self` are appended in `other`'s first-seen order, so
    /// merging the tables of consecutive inputs equals aggregating their
    /// concatenation.
    pub fn merge(&mut self, other: &CountTable) -> Result<(), Error> {
        if self.dimensions != other.dimensions {
            return Err(Error::DimensionMismatch {
                expected: self.dimensions.iter().map(|d| d.to_string()).collect(),
                found: other.dimensions.iter().map(|d| d.to_string()).collect(),
            });
        }
        for (key, count) in &other.counts {
            self.add(key.clone(), *count);
        }
        Ok(())
    }

    /// Sum counts over all dimensions but `dimension`.
    pub fn project(&self, dimension: Dimension) -> Result<CountTable, Error> {
        let axis = self.axis(dimension)?;
        let mut result = CountTable::new(&[dimension]);
        for (key, count) in &self.counts {
            result.add(vec![key[axis].clone()], *count);
        }
        Ok(result)
    }

    /// Entries sorted by count descending, ties in first-seen order.
    pub fn ranked(&self) -> Vec<(&[String], usize)> {
        let mut entries = self.iter().collect::<Vec<_>>();
        // `sort_by` is stable
        entries.sort_by(|(_, lhs), (_, rhs)| rhs.cmp(lhs));
        entries
    }

    /// The `n` most frequent values of `dimension`.
    pub fn top_n(&self, dimension: Dimension, n: usize) -> Result<RankedTop, Error> {
        let projected = self.project(dimension)?;
        let entries = projected
            .ranked()
            .into_iter()
            .take(n)
            .map(|(key, count)| (key[0].clone(), count))
            .collect();
        Ok(RankedTop { dimension, entries })
    }
}

/// Fold `variants` into a table over `dimensions` in a single pass.
///
/// A variant is left out when any of its projected values is missing.
pub fn aggregate<'a, I>(variants: I, dimensions: &[Dimension]) -> CountTable
where
    I: IntoIterator<Item = &'a ClassifiedVariant>,
{
    let mut table = CountTable::new(dimensions);
    for variant in variants {
        table.observe(variant);
    }
    table
}

/// Several count tables filled from the same pass over the variants.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableSet {
    tables: IndexMap<Vec<Dimension>, CountTable>,
}

impl TableSet {
    /// Create empty tables, one per entry of `dimension_sets`.
    pub fn new(dimension_sets: &[Vec<Dimension>]) -> Self {
        Self {
            tables: dimension_sets
                .iter()
                .map(|dimensions| (dimensions.clone(), CountTable::new(dimensions)))
                .collect(),
        }
    }

    /// Count `variant` in every table.
    pub fn observe(&mut self, variant: &ClassifiedVariant) {
        for table in self.tables.values_mut() {
            table.observe(variant);
        }
    }

    pub fn get(&self, dimensions: &[Dimension]) -> Option<&CountTable> {
        self.tables.get(dimensions)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CountTable> {
        self.tables.values()
    }

    /// Merge every table of `other` into the table over the same dimensions.
    pub fn merge(&mut self, other: &TableSet) -> Result<(), Error> {
        for (dimensions, table) in &other.tables {
            match self.tables.get_mut(dimensions) {
                Some(mine) => mine.merge(table)?,
                None => {
                    self.tables.insert(dimensions.clone(), table.clone());
                }
            }
        }
        Ok(())
    }
}

/// Up to N `(category, count)` pairs, most frequent first.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct RankedTop {
    pub dimension: Dimension,
    pub entries: Vec<(String, usize)>,
}
