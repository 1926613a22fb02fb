//! The fixed set of tables reported for a run.

use indexmap::IndexMap;
use itertools::Itertools;
use strum::IntoEnumIterator;

use crate::{annotation::AnnotationSchema, common::version, err::Error};

use super::{
    chrom::sort_chroms,
    compare::{CombinedDataset, CombinedTables, SkippedFile},
    table::{CountTable, Dimension, TableSet},
};

/// Number of categories kept in the ranked tables by default.
pub const DEFAULT_TOP_N: usize = 10;

/// Display order of the well-known impact tiers.
pub const IMPACT_ORDER: &[&str] = &["HIGH", "MODERATE", "LOW", "MODIFIER"];

/// Tables of a summary, in output order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    serde::Serialize,
    strum::Display,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SummaryTable {
    /// Variants per chromosome.
    PerChrom,
    /// SNP vs. INDEL.
    RefaltType,
    /// Molecular type as emitted by the annotator.
    VepType,
    /// Most frequent consequences.
    VepConsequence,
    Impact,
    /// Most frequently hit genes.
    TopGenes,
}

impl SummaryTable {
    /// The dimension the table counts.
    pub fn dimension(&self) -> Dimension {
        match self {
            SummaryTable::PerChrom => Dimension::Chromosome,
            SummaryTable::RefaltType => Dimension::VariantType,
            SummaryTable::VepType => Dimension::MolecularType,
            SummaryTable::VepConsequence => Dimension::Consequence,
            SummaryTable::Impact => Dimension::Impact,
            SummaryTable::TopGenes => Dimension::Gene,
        }
    }

    /// Whether only the top-N categories are reported.
    pub fn is_ranked(&self) -> bool {
        matches!(self, SummaryTable::VepConsequence | SummaryTable::TopGenes)
    }

    /// Tables that `schema` can provide values for.
    pub fn available(schema: &AnnotationSchema) -> Vec<SummaryTable> {
        SummaryTable::iter()
            .filter(|table| {
                table
                    .dimension()
                    .schema_field()
                    .map(|name| schema.contains(name))
                    .unwrap_or(true)
            })
            .collect()
    }
}

/// Options for building a summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryOptions {
    /// Number of categories kept in ranked tables.
    pub top_n: usize,
    /// Break every table down by input file.
    pub split_by_source: bool,
}

impl Default for SummaryOptions {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
            split_by_source: false,
        }
    }
}

/// One line of a summary table.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Row {
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub count: usize,
}

/// Dimension lists to aggregate for the summary over `schema`.
pub fn dimension_sets(
    schema: &AnnotationSchema,
    options: &SummaryOptions,
) -> Vec<Vec<Dimension>> {
    let mut result = Vec::new();
    for table in SummaryTable::available(schema) {
        result.push(vec![table.dimension()]);
        if options.split_by_source {
            result.push(vec![table.dimension(), Dimension::Source]);
        }
    }
    result
}

/// Categories of a pooled one-dimensional table in display order.
fn display_order(
    table: SummaryTable,
    pooled: &CountTable,
    top_n: usize,
) -> Result<Vec<(String, usize)>, Error> {
    let ranked = || {
        pooled
            .ranked()
            .into_iter()
            .map(|(key, count)| (key[0].clone(), count))
            .collect::<Vec<_>>()
    };

    Ok(match table {
        SummaryTable::PerChrom => {
            let mut labels = pooled
                .iter()
                .map(|(key, _)| key[0].clone())
                .collect::<Vec<_>>();
            sort_chroms(&mut labels);
            labels
                .into_iter()
                .map(|label| {
                    let count = pooled.get(&[label.as_str()]);
                    (label, count)
                })
                .collect()
        }
        SummaryTable::Impact => {
            let mut entries = ranked();
            // stable, so unexpected tiers stay ranked by count
            entries.sort_by_key(|(category, _)| {
                IMPACT_ORDER
                    .iter()
                    .position(|tier| *tier == category.as_str())
                    .unwrap_or(IMPACT_ORDER.len())
            });
            entries
        }
        _ if table.is_ranked() => pooled.top_n(table.dimension(), top_n)?.entries,
        _ => ranked(),
    })
}

fn lookup<'a>(tables: &'a TableSet, dimensions: &[Dimension]) -> Result<&'a CountTable, Error> {
    tables
        .get(dimensions)
        .ok_or_else(|| Error::UnknownDimension(dimensions.iter().join("+")))
}

/// Tables of one run, handed to whatever renders them.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Summary {
    pub version: String,
    /// Input files that contributed, in input order.
    pub sources: Vec<String>,
    pub skipped: Vec<SkippedFile>,
    /// Number of classified variants.
    pub num_variants: usize,
    pub tables: IndexMap<SummaryTable, Vec<Row>>,
}

impl Summary {
    /// Build the summary from tables aggregated over `dimension_sets(schema, options)`.
    pub fn from_tables(
        tables: &TableSet,
        schema: &AnnotationSchema,
        sources: Vec<String>,
        skipped: Vec<SkippedFile>,
        options: &SummaryOptions,
    ) -> Result<Self, Error> {
        let mut result = Self {
            version: version().to_string(),
            num_variants: lookup(tables, &[Dimension::Chromosome])?.total(),
            sources,
            skipped,
            tables: IndexMap::new(),
        };

        for table in SummaryTable::available(schema) {
            let dimension = table.dimension();
            let pooled = lookup(tables, &[dimension])?;
            let order = display_order(table, pooled, options.top_n)?;

            let rows = if options.split_by_source {
                // categories are ranked on the pooled counts, then broken down
                let split = lookup(tables, &[dimension, Dimension::Source])?;
                let sources = result.sources.iter().unique().collect::<Vec<_>>();
                order
                    .iter()
                    .flat_map(|(category, _)| {
                        sources.iter().map(move |source| Row {
                            category: category.clone(),
                            source: Some(source.to_string()),
                            count: split.get(&[category.as_str(), source.as_str()]),
                        })
                    })
                    .collect()
            } else {
                order
                    .into_iter()
                    .map(|(category, count)| Row {
                        category,
                        source: None,
                        count,
                    })
                    .collect()
            };
            result.tables.insert(table, rows);
        }

        Ok(result)
    }

    /// Summarize a dataset read with `compare_files`.
    pub fn from_dataset(dataset: &CombinedDataset, options: &SummaryOptions) -> Result<Self, Error> {
        let tables = dataset.tables(&dimension_sets(&dataset.schema, options))?;
        Self::from_tables(
            &tables,
            &dataset.schema,
            dataset.sources.clone(),
            dataset.skipped.clone(),
            options,
        )
    }

    /// Summarize tables aggregated with `aggregate_files_parallel`.
    pub fn from_combined(
        combined: &CombinedTables,
        schema: &AnnotationSchema,
        options: &SummaryOptions,
    ) -> Result<Self, Error> {
        Self::from_tables(
            &combined.tables,
            schema,
            combined.sources.clone(),
            combined.skipped.clone(),
            options,
        )
    }

    pub fn rows(&self, table: SummaryTable) -> Option<&[Row]> {
        self.tables.get(&table).map(|rows| rows.as_slice())
    }
}
