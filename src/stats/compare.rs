//! Classification of one or more VCF files into a combined, comparable dataset.

use rayon::prelude::*;
use thousands::Separable;

use crate::{
    annotation::{classify, AnnotationFormat, AnnotationSchema, ClassifiedVariant, ClassifyOptions},
    common::noodles::{VariantSource, VcfSource},
    err::Error,
};

use super::table::{aggregate, CountTable, Dimension, TableSet};

/// What to do when an input file cannot be read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Abort the whole run.
    #[default]
    FailFast,
    /// Leave the file out and continue with the next one.
    SkipUnreadable,
}

/// Options for reading input files.
#[derive(Debug, Clone, Default)]
pub struct CompareOptions {
    pub classify: ClassifyOptions,
    pub policy: ErrorPolicy,
    /// Validate the schema against the header's annotation format.
    pub strict: bool,
    /// Tag each variant with the path of its input file.
    pub tag_source: bool,
}

/// An input file left out under `ErrorPolicy::SkipUnreadable`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SkippedFile {
    pub path: String,
    pub reason: String,
}

/// Classified variants of all input files, in input order.
#[derive(Debug, Clone)]
pub struct CombinedDataset {
    /// Schema the variants were classified with.
    pub schema: AnnotationSchema,
    /// Files that were read, in input order.
    pub sources: Vec<String>,
    /// Files left out because they could not be read.
    pub skipped: Vec<SkippedFile>,
    /// Variants of the first file, then of the second, etc.
    pub variants: Vec<ClassifiedVariant>,
}

impl CombinedDataset {
    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    /// Aggregate the dataset over `dimensions`.
    ///
    /// Requesting an annotation dimension the schema does not bind is an
    /// error.
    pub fn table(&self, dimensions: &[Dimension]) -> Result<CountTable, Error> {
        check_dimensions(&self.schema, dimensions)?;
        Ok(aggregate(&self.variants, dimensions))
    }

    /// Aggregate the dataset into one table per entry of `dimension_sets`.
    pub fn tables(&self, dimension_sets: &[Vec<Dimension>]) -> Result<TableSet, Error> {
        for dimensions in dimension_sets {
            check_dimensions(&self.schema, dimensions)?;
        }
        let mut tables = TableSet::new(dimension_sets);
        for variant in &self.variants {
            tables.observe(variant);
        }
        Ok(tables)
    }
}

/// Tables aggregated per file and merged in input order.
#[derive(Debug, Clone)]
pub struct CombinedTables {
    pub sources: Vec<String>,
    pub skipped: Vec<SkippedFile>,
    pub tables: TableSet,
}

/// Drop repeated paths, keeping the first occurrence of each.
///
/// Reading a file twice would count its records twice under the same source.
pub fn unique_paths(paths: &[String]) -> Vec<String> {
    let mut seen = indexmap::IndexSet::new();
    for path in paths {
        if !seen.insert(path.clone()) {
            tracing::warn!("{} given more than once, reading it only once", path);
        }
    }
    seen.into_iter().collect()
}

/// Fail with `UnknownSchemaField` if `schema` cannot provide a dimension.
pub fn check_dimensions(schema: &AnnotationSchema, dimensions: &[Dimension]) -> Result<(), Error> {
    for dimension in dimensions {
        if let Some(name) = dimension.schema_field() {
            if !schema.contains(name) {
                return Err(Error::UnknownSchemaField(name.to_string()));
            }
        }
    }
    Ok(())
}

/// Classify all records of `source`, handing each to `sink`.
///
/// Returns the number of records read.
fn scan_source<S, F>(
    mut source: S,
    path: &str,
    schema: &AnnotationSchema,
    options: &CompareOptions,
    mut sink: F,
) -> Result<usize, Error>
where
    S: VariantSource,
    F: FnMut(ClassifiedVariant),
{
    if options.strict {
        let format = source
            .info_description(&options.classify.annotation_key)
            .and_then(|description| AnnotationFormat::from_description(&description));
        match format {
            Some(format) => schema.validate_against(&format)?,
            None => tracing::warn!(
                "{} declares no format for INFO/{}, cannot validate schema",
                path,
                &options.classify.annotation_key
            ),
        }
    }

    let tag = if options.tag_source { Some(path) } else { None };
    let mut prev = std::time::Instant::now();
    let mut count = 0usize;
    for raw in source.by_ref() {
        let raw = raw.map_err(|e| Error::FileUnreadable {
            path: path.to_string(),
            source: e,
        })?;
        sink(classify(&raw, schema, tag, &options.classify));
        count += 1;

        if prev.elapsed().as_secs() >= 60 {
            tracing::info!("at {}:{}", &raw.chrom, raw.pos);
            prev = std::time::Instant::now();
        }
    }
    Ok(count)
}

/// Open `path` with `open` and scan it, mapping open failures.
fn scan_file<S, O, F>(
    path: &str,
    schema: &AnnotationSchema,
    options: &CompareOptions,
    open: &O,
    sink: F,
) -> Result<usize, Error>
where
    S: VariantSource,
    O: Fn(&str) -> Result<S, std::io::Error>,
    F: FnMut(ClassifiedVariant),
{
    tracing::info!("processing {} ...", path);
    let before = std::time::Instant::now();
    let source = open(path).map_err(|e| Error::FileUnreadable {
        path: path.to_string(),
        source: e,
    })?;
    let count = scan_source(source, path, schema, options, sink)?;
    tracing::info!(
        "... read {} records from {} in {:?}",
        count.separate_with_commas(),
        path,
        before.elapsed()
    );
    Ok(count)
}

/// Apply the error policy to the outcome of reading one file.
///
/// Returns `Ok(None)` for a skipped file.
fn apply_policy<T>(
    result: Result<T, Error>,
    policy: ErrorPolicy,
    skipped: &mut Vec<SkippedFile>,
) -> Result<Option<T>, Error> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(Error::FileUnreadable { path, source }) if policy == ErrorPolicy::SkipUnreadable => {
            tracing::warn!("skipping unreadable file {}: {}", &path, &source);
            skipped.push(SkippedFile {
                path,
                reason: source.to_string(),
            });
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Classify the records of all `paths` in order, opening files with `open`.
pub fn compare_files_with<S, O>(
    paths: &[String],
    schema: &AnnotationSchema,
    options: &CompareOptions,
    open: O,
) -> Result<CombinedDataset, Error>
where
    S: VariantSource,
    O: Fn(&str) -> Result<S, std::io::Error>,
{
    let mut result = CombinedDataset {
        schema: schema.clone(),
        sources: Vec::new(),
        skipped: Vec::new(),
        variants: Vec::new(),
    };

    for path in paths {
        // records of a file are only kept once the whole file has been read
        let mut file_variants = Vec::new();
        let scanned = scan_file(path, schema, options, &open, |variant| {
            file_variants.push(variant)
        });
        if apply_policy(scanned, options.policy, &mut result.skipped)?.is_some() {
            result.sources.push(path.clone());
            result.variants.append(&mut file_variants);
        }
    }

    Ok(result)
}

/// Classify the records of all VCF files in `paths` in order.
pub fn compare_files(
    paths: &[String],
    schema: &AnnotationSchema,
    options: &CompareOptions,
) -> Result<CombinedDataset, Error> {
    compare_files_with(paths, schema, options, |path: &str| VcfSource::open(path))
}

/// Aggregate each file on its own rayon task, then merge in input order.
///
/// Tables are merged before any ranking is derived, so the result equals
/// `compare_files(..).tables(..)`.
pub fn aggregate_files_parallel_with<S, O>(
    paths: &[String],
    schema: &AnnotationSchema,
    options: &CompareOptions,
    dimension_sets: &[Vec<Dimension>],
    open: O,
) -> Result<CombinedTables, Error>
where
    S: VariantSource,
    O: Fn(&str) -> Result<S, std::io::Error> + Sync,
{
    for dimensions in dimension_sets {
        check_dimensions(schema, dimensions)?;
    }

    let per_file = paths
        .par_iter()
        .map(|path| {
            let mut tables = TableSet::new(dimension_sets);
            scan_file(path, schema, options, &open, |variant| {
                tables.observe(&variant)
            })
            .map(|_| tables)
        })
        .collect::<Vec<_>>();

    let mut result = CombinedTables {
        sources: Vec::new(),
        skipped: Vec::new(),
        tables: TableSet::new(dimension_sets),
    };
    for (path, file_tables) in paths.iter().zip(per_file) {
        if let Some(file_tables) = apply_policy(file_tables, options.policy, &mut result.skipped)? {
            result.sources.push(path.clone());
            result.tables.merge(&file_tables)?;
        }
    }

    Ok(result)
}

/// Aggregate the VCF files in `paths` in parallel.
pub fn aggregate_files_parallel(
    paths: &[String],
    schema: &AnnotationSchema,
    options: &CompareOptions,
    dimension_sets: &[Vec<Dimension>],
) -> Result<CombinedTables, Error> {
    aggregate_files_parallel_with(paths, schema, options, dimension_sets, |path: &str| {
        VcfSource::open(path)
    })
}
