//! Command line interface for `single` and `compare`.

use std::time::Instant;

use clap::Parser;
use thousands::Separable;

use crate::{
    annotation::{
        classify::DEFAULT_ANNOTATION_KEY, schema::DEFAULT_PRESET, AnnotationSchema,
        ClassifyOptions,
    },
    common::{expand_at_paths, load_json_or_at_path},
};

use super::{
    compare::{
        aggregate_files_parallel, compare_files, unique_paths, CompareOptions, ErrorPolicy,
    },
    output::write_summary,
    summary::{dimension_sets, Summary, SummaryOptions, DEFAULT_TOP_N},
};

/// Options shared by all statistics commands.
#[derive(clap::Args, Debug, Clone)]
pub struct StatsArgs {
    /// Annotation schema: name of a preset, a JSON document, or `@path` to a
    /// JSON file.
    #[arg(long, default_value = DEFAULT_PRESET)]
    pub schema: String,
    /// INFO key carrying the annotation payload.
    #[arg(long, default_value = DEFAULT_ANNOTATION_KEY)]
    pub annotation_key: String,
    /// Check schema indices against the format declared in the VCF header.
    #[arg(long)]
    pub strict: bool,
    /// Number of categories in the consequence and gene rankings.
    #[arg(long, default_value_t = DEFAULT_TOP_N)]
    pub top_n: usize,
    /// Keep empty annotation values instead of treating them as missing.
    #[arg(long)]
    pub keep_empty: bool,
}

impl Default for StatsArgs {
    fn default() -> Self {
        Self {
            schema: DEFAULT_PRESET.to_string(),
            annotation_key: DEFAULT_ANNOTATION_KEY.to_string(),
            strict: false,
            top_n: DEFAULT_TOP_N,
            keep_empty: false,
        }
    }
}

impl StatsArgs {
    fn compare_options(&self, policy: ErrorPolicy, tag_source: bool) -> CompareOptions {
        CompareOptions {
            classify: ClassifyOptions {
                annotation_key: self.annotation_key.clone(),
                keep_empty: self.keep_empty,
            },
            policy,
            strict: self.strict,
            tag_source,
        }
    }
}

/// Command line arguments for `single` sub command.
#[derive(Parser, Debug)]
#[command(about = "Summarize one annotated VCF file", long_about = None)]
pub struct SingleArgs {
    /// Path to the input VCF file, optionally gzip or BGZF compressed.
    #[arg(long)]
    pub path_input: String,
    /// Prefix of the output files.
    #[arg(long)]
    pub out_prefix: String,

    #[command(flatten)]
    pub stats: StatsArgs,
}

/// Command line arguments for `compare` sub command.
#[derive(Parser, Debug)]
#[command(about = "Compare annotated VCF files", long_about = None)]
pub struct CompareArgs {
    /// Input VCF files, prefix with `@` for a file with line-wise paths.
    #[arg(long, required = true, num_args = 1..)]
    pub path_input: Vec<String>,
    /// Prefix of the output files.
    #[arg(long)]
    pub out_prefix: String,
    /// Leave out unreadable files instead of failing.
    #[arg(long)]
    pub skip_unreadable: bool,
    /// Number of threads for reading files in parallel.
    #[arg(long)]
    pub num_threads: Option<usize>,

    #[command(flatten)]
    pub stats: StatsArgs,
}

/// Load the schema given as preset name, JSON, or `@path`.
pub fn load_schema(value: &str) -> Result<AnnotationSchema, anyhow::Error> {
    if let Some(schema) = AnnotationSchema::preset(value) {
        return Ok(schema);
    }
    load_json_or_at_path(value).map_err(|e| {
        anyhow::anyhow!(
            "{} is neither a schema preset nor a valid schema: {}",
            value,
            e
        )
    })
}

fn log_summary(summary: &Summary) {
    tracing::info!(
        "summarized {} variants from {} file(s)",
        summary.num_variants.separate_with_commas(),
        summary.sources.len()
    );
    for skipped in &summary.skipped {
        tracing::warn!("skipped {}: {}", &skipped.path, &skipped.reason);
    }
    for (table, rows) in &summary.tables {
        tracing::debug!("  {}: {} rows", table, rows.len());
    }
}

/// Main entry point for `single` sub command.
pub fn run_single(
    common_args: &crate::common::Args,
    args: &SingleArgs,
) -> Result<(), anyhow::Error> {
    let before_anything = Instant::now();
    tracing::info!("Starting `single`");
    tracing::info!("  common_args = {:?}", &common_args);
    tracing::info!("  args = {:?}", &args);

    let schema = load_schema(&args.stats.schema)?;
    tracing::debug!("schema = {:?}", &schema);

    let dataset = compare_files(
        &[args.path_input.clone()],
        &schema,
        &args.stats.compare_options(ErrorPolicy::FailFast, false),
    )?;
    let summary = Summary::from_dataset(
        &dataset,
        &SummaryOptions {
            top_n: args.stats.top_n,
            split_by_source: false,
        },
    )?;
    log_summary(&summary);

    let written = write_summary(&args.out_prefix, &summary)?;
    tracing::info!("wrote {} files with prefix {}", written.len(), &args.out_prefix);

    tracing::info!(
        "All of `single` completed in {:?}",
        before_anything.elapsed()
    );
    Ok(())
}

/// Main entry point for `compare` sub command.
pub fn run_compare(
    common_args: &crate::common::Args,
    args: &CompareArgs,
) -> Result<(), anyhow::Error> {
    let before_anything = Instant::now();
    tracing::info!("Starting `compare`");
    tracing::info!("  common_args = {:?}", &common_args);
    tracing::info!("  args = {:?}", &args);

    let schema = load_schema(&args.stats.schema)?;
    tracing::debug!("schema = {:?}", &schema);

    // Build path of all input files to read, read through files given by `@path`.
    let paths = unique_paths(&expand_at_paths(&args.path_input)?);
    tracing::info!("final input file list is (#: {}): {:?}", paths.len(), &paths);
    if paths.is_empty() {
        tracing::warn!("no input files given, writing empty summary");
    }

    let policy = if args.skip_unreadable {
        ErrorPolicy::SkipUnreadable
    } else {
        ErrorPolicy::FailFast
    };
    let compare_options = args.stats.compare_options(policy, true);
    let summary_options = SummaryOptions {
        top_n: args.stats.top_n,
        split_by_source: true,
    };
    let dimensions = dimension_sets(&schema, &summary_options);

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(num_threads) = args.num_threads {
        builder = builder.num_threads(num_threads);
    }
    let pool = builder
        .build()
        .map_err(|e| anyhow::anyhow!("building Rayon thread pool failed: {}", e))?;

    let before_reading = Instant::now();
    let combined = pool.install(|| {
        aggregate_files_parallel(&paths, &schema, &compare_options, &dimensions)
    })?;
    tracing::info!("... done reading files in {:?}", before_reading.elapsed());

    let summary = Summary::from_combined(&combined, &schema, &summary_options)?;
    log_summary(&summary);

    let written = write_summary(&args.out_prefix, &summary)?;
    tracing::info!("wrote {} files with prefix {}", written.len(), &args.out_prefix);

    tracing::info!(
        "All of `compare` completed in {:?}",
        before_anything.elapsed()
    );
    Ok(())
}
