//! Writing of summaries to TSV and JSON files.

use std::io::Write;

use crate::common::io::open_write_maybe_gz;

use super::summary::{Row, Summary, SummaryTable};

/// Path of the TSV file for `table`.
pub fn table_path(prefix: &str, table: SummaryTable) -> String {
    format!("{}_{}.tsv", prefix, table)
}

/// Path of the JSON file with the full summary.
pub fn summary_path(prefix: &str) -> String {
    format!("{}_summary.json", prefix)
}

/// Write `rows` as TSV with a header line.
///
/// The `source` column is written when any row carries a source.
pub fn write_rows<W>(writer: W, rows: &[Row]) -> Result<(), anyhow::Error>
where
    W: Write,
{
    let with_source = rows.iter().any(|row| row.source.is_some());
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .from_writer(writer);

    if with_source {
        writer.write_record(["category", "source", "count"])?;
    } else {
        writer.write_record(["category", "count"])?;
    }
    for row in rows {
        let count = row.count.to_string();
        if with_source {
            writer.write_record([
                row.category.as_str(),
                row.source.as_deref().unwrap_or_default(),
                count.as_str(),
            ])?;
        } else {
            writer.write_record([row.category.as_str(), count.as_str()])?;
        }
    }
    writer.flush()?;

    Ok(())
}

/// Write every non-empty table and the JSON summary next to `prefix`.
///
/// Returns the paths of the written files.
pub fn write_summary(prefix: &str, summary: &Summary) -> Result<Vec<String>, anyhow::Error> {
    let mut written = Vec::new();

    for (table, rows) in &summary.tables {
        if rows.is_empty() {
            tracing::info!("table {} is empty, not writing it", table);
            continue;
        }
        let path = table_path(prefix, *table);
        tracing::debug!("writing {} rows to {}", rows.len(), &path);
        let writer = open_write_maybe_gz(&path)
            .map_err(|e| anyhow::anyhow!("cannot open {} for writing: {}", &path, e))?;
        write_rows(writer, rows)?;
        written.push(path);
    }

    let path = summary_path(prefix);
    let mut writer = open_write_maybe_gz(&path)
        .map_err(|e| anyhow::anyhow!("cannot open {} for writing: {}", &path, e))?;
    serde_json::to_writer_pretty(&mut writer, summary)?;
    writeln!(writer)?;
    writer.flush()?;
    written.push(path);

    Ok(written)
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        annotation::AnnotationSchema,
        stats::{
            compare::{compare_files, CompareOptions},
            summary::SummaryOptions,
        },
    };

    fn summary(paths: &[&str], split: bool) -> Result<Summary, anyhow::Error> {
        let paths = paths.iter().map(|p| p.to_string()).collect::<Vec<_>>();
        let dataset = compare_files(
            &paths,
            &AnnotationSchema::preset("vep-core").unwrap(),
            &CompareOptions {
                tag_source: split,
                ..Default::default()
            },
        )?;
        Ok(Summary::from_dataset(
            &dataset,
            &SummaryOptions {
                split_by_source: split,
                ..Default::default()
            },
        )?)
    }

    #[test]
    fn paths() {
        assert_eq!(
            table_path("out/run", SummaryTable::TopGenes),
            "out/run_top_genes.tsv"
        );
        assert_eq!(summary_path("out/run"), "out/run_summary.json");
    }

    #[test]
    fn rows_without_source() -> Result<(), anyhow::Error> {
        let summary = summary(&["tests/data/compare_a.vcf"], false)?;
        let mut buf = Vec::new();
        write_rows(&mut buf, summary.rows(SummaryTable::PerChrom).unwrap())?;

        assert_eq!(
            String::from_utf8(buf)?,
            "category\tcount\nchr1\t2\nchr2\t1\n"
        );

        Ok(())
    }

    #[test]
    fn rows_with_source() -> Result<(), anyhow::Error> {
        let summary = summary(&["tests/data/compare_a.vcf", "tests/data/compare_b.vcf"], true)?;
        let mut buf = Vec::new();
        write_rows(&mut buf, summary.rows(SummaryTable::Impact).unwrap())?;

        assert_eq!(
            String::from_utf8(buf)?,
            "category\tsource\tcount\n\
             HIGH\ttests/data/compare_a.vcf\t1\n\
             HIGH\ttests/data/compare_b.vcf\t1\n\
             MODERATE\ttests/data/compare_a.vcf\t2\n\
             MODERATE\ttests/data/compare_b.vcf\t1\n\
             MODIFIER\ttests/data/compare_a.vcf\t0\n\
             MODIFIER\ttests/data/compare_b.vcf\t2\n"
        );

        Ok(())
    }

    #[test]
    fn write_all_files() -> Result<(), anyhow::Error> {
        let tmpdir = temp_testdir::TempDir::default();
        let prefix = format!("{}/out", tmpdir.to_path_buf().to_str().unwrap());

        let summary = summary(&["tests/data/compare_a.vcf"], false)?;
        let written = write_summary(&prefix, &summary)?;

        assert_eq!(
            written,
            vec![
                format!("{}_per_chrom.tsv", prefix),
                format!("{}_refalt_type.tsv", prefix),
                format!("{}_vep_consequence.tsv", prefix),
                format!("{}_impact.tsv", prefix),
                format!("{}_top_genes.tsv", prefix),
                format!("{}_summary.json", prefix),
            ]
        );
        for path in &written {
            assert!(std::path::Path::new(path).exists());
        }
        assert_eq!(
            std::fs::read_to_string(format!("{}_top_genes.tsv", prefix))?,
            "category\tcount\nNRAS\t2\nBRCA2\t1\n"
        );

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(summary_path(&prefix))?)?;
        assert_eq!(json["version"], "x.y.z");
        assert_eq!(json["num_variants"], 3);
        insta::assert_snapshot!(
            serde_json::to_string(&json["tables"]["impact"])?,
            @r###"[{"category":"HIGH","count":1},{"category":"MODERATE","count":2}]"###
        );

        Ok(())
    }

    #[test]
    fn empty_tables_are_skipped() -> Result<(), anyhow::Error> {
        let tmpdir = temp_testdir::TempDir::default();
        let prefix = format!("{}/empty", tmpdir.to_path_buf().to_str().unwrap());

        let summary = summary(&["tests/data/empty.vcf"], false)?;
        let written = write_summary(&prefix, &summary)?;

        assert_eq!(written, vec![summary_path(&prefix)]);
        assert!(!std::path::Path::new(&table_path(&prefix, SummaryTable::PerChrom)).exists());

        Ok(())
    }
}
