//! Opening of plain and compressed files.

use std::{
    fs::File,
    io::{BufRead, BufReader, BufWriter, Write},
    path::Path,
};

use flate2::{bufread::MultiGzDecoder, write::GzEncoder, Compression};

/// Extensions of gzip compressed files; `bgz` is used for BGZF by some tools.
const GZIP_EXTENSIONS: &[&str] = &["gz", "bgz"];

/// Whether `path` names a gzip or BGZF compressed file.
pub fn is_gzip_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| GZIP_EXTENSIONS.contains(&ext))
        .unwrap_or(false)
}

/// Open `path` for reading, decompressing gzip and BGZF input.
///
/// BGZF files are multi-member gzip files, so they go through the same
/// decoder and need no index.
pub fn open_read_maybe_gz<P>(path: P) -> Result<Box<dyn BufRead>, std::io::Error>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = BufReader::new(File::open(path)?);
    if is_gzip_path(path) {
        tracing::trace!("reading {:?} through gzip decoder", path);
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        tracing::trace!("reading {:?} as plain text", path);
        Ok(Box::new(file))
    }
}

/// Create `path` for writing, gzip compressing when the extension asks for it.
pub fn open_write_maybe_gz<P>(path: P) -> Result<Box<dyn Write>, std::io::Error>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = BufWriter::new(File::create(path)?);
    if is_gzip_path(path) {
        tracing::trace!("writing {:?} through gzip encoder", path);
        Ok(Box::new(GzEncoder::new(file, Compression::default())))
    } else {
        tracing::trace!("writing {:?} as plain text", path);
        Ok(Box::new(file))
    }
}

#[cfg(test)]
mod test {
    use std::io::{Read, Write};

    use pretty_assertions::assert_eq;

    #[rstest::rstest]
    #[case("lines.txt")]
    #[case("lines.txt.gz")]
    fn write_then_read(#[case] filename: &str) -> Result<(), anyhow::Error> {
        let tmp_dir = temp_testdir::TempDir::default();
        let path = tmp_dir.join(filename);

        {
            let mut f = super::open_write_maybe_gz(&path)?;
            f.write_all(b"chr1\nchr2\n")?;
            f.flush()?;
        }

        let mut buf = String::new();
        super::open_read_maybe_gz(&path)?.read_to_string(&mut buf)?;

        assert_eq!(buf, "chr1\nchr2\n");

        Ok(())
    }

    #[test]
    fn gzip_output_is_compressed() -> Result<(), anyhow::Error> {
        let tmp_dir = temp_testdir::TempDir::default();
        let path = tmp_dir.join("out.tsv.gz");

        {
            let mut f = super::open_write_maybe_gz(&path)?;
            f.write_all(b"category\tcount\n")?;
        }

        let raw = std::fs::read(&path)?;
        assert_eq!(&raw[..2], &[0x1f, 0x8b]);

        Ok(())
    }

    #[rstest::rstest]
    #[case("in.vcf.gz", true)]
    #[case("in.vcf.bgz", true)]
    #[case("in.vcf", false)]
    #[case("gz", false)]
    fn gzip_extension(#[case] path: &str, #[case] expected: bool) {
        assert_eq!(super::is_gzip_path(std::path::Path::new(path)), expected);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = super::open_read_maybe_gz("tests/data/does-not-exist.vcf")
            .err()
            .expect("must fail");
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }
}
