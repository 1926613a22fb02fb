//! Common functionality.

use clap::Parser;
use clap_verbosity_flag::{InfoLevel, Verbosity};

pub mod io;
pub mod noodles;

/// Commonly used command line arguments.
#[derive(Parser, Debug)]
pub struct Args {
    /// Verbosity of the program
    #[clap(flatten)]
    pub verbose: Verbosity<InfoLevel>,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            verbose: Verbosity::new(0, 0),
        }
    }
}

/// Return the version of the `vep-stats` crate and `x.y.z` in tests.
pub fn version() -> &'static str {
    if cfg!(test) {
        "x.y.z"
    } else {
        env!("CARGO_PKG_VERSION")
    }
}

/// Expand input paths, reading through files given by `@path`.
///
/// A file given as `@path` contains one path per line; blank lines are
/// ignored.
pub fn expand_at_paths(paths: &[String]) -> Result<Vec<String>, anyhow::Error> {
    let mut result = Vec::new();
    for path in paths {
        if let Some(list_path) = path.strip_prefix('@') {
            let contents = std::fs::read_to_string(list_path)
                .map_err(|e| anyhow::anyhow!("could not read path list {}: {}", list_path, e))?;
            result.extend(
                contents
                    .lines()
                    .map(|line| line.trim())
                    .filter(|line| !line.is_empty())
                    .map(|line| line.to_string()),
            );
        } else {
            result.push(path.clone());
        }
    }
    Ok(result)
}

/// Load a JSON value given inline or, when starting with `@`, from a file.
pub fn load_json_or_at_path<T>(value: &str) -> Result<T, anyhow::Error>
where
    T: serde::de::DeserializeOwned,
{
    if let Some(path) = value.strip_prefix('@') {
        let file = std::fs::File::open(path)
            .map_err(|e| anyhow::anyhow!("failed to open JSON file {}: {}", path, e))?;
        serde_json::from_reader(std::io::BufReader::new(file))
            .map_err(|e| anyhow::anyhow!("failed to parse JSON from {}: {}", path, e))
    } else {
        serde_json::from_str(value).map_err(|e| anyhow::anyhow!("failed to parse JSON: {}", e))
    }
}
