//! Error types shared by the annotation and statistics code.

/// Errors raised while reading, classifying, and aggregating variants.
///
/// Malformed annotation payloads and empty inputs are not errors; they yield
/// missing values and empty tables respectively.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The VCF reader could not open or decode the given file.
    #[error("could not read file {path}: {source}")]
    FileUnreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// A field was requested that the annotation schema does not define.
    #[error("unknown annotation schema field: {0}")]
    UnknownSchemaField(String),
    /// Strict mode found a schema index that disagrees with the file header.
    #[error(
        "schema field {field} expects column {expected:?} at index {index}, \
         but header declares {found:?}"
    )]
    SchemaMismatch {
        field: String,
        index: usize,
        expected: String,
        found: Option<String>,
    },
    /// The schema configuration itself is unusable.
    #[error("invalid annotation schema: {0}")]
    InvalidSchema(String),
    /// Two count tables with different dimensions were combined.
    #[error("cannot combine count tables over {found:?} into table over {expected:?}")]
    DimensionMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },
    /// A dimension was requested that the count table does not carry.
    #[error("count table has no dimension {0}")]
    UnknownDimension(String),
}
