//! Positional schema of the pipe-delimited annotation payload.
//!
//! The effect predictor writes one `|`-separated string per transcript.  Which
//! position holds which value depends on the predictor's version and flags, so
//! the positions are always configured and never baked into the classifier.

use indexmap::IndexMap;

use crate::err::Error;

/// Names of the semantic fields read by the classifier.
pub mod field {
    /// Functional consequence, e.g., `missense_variant`.
    pub const CONSEQUENCE: &str = "consequence";
    /// Impact tier, e.g., `MODERATE`.
    pub const IMPACT: &str = "impact";
    /// Gene symbol, e.g., `BRCA1`.
    pub const GENE: &str = "gene";
    /// Molecular type as emitted by the annotator, e.g., `SNV`.
    pub const MOLECULAR_TYPE: &str = "molecular_type";
}

/// Name of the built-in schema used when none is configured.
pub const DEFAULT_PRESET: &str = "vep-core";

/// Return the VEP column conventionally holding the given semantic field.
pub fn default_column(name: &str) -> Option<&'static str> {
    match name {
        field::CONSEQUENCE => Some("Consequence"),
        field::IMPACT => Some("IMPACT"),
        field::GENE => Some("SYMBOL"),
        field::MOLECULAR_TYPE => Some("VARIANT_CLASS"),
        _ => None,
    }
}

/// Binding of one named field to a zero-based payload position.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FieldSpec {
    /// Semantic field name.
    pub name: String,
    /// Zero-based position in the `|`-separated payload.
    pub index: usize,
    /// Header column expected at `index`; checked in strict mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
}

impl FieldSpec {
    pub fn new(name: &str, index: usize, column: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            index,
            column: column.map(|s| s.to_string()),
        }
    }

    /// The column expected in the header, explicit or well-known.
    pub fn expected_column(&self) -> Option<&str> {
        self.column.as_deref().or_else(|| default_column(&self.name))
    }

    /// The `|`-separated segment of `payload` at this field's index.
    pub fn segment<'a>(&self, payload: &'a str) -> Option<&'a str> {
        payload.split('|').nth(self.index)
    }
}

/// Serialized form of `AnnotationSchema`.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct SchemaConfig {
    fields: Vec<FieldSpec>,
}

/// Ordered set of field bindings, read-only once built.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "SchemaConfig", into = "SchemaConfig")]
pub struct AnnotationSchema {
    fields: IndexMap<String, FieldSpec>,
}

impl TryFrom<SchemaConfig> for AnnotationSchema {
    type Error = Error;

    fn try_from(value: SchemaConfig) -> Result<Self, Self::Error> {
        Self::new(value.fields)
    }
}

impl From<AnnotationSchema> for SchemaConfig {
    fn from(value: AnnotationSchema) -> Self {
        SchemaConfig {
            fields: value.fields.into_values().collect(),
        }
    }
}

impl AnnotationSchema {
    /// Build a schema, rejecting empty and duplicate field lists.
    pub fn new(fields: Vec<FieldSpec>) -> Result<Self, Error> {
        if fields.is_empty() {
            return Err(Error::InvalidSchema("no fields configured".into()));
        }
        let mut result = IndexMap::new();
        for spec in fields {
            if result.contains_key(&spec.name) {
                return Err(Error::InvalidSchema(format!(
                    "field {} configured more than once",
                    &spec.name
                )));
            }
            result.insert(spec.name.clone(), spec);
        }
        Ok(Self { fields: result })
    }

    /// Return the built-in schema with the given name, if any.
    ///
    /// `vep-core` binds the three positions that are stable across VEP
    /// invocations.  The molecular type has no preset as its position depends
    /// on the VEP flags.
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            DEFAULT_PRESET => Some(Self {
                fields: [
                    FieldSpec::new(field::CONSEQUENCE, 1, Some("Consequence")),
                    FieldSpec::new(field::IMPACT, 2, Some("IMPACT")),
                    FieldSpec::new(field::GENE, 3, Some("SYMBOL")),
                ]
                .into_iter()
                .map(|spec| (spec.name.clone(), spec))
                .collect(),
            }),
            _ => None,
        }
    }

    /// Return a copy with `spec` added or replacing the field of the same name.
    pub fn with_field(mut self, spec: FieldSpec) -> Self {
        self.fields.insert(spec.name.clone(), spec);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.values()
    }

    /// Resolve the value of `name` from a raw annotation payload.
    ///
    /// An absent payload yields `None` for every field.  A payload with too
    /// few segments yields `None`; an empty segment is returned as is.
    pub fn resolve<'a>(
        &self,
        name: &str,
        payload: Option<&'a str>,
    ) -> Result<Option<&'a str>, Error> {
        let Some(payload) = payload else {
            return Ok(None);
        };
        let spec = self
            .fields
            .get(name)
            .ok_or_else(|| Error::UnknownSchemaField(name.to_string()))?;
        Ok(spec.segment(payload))
    }

    /// Check the configured positions against the format declared in a header.
    pub fn validate_against(&self, format: &AnnotationFormat) -> Result<(), Error> {
        for spec in self.fields.values() {
            if let Some(expected) = spec.expected_column() {
                let found = format.column(spec.index);
                if found != Some(expected) {
                    return Err(Error::SchemaMismatch {
                        field: spec.name.clone(),
                        index: spec.index,
                        expected: expected.to_string(),
                        found: found.map(|s| s.to_string()),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Column layout declared in the `##INFO` description of the annotation key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationFormat {
    columns: Vec<String>,
}

impl AnnotationFormat {
    /// Parse the column list out of an `##INFO` description.
    ///
    /// Handles VEP (`... Format: Allele|Consequence|...`) and SnpEff
    /// (`Functional annotations: 'Allele | Annotation | ...'`) descriptions.
    pub fn from_description(description: &str) -> Option<Self> {
        let tail = match description.split_once("Format:") {
            Some((_, tail)) => tail,
            None => description.split_once(':')?.1,
        };
        let tail = tail.trim().trim_matches(|c| c == '\'' || c == '"').trim();
        if !tail.contains('|') {
            return None;
        }
        Some(Self {
            columns: tail.split('|').map(|s| s.trim().to_string()).collect(),
        })
    }

    pub fn column(&self, index: usize) -> Option<&str> {
        self.columns.get(index).map(|s| s.as_str())
    }

}
