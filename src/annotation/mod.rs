//! Decoding of the effect predictor's annotation payload.

pub mod classify;
pub mod schema;

pub use classify::{classify, ClassifiedVariant, ClassifyOptions, RawVariant, VariantType};
pub use schema::{AnnotationFormat, AnnotationSchema, FieldSpec};
