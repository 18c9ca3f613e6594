//! Error types for schema definition and encoding.

use thiserror::Error;

/// Schema-definition and compile-time errors.
///
/// These indicate a structurally invalid schema or registry state and are
/// always caller-fixable; they are never produced while processing values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("min must not be greater than max")]
    MinMax,
    #[error("duplicate object field key: {0:?}")]
    DuplicateField(String),
    #[error("union has no alternatives")]
    EmptyUnion,
    #[error("ambiguous union: duplicate discriminator {0}")]
    AmbiguousUnion(String),
    #[error("union alternative cannot be discriminated: {0}")]
    Undiscriminable(&'static str),
    #[error("type alias not found: {0:?}")]
    UnknownAlias(String),
    #[error("circular reference chain at {0:?}")]
    CircularRef(String),
    #[error("reference {0:?} used outside of a type system")]
    NoSystem(String),
    #[error("unknown validator: {0:?}")]
    UnknownValidator(String),
    #[error("validator already registered: {0:?}")]
    DuplicateValidator(String),
    #[error("const value cannot be rendered: {0}")]
    InvalidConst(String),
}

/// Encoder-time errors.
///
/// Encoding assumes pre-validated input, so these are reserved for values the
/// target format genuinely cannot represent under the schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("expected {0}")]
    Mismatch(&'static str),
    #[error("missing required field: {0:?}")]
    Field(String),
    #[error("binary value must be an array of bytes")]
    Bin,
    #[error(transparent)]
    Schema(#[from] SchemaError),
}
