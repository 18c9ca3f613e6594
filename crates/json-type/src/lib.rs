//! `json-type` — schema-driven type engine.
//!
//! Declarative data-shape descriptions ([`Schema`]) are compiled into
//! specialized functions that validate, serialize, and estimate the encoded
//! size of conforming values:
//!
//! ```
//! use json_type::{ErrorMode, TypeBuilder};
//! use json_type_codecs::EncodingFormat;
//! use serde_json::json;
//!
//! let t = TypeBuilder::new();
//! let user = t.obj(vec![
//!     t.field("id", t.str()),
//!     t.field_opt("tags", t.arr(t.str())),
//! ]);
//!
//! let validate = user.validator(ErrorMode::Boolean).unwrap();
//! assert!(validate(&json!({"id": "abc"})).is_ok());
//!
//! let text = user.encode_json_text(&json!({"id": "abc"})).unwrap();
//! assert_eq!(text, r#"{"id":"abc"}"#);
//!
//! let bytes = user.encode(EncodingFormat::Cbor, &json!({"id": "abc"})).unwrap();
//! let size = user.capacity_estimator().unwrap()(&json!({"id": "abc"}));
//! assert!(bytes.len() <= size);
//! ```
//!
//! Named types live in a [`TypeSystem`]; `ref` nodes resolve against it and
//! call the referenced type's own compiled functions, so recursive and
//! mutually-referential schemas compile and run.

pub mod codegen;
pub mod constants;
pub mod error;
pub mod json_schema;
pub mod random;
pub mod schema;
pub mod type_def;
pub mod type_system;
pub mod util;

pub use codegen::binary::BinaryEncoderFn;
pub use codegen::capacity::CapacityEstimatorFn;
pub use codegen::discriminator::Discriminator;
pub use codegen::json_text::TextEncoderFn;
pub use codegen::validator::{
    ErrorMode, ObjectValidationError, ValidationResult, ValidatorFn, ValidatorOptions,
};
pub use constants::ValidationError;
pub use error::{EncodeError, SchemaError};
pub use random::Random;
pub use schema::{Schema, SchemaBase};
pub use type_def::{BaseInfo, FieldType, TypeBuilder, TypeNode};
pub use type_system::{CustomValidatorFn, TypeAlias, TypeSystem};

pub use json_type_codecs::EncodingFormat;
