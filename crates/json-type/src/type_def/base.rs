//! Shared state carried by every type node.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

use serde_json::Value;

use json_type_codecs::EncodingFormat;

use crate::codegen::binary::BinaryEncoderFn;
use crate::codegen::capacity::CapacityEstimatorFn;
use crate::codegen::json_text::TextEncoderFn;
use crate::codegen::validator::{CheckFn, ValidatorFn, ValidatorOptions};
use crate::schema::SchemaBase;
use crate::type_system::TypeSystem;

/// Compiled functions, memoized for the node's lifetime.
///
/// The cell is shared by clones of the node, so an alias registered in a
/// [`TypeSystem`] and every `ref` reaching it use the same compiled
/// functions. Maps are lock-guarded so a multi-threaded host still gets
/// compile-once behavior.
#[derive(Default)]
pub(crate) struct CompiledCaches {
    pub validators: RwLock<HashMap<ValidatorOptions, ValidatorFn>>,
    pub checks: RwLock<HashMap<bool, CheckFn>>,
    pub encoders: RwLock<HashMap<EncodingFormat, BinaryEncoderFn>>,
    pub json_text: OnceLock<TextEncoderFn>,
    pub estimator: OnceLock<CapacityEstimatorFn>,
}

/// Metadata, custom-validator names, the owning system, and compiled caches.
#[derive(Clone, Default)]
pub struct BaseInfo {
    pub title: Option<String>,
    pub intro: Option<String>,
    pub description: Option<String>,
    pub examples: Vec<Value>,
    /// Names of custom validators to run after structural checks.
    pub validator: Vec<String>,
    /// Back-reference to the owning type system, required by `ref` nodes.
    pub system: Option<TypeSystem>,
    pub(crate) caches: Arc<CompiledCaches>,
}

impl BaseInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_schema(base: &SchemaBase, system: Option<TypeSystem>) -> Self {
        Self {
            title: base.title.clone(),
            intro: base.intro.clone(),
            description: base.description.clone(),
            examples: base.examples.clone(),
            validator: base.validator.clone(),
            system,
            caches: Arc::new(CompiledCaches::default()),
        }
    }

    pub(crate) fn to_schema_base(&self) -> SchemaBase {
        SchemaBase {
            title: self.title.clone(),
            intro: self.intro.clone(),
            description: self.description.clone(),
            examples: self.examples.clone(),
            validator: self.validator.clone(),
        }
    }
}

impl std::fmt::Debug for BaseInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BaseInfo")
            .field("title", &self.title)
            .field("description", &self.description)
            .field("validator", &self.validator)
            .finish()
    }
}
