//! The runtime type model.
//!
//! A [`TypeNode`] wraps one schema node, owns the compiled-function caches
//! for it, and knows how to hand each compiler backend the information it
//! needs. Construction goes through [`TypeBuilder`], either directly or by
//! importing a plain [`Schema`](crate::schema::Schema) tree.

mod base;
mod builder;
mod classes;

pub use base::BaseInfo;
pub use builder::TypeBuilder;
pub use classes::*;

use std::collections::HashSet;

use serde_json::Value;

use json_type_codecs::EncodingFormat;

use crate::codegen::binary::{self, BinaryEncoderFn};
use crate::codegen::capacity::{self, CapacityEstimatorFn};
use crate::codegen::discriminator::Discriminator;
use crate::codegen::json_text::{self, TextEncoderFn};
use crate::codegen::validator::{
    self, CheckFn, ErrorMode, ValidationResult, ValidatorFn, ValidatorOptions,
};
use crate::error::{EncodeError, SchemaError};
use crate::schema::*;

/// The unified runtime type, one variant per schema kind.
#[derive(Debug, Clone)]
pub enum TypeNode {
    Any(AnyType),
    Con(ConType),
    Bool(BoolType),
    Num(NumType),
    Str(StrType),
    Bin(BinType),
    Arr(ArrType),
    Tup(TupType),
    Obj(ObjType),
    Map(MapType),
    Ref(RefType),
    Or(OrType),
    Fn(FnType),
    FnRx(FnRxType),
}

impl TypeNode {
    /// The schema `kind` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Any(_) => "any",
            Self::Con(_) => "con",
            Self::Bool(_) => "bool",
            Self::Num(_) => "num",
            Self::Str(_) => "str",
            Self::Bin(_) => "bin",
            Self::Arr(_) => "arr",
            Self::Tup(_) => "tup",
            Self::Obj(_) => "obj",
            Self::Map(_) => "map",
            Self::Ref(_) => "ref",
            Self::Or(_) => "or",
            Self::Fn(_) => "fn",
            Self::FnRx(_) => "fn$",
        }
    }

    /// Shared base info.
    pub fn base(&self) -> &BaseInfo {
        match self {
            Self::Any(t) => &t.base,
            Self::Con(t) => &t.base,
            Self::Bool(t) => &t.base,
            Self::Num(t) => &t.base,
            Self::Str(t) => &t.base,
            Self::Bin(t) => &t.base,
            Self::Arr(t) => &t.base,
            Self::Tup(t) => &t.base,
            Self::Obj(t) => &t.base,
            Self::Map(t) => &t.base,
            Self::Ref(t) => &t.base,
            Self::Or(t) => &t.base,
            Self::Fn(t) => &t.base,
            Self::FnRx(t) => &t.base,
        }
    }

    pub fn base_mut(&mut self) -> &mut BaseInfo {
        match self {
            Self::Any(t) => &mut t.base,
            Self::Con(t) => &mut t.base,
            Self::Bool(t) => &mut t.base,
            Self::Num(t) => &mut t.base,
            Self::Str(t) => &mut t.base,
            Self::Bin(t) => &mut t.base,
            Self::Arr(t) => &mut t.base,
            Self::Tup(t) => &mut t.base,
            Self::Obj(t) => &mut t.base,
            Self::Map(t) => &mut t.base,
            Self::Ref(t) => &mut t.base,
            Self::Or(t) => &mut t.base,
            Self::Fn(t) => &mut t.base,
            Self::FnRx(t) => &mut t.base,
        }
    }

    // -- metadata -----------------------------------------------------------

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.base_mut().title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.base_mut().description = Some(description.into());
        self
    }

    /// Attaches a named custom validator, run after structural checks in
    /// declared order.
    pub fn with_validator(mut self, name: impl Into<String>) -> Self {
        self.base_mut().validator.push(name.into());
        self
    }

    // -- schema export ------------------------------------------------------

    /// Reassembles the plain schema tree for this type.
    pub fn get_schema(&self) -> Schema {
        match self {
            Self::Any(t) => Schema::Any(AnySchema {
                base: t.base.to_schema_base(),
            }),
            Self::Con(t) => Schema::Con(ConSchema {
                base: t.base.to_schema_base(),
                value: t.value.clone(),
            }),
            Self::Bool(t) => Schema::Bool(BoolSchema {
                base: t.base.to_schema_base(),
            }),
            Self::Num(t) => Schema::Num(NumSchema {
                base: t.base.to_schema_base(),
                format: t.format,
                gt: t.gt,
                gte: t.gte,
                lt: t.lt,
                lte: t.lte,
            }),
            Self::Str(t) => Schema::Str(StrSchema {
                base: t.base.to_schema_base(),
                min: t.min,
                max: t.max,
                ascii: t.ascii.then_some(true),
                no_json_escape: t.no_json_escape.then_some(true),
            }),
            Self::Bin(t) => Schema::Bin(BinSchema {
                base: t.base.to_schema_base(),
                type_: Box::new(t.type_.get_schema()),
                format: t.format,
                min: t.min,
                max: t.max,
            }),
            Self::Arr(t) => Schema::Arr(ArrSchema {
                base: t.base.to_schema_base(),
                type_: Box::new(t.type_.get_schema()),
                min: t.min,
                max: t.max,
            }),
            Self::Tup(t) => Schema::Tup(TupSchema {
                base: t.base.to_schema_base(),
                types: t.types.iter().map(TypeNode::get_schema).collect(),
            }),
            Self::Obj(t) => Schema::Obj(ObjSchema {
                base: t.base.to_schema_base(),
                fields: t
                    .fields
                    .iter()
                    .map(|f| FieldSchema {
                        base: f.meta.clone(),
                        key: f.key.clone(),
                        type_: Box::new(f.ty.get_schema()),
                        optional: f.optional.then_some(true),
                    })
                    .collect(),
                unknown_fields: t.unknown_fields.then_some(true),
                encode_unknown_fields: t.encode_unknown_fields.then_some(true),
            }),
            Self::Map(t) => Schema::Map(MapSchema {
                base: t.base.to_schema_base(),
                value: Box::new(t.value.get_schema()),
            }),
            Self::Ref(t) => Schema::Ref(RefSchema {
                base: t.base.to_schema_base(),
                ref_: t.ref_.clone(),
            }),
            Self::Or(t) => Schema::Or(OrSchema {
                base: t.base.to_schema_base(),
                types: t.types.iter().map(TypeNode::get_schema).collect(),
                discriminator: t.discriminator.clone(),
            }),
            Self::Fn(t) => Schema::Fn(FnSchema {
                base: t.base.to_schema_base(),
                req: Box::new(t.req.get_schema()),
                res: Box::new(t.res.get_schema()),
            }),
            Self::FnRx(t) => Schema::FnRx(FnRxSchema {
                base: t.base.to_schema_base(),
                req: Box::new(t.req.get_schema()),
                res: Box::new(t.res.get_schema()),
            }),
        }
    }

    // -- structural validation ----------------------------------------------

    /// Checks the schema itself for structural errors: inverted bounds,
    /// duplicate object keys, empty or ambiguous unions. Runs before any
    /// backend compiles against the node.
    pub fn validate_schema(&self) -> Result<(), SchemaError> {
        match self {
            Self::Str(t) => check_min_max(t.min, t.max),
            Self::Bin(t) => {
                check_min_max(t.min, t.max)?;
                t.type_.validate_schema()
            }
            Self::Arr(t) => {
                check_min_max(t.min, t.max)?;
                t.type_.validate_schema()
            }
            Self::Tup(t) => t.types.iter().try_for_each(TypeNode::validate_schema),
            Self::Obj(t) => {
                let mut seen: HashSet<&str> = HashSet::new();
                for field in &t.fields {
                    if !seen.insert(field.key.as_str()) {
                        return Err(SchemaError::DuplicateField(field.key.clone()));
                    }
                }
                t.fields.iter().try_for_each(|f| f.ty.validate_schema())
            }
            Self::Map(t) => t.value.validate_schema(),
            Self::Or(t) => {
                if t.types.is_empty() {
                    return Err(SchemaError::EmptyUnion);
                }
                Discriminator::verify(&t.types)?;
                t.types.iter().try_for_each(TypeNode::validate_schema)
            }
            Self::Fn(t) => {
                t.req.validate_schema()?;
                t.res.validate_schema()
            }
            Self::FnRx(t) => {
                t.req.validate_schema()?;
                t.res.validate_schema()
            }
            _ => Ok(()),
        }
    }

    // -- compiled functions -------------------------------------------------

    /// A compiled validator for the given error-reporting mode, memoized per
    /// mode for this node's lifetime.
    pub fn validator(&self, mode: ErrorMode) -> Result<ValidatorFn, SchemaError> {
        self.validator_with(ValidatorOptions {
            errors: mode,
            ..ValidatorOptions::default()
        })
    }

    pub fn validator_with(&self, options: ValidatorOptions) -> Result<ValidatorFn, SchemaError> {
        let caches = &self.base().caches;
        if let Some(found) = caches.validators.read().unwrap().get(&options) {
            return Ok(found.clone());
        }
        self.validate_schema()?;
        let compiled = validator::compile(self, options)?;
        let mut map = caches.validators.write().unwrap();
        Ok(map.entry(options).or_insert(compiled).clone())
    }

    /// Compiles and runs the validator in one step.
    pub fn validate(&self, value: &Value, mode: ErrorMode) -> Result<ValidationResult, SchemaError> {
        Ok(self.validator(mode)?(value))
    }

    pub(crate) fn compiled_checks(&self, skip_unknown_keys: bool) -> Result<CheckFn, SchemaError> {
        let caches = &self.base().caches;
        if let Some(found) = caches.checks.read().unwrap().get(&skip_unknown_keys) {
            return Ok(found.clone());
        }
        self.validate_schema()?;
        let compiled = validator::compile_checks(self, skip_unknown_keys)?;
        let mut map = caches.checks.write().unwrap();
        Ok(map.entry(skip_unknown_keys).or_insert(compiled).clone())
    }

    /// A compiled encoder for one binary format, memoized per format.
    ///
    /// The returned function writes against the encoder capability; the
    /// driving caller resets the writer before and flushes after. Use
    /// [`encode`](Self::encode) for the one-shot form.
    pub fn encoder(&self, format: EncodingFormat) -> Result<BinaryEncoderFn, SchemaError> {
        let caches = &self.base().caches;
        if let Some(found) = caches.encoders.read().unwrap().get(&format) {
            return Ok(found.clone());
        }
        self.validate_schema()?;
        let compiled = binary::compile(self, format)?;
        let mut map = caches.encoders.write().unwrap();
        Ok(map.entry(format).or_insert(compiled).clone())
    }

    /// Encodes a value into freshly flushed bytes.
    pub fn encode(&self, format: EncodingFormat, value: &Value) -> Result<Vec<u8>, EncodeError> {
        let encode = self.encoder(format)?;
        let mut encoder = format.new_encoder();
        encoder.writer().reset();
        encode(value, &mut *encoder)?;
        Ok(encoder.writer().flush())
    }

    /// A compiled JSON text encoder, memoized for this node's lifetime.
    pub fn json_text_encoder(&self) -> Result<TextEncoderFn, SchemaError> {
        let caches = &self.base().caches;
        if let Some(found) = caches.json_text.get() {
            return Ok(found.clone());
        }
        self.validate_schema()?;
        let compiled = json_text::compile(self)?;
        let _ = caches.json_text.set(compiled.clone());
        Ok(caches.json_text.get().cloned().unwrap_or(compiled))
    }

    /// Encodes a value to JSON text.
    pub fn encode_json_text(&self, value: &Value) -> Result<String, EncodeError> {
        self.json_text_encoder()?(value)
    }

    /// A compiled conservative byte-size estimator, memoized for this
    /// node's lifetime.
    pub fn capacity_estimator(&self) -> Result<CapacityEstimatorFn, SchemaError> {
        let caches = &self.base().caches;
        if let Some(found) = caches.estimator.get() {
            return Ok(found.clone());
        }
        self.validate_schema()?;
        let compiled = capacity::compile(self)?;
        let _ = caches.estimator.set(compiled.clone());
        Ok(caches.estimator.get().cloned().unwrap_or(compiled))
    }

    /// Generates a random value conforming to this type.
    pub fn random(&self) -> Value {
        crate::random::Random::new().gen(self)
    }

    /// Exports a JSON-Schema-like description.
    pub fn to_json_schema(&self) -> Value {
        crate::json_schema::to_json_schema(self)
    }
}

fn check_min_max(min: Option<u64>, max: Option<u64>) -> Result<(), SchemaError> {
    match (min, max) {
        (Some(min), Some(max)) if min > max => Err(SchemaError::MinMax),
        _ => Ok(()),
    }
}

impl std::fmt::Display for TypeNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.kind())
    }
}
