//! Schema nodes.
//!
//! A [`Schema`] is an immutable-by-convention tree tagged by `kind`; the tree
//! itself is the on-the-wire representation for sharing type definitions, so
//! every node serializes to and from plain JSON.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Number format specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NumFormat {
    #[serde(rename = "i")]
    I,
    #[serde(rename = "u")]
    U,
    #[serde(rename = "f")]
    F,
    #[serde(rename = "i8")]
    I8,
    #[serde(rename = "i16")]
    I16,
    #[serde(rename = "i32")]
    I32,
    #[serde(rename = "i64")]
    I64,
    #[serde(rename = "u8")]
    U8,
    #[serde(rename = "u16")]
    U16,
    #[serde(rename = "u32")]
    U32,
    #[serde(rename = "u64")]
    U64,
    #[serde(rename = "f32")]
    F32,
    #[serde(rename = "f64")]
    F64,
}

impl NumFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::I => "i",
            Self::U => "u",
            Self::F => "f",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::F32 => "f32",
            Self::F64 => "f64",
        }
    }

    pub fn is_integer(self) -> bool {
        matches!(
            self,
            Self::I
                | Self::I8
                | Self::I16
                | Self::I32
                | Self::I64
                | Self::U
                | Self::U8
                | Self::U16
                | Self::U32
                | Self::U64
        )
    }

    pub fn is_unsigned(self) -> bool {
        matches!(self, Self::U | Self::U8 | Self::U16 | Self::U32 | Self::U64)
    }

    pub fn is_float(self) -> bool {
        matches!(self, Self::F | Self::F32 | Self::F64)
    }
}

/// Which codec a `bin` payload is encoded with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BinFormat {
    Json,
    Cbor,
    Msgpack,
}

/// Display-only metadata plus custom-validator names, common to all nodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaBase {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intro: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<Value>,
    /// Custom validator name or list of names; resolved against the type
    /// system at compile time.
    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "one_or_many"
    )]
    pub validator: Vec<String>,
}

/// Accepts `"name"` or `["a", "b"]`.
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(name) => vec![name],
        OneOrMany::Many(names) => names,
    })
}

/// Any value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnySchema {
    #[serde(flatten)]
    pub base: SchemaBase,
}

/// An exact constant value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConSchema {
    #[serde(flatten)]
    pub base: SchemaBase,
    pub value: Value,
}

/// A JSON boolean.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoolSchema {
    #[serde(flatten)]
    pub base: SchemaBase,
}

/// A JSON number with optional format and range constraints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NumSchema {
    #[serde(flatten)]
    pub base: SchemaBase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<NumFormat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gt: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gte: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lt: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lte: Option<f64>,
}

/// A JSON string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrSchema {
    #[serde(flatten)]
    pub base: SchemaBase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<u64>,
    /// Hint: the string is known to be ASCII.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ascii: Option<bool>,
    /// Hint: the string needs no JSON escaping.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_json_escape: Option<bool>,
}

/// Binary data whose decoded content is itself typed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinSchema {
    #[serde(flatten)]
    pub base: SchemaBase,
    /// Type of the value encoded in the binary payload.
    #[serde(rename = "type")]
    pub type_: Box<Schema>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<BinFormat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<u64>,
}

/// A homogeneous sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrSchema {
    #[serde(flatten)]
    pub base: SchemaBase,
    #[serde(rename = "type")]
    pub type_: Box<Schema>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<u64>,
}

/// A fixed-arity heterogeneous sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TupSchema {
    #[serde(flatten)]
    pub base: SchemaBase,
    pub types: Vec<Schema>,
}

/// A single field of an object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSchema {
    #[serde(flatten)]
    pub base: SchemaBase,
    pub key: String,
    #[serde(rename = "type")]
    pub type_: Box<Schema>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optional: Option<bool>,
}

/// An object with a declared, ordered field list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjSchema {
    #[serde(flatten)]
    pub base: SchemaBase,
    #[serde(default)]
    pub fields: Vec<FieldSchema>,
    /// Tolerate keys outside the declared field list when validating.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unknown_fields: Option<bool>,
    /// Carry keys outside the declared field list through when encoding.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encode_unknown_fields: Option<bool>,
}

/// An object treated as a map: untyped string keys, uniformly typed values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapSchema {
    #[serde(flatten)]
    pub base: SchemaBase,
    pub value: Box<Schema>,
}

/// A named pointer into the alias registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefSchema {
    #[serde(flatten)]
    pub base: SchemaBase,
    #[serde(rename = "ref")]
    pub ref_: String,
}

/// A tagged union.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrSchema {
    #[serde(flatten)]
    pub base: SchemaBase,
    pub types: Vec<Schema>,
    /// An explicit discriminator expression. Carried structurally; dispatch
    /// is always inferred from the alternatives.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discriminator: Option<Value>,
}

/// A request/response function contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FnSchema {
    #[serde(flatten)]
    pub base: SchemaBase,
    pub req: Box<Schema>,
    pub res: Box<Schema>,
}

/// A streaming function contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FnRxSchema {
    #[serde(flatten)]
    pub base: SchemaBase,
    pub req: Box<Schema>,
    pub res: Box<Schema>,
}

/// The unified schema node, tagged by `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Schema {
    #[serde(rename = "any")]
    Any(AnySchema),
    #[serde(rename = "con")]
    Con(ConSchema),
    #[serde(rename = "bool")]
    Bool(BoolSchema),
    #[serde(rename = "num")]
    Num(NumSchema),
    #[serde(rename = "str")]
    Str(StrSchema),
    #[serde(rename = "bin")]
    Bin(BinSchema),
    #[serde(rename = "arr")]
    Arr(ArrSchema),
    #[serde(rename = "tup")]
    Tup(TupSchema),
    #[serde(rename = "obj")]
    Obj(ObjSchema),
    #[serde(rename = "map")]
    Map(MapSchema),
    #[serde(rename = "ref")]
    Ref(RefSchema),
    #[serde(rename = "or")]
    Or(OrSchema),
    #[serde(rename = "fn")]
    Fn(FnSchema),
    #[serde(rename = "fn$")]
    FnRx(FnRxSchema),
}

impl Schema {
    /// The `kind` tag of this node.
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

    /// The shared base fields.
    pub fn base(&self) -> &SchemaBase {
        match self {
            Self::Any(s) => &s.base,
            Self::Con(s) => &s.base,
            Self::Bool(s) => &s.base,
            Self::Num(s) => &s.base,
            Self::Str(s) => &s.base,
            Self::Bin(s) => &s.base,
            Self::Arr(s) => &s.base,
            Self::Tup(s) => &s.base,
            Self::Obj(s) => &s.base,
            Self::Map(s) => &s.base,
            Self::Ref(s) => &s.base,
            Self::Or(s) => &s.base,
            Self::Fn(s) => &s.base,
            Self::FnRx(s) => &s.base,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn kind_tag_round_trips() {
        let schema = Schema::Obj(ObjSchema {
            fields: vec![
                FieldSchema {
                    base: SchemaBase::default(),
                    key: "id".into(),
                    type_: Box::new(Schema::Str(StrSchema::default())),
                    optional: None,
                },
                FieldSchema {
                    base: SchemaBase::default(),
                    key: "age".into(),
                    type_: Box::new(Schema::Num(NumSchema {
                        format: Some(NumFormat::U8),
                        ..Default::default()
                    })),
                    optional: Some(true),
                },
            ],
            ..Default::default()
        });
        let encoded = serde_json::to_value(&schema).unwrap();
        assert_eq!(encoded["kind"], "obj");
        assert_eq!(encoded["fields"][0]["key"], "id");
        assert_eq!(encoded["fields"][0]["type"]["kind"], "str");
        assert_eq!(encoded["fields"][1]["type"]["format"], "u8");
        let decoded: Schema = serde_json::from_value(encoded).unwrap();
        assert_eq!(decoded, schema);
    }

    #[test]
    fn fn_streaming_kind_is_spelled_with_dollar() {
        let schema = Schema::FnRx(FnRxSchema {
            base: SchemaBase::default(),
            req: Box::new(Schema::Any(AnySchema::default())),
            res: Box::new(Schema::Any(AnySchema::default())),
        });
        let encoded = serde_json::to_value(&schema).unwrap();
        assert_eq!(encoded["kind"], "fn$");
    }

    #[test]
    fn validator_accepts_one_or_many() {
        let one: StrSchema = serde_json::from_value(json!({"validator": "id"})).unwrap();
        assert_eq!(one.base.validator, vec!["id"]);
        let many: StrSchema =
            serde_json::from_value(json!({"validator": ["a", "b"]})).unwrap();
        assert_eq!(many.base.validator, vec!["a", "b"]);
    }

    #[test]
    fn options_are_omitted_when_absent() {
        let schema = Schema::Str(StrSchema::default());
        assert_eq!(serde_json::to_value(&schema).unwrap(), json!({"kind": "str"}));
    }
}
