//! Per-kind type structs.
//!
//! Each struct owns its schema options and a [`BaseInfo`]. Options are set
//! through chaining builder methods; [`get_schema`](super::TypeNode::get_schema)
//! reassembles the plain schema tree.

use serde_json::Value;

use super::base::BaseInfo;
use super::TypeNode;
use crate::schema::*;

// ---------------------------------------------------------------------------
// AnyType

#[derive(Debug, Clone, Default)]
pub struct AnyType {
    pub base: BaseInfo,
}

impl AnyType {
    pub fn new() -> Self {
        Self::default()
    }
}

// ---------------------------------------------------------------------------
// ConType

#[derive(Debug, Clone)]
pub struct ConType {
    pub value: Value,
    pub base: BaseInfo,
}

impl ConType {
    pub fn new(value: Value) -> Self {
        Self {
            value,
            base: BaseInfo::default(),
        }
    }

    pub fn literal(&self) -> &Value {
        &self.value
    }
}

// ---------------------------------------------------------------------------
// BoolType

#[derive(Debug, Clone, Default)]
pub struct BoolType {
    pub base: BaseInfo,
}

impl BoolType {
    pub fn new() -> Self {
        Self::default()
    }
}

// ---------------------------------------------------------------------------
// NumType

#[derive(Debug, Clone, Default)]
pub struct NumType {
    pub format: Option<NumFormat>,
    pub gt: Option<f64>,
    pub gte: Option<f64>,
    pub lt: Option<f64>,
    pub lte: Option<f64>,
    pub base: BaseInfo,
}

impl NumType {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn format(mut self, format: NumFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn gt(mut self, v: f64) -> Self {
        self.gt = Some(v);
        self
    }

    pub fn gte(mut self, v: f64) -> Self {
        self.gte = Some(v);
        self
    }

    pub fn lt(mut self, v: f64) -> Self {
        self.lt = Some(v);
        self
    }

    pub fn lte(mut self, v: f64) -> Self {
        self.lte = Some(v);
        self
    }
}

// ---------------------------------------------------------------------------
// StrType

#[derive(Debug, Clone, Default)]
pub struct StrType {
    pub min: Option<u64>,
    pub max: Option<u64>,
    pub ascii: bool,
    pub no_json_escape: bool,
    pub base: BaseInfo,
}

impl StrType {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn min(mut self, v: u64) -> Self {
        self.min = Some(v);
        self
    }

    pub fn max(mut self, v: u64) -> Self {
        self.max = Some(v);
        self
    }

    pub fn ascii(mut self) -> Self {
        self.ascii = true;
        self
    }

    pub fn no_json_escape(mut self) -> Self {
        self.no_json_escape = true;
        self
    }
}

// ---------------------------------------------------------------------------
// BinType

#[derive(Debug, Clone)]
pub struct BinType {
    /// Type of the value encoded in the payload.
    pub type_: Box<TypeNode>,
    pub format: Option<BinFormat>,
    pub min: Option<u64>,
    pub max: Option<u64>,
    pub base: BaseInfo,
}

impl BinType {
    pub fn new(type_: TypeNode) -> Self {
        Self {
            type_: Box::new(type_),
            format: None,
            min: None,
            max: None,
            base: BaseInfo::default(),
        }
    }

    pub fn format(mut self, format: BinFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn min(mut self, v: u64) -> Self {
        self.min = Some(v);
        self
    }

    pub fn max(mut self, v: u64) -> Self {
        self.max = Some(v);
        self
    }
}

// ---------------------------------------------------------------------------
// ArrType

#[derive(Debug, Clone)]
pub struct ArrType {
    pub type_: Box<TypeNode>,
    pub min: Option<u64>,
    pub max: Option<u64>,
    pub base: BaseInfo,
}

impl ArrType {
    pub fn new(type_: TypeNode) -> Self {
        Self {
            type_: Box::new(type_),
            min: None,
            max: None,
            base: BaseInfo::default(),
        }
    }

    pub fn min(mut self, v: u64) -> Self {
        self.min = Some(v);
        self
    }

    pub fn max(mut self, v: u64) -> Self {
        self.max = Some(v);
        self
    }
}

// ---------------------------------------------------------------------------
// TupType

#[derive(Debug, Clone, Default)]
pub struct TupType {
    pub types: Vec<TypeNode>,
    pub base: BaseInfo,
}

impl TupType {
    pub fn new(types: Vec<TypeNode>) -> Self {
        Self {
            types,
            base: BaseInfo::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// FieldType / ObjType

/// One declared object field.
#[derive(Debug, Clone)]
pub struct FieldType {
    pub key: String,
    pub ty: Box<TypeNode>,
    pub optional: bool,
    /// Display-only metadata carried through import/export.
    pub meta: SchemaBase,
}

impl FieldType {
    pub fn new(key: impl Into<String>, ty: TypeNode) -> Self {
        Self {
            key: key.into(),
            ty: Box::new(ty),
            optional: false,
            meta: SchemaBase::default(),
        }
    }

    pub fn new_opt(key: impl Into<String>, ty: TypeNode) -> Self {
        Self {
            optional: true,
            ..Self::new(key, ty)
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ObjType {
    /// Declaration order is significant and preserved by every backend.
    pub fields: Vec<FieldType>,
    pub unknown_fields: bool,
    pub encode_unknown_fields: bool,
    pub base: BaseInfo,
}

impl ObjType {
    pub fn new(fields: Vec<FieldType>) -> Self {
        Self {
            fields,
            ..Self::default()
        }
    }

    pub fn field(mut self, key: impl Into<String>, ty: TypeNode) -> Self {
        self.fields.push(FieldType::new(key, ty));
        self
    }

    pub fn field_opt(mut self, key: impl Into<String>, ty: TypeNode) -> Self {
        self.fields.push(FieldType::new_opt(key, ty));
        self
    }

    pub fn unknown_fields(mut self) -> Self {
        self.unknown_fields = true;
        self
    }

    pub fn encode_unknown_fields(mut self) -> Self {
        self.encode_unknown_fields = true;
        self
    }

    pub fn get_field(&self, key: &str) -> Option<&FieldType> {
        self.fields.iter().find(|f| f.key == key)
    }
}

// ---------------------------------------------------------------------------
// MapType

#[derive(Debug, Clone)]
pub struct MapType {
    pub value: Box<TypeNode>,
    pub base: BaseInfo,
}

impl MapType {
    pub fn new(value: TypeNode) -> Self {
        Self {
            value: Box::new(value),
            base: BaseInfo::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// RefType

#[derive(Debug, Clone)]
pub struct RefType {
    pub ref_: String,
    pub base: BaseInfo,
}

impl RefType {
    pub fn new(ref_: impl Into<String>) -> Self {
        Self {
            ref_: ref_.into(),
            base: BaseInfo::default(),
        }
    }

    pub fn ref_name(&self) -> &str {
        &self.ref_
    }
}

// ---------------------------------------------------------------------------
// OrType

#[derive(Debug, Clone, Default)]
pub struct OrType {
    pub types: Vec<TypeNode>,
    /// Explicit discriminator expression, carried structurally.
    pub discriminator: Option<Value>,
    pub base: BaseInfo,
}

impl OrType {
    pub fn new(types: Vec<TypeNode>) -> Self {
        Self {
            types,
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// FnType / FnRxType

#[derive(Debug, Clone)]
pub struct FnType {
    pub req: Box<TypeNode>,
    pub res: Box<TypeNode>,
    pub base: BaseInfo,
}

impl FnType {
    pub fn new(req: TypeNode, res: TypeNode) -> Self {
        Self {
            req: Box::new(req),
            res: Box::new(res),
            base: BaseInfo::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FnRxType {
    pub req: Box<TypeNode>,
    pub res: Box<TypeNode>,
    pub base: BaseInfo,
}

impl FnRxType {
    pub fn new(req: TypeNode, res: TypeNode) -> Self {
        Self {
            req: Box::new(req),
            res: Box::new(res),
            base: BaseInfo::default(),
        }
    }
}
