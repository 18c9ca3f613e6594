//! `TypeBuilder` — factory for constructing type nodes.

use serde_json::Value;

use super::classes::*;
use super::{BaseInfo, TypeNode};
use crate::schema::Schema;
use crate::type_system::TypeSystem;

/// Factory for [`TypeNode`]s, optionally bound to a [`TypeSystem`] so that
/// constructed nodes can resolve `ref`s against it.
#[derive(Debug, Clone, Default)]
pub struct TypeBuilder {
    pub system: Option<TypeSystem>,
}

impl TypeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_system(system: TypeSystem) -> Self {
        Self {
            system: Some(system),
        }
    }

    fn stamp(&self, mut node: TypeNode) -> TypeNode {
        if let Some(system) = &self.system {
            node.base_mut().system.get_or_insert_with(|| system.clone());
        }
        node
    }

    // -- kind factories -----------------------------------------------------

    pub fn any(&self) -> TypeNode {
        self.stamp(TypeNode::Any(AnyType::new()))
    }

    pub fn con(&self, value: impl Into<Value>) -> TypeNode {
        self.stamp(TypeNode::Con(ConType::new(value.into())))
    }

    /// The `null` constant.
    pub fn nil(&self) -> TypeNode {
        self.con(Value::Null)
    }

    pub fn bool(&self) -> TypeNode {
        self.stamp(TypeNode::Bool(BoolType::new()))
    }

    pub fn num(&self) -> TypeNode {
        self.stamp(TypeNode::Num(NumType::new()))
    }

    pub fn str(&self) -> TypeNode {
        self.stamp(TypeNode::Str(StrType::new()))
    }

    pub fn bin(&self, type_: TypeNode) -> TypeNode {
        self.stamp(TypeNode::Bin(BinType::new(type_)))
    }

    pub fn arr(&self, type_: TypeNode) -> TypeNode {
        self.stamp(TypeNode::Arr(ArrType::new(type_)))
    }

    pub fn tup(&self, types: Vec<TypeNode>) -> TypeNode {
        self.stamp(TypeNode::Tup(TupType::new(types)))
    }

    pub fn obj(&self, fields: Vec<FieldType>) -> TypeNode {
        self.stamp(TypeNode::Obj(ObjType::new(fields)))
    }

    pub fn field(&self, key: impl Into<String>, ty: TypeNode) -> FieldType {
        FieldType::new(key, ty)
    }

    pub fn field_opt(&self, key: impl Into<String>, ty: TypeNode) -> FieldType {
        FieldType::new_opt(key, ty)
    }

    pub fn map(&self, value: TypeNode) -> TypeNode {
        self.stamp(TypeNode::Map(MapType::new(value)))
    }

    pub fn ref_(&self, id: impl Into<String>) -> TypeNode {
        self.stamp(TypeNode::Ref(RefType::new(id)))
    }

    pub fn or(&self, types: Vec<TypeNode>) -> TypeNode {
        self.stamp(TypeNode::Or(OrType::new(types)))
    }

    pub fn fn_(&self, req: TypeNode, res: TypeNode) -> TypeNode {
        self.stamp(TypeNode::Fn(FnType::new(req, res)))
    }

    pub fn fn_rx(&self, req: TypeNode, res: TypeNode) -> TypeNode {
        self.stamp(TypeNode::FnRx(FnRxType::new(req, res)))
    }

    // -- conveniences -------------------------------------------------------

    /// `T | null`.
    pub fn maybe(&self, ty: TypeNode) -> TypeNode {
        self.or(vec![ty, self.nil()])
    }

    /// A union of constants.
    pub fn enum_<T: Into<Value>>(&self, values: Vec<T>) -> TypeNode {
        self.or(values.into_iter().map(|v| self.con(v)).collect())
    }

    // -- import -------------------------------------------------------------

    /// Recursively reconstructs a type tree from a plain schema, re-applying
    /// every option.
    pub fn import(&self, schema: &Schema) -> TypeNode {
        let base = BaseInfo::from_schema(schema.base(), self.system.clone());
        let node = match schema {
            Schema::Any(_) => TypeNode::Any(AnyType { base }),
            Schema::Con(s) => TypeNode::Con(ConType {
                value: s.value.clone(),
                base,
            }),
            Schema::Bool(_) => TypeNode::Bool(BoolType { base }),
            Schema::Num(s) => TypeNode::Num(NumType {
                format: s.format,
                gt: s.gt,
                gte: s.gte,
                lt: s.lt,
                lte: s.lte,
                base,
            }),
            Schema::Str(s) => TypeNode::Str(StrType {
                min: s.min,
                max: s.max,
                ascii: s.ascii == Some(true),
                no_json_escape: s.no_json_escape == Some(true),
                base,
            }),
            Schema::Bin(s) => TypeNode::Bin(BinType {
                type_: Box::new(self.import(&s.type_)),
                format: s.format,
                min: s.min,
                max: s.max,
                base,
            }),
            Schema::Arr(s) => TypeNode::Arr(ArrType {
                type_: Box::new(self.import(&s.type_)),
                min: s.min,
                max: s.max,
                base,
            }),
            Schema::Tup(s) => TypeNode::Tup(TupType {
                types: s.types.iter().map(|t| self.import(t)).collect(),
                base,
            }),
            Schema::Obj(s) => TypeNode::Obj(ObjType {
                fields: s
                    .fields
                    .iter()
                    .map(|f| FieldType {
                        key: f.key.clone(),
                        ty: Box::new(self.import(&f.type_)),
                        optional: f.optional == Some(true),
                        meta: f.base.clone(),
                    })
                    .collect(),
                unknown_fields: s.unknown_fields == Some(true),
                encode_unknown_fields: s.encode_unknown_fields == Some(true),
                base,
            }),
            Schema::Map(s) => TypeNode::Map(MapType {
                value: Box::new(self.import(&s.value)),
                base,
            }),
            Schema::Ref(s) => TypeNode::Ref(RefType {
                ref_: s.ref_.clone(),
                base,
            }),
            Schema::Or(s) => TypeNode::Or(OrType {
                types: s.types.iter().map(|t| self.import(t)).collect(),
                discriminator: s.discriminator.clone(),
                base,
            }),
            Schema::Fn(s) => TypeNode::Fn(FnType {
                req: Box::new(self.import(&s.req)),
                res: Box::new(self.import(&s.res)),
                base,
            }),
            Schema::FnRx(s) => TypeNode::FnRx(FnRxType {
                req: Box::new(self.import(&s.req)),
                res: Box::new(self.import(&s.res)),
                base,
            }),
        };
        node
    }

    /// Infers a type from an example value.
    pub fn from_value(&self, value: &Value) -> TypeNode {
        match value {
            Value::Null => self.nil(),
            Value::Bool(_) => self.bool(),
            Value::Number(_) => self.num(),
            Value::String(_) => self.str(),
            Value::Array(arr) => {
                if arr.is_empty() {
                    return self.arr(self.any());
                }
                let first = self.from_value(&arr[0]);
                let uniform = arr
                    .iter()
                    .all(|v| self.from_value(v).kind() == first.kind());
                if uniform {
                    self.arr(first)
                } else {
                    self.tup(arr.iter().map(|v| self.from_value(v)).collect())
                }
            }
            Value::Object(map) => self.obj(
                map.iter()
                    .map(|(k, v)| FieldType::new(k.clone(), self.from_value(v)))
                    .collect(),
            ),
        }
    }
}
