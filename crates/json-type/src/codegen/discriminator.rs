//! Discriminator inference for tagged unions.
//!
//! Given the alternatives of an `or` type, infers a minimal test that picks
//! the correct alternative: the shallowest reachable `con` node ("value at
//! path equals the constant"), or, failing that, a coarse runtime-shape test
//! at the root. Every backend dispatches unions through the same compiled
//! expression.

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::{json, Value};

use crate::error::SchemaError;
use crate::type_def::TypeNode;
use crate::util::deep_equal;

/// Compiled union dispatch: `(value) → alternative index`.
pub type DispatchFn = Arc<dyn Fn(&Value) -> usize + Send + Sync>;

#[derive(Debug, Clone, PartialEq)]
pub enum PathStep {
    Key(String),
    Index(usize),
}

/// The coarse runtime-shape test used when no constant is reachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindTest {
    Any,
    Bool,
    Num,
    Str,
    Arr,
    Obj,
    Bin,
}

impl KindTest {
    fn name(self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::Bool => "bool",
            Self::Num => "num",
            Self::Str => "str",
            Self::Arr => "arr",
            Self::Obj => "obj",
            Self::Bin => "bin",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// The value at the path equals this constant.
    Const(Value),
    /// The value's runtime shape matches the kind.
    Kind(KindTest),
}

/// The inferred test for one union alternative.
#[derive(Debug, Clone, PartialEq)]
pub struct Discriminator {
    pub path: Vec<PathStep>,
    pub condition: Condition,
}

impl Discriminator {
    /// Infers the discriminator for one alternative.
    pub fn find(node: &TypeNode) -> Result<Self, SchemaError> {
        let mut path = Vec::new();
        let mut seen = HashSet::new();
        if let Some(found) = find_const(node, &mut path, &mut seen)? {
            return Ok(found);
        }
        let kind = coarse_kind(node)?;
        Ok(Self {
            path: Vec::new(),
            condition: Condition::Kind(kind),
        })
    }

    /// Infers discriminators for every alternative and rejects duplicates.
    ///
    /// Two alternatives with the same fingerprint could never be told apart,
    /// which makes the union ambiguous — a schema error, not a runtime one.
    pub fn verify(types: &[TypeNode]) -> Result<Vec<Self>, SchemaError> {
        if types.is_empty() {
            return Err(SchemaError::EmptyUnion);
        }
        let discriminators = types
            .iter()
            .map(Self::find)
            .collect::<Result<Vec<_>, _>>()?;
        let mut seen: HashSet<String> = HashSet::new();
        for discriminator in &discriminators {
            let fingerprint = discriminator.fingerprint();
            if !seen.insert(fingerprint.clone()) {
                return Err(SchemaError::AmbiguousUnion(fingerprint));
            }
        }
        Ok(discriminators)
    }

    /// Compiles the union dispatch expression.
    ///
    /// The expression nests one conditional per alternative with the first
    /// declared alternative outermost, so conditions are evaluated in
    /// declaration order and earlier alternatives are never shadowed by
    /// later ones with overlapping conditions. A value matching no
    /// condition falls to alternative 0, the implicit default.
    pub fn create_expression(types: &[TypeNode]) -> Result<DispatchFn, SchemaError> {
        let discriminators = Self::verify(types)?;
        Ok(Arc::new(move |value: &Value| {
            for (index, discriminator) in discriminators.iter().enumerate() {
                if discriminator.eval(value) {
                    return index;
                }
            }
            0
        }))
    }

    /// Evaluates the condition against a value.
    pub fn eval(&self, value: &Value) -> bool {
        let mut at = value;
        for step in &self.path {
            let next = match step {
                PathStep::Key(key) => at.get(key),
                PathStep::Index(index) => at.get(index),
            };
            match next {
                Some(next) => at = next,
                None => return false,
            }
        }
        match &self.condition {
            Condition::Const(expected) => deep_equal(at, expected),
            Condition::Kind(KindTest::Any) => true,
            Condition::Kind(KindTest::Bool) => at.is_boolean(),
            Condition::Kind(KindTest::Num) => at.is_number(),
            Condition::Kind(KindTest::Str) => at.is_string(),
            Condition::Kind(KindTest::Arr) | Condition::Kind(KindTest::Bin) => at.is_array(),
            Condition::Kind(KindTest::Obj) => at.is_object(),
        }
    }

    /// Stable specifier used to detect ambiguous unions.
    pub fn fingerprint(&self) -> String {
        let path: Vec<Value> = self
            .path
            .iter()
            .map(|step| match step {
                PathStep::Key(key) => json!(key),
                PathStep::Index(index) => json!(index),
            })
            .collect();
        let condition = match &self.condition {
            Condition::Const(value) => json!(["con", value]),
            Condition::Kind(kind) => json!(["kind", kind.name()]),
        };
        json!([path, condition]).to_string()
    }
}

/// Depth-first search for the shallowest reachable constant: directly at the
/// node, or nested through tuple elements and object fields. Aliases are
/// entered at most once so cyclic schemas terminate.
fn find_const(
    node: &TypeNode,
    path: &mut Vec<PathStep>,
    seen: &mut HashSet<String>,
) -> Result<Option<Discriminator>, SchemaError> {
    match node {
        TypeNode::Con(t) => Ok(Some(Discriminator {
            path: path.clone(),
            condition: Condition::Const(t.value.clone()),
        })),
        TypeNode::Tup(t) => {
            for (index, child) in t.types.iter().enumerate() {
                path.push(PathStep::Index(index));
                if let Some(found) = find_const(child, path, seen)? {
                    return Ok(Some(found));
                }
                path.pop();
            }
            Ok(None)
        }
        TypeNode::Obj(t) => {
            for field in &t.fields {
                path.push(PathStep::Key(field.key.clone()));
                if let Some(found) = find_const(&field.ty, path, seen)? {
                    return Ok(Some(found));
                }
                path.pop();
            }
            Ok(None)
        }
        TypeNode::Ref(t) => {
            if !seen.insert(t.ref_.clone()) {
                return Ok(None);
            }
            let target = resolve_ref(t)?;
            find_const(&target, path, seen)
        }
        _ => Ok(None),
    }
}

fn coarse_kind(node: &TypeNode) -> Result<KindTest, SchemaError> {
    Ok(match node {
        TypeNode::Any(_) => KindTest::Any,
        TypeNode::Bool(_) => KindTest::Bool,
        TypeNode::Num(_) => KindTest::Num,
        TypeNode::Str(_) => KindTest::Str,
        TypeNode::Bin(_) => KindTest::Bin,
        TypeNode::Arr(_) | TypeNode::Tup(_) => KindTest::Arr,
        TypeNode::Obj(_) | TypeNode::Map(_) => KindTest::Obj,
        TypeNode::Ref(t) => coarse_kind(&resolve_ref(t)?)?,
        TypeNode::Con(_) => KindTest::Any, // unreachable; constants are found first
        TypeNode::Or(_) => return Err(SchemaError::Undiscriminable("or")),
        TypeNode::Fn(_) | TypeNode::FnRx(_) => return Err(SchemaError::Undiscriminable("fn")),
    })
}

fn resolve_ref(t: &crate::type_def::RefType) -> Result<TypeNode, SchemaError> {
    let system = t
        .base
        .system
        .as_ref()
        .ok_or_else(|| SchemaError::NoSystem(t.ref_.clone()))?;
    Ok(system.resolve(&t.ref_)?.ty)
}
