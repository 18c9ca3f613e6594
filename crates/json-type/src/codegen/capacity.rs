//! Capacity estimator compiler.
//!
//! Produces `(value) → usize`, a conservative upper bound on the bytes any
//! supported format needs for the value — never smaller than the true
//! encoded size. Callers size their output buffer with it before encoding,
//! which is why the encoders themselves never re-check bounds per write.

use std::sync::Arc;

use serde_json::Value;

use crate::codegen::discriminator::Discriminator;
use crate::codegen::{LazyRef, Switch};
use crate::error::SchemaError;
use crate::type_def::TypeNode;
use crate::util::{max_encoding_capacity, MaxEncodingOverhead};

/// A compiled capacity estimator. Estimation is total: it never fails.
pub type CapacityEstimatorFn = Arc<dyn Fn(&Value) -> usize + Send + Sync>;

pub(crate) fn compile(node: &TypeNode) -> Result<CapacityEstimatorFn, SchemaError> {
    match node {
        TypeNode::Any(_) | TypeNode::Fn(_) | TypeNode::FnRx(_) => {
            Ok(Arc::new(|value: &Value| max_encoding_capacity(value)))
        }

        TypeNode::Con(t) => {
            let size = max_encoding_capacity(&t.value);
            Ok(Arc::new(move |_value: &Value| size))
        }

        TypeNode::Bool(_) => Ok(Arc::new(|_value: &Value| MaxEncodingOverhead::BOOLEAN)),

        TypeNode::Num(_) => Ok(Arc::new(|_value: &Value| MaxEncodingOverhead::NUMBER)),

        TypeNode::Str(_) => Ok(Arc::new(|value: &Value| {
            let len = value.as_str().map(str::len).unwrap_or(0);
            MaxEncodingOverhead::STRING + MaxEncodingOverhead::STRING_LENGTH_MULTIPLIER * len
        })),

        TypeNode::Bin(_) => Ok(Arc::new(|value: &Value| {
            let len = value.as_array().map(Vec::len).unwrap_or(0);
            MaxEncodingOverhead::BINARY + MaxEncodingOverhead::BINARY_LENGTH_MULTIPLIER * len
        })),

        TypeNode::Arr(t) => {
            // Constant-size element kinds multiply a single estimate by the
            // element count instead of iterating.
            let fixed_element: Option<usize> = match t.type_.as_ref() {
                TypeNode::Con(c) => Some(max_encoding_capacity(&c.value)),
                TypeNode::Bool(_) => Some(MaxEncodingOverhead::BOOLEAN),
                TypeNode::Num(_) => Some(MaxEncodingOverhead::NUMBER),
                _ => None,
            };
            let element = match fixed_element {
                Some(_) => None,
                None => Some(compile(&t.type_)?),
            };
            Ok(Arc::new(move |value: &Value| {
                let arr: &[Value] = value.as_array().map(Vec::as_slice).unwrap_or(&[]);
                let mut size =
                    MaxEncodingOverhead::ARRAY + MaxEncodingOverhead::ARRAY_ELEMENT * arr.len();
                match (&fixed_element, &element) {
                    (Some(per_element), _) => size += per_element * arr.len(),
                    (None, Some(estimate)) => {
                        for item in arr {
                            size += estimate(item);
                        }
                    }
                    (None, None) => {}
                }
                size
            }))
        }

        TypeNode::Tup(t) => {
            let elements: Vec<CapacityEstimatorFn> = t
                .types
                .iter()
                .map(compile)
                .collect::<Result<_, _>>()?;
            Ok(Arc::new(move |value: &Value| {
                let arr: &[Value] = value.as_array().map(Vec::as_slice).unwrap_or(&[]);
                let mut size = MaxEncodingOverhead::ARRAY
                    + MaxEncodingOverhead::ARRAY_ELEMENT * elements.len();
                for (index, estimate) in elements.iter().enumerate() {
                    if let Some(item) = arr.get(index) {
                        size += estimate(item);
                    }
                }
                size
            }))
        }

        TypeNode::Obj(t) => {
            if t.encode_unknown_fields {
                // Unknown keys are carried through verbatim; bound by the
                // whole value.
                return Ok(Arc::new(|value: &Value| max_encoding_capacity(value)));
            }
            struct FieldPlan {
                key: String,
                key_size: usize,
                estimate: CapacityEstimatorFn,
                optional: bool,
            }
            let plans: Vec<FieldPlan> = t
                .fields
                .iter()
                .map(|field| {
                    Ok(FieldPlan {
                        key: field.key.clone(),
                        key_size: MaxEncodingOverhead::STRING
                            + MaxEncodingOverhead::STRING_LENGTH_MULTIPLIER * field.key.len(),
                        estimate: compile(&field.ty)?,
                        optional: field.optional,
                    })
                })
                .collect::<Result<_, SchemaError>>()?;
            Ok(Arc::new(move |value: &Value| {
                let obj = match value.as_object() {
                    Some(obj) => obj,
                    None => return MaxEncodingOverhead::OBJECT,
                };
                let mut size = MaxEncodingOverhead::OBJECT;
                for plan in &plans {
                    match obj.get(&plan.key) {
                        Some(item) => {
                            size += MaxEncodingOverhead::OBJECT_ELEMENT;
                            size += plan.key_size;
                            size += (plan.estimate)(item);
                        }
                        None if plan.optional => {}
                        None => {
                            size += MaxEncodingOverhead::OBJECT_ELEMENT;
                            size += plan.key_size;
                        }
                    }
                }
                size
            }))
        }

        TypeNode::Map(t) => {
            let element = compile(&t.value)?;
            Ok(Arc::new(move |value: &Value| {
                let obj = match value.as_object() {
                    Some(obj) => obj,
                    None => return MaxEncodingOverhead::OBJECT,
                };
                let mut size = MaxEncodingOverhead::OBJECT
                    + MaxEncodingOverhead::OBJECT_ELEMENT * obj.len();
                for (key, item) in obj {
                    size += MaxEncodingOverhead::STRING
                        + MaxEncodingOverhead::STRING_LENGTH_MULTIPLIER * key.len();
                    size += element(item);
                }
                size
            }))
        }

        TypeNode::Or(t) => {
            let dispatch = Discriminator::create_expression(&t.types)?;
            let arms: Vec<CapacityEstimatorFn> = t
                .types
                .iter()
                .map(compile)
                .collect::<Result<_, _>>()?;
            let switch = Switch::new(dispatch, arms);
            Ok(Arc::new(move |value: &Value| switch.select(value)(value)))
        }

        TypeNode::Ref(t) => {
            let system = t
                .base
                .system
                .clone()
                .ok_or_else(|| SchemaError::NoSystem(t.ref_.clone()))?;
            let target = system.resolve(&t.ref_)?.ty;
            let lazy: Arc<LazyRef<CapacityEstimatorFn>> = Arc::new(LazyRef::new());
            Ok(Arc::new(move |value: &Value| {
                match lazy.get_or_init(|| target.capacity_estimator()) {
                    Ok(estimate) => estimate(value),
                    Err(_) => max_encoding_capacity(value),
                }
            }))
        }
    }
}
