//! JSON text encoder compiler.
//!
//! Produces `(value) → String` writers built from coalesced string
//! fragments: object keys, fixed structure, and `con` values are rendered
//! once at compile time; only schema-dynamic parts run per call. Objects
//! with optional or carried-through unknown fields append a separator after
//! every field and elide the trailing one before the closing brace.

use std::collections::HashSet;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::Value;

use crate::codegen::discriminator::Discriminator;
use crate::codegen::{Assembler, LazyRef, Program, Step, Switch};
use crate::error::{EncodeError, SchemaError};
use crate::type_def::TypeNode;

/// A compiled JSON text encoder.
pub type TextEncoderFn = Arc<dyn Fn(&Value) -> Result<String, EncodeError> + Send + Sync>;

type TextOp = Arc<dyn Fn(&Value, &mut String) -> Result<(), EncodeError> + Send + Sync>;

enum Gen {
    Const(String),
    Dyn(TextOp),
}

pub(crate) fn compile(node: &TypeNode) -> Result<TextEncoderFn, SchemaError> {
    Ok(match gen(node)? {
        Gen::Const(text) => Arc::new(move |_value: &Value| Ok(text.clone())),
        Gen::Dyn(op) => Arc::new(move |value: &Value| {
            let mut out = String::new();
            op(value, &mut out)?;
            Ok(out)
        }),
    })
}

fn to_op(gen: Gen) -> TextOp {
    match gen {
        Gen::Const(text) => Arc::new(move |_value: &Value, out: &mut String| {
            out.push_str(&text);
            Ok(())
        }),
        Gen::Dyn(op) => op,
    }
}

fn finish(program: Program<String, TextOp>) -> Gen {
    match program.into_const() {
        Ok(text) => Gen::Const(text),
        Err(program) => {
            let steps = program.steps;
            Gen::Dyn(Arc::new(move |value: &Value, out: &mut String| {
                for step in &steps {
                    match step {
                        Step::Blob(text) => out.push_str(text),
                        Step::Op(op) => op(value, out)?,
                    }
                }
                Ok(())
            }))
        }
    }
}

/// Renders a value as JSON at compile time.
fn render_const(value: &Value) -> Result<String, SchemaError> {
    serde_json::to_string(value).map_err(|err| SchemaError::InvalidConst(err.to_string()))
}

fn write_any(value: &Value, out: &mut String) -> Result<(), EncodeError> {
    let text =
        serde_json::to_string(value).map_err(|_| EncodeError::Mismatch("JSON value"))?;
    out.push_str(&text);
    Ok(())
}

fn gen(node: &TypeNode) -> Result<Gen, SchemaError> {
    match node {
        TypeNode::Con(t) => Ok(Gen::Const(render_const(&t.value)?)),

        TypeNode::Any(_) => Ok(Gen::Dyn(Arc::new(|value, out| write_any(value, out)))),

        TypeNode::Fn(_) | TypeNode::FnRx(_) => Ok(Gen::Dyn(Arc::new(|_value, out| {
            out.push_str("null");
            Ok(())
        }))),

        TypeNode::Bool(_) => Ok(Gen::Dyn(Arc::new(|value, out| {
            let b = value.as_bool().ok_or(EncodeError::Mismatch("boolean"))?;
            out.push_str(if b { "true" } else { "false" });
            Ok(())
        }))),

        TypeNode::Num(_) => Ok(Gen::Dyn(Arc::new(|value, out| {
            match value {
                Value::Number(num) => out.push_str(&num.to_string()),
                _ => return Err(EncodeError::Mismatch("number")),
            }
            Ok(())
        }))),

        TypeNode::Str(t) => {
            let no_json_escape = t.no_json_escape;
            Ok(Gen::Dyn(Arc::new(move |value, out| {
                let s = value.as_str().ok_or(EncodeError::Mismatch("string"))?;
                if no_json_escape {
                    out.push('"');
                    out.push_str(s);
                    out.push('"');
                } else {
                    let escaped = serde_json::to_string(s)
                        .map_err(|_| EncodeError::Mismatch("string"))?;
                    out.push_str(&escaped);
                }
                Ok(())
            })))
        }

        TypeNode::Bin(_) => Ok(Gen::Dyn(Arc::new(|value, out| {
            let arr = value.as_array().ok_or(EncodeError::Bin)?;
            let mut bytes = Vec::with_capacity(arr.len());
            for item in arr {
                let byte = item
                    .as_u64()
                    .and_then(|n| u8::try_from(n).ok())
                    .ok_or(EncodeError::Bin)?;
                bytes.push(byte);
            }
            out.push_str("\"data:application/octet-stream;base64,");
            out.push_str(&BASE64.encode(&bytes));
            out.push('"');
            Ok(())
        }))),

        TypeNode::Arr(t) => {
            let element = to_op(gen(&t.type_)?);
            Ok(Gen::Dyn(Arc::new(move |value, out| {
                let arr = value.as_array().ok_or(EncodeError::Mismatch("array"))?;
                out.push('[');
                for (index, item) in arr.iter().enumerate() {
                    if index > 0 {
                        out.push(',');
                    }
                    element(item, out)?;
                }
                out.push(']');
                Ok(())
            })))
        }

        TypeNode::Tup(t) => {
            let mut asm: Assembler<String, TextOp> = Assembler::new();
            asm.blob("[".into());
            for (index, ty) in t.types.iter().enumerate() {
                if index > 0 {
                    asm.blob(",".into());
                }
                match gen(ty)? {
                    Gen::Const(text) => asm.blob(text),
                    Gen::Dyn(op) => {
                        asm.op(Arc::new(move |value: &Value, out: &mut String| {
                            let item = value
                                .as_array()
                                .and_then(|arr| arr.get(index))
                                .ok_or(EncodeError::Mismatch("tuple"))?;
                            op(item, out)
                        }));
                    }
                }
            }
            asm.blob("]".into());
            Ok(finish(asm.compile()))
        }

        TypeNode::Obj(t) => {
            let fixed = t.fields.iter().all(|f| !f.optional) && !t.encode_unknown_fields;
            if fixed {
                let mut asm: Assembler<String, TextOp> = Assembler::new();
                asm.blob("{".into());
                for (index, field) in t.fields.iter().enumerate() {
                    if index > 0 {
                        asm.blob(",".into());
                    }
                    let mut key_blob = serde_json::to_string(&field.key)
                        .map_err(|err| SchemaError::InvalidConst(err.to_string()))?;
                    key_blob.push(':');
                    asm.blob(key_blob);
                    match gen(&field.ty)? {
                        Gen::Const(text) => asm.blob(text),
                        Gen::Dyn(op) => {
                            let key = field.key.clone();
                            asm.op(Arc::new(move |value: &Value, out: &mut String| {
                                let item = value
                                    .as_object()
                                    .ok_or(EncodeError::Mismatch("object"))?
                                    .get(&key)
                                    .ok_or_else(|| EncodeError::Field(key.clone()))?;
                                op(item, out)
                            }));
                        }
                    }
                }
                asm.blob("}".into());
                return Ok(finish(asm.compile()));
            }

            struct FieldPlan {
                key: String,
                key_blob: String,
                encode: TextOp,
                optional: bool,
            }
            let plans: Vec<FieldPlan> = t
                .fields
                .iter()
                .map(|field| {
                    let mut key_blob = serde_json::to_string(&field.key)
                        .map_err(|err| SchemaError::InvalidConst(err.to_string()))?;
                    key_blob.push(':');
                    Ok(FieldPlan {
                        key: field.key.clone(),
                        key_blob,
                        encode: to_op(gen(&field.ty)?),
                        optional: field.optional,
                    })
                })
                .collect::<Result<_, SchemaError>>()?;
            let declared: HashSet<String> = t.fields.iter().map(|f| f.key.clone()).collect();
            let encode_unknown = t.encode_unknown_fields;
            Ok(Gen::Dyn(Arc::new(move |value, out| {
                let obj = value.as_object().ok_or(EncodeError::Mismatch("object"))?;
                out.push('{');
                for plan in &plans {
                    match obj.get(&plan.key) {
                        Some(item) => {
                            out.push_str(&plan.key_blob);
                            (plan.encode)(item, out)?;
                            out.push(',');
                        }
                        None if plan.optional => {}
                        None => return Err(EncodeError::Field(plan.key.clone())),
                    }
                }
                if encode_unknown {
                    for (key, item) in obj {
                        if declared.contains(key) {
                            continue;
                        }
                        let escaped = serde_json::to_string(key)
                            .map_err(|_| EncodeError::Mismatch("string"))?;
                        out.push_str(&escaped);
                        out.push(':');
                        write_any(item, out)?;
                        out.push(',');
                    }
                }
                // Trailing-separator elision: the last comma is overwritten
                // by the closing brace.
                if out.ends_with(',') {
                    out.pop();
                }
                out.push('}');
                Ok(())
            })))
        }

        TypeNode::Map(t) => {
            let element = to_op(gen(&t.value)?);
            Ok(Gen::Dyn(Arc::new(move |value, out| {
                let obj = value.as_object().ok_or(EncodeError::Mismatch("map"))?;
                out.push('{');
                for (index, (key, item)) in obj.iter().enumerate() {
                    if index > 0 {
                        out.push(',');
                    }
                    let escaped = serde_json::to_string(key)
                        .map_err(|_| EncodeError::Mismatch("string"))?;
                    out.push_str(&escaped);
                    out.push(':');
                    element(item, out)?;
                }
                out.push('}');
                Ok(())
            })))
        }

        TypeNode::Or(t) => {
            let dispatch = Discriminator::create_expression(&t.types)?;
            let arms: Vec<TextOp> = t
                .types
                .iter()
                .map(|ty| gen(ty).map(to_op))
                .collect::<Result<_, _>>()?;
            let switch = Switch::new(dispatch, arms);
            Ok(Gen::Dyn(Arc::new(move |value, out| {
                switch.select(value)(value, out)
            })))
        }

        TypeNode::Ref(t) => {
            let system = t
                .base
                .system
                .clone()
                .ok_or_else(|| SchemaError::NoSystem(t.ref_.clone()))?;
            let target = system.resolve(&t.ref_)?.ty;
            let lazy: Arc<LazyRef<TextEncoderFn>> = Arc::new(LazyRef::new());
            Ok(Gen::Dyn(Arc::new(move |value, out| {
                let encode = lazy.get_or_init(|| target.json_text_encoder())?;
                out.push_str(&encode(value)?);
                Ok(())
            })))
        }
    }
}
