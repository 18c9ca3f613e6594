//! Encoder compiler for the byte-oriented formats (CBOR, MessagePack, and
//! the JSON text form written as bytes).
//!
//! One compiler serves all three formats by emitting calls against the
//! [`Encoder`] capability; format differences live entirely inside the
//! capability. Output known ahead of time — structural headers of
//! fixed-shape containers, object keys, `con` values — is pre-rendered at
//! compile time by running a throwaway encoder, and adjacent constant runs
//! are folded into single bulk writes by the assembler.

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::Value;

use json_type_codecs::{Encoder, EncodingFormat};

use crate::codegen::discriminator::Discriminator;
use crate::codegen::{Assembler, LazyRef, Program, Step, Switch};
use crate::error::{EncodeError, SchemaError};
use crate::type_def::TypeNode;

/// A compiled encoder. The caller owns the writer lifecycle: reset before,
/// flush after.
pub type BinaryEncoderFn =
    Arc<dyn Fn(&Value, &mut dyn Encoder) -> Result<(), EncodeError> + Send + Sync>;

/// Outcome of compiling one subtree: either fully constant bytes, or a
/// dynamic function. Constant subtrees fold into their parents' programs.
enum Gen {
    Const(Vec<u8>),
    Dyn(BinaryEncoderFn),
}

pub(crate) fn compile(node: &TypeNode, format: EncodingFormat) -> Result<BinaryEncoderFn, SchemaError> {
    Ok(to_fn(gen(node, format)?))
}

/// Runs a throwaway encoder to pre-render constant output.
fn render(format: EncodingFormat, emit: impl FnOnce(&mut dyn Encoder)) -> Vec<u8> {
    let mut encoder = format.new_encoder();
    encoder.writer().reset();
    emit(&mut *encoder);
    encoder.writer().flush()
}

fn to_fn(gen: Gen) -> BinaryEncoderFn {
    match gen {
        Gen::Const(blob) => Arc::new(move |_value: &Value, encoder: &mut dyn Encoder| {
            encoder.writer().buf(&blob);
            Ok(())
        }),
        Gen::Dyn(fun) => fun,
    }
}

fn finish(program: Program<Vec<u8>, BinaryEncoderFn>) -> Gen {
    match program.into_const() {
        Ok(blob) => Gen::Const(blob),
        Err(program) => {
            let steps = program.steps;
            Gen::Dyn(Arc::new(move |value: &Value, encoder: &mut dyn Encoder| {
                for step in &steps {
                    match step {
                        Step::Blob(blob) => encoder.writer().buf(blob),
                        Step::Op(op) => op(value, encoder)?,
                    }
                }
                Ok(())
            }))
        }
    }
}

fn gen(node: &TypeNode, format: EncodingFormat) -> Result<Gen, SchemaError> {
    match node {
        TypeNode::Con(t) => {
            let value = t.value.clone();
            Ok(Gen::Const(render(format, |e| e.write_any(&value))))
        }

        TypeNode::Any(_) => Ok(Gen::Dyn(Arc::new(|value, encoder| {
            encoder.write_any(value);
            Ok(())
        }))),

        TypeNode::Fn(_) | TypeNode::FnRx(_) => Ok(Gen::Dyn(Arc::new(|_value, encoder| {
            encoder.write_null();
            Ok(())
        }))),

        TypeNode::Bool(_) => Ok(Gen::Dyn(Arc::new(|value, encoder| {
            let b = value.as_bool().ok_or(EncodeError::Mismatch("boolean"))?;
            encoder.write_boolean(b);
            Ok(())
        }))),

        TypeNode::Num(t) => {
            let num_format = t.format;
            Ok(Gen::Dyn(Arc::new(move |value, encoder| {
                let num = match value {
                    Value::Number(num) => num,
                    _ => return Err(EncodeError::Mismatch("number")),
                };
                match num_format {
                    Some(f) if f.is_unsigned() => {
                        // Integral floats are admitted by the validator, so
                        // accept them here as well.
                        let uint = num
                            .as_u64()
                            .or_else(|| {
                                num.as_f64()
                                    .filter(|x| x.fract() == 0.0 && *x >= 0.0)
                                    .map(|x| x as u64)
                            })
                            .ok_or(EncodeError::Mismatch("unsigned integer"))?;
                        encoder.write_u_integer(uint);
                    }
                    Some(f) if f.is_integer() => {
                        let int = num
                            .as_i64()
                            .or_else(|| {
                                num.as_f64()
                                    .filter(|x| x.fract() == 0.0)
                                    .map(|x| x as i64)
                            })
                            .ok_or(EncodeError::Mismatch("integer"))?;
                        encoder.write_integer(int);
                    }
                    Some(_) => {
                        let float = num.as_f64().ok_or(EncodeError::Mismatch("number"))?;
                        encoder.write_float(float);
                    }
                    None => encoder.write_number(num),
                }
                Ok(())
            })))
        }

        TypeNode::Str(t) => {
            let ascii = t.ascii;
            Ok(Gen::Dyn(Arc::new(move |value, encoder| {
                let s = value.as_str().ok_or(EncodeError::Mismatch("string"))?;
                if ascii {
                    encoder.write_ascii_str(s);
                } else {
                    encoder.write_str(s);
                }
                Ok(())
            })))
        }

        TypeNode::Bin(_) => Ok(Gen::Dyn(Arc::new(|value, encoder| {
            let arr = value.as_array().ok_or(EncodeError::Bin)?;
            let mut bytes = Vec::with_capacity(arr.len());
            for item in arr {
                let byte = item
                    .as_u64()
                    .and_then(|n| u8::try_from(n).ok())
                    .ok_or(EncodeError::Bin)?;
                bytes.push(byte);
            }
            encoder.write_bin(&bytes);
            Ok(())
        }))),

        TypeNode::Arr(t) => {
            let element = to_fn(gen(&t.type_, format)?);
            Ok(Gen::Dyn(Arc::new(move |value, encoder| {
                let arr = value.as_array().ok_or(EncodeError::Mismatch("array"))?;
                encoder.write_arr_hdr(arr.len());
                for (index, item) in arr.iter().enumerate() {
                    if index > 0 {
                        encoder.write_arr_separator();
                    }
                    element(item, encoder)?;
                }
                encoder.write_end_arr();
                Ok(())
            })))
        }

        TypeNode::Tup(t) => {
            let mut asm: Assembler<Vec<u8>, BinaryEncoderFn> = Assembler::new();
            asm.blob(render(format, |e| e.write_arr_hdr(t.types.len())));
            for (index, ty) in t.types.iter().enumerate() {
                if index > 0 {
                    asm.blob(render(format, |e| e.write_arr_separator()));
                }
                match gen(ty, format)? {
                    Gen::Const(blob) => asm.blob(blob),
                    Gen::Dyn(fun) => {
                        asm.op(Arc::new(move |value: &Value, encoder: &mut dyn Encoder| {
                            let item = value
                                .as_array()
                                .and_then(|arr| arr.get(index))
                                .ok_or(EncodeError::Mismatch("tuple"))?;
                            fun(item, encoder)
                        }));
                    }
                }
            }
            asm.blob(render(format, |e| e.write_end_arr()));
            Ok(finish(asm.compile()))
        }

        TypeNode::Obj(t) => {
            let fixed = t.fields.iter().all(|f| !f.optional) && !t.encode_unknown_fields;
            if fixed {
                // Static shape: the header and every key fold into blobs;
                // an all-constant object folds into one.
                let mut asm: Assembler<Vec<u8>, BinaryEncoderFn> = Assembler::new();
                asm.blob(render(format, |e| e.write_obj_hdr(t.fields.len())));
                for (index, field) in t.fields.iter().enumerate() {
                    if index > 0 {
                        asm.blob(render(format, |e| e.write_obj_separator()));
                    }
                    let key = field.key.clone();
                    asm.blob(render(format, |e| {
                        e.write_str(&key);
                        e.write_obj_key_separator();
                    }));
                    match gen(&field.ty, format)? {
                        Gen::Const(blob) => asm.blob(blob),
                        Gen::Dyn(fun) => {
                            let key = field.key.clone();
                            asm.op(Arc::new(move |value: &Value, encoder: &mut dyn Encoder| {
                                let item = value
                                    .as_object()
                                    .ok_or(EncodeError::Mismatch("object"))?
                                    .get(&key)
                                    .ok_or_else(|| EncodeError::Field(key.clone()))?;
                                fun(item, encoder)
                            }));
                        }
                    }
                }
                asm.blob(render(format, |e| e.write_end_obj()));
                return Ok(finish(asm.compile()));
            }

            // Dynamic shape: the field count is only known after checking
            // which optional and unknown fields are present, so a
            // placeholder header goes first and the true count is patched
            // back at the end (trailing-separator elision for text).
            struct FieldPlan {
                key: String,
                key_blob: Vec<u8>,
                encode: BinaryEncoderFn,
                optional: bool,
            }
            let plans: Vec<FieldPlan> = t
                .fields
                .iter()
                .map(|field| {
                    let key = field.key.clone();
                    let key_blob = render(format, |e| {
                        e.write_str(&key);
                        e.write_obj_key_separator();
                    });
                    Ok(FieldPlan {
                        key,
                        key_blob,
                        encode: to_fn(gen(&field.ty, format)?),
                        optional: field.optional,
                    })
                })
                .collect::<Result<_, SchemaError>>()?;
            let declared: HashSet<String> = t.fields.iter().map(|f| f.key.clone()).collect();
            let encode_unknown = t.encode_unknown_fields;
            Ok(Gen::Dyn(Arc::new(move |value, encoder| {
                let obj = value.as_object().ok_or(EncodeError::Mismatch("object"))?;
                let pos = encoder.write_obj_hdr_placeholder();
                let mut count = 0usize;
                for plan in &plans {
                    match obj.get(&plan.key) {
                        Some(item) => {
                            encoder.writer().buf(&plan.key_blob);
                            (plan.encode)(item, encoder)?;
                            encoder.write_obj_separator();
                            count += 1;
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
                        encoder.write_str(key);
                        encoder.write_obj_key_separator();
                        encoder.write_any(item);
                        encoder.write_obj_separator();
                        count += 1;
                    }
                }
                encoder.patch_obj_hdr(pos, count);
                Ok(())
            })))
        }

        TypeNode::Map(t) => {
            let element = to_fn(gen(&t.value, format)?);
            Ok(Gen::Dyn(Arc::new(move |value, encoder| {
                let obj = value.as_object().ok_or(EncodeError::Mismatch("map"))?;
                let pos = encoder.write_obj_hdr_placeholder();
                for (key, item) in obj {
                    encoder.write_str(key);
                    encoder.write_obj_key_separator();
                    element(item, encoder)?;
                    encoder.write_obj_separator();
                }
                encoder.patch_obj_hdr(pos, obj.len());
                Ok(())
            })))
        }

        TypeNode::Or(t) => {
            let dispatch = Discriminator::create_expression(&t.types)?;
            let arms: Vec<BinaryEncoderFn> = t
                .types
                .iter()
                .map(|ty| gen(ty, format).map(to_fn))
                .collect::<Result<_, _>>()?;
            let switch = Switch::new(dispatch, arms);
            Ok(Gen::Dyn(Arc::new(move |value, encoder| {
                switch.select(value)(value, encoder)
            })))
        }

        TypeNode::Ref(t) => {
            let system = t
                .base
                .system
                .clone()
                .ok_or_else(|| SchemaError::NoSystem(t.ref_.clone()))?;
            // Call the target's own compiled encoder indirectly instead of
            // inlining it; compilation happens on the first actual call,
            // which keeps cyclic schemas compilable.
            let target = system.resolve(&t.ref_)?.ty;
            let lazy: Arc<LazyRef<BinaryEncoderFn>> = Arc::new(LazyRef::new());
            Ok(Gen::Dyn(Arc::new(move |value, encoder| {
                let encode = lazy.get_or_init(|| target.encoder(format))?;
                encode(value, encoder)
            })))
        }
    }
}
