//! Validator compiler.
//!
//! Walks a type tree once and compiles a `(value) → error-indicator`
//! function. The error-indicator shape is selected by [`ErrorMode`]:
//! boolean (`true` means invalid), string (empty means valid, otherwise a
//! compact `[CODE, ...path]` rendering), or object (full error detail).
//!
//! Structural checks run first; custom validators attached to a node run
//! after them, in declared order, short-circuiting on the first failure.

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::Value;

use crate::codegen::discriminator::Discriminator;
use crate::codegen::{LazyRef, Switch};
use crate::constants::ValidationError;
use crate::error::SchemaError;
use crate::schema::NumFormat;
use crate::type_def::TypeNode;
use crate::type_system::CustomValidatorFn;
use crate::util::deep_equal;

/// A compiled validator.
pub type ValidatorFn = Arc<dyn Fn(&Value) -> ValidationResult + Send + Sync>;

/// Mode-independent check compiled once per node and shared by every
/// error-reporting wrapper, including `ref` indirections.
pub(crate) type CheckFn = Arc<dyn Fn(&Value) -> Option<Box<ErrorInfo>> + Send + Sync>;

/// Error-reporting mode of a compiled validator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ErrorMode {
    /// `true` means invalid. The fastest mode.
    #[default]
    Boolean,
    /// Empty string means valid, otherwise `[CODE, ...path]` as JSON text.
    String,
    /// `Ok` or a full [`ObjectValidationError`].
    Object,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ValidatorOptions {
    pub errors: ErrorMode,
    /// Skip the reject-unknown-object-keys check entirely; a fast-path
    /// concession for pre-screened input.
    pub skip_unknown_key_check: bool,
}

/// Full error detail produced in [`ErrorMode::Object`].
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectValidationError {
    pub code: String,
    pub errno: u8,
    pub message: String,
    /// Object keys / array indexes walked to reach the failing value.
    pub path: Vec<Value>,
    /// Kind of the type that reported the failure.
    pub type_: Option<String>,
    /// Alias id when the failure happened inside a `ref`-resolved type.
    pub ref_id: Option<String>,
    /// The nested error from the referenced type.
    pub ref_error: Option<Box<ObjectValidationError>>,
    /// Name of the custom validator that failed.
    pub validator: Option<String>,
}

/// Result of running a compiled validator.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationResult {
    Ok,
    BoolError,
    StringError(String),
    ObjectError(Box<ObjectValidationError>),
}

impl ValidationResult {
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }

    pub fn is_err(&self) -> bool {
        !self.is_ok()
    }
}

/// Internal error carrier; the path is accumulated deepest-first while
/// unwinding and reversed at the reporting boundary.
#[derive(Debug, Clone)]
pub(crate) struct ErrorInfo {
    code: ValidationError,
    kind: &'static str,
    path_rev: Vec<Value>,
    message: Option<String>,
    validator: Option<String>,
    ref_id: Option<String>,
    nested: Option<Box<ErrorInfo>>,
}

impl ErrorInfo {
    fn new(code: ValidationError, kind: &'static str) -> Box<Self> {
        Box::new(Self {
            code,
            kind,
            path_rev: Vec::new(),
            message: None,
            validator: None,
            ref_id: None,
            nested: None,
        })
    }
}

/// Compiles a validator for the given options.
pub(crate) fn compile(
    node: &TypeNode,
    options: ValidatorOptions,
) -> Result<ValidatorFn, SchemaError> {
    let checks = node.compiled_checks(options.skip_unknown_key_check)?;
    Ok(match options.errors {
        ErrorMode::Boolean => Arc::new(move |value: &Value| {
            if checks(value).is_some() {
                ValidationResult::BoolError
            } else {
                ValidationResult::Ok
            }
        }),
        ErrorMode::String => Arc::new(move |value: &Value| match checks(value) {
            None => ValidationResult::Ok,
            Some(error) => ValidationResult::StringError(string_error(*error)),
        }),
        ErrorMode::Object => Arc::new(move |value: &Value| match checks(value) {
            None => ValidationResult::Ok,
            Some(error) => ValidationResult::ObjectError(Box::new(object_error(*error))),
        }),
    })
}

fn string_error(error: ErrorInfo) -> String {
    let mut parts: Vec<Value> = vec![Value::String(error.code.name().to_string())];
    let mut path = error.path_rev;
    path.reverse();
    parts.extend(path);
    serde_json::to_string(&Value::Array(parts)).unwrap_or_default()
}

fn object_error(error: ErrorInfo) -> ObjectValidationError {
    let mut path = error.path_rev;
    path.reverse();
    ObjectValidationError {
        code: error.code.name().to_string(),
        errno: error.code as u8,
        message: error
            .message
            .unwrap_or_else(|| error.code.message().to_string()),
        path,
        type_: Some(error.kind.to_string()),
        ref_id: error.ref_id,
        ref_error: error.nested.map(|nested| Box::new(object_error(*nested))),
        validator: error.validator,
    }
}

/// Compiles the mode-independent check for a node: structural checks
/// followed by the node's custom validators.
pub(crate) fn compile_checks(
    node: &TypeNode,
    skip_unknown_keys: bool,
) -> Result<CheckFn, SchemaError> {
    let structural = gen_kind(node, skip_unknown_keys)?;
    attach_custom_validators(node, structural)
}

fn attach_custom_validators(
    node: &TypeNode,
    structural: CheckFn,
) -> Result<CheckFn, SchemaError> {
    let names = &node.base().validator;
    if names.is_empty() {
        return Ok(structural);
    }
    let system = node
        .base()
        .system
        .as_ref()
        .ok_or_else(|| SchemaError::UnknownValidator(names[0].clone()))?;
    let customs: Vec<(String, CustomValidatorFn)> = names
        .iter()
        .map(|name| {
            system
                .get_custom_validator(name)
                .map(|fun| (name.clone(), fun))
                .ok_or_else(|| SchemaError::UnknownValidator(name.clone()))
        })
        .collect::<Result<_, _>>()?;
    let kind = kind_str(node);
    Ok(Arc::new(move |value: &Value| {
        if let Some(error) = structural(value) {
            return Some(error);
        }
        for (name, fun) in &customs {
            if let Some(message) = fun(value) {
                let mut error = ErrorInfo::new(ValidationError::Validation, kind);
                error.validator = Some(name.clone());
                error.message = Some(message);
                return Some(error);
            }
        }
        None
    }))
}

fn kind_str(node: &TypeNode) -> &'static str {
    node.kind()
}

/// Required fields of these kinds keep an explicit presence check; for the
/// structural kinds the field's own type check rejects an absent value
/// anyway, so the presence check is elided. (A required structural field
/// that is absent reports its kind error rather than `KEY` — a deliberate
/// speed/strictness trade-off; the stricter variant would check presence
/// for every required field.)
fn keeps_presence_check(node: &TypeNode) -> bool {
    matches!(
        node,
        TypeNode::Any(_) | TypeNode::Con(_) | TypeNode::Ref(_) | TypeNode::Or(_)
    )
}

fn gen_kind(node: &TypeNode, skip_unknown_keys: bool) -> Result<CheckFn, SchemaError> {
    match node {
        TypeNode::Any(_) | TypeNode::Fn(_) | TypeNode::FnRx(_) => Ok(Arc::new(|_| None)),

        TypeNode::Con(t) => {
            let expected = t.value.clone();
            Ok(Arc::new(move |value: &Value| {
                if deep_equal(value, &expected) {
                    None
                } else {
                    Some(ErrorInfo::new(ValidationError::Const, "con"))
                }
            }))
        }

        TypeNode::Bool(_) => Ok(Arc::new(|value: &Value| {
            if value.is_boolean() {
                None
            } else {
                Some(ErrorInfo::new(ValidationError::Bool, "bool"))
            }
        })),

        TypeNode::Num(t) => {
            let format = t.format;
            let (gt, gte, lt, lte) = (t.gt, t.gte, t.lt, t.lte);
            Ok(Arc::new(move |value: &Value| {
                let num = match value.as_f64() {
                    Some(num) => num,
                    None => return Some(ErrorInfo::new(ValidationError::Num, "num")),
                };
                if let Some(format) = format {
                    if format.is_integer() {
                        if num.fract() != 0.0 {
                            return Some(ErrorInfo::new(ValidationError::Int, "num"));
                        }
                        if format.is_unsigned() && num < 0.0 {
                            return Some(ErrorInfo::new(ValidationError::Uint, "num"));
                        }
                        match format {
                            NumFormat::U8 if num > 255.0 => {
                                return Some(ErrorInfo::new(ValidationError::Uint, "num"))
                            }
                            NumFormat::U16 if num > 65_535.0 => {
                                return Some(ErrorInfo::new(ValidationError::Uint, "num"))
                            }
                            NumFormat::U32 if num > 4_294_967_295.0 => {
                                return Some(ErrorInfo::new(ValidationError::Uint, "num"))
                            }
                            NumFormat::I8 if !(-128.0..=127.0).contains(&num) => {
                                return Some(ErrorInfo::new(ValidationError::Int, "num"))
                            }
                            NumFormat::I16 if !(-32_768.0..=32_767.0).contains(&num) => {
                                return Some(ErrorInfo::new(ValidationError::Int, "num"))
                            }
                            NumFormat::I32
                                if !(-2_147_483_648.0..=2_147_483_647.0).contains(&num) =>
                            {
                                return Some(ErrorInfo::new(ValidationError::Int, "num"))
                            }
                            // i64/u64: f64 cannot represent every 64-bit
                            // integer exactly (max safe integer is 2^53-1),
                            // so any integral value is accepted for these.
                            _ => {}
                        }
                    } else if !num.is_finite() {
                        return Some(ErrorInfo::new(ValidationError::Num, "num"));
                    }
                }
                if let Some(gt) = gt {
                    if num <= gt {
                        return Some(ErrorInfo::new(ValidationError::Gt, "num"));
                    }
                }
                if let Some(gte) = gte {
                    if num < gte {
                        return Some(ErrorInfo::new(ValidationError::Gte, "num"));
                    }
                }
                if let Some(lt) = lt {
                    if num >= lt {
                        return Some(ErrorInfo::new(ValidationError::Lt, "num"));
                    }
                }
                if let Some(lte) = lte {
                    if num > lte {
                        return Some(ErrorInfo::new(ValidationError::Lte, "num"));
                    }
                }
                None
            }))
        }

        TypeNode::Str(t) => {
            let (min, max, ascii) = (t.min, t.max, t.ascii);
            Ok(Arc::new(move |value: &Value| {
                let s = match value.as_str() {
                    Some(s) => s,
                    None => return Some(ErrorInfo::new(ValidationError::Str, "str")),
                };
                let len = s.chars().count() as u64;
                match (min, max) {
                    // Exact-length specialization.
                    (Some(exact), Some(max)) if exact == max => {
                        if len != exact {
                            return Some(ErrorInfo::new(ValidationError::StrLen, "str"));
                        }
                    }
                    _ => {
                        if let Some(min) = min {
                            if len < min {
                                return Some(ErrorInfo::new(ValidationError::StrLen, "str"));
                            }
                        }
                        if let Some(max) = max {
                            if len > max {
                                return Some(ErrorInfo::new(ValidationError::StrLen, "str"));
                            }
                        }
                    }
                }
                if ascii && !s.is_ascii() {
                    return Some(ErrorInfo::new(ValidationError::Str, "str"));
                }
                None
            }))
        }

        TypeNode::Bin(t) => {
            let (min, max) = (t.min, t.max);
            Ok(Arc::new(move |value: &Value| {
                let arr = match value.as_array() {
                    Some(arr) => arr,
                    None => return Some(ErrorInfo::new(ValidationError::Bin, "bin")),
                };
                if !arr
                    .iter()
                    .all(|b| b.as_u64().is_some_and(|byte| byte <= 255))
                {
                    return Some(ErrorInfo::new(ValidationError::Bin, "bin"));
                }
                let len = arr.len() as u64;
                if let Some(min) = min {
                    if len < min {
                        return Some(ErrorInfo::new(ValidationError::BinLen, "bin"));
                    }
                }
                if let Some(max) = max {
                    if len > max {
                        return Some(ErrorInfo::new(ValidationError::BinLen, "bin"));
                    }
                }
                None
            }))
        }

        TypeNode::Arr(t) => {
            let element = compile_checks(&t.type_, skip_unknown_keys)?;
            let (min, max) = (t.min, t.max);
            Ok(Arc::new(move |value: &Value| {
                let arr = match value.as_array() {
                    Some(arr) => arr,
                    None => return Some(ErrorInfo::new(ValidationError::Arr, "arr")),
                };
                let len = arr.len() as u64;
                if let Some(min) = min {
                    if len < min {
                        return Some(ErrorInfo::new(ValidationError::ArrLen, "arr"));
                    }
                }
                if let Some(max) = max {
                    if len > max {
                        return Some(ErrorInfo::new(ValidationError::ArrLen, "arr"));
                    }
                }
                for (index, item) in arr.iter().enumerate() {
                    if let Some(mut error) = element(item) {
                        error.path_rev.push(Value::Number(index.into()));
                        return Some(error);
                    }
                }
                None
            }))
        }

        TypeNode::Tup(t) => {
            let elements: Vec<CheckFn> = t
                .types
                .iter()
                .map(|ty| compile_checks(ty, skip_unknown_keys))
                .collect::<Result<_, _>>()?;
            Ok(Arc::new(move |value: &Value| {
                let arr = match value.as_array() {
                    Some(arr) => arr,
                    None => return Some(ErrorInfo::new(ValidationError::Tup, "tup")),
                };
                if arr.len() != elements.len() {
                    return Some(ErrorInfo::new(ValidationError::Tup, "tup"));
                }
                for (index, (item, check)) in arr.iter().zip(elements.iter()).enumerate() {
                    if let Some(mut error) = check(item) {
                        error.path_rev.push(Value::Number(index.into()));
                        return Some(error);
                    }
                }
                None
            }))
        }

        TypeNode::Obj(t) => {
            struct FieldPlan {
                key: String,
                check: CheckFn,
                optional: bool,
                explicit_presence: bool,
            }
            let plans: Vec<FieldPlan> = t
                .fields
                .iter()
                .map(|field| {
                    Ok(FieldPlan {
                        key: field.key.clone(),
                        check: compile_checks(&field.ty, skip_unknown_keys)?,
                        optional: field.optional,
                        explicit_presence: keeps_presence_check(&field.ty),
                    })
                })
                .collect::<Result<_, SchemaError>>()?;
            let declared: HashSet<String> =
                t.fields.iter().map(|field| field.key.clone()).collect();
            let check_unknown = !t.unknown_fields && !skip_unknown_keys && !t.fields.is_empty();
            Ok(Arc::new(move |value: &Value| {
                let obj = match value.as_object() {
                    Some(obj) => obj,
                    None => return Some(ErrorInfo::new(ValidationError::Obj, "obj")),
                };
                if check_unknown {
                    for key in obj.keys() {
                        if !declared.contains(key) {
                            let mut error = ErrorInfo::new(ValidationError::Keys, "obj");
                            error.path_rev.push(Value::String(key.clone()));
                            return Some(error);
                        }
                    }
                }
                for plan in &plans {
                    match obj.get(&plan.key) {
                        Some(field_value) => {
                            if let Some(mut error) = (plan.check)(field_value) {
                                error.path_rev.push(Value::String(plan.key.clone()));
                                return Some(error);
                            }
                        }
                        None if plan.optional => {}
                        None if plan.explicit_presence => {
                            let mut error = ErrorInfo::new(ValidationError::Key, "obj");
                            error.path_rev.push(Value::String(plan.key.clone()));
                            return Some(error);
                        }
                        None => {
                            // Structural kinds: an absent value fails the
                            // field's own type check.
                            if let Some(mut error) = (plan.check)(&Value::Null) {
                                error.path_rev.push(Value::String(plan.key.clone()));
                                return Some(error);
                            }
                        }
                    }
                }
                None
            }))
        }

        TypeNode::Map(t) => {
            let element = compile_checks(&t.value, skip_unknown_keys)?;
            Ok(Arc::new(move |value: &Value| {
                let obj = match value.as_object() {
                    Some(obj) => obj,
                    None => return Some(ErrorInfo::new(ValidationError::Map, "map")),
                };
                for (key, item) in obj {
                    if let Some(mut error) = element(item) {
                        error.path_rev.push(Value::String(key.clone()));
                        return Some(error);
                    }
                }
                None
            }))
        }

        TypeNode::Or(t) => {
            let dispatch = Discriminator::create_expression(&t.types)?;
            let arms: Vec<CheckFn> = t
                .types
                .iter()
                .map(|ty| compile_checks(ty, skip_unknown_keys))
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
            // The id must resolve to a concrete alias before compiling
            // against it; the target's own function is compiled lazily on
            // first call, which is what lets cyclic schemas compile.
            let target = system.resolve(&t.ref_)?.ty;
            let id = t.ref_.clone();
            let lazy: Arc<LazyRef<CheckFn>> = Arc::new(LazyRef::new());
            Ok(Arc::new(move |value: &Value| {
                match lazy.get_or_init(|| target.compiled_checks(skip_unknown_keys)) {
                    Ok(checks) => checks(value).map(|nested| {
                        let mut error = ErrorInfo::new(ValidationError::Ref, "ref");
                        error.ref_id = Some(id.clone());
                        error.nested = Some(nested);
                        error
                    }),
                    Err(_) => {
                        let mut error = ErrorInfo::new(ValidationError::Ref, "ref");
                        error.ref_id = Some(id.clone());
                        Some(error)
                    }
                }
            }))
        }
    }
}
