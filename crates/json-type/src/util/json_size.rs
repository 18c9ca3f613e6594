use serde_json::Value;

/// Worst-case encoding overhead constants, shared by the capacity estimator.
///
/// The values hold for every supported format simultaneously: each is the
/// maximum across the JSON text form (the loosest for strings and binary,
/// which becomes a base64 data URI) and the binary forms (the loosest for
/// small headers).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaxEncodingOverhead;

impl MaxEncodingOverhead {
    /// Literal `null` = 4 bytes.
    pub const NULL: usize = 4;
    /// Literal `false` = 5 bytes.
    pub const BOOLEAN: usize = 5;
    /// Longest number literal, e.g. `1.1111111111111111e+21`.
    pub const NUMBER: usize = 22;
    /// String framing: header or quotes plus length bytes.
    pub const STRING: usize = 1 + 4;
    /// Per-character multiplier: up to 4 UTF-8 bytes, each possibly escaped.
    pub const STRING_LENGTH_MULTIPLIER: usize = 5;
    /// Binary framing: quotes + `data:application/octet-stream;base64,` + padding.
    pub const BINARY: usize = 2 + 37 + 2;
    /// Per-byte multiplier for the base64 expansion.
    pub const BINARY_LENGTH_MULTIPLIER: usize = 2;
    /// Array framing: bracket/header plus length bytes.
    pub const ARRAY: usize = 1 + 4;
    /// Per-element separator.
    pub const ARRAY_ELEMENT: usize = 1;
    /// Object framing: brace/header plus length bytes.
    pub const OBJECT: usize = 1 + 4;
    /// Per-field key and value separators.
    pub const OBJECT_ELEMENT: usize = 1 + 1;
}

/// Worst-case encoded size of an arbitrary JSON value.
pub fn max_encoding_capacity(value: &Value) -> usize {
    match value {
        Value::Null => MaxEncodingOverhead::NULL,
        Value::Bool(_) => MaxEncodingOverhead::BOOLEAN,
        Value::Number(_) => MaxEncodingOverhead::NUMBER,
        Value::String(s) => {
            MaxEncodingOverhead::STRING + s.len() * MaxEncodingOverhead::STRING_LENGTH_MULTIPLIER
        }
        Value::Array(arr) => {
            let mut size =
                MaxEncodingOverhead::ARRAY + arr.len() * MaxEncodingOverhead::ARRAY_ELEMENT;
            for elem in arr {
                size += max_encoding_capacity(elem);
            }
            size
        }
        Value::Object(obj) => {
            let mut size = MaxEncodingOverhead::OBJECT;
            for (key, val) in obj {
                size += MaxEncodingOverhead::OBJECT_ELEMENT;
                size += MaxEncodingOverhead::STRING
                    + key.len() * MaxEncodingOverhead::STRING_LENGTH_MULTIPLIER;
                size += max_encoding_capacity(val);
            }
            size
        }
    }
}
