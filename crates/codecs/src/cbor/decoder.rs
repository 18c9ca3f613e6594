//! CBOR decoding via `ciborium`, lowered to JSON values.

use ciborium::value::Value as CborValue;
use serde_json::{Map, Number, Value};
use std::io::Cursor;

use crate::error::DecodeError;

/// Decodes one CBOR value into its JSON representation.
///
/// Byte strings come back as arrays of numbers, matching how binary payloads
/// are represented on the JSON side of the type engine.
pub fn decode(bytes: &[u8]) -> Result<Value, DecodeError> {
    let mut cursor = Cursor::new(bytes);
    let value = ciborium::de::from_reader::<CborValue, _>(&mut cursor)
        .map_err(|_| DecodeError::InvalidPayload)?;
    lower(&value)
}

fn lower(value: &CborValue) -> Result<Value, DecodeError> {
    match value {
        CborValue::Null => Ok(Value::Null),
        CborValue::Bool(b) => Ok(Value::Bool(*b)),
        CborValue::Integer(int) => {
            let int = i128::from(*int);
            if let Ok(i) = i64::try_from(int) {
                Ok(Value::Number(i.into()))
            } else if let Ok(u) = u64::try_from(int) {
                Ok(Value::Number(u.into()))
            } else {
                Number::from_f64(int as f64)
                    .map(Value::Number)
                    .ok_or(DecodeError::InvalidPayload)
            }
        }
        CborValue::Float(f) => Number::from_f64(*f)
            .map(Value::Number)
            .ok_or(DecodeError::InvalidPayload),
        CborValue::Text(s) => Ok(Value::String(s.clone())),
        CborValue::Bytes(bytes) => Ok(Value::Array(
            bytes.iter().map(|b| Value::Number((*b).into())).collect(),
        )),
        CborValue::Array(arr) => arr.iter().map(lower).collect::<Result<_, _>>().map(Value::Array),
        CborValue::Map(entries) => {
            let mut map = Map::with_capacity(entries.len());
            for (key, val) in entries {
                let CborValue::Text(key) = key else {
                    return Err(DecodeError::NonStringKey);
                };
                map.insert(key.clone(), lower(val)?);
            }
            Ok(Value::Object(map))
        }
        CborValue::Tag(_, inner) => lower(inner),
        _ => Err(DecodeError::InvalidPayload),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cbor::CborEncoder;
    use serde_json::json;

    #[test]
    fn roundtrip_matrix() {
        let cases = vec![
            json!(null),
            json!(true),
            json!(123),
            json!(-7),
            json!(3.5),
            json!("hello"),
            json!([1, 2, 3]),
            json!({"a": 1, "b": [true, null, "x"]}),
        ];
        let mut encoder = CborEncoder::new();
        for case in cases {
            let bytes = encoder.encode(&case);
            assert_eq!(decode(&bytes).unwrap(), case);
        }
    }
}
