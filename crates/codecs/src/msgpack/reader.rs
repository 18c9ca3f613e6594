//! MessagePack reader lowering payloads to JSON values.

use serde_json::{Map, Number, Value};

use crate::error::DecodeError;

/// Decodes MessagePack payloads. Binary blobs come back as arrays of
/// numbers, mirroring the JSON-side representation of `bin` values.
#[derive(Default)]
pub struct Reader {
    data: Vec<u8>,
    x: usize,
}

impl Reader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn decode(&mut self, input: &[u8]) -> Result<Value, DecodeError> {
        self.data = input.to_vec();
        self.x = 0;
        self.read_any()
    }

    #[inline]
    fn check(&self, n: usize) -> Result<(), DecodeError> {
        if self.x + n > self.data.len() {
            Err(DecodeError::UnexpectedEof)
        } else {
            Ok(())
        }
    }

    #[inline]
    fn u8(&mut self) -> Result<u8, DecodeError> {
        self.check(1)?;
        let v = self.data[self.x];
        self.x += 1;
        Ok(v)
    }

    #[inline]
    fn u16(&mut self) -> Result<u16, DecodeError> {
        self.check(2)?;
        let v = u16::from_be_bytes([self.data[self.x], self.data[self.x + 1]]);
        self.x += 2;
        Ok(v)
    }

    #[inline]
    fn u32(&mut self) -> Result<u32, DecodeError> {
        self.check(4)?;
        let v = u32::from_be_bytes(self.data[self.x..self.x + 4].try_into().unwrap());
        self.x += 4;
        Ok(v)
    }

    #[inline]
    fn u64(&mut self) -> Result<u64, DecodeError> {
        self.check(8)?;
        let v = u64::from_be_bytes(self.data[self.x..self.x + 8].try_into().unwrap());
        self.x += 8;
        Ok(v)
    }

    fn f32(&mut self) -> Result<f32, DecodeError> {
        self.u32().map(f32::from_bits)
    }

    fn f64(&mut self) -> Result<f64, DecodeError> {
        self.u64().map(f64::from_bits)
    }

    fn utf8(&mut self, size: usize) -> Result<String, DecodeError> {
        self.check(size)?;
        let slice = &self.data[self.x..self.x + size];
        let s = std::str::from_utf8(slice)
            .map_err(|_| DecodeError::InvalidUtf8)?
            .to_string();
        self.x += size;
        Ok(s)
    }

    fn bytes(&mut self, size: usize) -> Result<Value, DecodeError> {
        self.check(size)?;
        let arr = self.data[self.x..self.x + size]
            .iter()
            .map(|b| Value::Number((*b).into()))
            .collect();
        self.x += size;
        Ok(Value::Array(arr))
    }

    fn float(&mut self, f: f64) -> Result<Value, DecodeError> {
        Number::from_f64(f)
            .map(Value::Number)
            .ok_or(DecodeError::InvalidPayload)
    }

    fn read_arr(&mut self, size: usize) -> Result<Value, DecodeError> {
        let mut arr = Vec::with_capacity(size.min(4096));
        for _ in 0..size {
            arr.push(self.read_any()?);
        }
        Ok(Value::Array(arr))
    }

    fn read_obj(&mut self, size: usize) -> Result<Value, DecodeError> {
        let mut obj = Map::with_capacity(size.min(4096));
        for _ in 0..size {
            let key = match self.read_any()? {
                Value::String(key) => key,
                _ => return Err(DecodeError::NonStringKey),
            };
            obj.insert(key, self.read_any()?);
        }
        Ok(Value::Object(obj))
    }

    pub fn read_any(&mut self) -> Result<Value, DecodeError> {
        let byte = self.u8()?;

        if byte >= 0xe0 {
            return Ok(Value::Number((byte as i8 as i64).into()));
        }
        if byte <= 0x7f {
            return Ok(Value::Number((byte as i64).into()));
        }
        if (0x80..=0x8f).contains(&byte) {
            return self.read_obj(byte as usize & 0xf);
        }
        if (0x90..=0x9f).contains(&byte) {
            return self.read_arr(byte as usize & 0xf);
        }
        if (0xa0..=0xbf).contains(&byte) {
            let len = byte as usize & 0x1f;
            return self.utf8(len).map(Value::String);
        }

        match byte {
            0xc0 => Ok(Value::Null),
            0xc2 => Ok(Value::Bool(false)),
            0xc3 => Ok(Value::Bool(true)),
            0xc4 => {
                let n = self.u8()? as usize;
                self.bytes(n)
            }
            0xc5 => {
                let n = self.u16()? as usize;
                self.bytes(n)
            }
            0xc6 => {
                let n = self.u32()? as usize;
                self.bytes(n)
            }
            0xca => {
                let f = self.f32()?;
                self.float(f as f64)
            }
            0xcb => {
                let f = self.f64()?;
                self.float(f)
            }
            0xcc => Ok(Value::Number((self.u8()? as u64).into())),
            0xcd => Ok(Value::Number((self.u16()? as u64).into())),
            0xce => Ok(Value::Number((self.u32()? as u64).into())),
            0xcf => Ok(Value::Number(self.u64()?.into())),
            0xd0 => Ok(Value::Number((self.u8()? as i8 as i64).into())),
            0xd1 => Ok(Value::Number((self.u16()? as i16 as i64).into())),
            0xd2 => Ok(Value::Number((self.u32()? as i32 as i64).into())),
            0xd3 => Ok(Value::Number((self.u64()? as i64).into())),
            0xd9 => {
                let n = self.u8()? as usize;
                self.utf8(n).map(Value::String)
            }
            0xda => {
                let n = self.u16()? as usize;
                self.utf8(n).map(Value::String)
            }
            0xdb => {
                let n = self.u32()? as usize;
                self.utf8(n).map(Value::String)
            }
            0xdc => {
                let n = self.u16()? as usize;
                self.read_arr(n)
            }
            0xdd => {
                let n = self.u32()? as usize;
                self.read_arr(n)
            }
            0xde => {
                let n = self.u16()? as usize;
                self.read_obj(n)
            }
            0xdf => {
                let n = self.u32()? as usize;
                self.read_obj(n)
            }
            _ => Err(DecodeError::UnsupportedToken(byte)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::msgpack::MsgPackEncoder;
    use serde_json::json;

    #[test]
    fn roundtrip_matrix() {
        let cases = vec![
            json!(null),
            json!(true),
            json!(false),
            json!(0),
            json!(127),
            json!(128),
            json!(-1),
            json!(-33),
            json!(65536),
            json!(2.5),
            json!("hello"),
            json!(""),
            json!([1, "a", null]),
            json!({"a": 1, "nested": {"b": [true]}}),
        ];
        let mut encoder = MsgPackEncoder::new();
        let mut reader = Reader::new();
        for case in cases {
            let bytes = encoder.encode(&case);
            assert_eq!(reader.decode(&bytes).unwrap(), case);
        }
    }

    #[test]
    fn map16_from_placeholder_decodes() {
        use crate::encoder::Encoder;
        let mut e = MsgPackEncoder::new();
        e.writer.reset();
        let pos = e.write_obj_hdr_placeholder();
        e.write_str("k");
        e.write_integer(7);
        e.patch_obj_hdr(pos, 1);
        let bytes = e.writer.flush();
        assert_eq!(Reader::new().decode(&bytes).unwrap(), json!({"k": 7}));
    }
}
