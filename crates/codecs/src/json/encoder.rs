//! `JsonEncoder` — JSON encoder writing UTF-8 bytes to a [`Writer`].
//!
//! Unlike a generic JSON serializer, this encoder writes binary data as
//! `data:application/octet-stream;base64,...` URI strings, so every schema
//! kind has a JSON text representation.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use json_type_buffers::Writer;
use serde_json::Value;

use crate::encoder::Encoder;

const BIN_URI_PREFIX: &[u8] = b"\"data:application/octet-stream;base64,";

pub struct JsonEncoder {
    pub writer: Writer,
}

impl Default for JsonEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonEncoder {
    pub fn new() -> Self {
        Self {
            writer: Writer::new(),
        }
    }

    /// Encodes one value and returns the produced bytes.
    pub fn encode(&mut self, value: &Value) -> Vec<u8> {
        self.writer.reset();
        self.write_any(value);
        self.writer.flush()
    }
}

impl Encoder for JsonEncoder {
    fn writer(&mut self) -> &mut Writer {
        &mut self.writer
    }

    fn write_null(&mut self) {
        self.writer.u32(0x6e75_6c6c); // "null"
    }

    fn write_boolean(&mut self, b: bool) {
        if b {
            self.writer.u32(0x7472_7565); // "true"
        } else {
            self.writer.u8(0x66); // 'f'
            self.writer.u32(0x616c_7365); // "alse"
        }
    }

    fn write_integer(&mut self, int: i64) {
        self.writer.ascii(&int.to_string());
    }

    fn write_u_integer(&mut self, uint: u64) {
        self.writer.ascii(&uint.to_string());
    }

    fn write_float(&mut self, float: f64) {
        self.writer.ascii(&format_float(float));
    }

    fn write_str(&mut self, s: &str) {
        let bytes = s.as_bytes();
        let len = bytes.len();

        // Fast path: printable ASCII with no quotes or backslashes.
        if len < 256 && !bytes.iter().any(|&b| !(32..127).contains(&b) || b == b'"' || b == b'\\') {
            self.writer.ensure_capacity(len + 2);
            let x = self.writer.x;
            self.writer.uint8[x] = b'"';
            self.writer.uint8[x + 1..x + 1 + len].copy_from_slice(bytes);
            self.writer.uint8[x + 1 + len] = b'"';
            self.writer.x = x + 2 + len;
            return;
        }

        let json_str = serde_json::to_string(s).unwrap_or_else(|_| String::from("\"\""));
        self.writer.buf(json_str.as_bytes());
    }

    fn write_ascii_str(&mut self, s: &str) {
        let len = s.len();
        self.writer.ensure_capacity(len * 2 + 2);
        self.writer.u8(b'"');
        for &b in s.as_bytes() {
            if b == b'"' || b == b'\\' {
                self.writer.u8(b'\\');
            }
            self.writer.u8(b);
        }
        self.writer.u8(b'"');
    }

    fn write_bin(&mut self, buf: &[u8]) {
        self.writer.buf(BIN_URI_PREFIX);
        self.writer.buf(BASE64.encode(buf).as_bytes());
        self.writer.u8(b'"');
    }

    // For a text grammar the "header" is just the opening bracket; the count
    // is implicit in the separators.
    fn write_arr_hdr(&mut self, _length: usize) {
        self.writer.u8(b'[');
    }

    fn write_obj_hdr(&mut self, _length: usize) {
        self.writer.u8(b'{');
    }

    fn write_obj_hdr_placeholder(&mut self) -> usize {
        self.writer.u8(b'{');
        self.writer.x
    }

    fn patch_obj_hdr(&mut self, _pos: usize, _length: usize) {
        // Trailing-separator elision: overwrite a dangling comma with the
        // closing brace instead of appending after it.
        if self.writer.x > self.writer.x0 && self.writer.uint8[self.writer.x - 1] == b',' {
            self.writer.x -= 1;
        }
        self.writer.u8(b'}');
    }

    fn write_start_arr(&mut self) {
        self.writer.u8(b'[');
    }

    fn write_end_arr(&mut self) {
        self.writer.u8(b']');
    }

    fn write_start_obj(&mut self) {
        self.writer.u8(b'{');
    }

    fn write_end_obj(&mut self) {
        self.writer.u8(b'}');
    }

    fn write_arr_separator(&mut self) {
        self.writer.u8(b',');
    }

    fn write_obj_separator(&mut self) {
        self.writer.u8(b',');
    }

    fn write_obj_key_separator(&mut self) {
        self.writer.u8(b':');
    }

    fn write_any(&mut self, value: &Value) {
        match value {
            Value::Null => self.write_null(),
            Value::Bool(b) => self.write_boolean(*b),
            Value::Number(n) => self.write_number(n),
            Value::String(s) => self.write_str(s),
            Value::Array(arr) => {
                self.writer.u8(b'[');
                let last = arr.len().saturating_sub(1);
                for (i, item) in arr.iter().enumerate() {
                    self.write_any(item);
                    if i < last {
                        self.writer.u8(b',');
                    }
                }
                self.writer.u8(b']');
            }
            Value::Object(obj) => {
                self.writer.u8(b'{');
                let last = obj.len().saturating_sub(1);
                for (i, (key, item)) in obj.iter().enumerate() {
                    self.write_str(key);
                    self.writer.u8(b':');
                    self.write_any(item);
                    if i < last {
                        self.writer.u8(b',');
                    }
                }
                self.writer.u8(b'}');
            }
        }
    }
}

fn format_float(f: f64) -> String {
    if f.is_nan() {
        "null".to_string()
    } else if f.is_infinite() {
        if f > 0.0 {
            "1e308".to_string()
        } else {
            "-1e308".to_string()
        }
    } else {
        // Shortest round-trip representation; keeps the ".0" on integral
        // floats so the value decodes back as a float.
        format!("{:?}", f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn enc(value: Value) -> String {
        String::from_utf8(JsonEncoder::new().encode(&value)).unwrap()
    }

    #[test]
    fn literals() {
        assert_eq!(enc(json!(null)), "null");
        assert_eq!(enc(json!(true)), "true");
        assert_eq!(enc(json!(false)), "false");
        assert_eq!(enc(json!(123)), "123");
        assert_eq!(enc(json!(-5)), "-5");
    }

    #[test]
    fn floats_keep_their_point() {
        assert_eq!(enc(json!(2.5)), "2.5");
        assert_eq!(enc(json!(5.0)), "5.0");
    }

    #[test]
    fn strings_are_escaped() {
        assert_eq!(enc(json!("hello")), "\"hello\"");
        assert_eq!(enc(json!("a\"b")), "\"a\\\"b\"");
        assert_eq!(enc(json!("π")), "\"π\"");
    }

    #[test]
    fn containers() {
        assert_eq!(enc(json!([1, 2])), "[1,2]");
        assert_eq!(enc(json!({"a": 1, "b": [true]})), "{\"a\":1,\"b\":[true]}");
        assert_eq!(enc(json!({})), "{}");
    }

    #[test]
    fn bin_as_data_uri() {
        let mut e = JsonEncoder::new();
        e.writer.reset();
        e.write_bin(&[1, 2, 3]);
        let out = String::from_utf8(e.writer.flush()).unwrap();
        assert_eq!(out, "\"data:application/octet-stream;base64,AQID\"");
    }

    #[test]
    fn placeholder_patch_elides_trailing_comma() {
        let mut e = JsonEncoder::new();
        e.writer.reset();
        let pos = e.write_obj_hdr_placeholder();
        e.write_str("a");
        e.write_obj_key_separator();
        e.write_integer(1);
        e.write_obj_separator();
        e.patch_obj_hdr(pos, 1);
        assert_eq!(String::from_utf8(e.writer.flush()).unwrap(), "{\"a\":1}");
    }

    #[test]
    fn empty_placeholder_object() {
        let mut e = JsonEncoder::new();
        e.writer.reset();
        let pos = e.write_obj_hdr_placeholder();
        e.patch_obj_hdr(pos, 0);
        assert_eq!(String::from_utf8(e.writer.flush()).unwrap(), "{}");
    }
}
