//! CBOR encoder writing into a [`Writer`].

use json_type_buffers::Writer;
use serde_json::Value;

use crate::encoder::Encoder;

// Major type overlays.
const MAJOR_UIN: u8 = 0x00;
const MAJOR_NIN: u8 = 0x20;
const MAJOR_BIN: u8 = 0x40;
const MAJOR_STR: u8 = 0x60;
const MAJOR_ARR: u8 = 0x80;
const MAJOR_MAP: u8 = 0xa0;

const NULL: u8 = 0xf6;
const FALSE: u8 = 0xf4;
const TRUE: u8 = 0xf5;
const FLOAT64: u8 = 0xfb;

pub struct CborEncoder {
    pub writer: Writer,
}

impl Default for CborEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl CborEncoder {
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

    fn write_hdr(&mut self, major: u8, length: u64) {
        let w = &mut self.writer;
        if length <= 23 {
            w.u8(major | length as u8);
        } else if length <= 0xff {
            w.u8(major | 24);
            w.u8(length as u8);
        } else if length <= 0xffff {
            w.u8u16(major | 25, length as u16);
        } else if length <= 0xffff_ffff {
            w.u8u32(major | 26, length as u32);
        } else {
            w.u8u64(major | 27, length);
        }
    }
}

impl Encoder for CborEncoder {
    fn writer(&mut self) -> &mut Writer {
        &mut self.writer
    }

    fn write_null(&mut self) {
        self.writer.u8(NULL);
    }

    fn write_boolean(&mut self, b: bool) {
        self.writer.u8(if b { TRUE } else { FALSE });
    }

    fn write_integer(&mut self, int: i64) {
        if int >= 0 {
            self.write_u_integer(int as u64);
        } else {
            let uint = (-1i64).wrapping_sub(int) as u64;
            self.write_hdr(MAJOR_NIN, uint);
        }
    }

    fn write_u_integer(&mut self, uint: u64) {
        self.write_hdr(MAJOR_UIN, uint);
    }

    fn write_float(&mut self, float: f64) {
        self.writer.u8f64(FLOAT64, float);
    }

    fn write_str(&mut self, s: &str) {
        self.write_hdr(MAJOR_STR, s.len() as u64);
        self.writer.utf8(s);
    }

    fn write_ascii_str(&mut self, s: &str) {
        self.write_hdr(MAJOR_STR, s.len() as u64);
        self.writer.ascii(s);
    }

    fn write_bin(&mut self, buf: &[u8]) {
        self.write_hdr(MAJOR_BIN, buf.len() as u64);
        self.writer.buf(buf);
    }

    fn write_arr_hdr(&mut self, length: usize) {
        self.write_hdr(MAJOR_ARR, length as u64);
    }

    fn write_obj_hdr(&mut self, length: usize) {
        self.write_hdr(MAJOR_MAP, length as u64);
    }

    fn write_obj_hdr_placeholder(&mut self) -> usize {
        // Two-byte-count map header, count patched in later.
        self.writer.u8(MAJOR_MAP | 25);
        let pos = self.writer.x;
        self.writer.u16(0);
        pos
    }

    fn patch_obj_hdr(&mut self, pos: usize, length: usize) {
        self.writer.uint8[pos..pos + 2].copy_from_slice(&(length as u16).to_be_bytes());
    }

    // Containers are always written with definite-length headers; the
    // text-structure operations have no representation here.
    fn write_start_arr(&mut self) {}
    fn write_end_arr(&mut self) {}
    fn write_start_obj(&mut self) {}
    fn write_end_obj(&mut self) {}
    fn write_arr_separator(&mut self) {}
    fn write_obj_separator(&mut self) {}
    fn write_obj_key_separator(&mut self) {}

    fn write_any(&mut self, value: &Value) {
        match value {
            Value::Null => self.write_null(),
            Value::Bool(b) => self.write_boolean(*b),
            Value::Number(n) => self.write_number(n),
            Value::String(s) => self.write_str(s),
            Value::Array(arr) => {
                self.write_arr_hdr(arr.len());
                for item in arr {
                    self.write_any(item);
                }
            }
            Value::Object(obj) => {
                self.write_obj_hdr(obj.len());
                for (key, item) in obj {
                    self.write_str(key);
                    self.write_any(item);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn enc(value: Value) -> Vec<u8> {
        CborEncoder::new().encode(&value)
    }

    #[test]
    fn small_uints_are_one_byte() {
        assert_eq!(enc(json!(0)), [0x00]);
        assert_eq!(enc(json!(23)), [0x17]);
        assert_eq!(enc(json!(24)), [0x18, 24]);
    }

    #[test]
    fn negative_ints() {
        assert_eq!(enc(json!(-1)), [0x20]);
        assert_eq!(enc(json!(-24)), [0x37]);
        assert_eq!(enc(json!(-25)), [0x38, 24]);
    }

    #[test]
    fn simple_values() {
        assert_eq!(enc(json!(null)), [0xf6]);
        assert_eq!(enc(json!(false)), [0xf4]);
        assert_eq!(enc(json!(true)), [0xf5]);
    }

    #[test]
    fn short_string() {
        assert_eq!(enc(json!("a")), [0x61, b'a']);
    }

    #[test]
    fn small_array_and_map() {
        assert_eq!(enc(json!([1, 2])), [0x82, 0x01, 0x02]);
        assert_eq!(enc(json!({"a": 1})), [0xa1, 0x61, b'a', 0x01]);
    }

    #[test]
    fn placeholder_patch_produces_map16() {
        let mut e = CborEncoder::new();
        e.writer.reset();
        let pos = e.write_obj_hdr_placeholder();
        e.write_str("a");
        e.write_integer(1);
        e.patch_obj_hdr(pos, 1);
        let bytes = e.writer.flush();
        assert_eq!(bytes, [0xb9, 0x00, 0x01, 0x61, b'a', 0x01]);
        assert_eq!(super::super::decode(&bytes).unwrap(), json!({"a": 1}));
    }
}
