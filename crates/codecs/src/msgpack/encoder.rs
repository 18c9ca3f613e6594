//! MessagePack encoder writing into a [`Writer`].

use json_type_buffers::Writer;
use serde_json::Value;

use crate::encoder::Encoder;

pub struct MsgPackEncoder {
    pub writer: Writer,
}

impl Default for MsgPackEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl MsgPackEncoder {
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

    fn write_str_hdr(&mut self, length: usize) {
        if length <= 0x1f {
            self.writer.u8(0xa0 | length as u8);
        } else if length <= 0xff {
            self.writer.u16(0xd900 | length as u16);
        } else if length <= 0xffff {
            self.writer.u8u16(0xda, length as u16);
        } else {
            self.writer.u8u32(0xdb, length as u32);
        }
    }
}

impl Encoder for MsgPackEncoder {
    fn writer(&mut self) -> &mut Writer {
        &mut self.writer
    }

    fn write_null(&mut self) {
        self.writer.u8(0xc0);
    }

    fn write_boolean(&mut self, b: bool) {
        self.writer.u8(if b { 0xc3 } else { 0xc2 });
    }

    fn write_integer(&mut self, int: i64) {
        if int >= 0 {
            self.write_u_integer(int as u64);
        } else if int >= -0x20 {
            self.writer.u8((0x100i64 + int) as u8);
        } else if int >= -0x80 {
            self.writer.u8(0xd0);
            self.writer.u8(int as i8 as u8);
        } else if int >= -0x8000 {
            self.writer.u8u16(0xd1, int as i16 as u16);
        } else if int >= -0x8000_0000 {
            self.writer.u8(0xd2);
            self.writer.i32(int as i32);
        } else {
            self.writer.u8(0xd3);
            self.writer.i64(int);
        }
    }

    fn write_u_integer(&mut self, uint: u64) {
        if uint <= 0x7f {
            self.writer.u8(uint as u8);
        } else if uint <= 0xff {
            self.writer.u16(0xcc00 | uint as u16);
        } else if uint <= 0xffff {
            self.writer.u8u16(0xcd, uint as u16);
        } else if uint <= 0xffff_ffff {
            self.writer.u8u32(0xce, uint as u32);
        } else {
            self.writer.u8u64(0xcf, uint);
        }
    }

    fn write_float(&mut self, float: f64) {
        self.writer.u8f64(0xcb, float);
    }

    fn write_str(&mut self, s: &str) {
        self.write_str_hdr(s.len());
        self.writer.utf8(s);
    }

    fn write_ascii_str(&mut self, s: &str) {
        self.write_str_hdr(s.len());
        self.writer.ascii(s);
    }

    fn write_bin(&mut self, buf: &[u8]) {
        let length = buf.len();
        if length <= 0xff {
            self.writer.u16(0xc400 | length as u16);
        } else if length <= 0xffff {
            self.writer.u8u16(0xc5, length as u16);
        } else {
            self.writer.u8u32(0xc6, length as u32);
        }
        self.writer.buf(buf);
    }

    fn write_arr_hdr(&mut self, length: usize) {
        if length <= 0xf {
            self.writer.u8(0x90 | length as u8);
        } else if length <= 0xffff {
            self.writer.u8u16(0xdc, length as u16);
        } else {
            self.writer.u8u32(0xdd, length as u32);
        }
    }

    fn write_obj_hdr(&mut self, length: usize) {
        if length <= 0xf {
            self.writer.u8(0x80 | length as u8);
        } else if length <= 0xffff {
            self.writer.u8u16(0xde, length as u16);
        } else {
            self.writer.u8u32(0xdf, length as u32);
        }
    }

    fn write_obj_hdr_placeholder(&mut self) -> usize {
        // map16 header, count patched in later.
        self.writer.u8(0xde);
        let pos = self.writer.x;
        self.writer.u16(0);
        pos
    }

    fn patch_obj_hdr(&mut self, pos: usize, length: usize) {
        self.writer.uint8[pos..pos + 2].copy_from_slice(&(length as u16).to_be_bytes());
    }

    // MessagePack has no indefinite-length containers; headers always carry
    // the count, so the streaming markers are not representable.
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
        MsgPackEncoder::new().encode(&value)
    }

    #[test]
    fn fixint_encoding() {
        assert_eq!(enc(json!(0)), [0x00]);
        assert_eq!(enc(json!(127)), [0x7f]);
        assert_eq!(enc(json!(-1)), [0xff]);
        assert_eq!(enc(json!(-32)), [0xe0]);
        assert_eq!(enc(json!(-33)), [0xd0, 0xdf]);
    }

    #[test]
    fn fixstr_encoding() {
        assert_eq!(enc(json!("ab")), [0xa2, b'a', b'b']);
    }

    #[test]
    fn fixmap_and_fixarray() {
        assert_eq!(enc(json!([1])), [0x91, 0x01]);
        assert_eq!(enc(json!({"a": 1})), [0x81, 0xa1, b'a', 0x01]);
    }

    #[test]
    fn large_u64_is_lossless() {
        let n = u64::MAX;
        let bytes = enc(json!(n));
        assert_eq!(bytes[0], 0xcf);
        assert_eq!(u64::from_be_bytes(bytes[1..9].try_into().unwrap()), n);
    }
}
