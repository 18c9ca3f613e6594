//! The encoder capability consumed by the type compiler.

use json_type_buffers::Writer;
use serde_json::Value;

/// Primitive write operations shared by every wire format.
///
/// Text and binary formats expose the same surface; operations that have no
/// representation in a given grammar are no-ops there and the compiler's
/// pre-rendered byte blobs come out empty. Object encoding with a count that
/// is only known after the fact uses the placeholder/patch pair:
///
/// - [`write_obj_hdr_placeholder`](Encoder::write_obj_hdr_placeholder)
///   reserves the header and returns a patch position;
/// - [`patch_obj_hdr`](Encoder::patch_obj_hdr) finalizes it — binary formats
///   patch the reserved count bytes in place, the JSON form rewinds a
///   trailing separator and closes the object.
pub trait Encoder {
    /// The raw output buffer. The caller resets it before encoding and
    /// flushes it after.
    fn writer(&mut self) -> &mut Writer;

    fn write_null(&mut self);
    fn write_boolean(&mut self, b: bool);
    fn write_integer(&mut self, int: i64);
    fn write_u_integer(&mut self, uint: u64);
    fn write_float(&mut self, float: f64);
    fn write_str(&mut self, s: &str);
    fn write_ascii_str(&mut self, s: &str);
    fn write_bin(&mut self, buf: &[u8]);
    fn write_arr_hdr(&mut self, length: usize);
    fn write_obj_hdr(&mut self, length: usize);
    fn write_obj_hdr_placeholder(&mut self) -> usize;
    fn patch_obj_hdr(&mut self, pos: usize, length: usize);
    fn write_start_arr(&mut self);
    fn write_end_arr(&mut self);
    fn write_start_obj(&mut self);
    fn write_end_obj(&mut self);
    fn write_arr_separator(&mut self);
    fn write_obj_separator(&mut self);
    fn write_obj_key_separator(&mut self);

    /// Encodes an arbitrary JSON value.
    fn write_any(&mut self, value: &Value);

    /// Dispatches on the number's runtime representation.
    fn write_number(&mut self, num: &serde_json::Number) {
        if let Some(int) = num.as_i64() {
            self.write_integer(int);
        } else if let Some(uint) = num.as_u64() {
            self.write_u_integer(uint);
        } else if let Some(float) = num.as_f64() {
            self.write_float(float);
        }
    }
}
