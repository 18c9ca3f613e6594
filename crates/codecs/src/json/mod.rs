//! JSON text codec writing UTF-8 bytes.

mod encoder;

pub use encoder::JsonEncoder;
