//! Small JSON helpers shared by the compiler backends.

mod deep_equal;
mod json_size;

pub use deep_equal::deep_equal;
pub use json_size::{max_encoding_capacity, MaxEncodingOverhead};
