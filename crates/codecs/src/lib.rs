//! Wire codecs for the json-type engine.
//!
//! Each codec is a struct owning a [`Writer`] and exposing primitive write
//! operations (`write_null`, `write_str`, `write_obj_hdr`, ...) behind the
//! [`Encoder`] capability trait. The type compiler emits calls against that
//! trait and never deals with the wire grammars directly.
//!
//! Readers are provided for round-tripping: MessagePack has a native reader,
//! CBOR decoding delegates to `ciborium`, and the JSON byte form parses with
//! `serde_json`.

mod encoder;
mod error;

pub mod cbor;
pub mod json;
pub mod msgpack;

pub use encoder::Encoder;
pub use error::DecodeError;

pub use cbor::CborEncoder;
pub use json::JsonEncoder;
pub use msgpack::MsgPackEncoder;

pub use json_type_buffers::Writer;

/// Binary encoding formats the type compiler can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EncodingFormat {
    /// UTF-8 JSON text written as bytes.
    Json,
    Cbor,
    MsgPack,
}

impl EncodingFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Cbor => "cbor",
            Self::MsgPack => "msgpack",
        }
    }

    /// Creates a fresh encoder for this format.
    pub fn new_encoder(self) -> Box<dyn Encoder> {
        match self {
            Self::Json => Box::new(JsonEncoder::new()),
            Self::Cbor => Box::new(CborEncoder::new()),
            Self::MsgPack => Box::new(MsgPackEncoder::new()),
        }
    }

    /// Decodes one value of this format back into JSON, for round-tripping.
    pub fn decode(self, bytes: &[u8]) -> Result<serde_json::Value, DecodeError> {
        match self {
            Self::Json => serde_json::from_slice(bytes).map_err(|_| DecodeError::InvalidPayload),
            Self::Cbor => cbor::decode(bytes),
            Self::MsgPack => msgpack::Reader::new().decode(bytes),
        }
    }
}

impl std::fmt::Display for EncodingFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
