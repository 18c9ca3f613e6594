use thiserror::Error;

/// Errors produced while reading an encoded payload back.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unexpected end of input")]
    UnexpectedEof,
    #[error("invalid UTF-8 in string")]
    InvalidUtf8,
    #[error("payload is not a valid encoding")]
    InvalidPayload,
    #[error("object keys must be strings")]
    NonStringKey,
    #[error("unsupported token: 0x{0:02x}")]
    UnsupportedToken(u8),
}
