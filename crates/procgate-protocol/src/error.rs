//! Error types for envelope encoding and decoding.

use thiserror::Error;

/// Errors returned while building or parsing SOAP envelopes.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    /// The reply was not well-formed XML.
    #[error("malformed xml: {0}")]
    Xml(String),
    /// The reply was valid XML but not a SOAP envelope we understand.
    #[error("unexpected envelope shape: {0}")]
    Shape(String),
    /// A base64Binary element could not be decoded.
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
    /// A numeric framing field could not be parsed.
    #[error("invalid numeric field {field}: {value}")]
    Numeric { field: &'static str, value: String },
    /// A required element was missing from a wrapper message.
    #[error("missing element: {0}")]
    MissingElement(&'static str),
}
