//! Error types for client operations.

use procgate_protocol::{EnvelopeError, SoapFault};
use thiserror::Error;

/// The call never completed at protocol level.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connecting to the endpoint failed.
    #[error("connection failed: {0}")]
    Connect(String),
    /// The binding timeout elapsed before a reply arrived.
    #[error("request timed out")]
    Timeout,
    /// The endpoint answered with a status that cannot carry a SOAP body.
    #[error("unexpected http status: {0}")]
    Status(u16),
    /// Any other HTTP-level failure (reset, decode, redirect loop).
    #[error("http error: {0}")]
    Http(String),
    /// The reply was not a well-formed envelope.
    #[error("envelope error: {0}")]
    Envelope(#[from] EnvelopeError),
}

/// Errors surfaced by every client operation.
///
/// Exactly two kinds exist: the endpoint explicitly signalled a fault (the
/// operation reached the server), or the call could not complete below the
/// protocol layer. Neither is retried or translated.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The endpoint raised a SOAP fault; detail text is preserved verbatim.
    #[error("remote fault: {0}")]
    RemoteFault(#[from] SoapFault),
    /// The call failed before a protocol-level reply was received.
    #[error(transparent)]
    Transport(#[from] TransportError),
}
