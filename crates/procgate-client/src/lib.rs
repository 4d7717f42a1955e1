//! Typed client for the remote processing service.
//!
//! [`RemoteProcessingClient`] presents every remote operation as a local
//! async call with the contract's name, parameters, and return type. It
//! performs no argument transformation, no retry, and no validation of
//! chunked-upload framing; faults and transport failures propagate to the
//! caller unmodified.

mod client;
mod config;
mod error;
mod transport;

pub use client::RemoteProcessingClient;
pub use config::{ClientConfig, ConfigError, EndpointProfile};
pub use error::{ClientError, TransportError};
pub use transport::{Binding, HttpTransport, Transport};

/// Re-export of the wire types crate.
pub use procgate_protocol as protocol;
pub use procgate_protocol::{Attachment, AttachmentChunk, FieldDataType, ReturnInfo, SoapFault};
