//! Wire types and SOAP 1.1 envelope codec for the remote processing service.
//!
//! This crate owns the message shapes exchanged with the endpoint: the two
//! attachment wrapper messages, the wire enums, and the document-literal
//! envelope builder/parser used by every operation.

mod envelope;
mod error;
mod types;

pub use envelope::{Param, ResponseBody, SoapFault, build_request, parse_response};
pub use error::EnvelopeError;
pub use types::{Attachment, AttachmentChunk, FieldDataType, ReturnInfo};

/// XML namespace the service contract lives in.
pub const SERVICE_NAMESPACE: &str = "http://tempuri.org/";

/// Prefix of every operation's SOAP action URI.
pub const SOAP_ACTION_BASE: &str = "http://tempuri.org//ServiceExecuteProcess/";

/// Full SOAP action URI for an operation name.
pub fn soap_action(operation: &str) -> String {
    format!("{SOAP_ACTION_BASE}{operation}")
}
