//! Test transports for the procgate client.
//!
//! Reply envelopes here are written as literal XML rather than through the
//! protocol crate's builders, so a codec bug cannot cancel itself out in
//! round-trip tests.

mod chunk_sink;
mod transports;

pub use chunk_sink::ChunkSink;
pub use transports::{FailingTransport, FailureMode, ScriptedTransport, SentRequest};

/// Literal reply envelope with a single text result.
///
/// `value` is spliced into the XML verbatim: pre-escape it if it contains
/// markup characters (`&`, `<`).
pub fn text_reply(operation: &str, value: &str) -> String {
    wrap(
        operation,
        &format!("<{operation}Result>{value}</{operation}Result>"),
    )
}

/// Literal reply envelope with a string-array result.
///
/// Items are spliced into the XML verbatim: pre-escape any containing
/// markup characters (`&`, `<`).
pub fn list_reply(operation: &str, items: &[&str]) -> String {
    let mut inner = format!("<{operation}Result>");
    for item in items {
        inner.push_str("<string>");
        inner.push_str(item);
        inner.push_str("</string>");
    }
    inner.push_str(&format!("</{operation}Result>"));
    wrap(operation, &inner)
}

/// Literal reply envelope with no result element.
pub fn empty_reply(operation: &str) -> String {
    wrap(operation, "")
}

/// Literal SOAP 1.1 fault envelope.
///
/// `message` and `detail` are spliced in verbatim; `detail` may carry nested
/// elements on purpose. Pre-escape plain text containing `&` or `<`.
pub fn fault_reply(code: &str, message: &str, detail: Option<&str>) -> String {
    let detail = detail
        .map(|text| format!("<detail>{text}</detail>"))
        .unwrap_or_default();
    format!(
        "<s:Envelope xmlns:s=\"http://schemas.xmlsoap.org/soap/envelope/\">\
         <s:Body><s:Fault>\
         <faultcode>{code}</faultcode>\
         <faultstring>{message}</faultstring>\
         {detail}\
         </s:Fault></s:Body></s:Envelope>"
    )
}

fn wrap(operation: &str, inner: &str) -> String {
    format!(
        "<s:Envelope xmlns:s=\"http://schemas.xmlsoap.org/soap/envelope/\">\
         <s:Body><{operation}Response xmlns=\"http://tempuri.org/\">{inner}\
         </{operation}Response></s:Body></s:Envelope>"
    )
}
