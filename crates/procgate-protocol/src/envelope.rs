//! SOAP 1.1 document-literal envelope builder and parser.
//!
//! Requests are built as flat parameter lists under an operation element in
//! the service namespace. The two attachment messages use a wrapper shape
//! because their payload rides as an element-level `base64Binary`. Replies
//! are parsed into a text result, a string-list result, an empty
//! acknowledgement, or a SOAP fault; the reply action URI is never checked.

use crate::types::{Attachment, AttachmentChunk};
use crate::{EnvelopeError, SERVICE_NAMESPACE};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use quick_xml::Reader;
use quick_xml::escape::escape;
use quick_xml::events::Event;
use std::collections::HashMap;
use thiserror::Error;

const XML_DECL: &str = "<?xml version=\"1.0\" encoding=\"utf-8\"?>";
const SOAP_ENVELOPE_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";

/// One positional operation parameter.
#[derive(Debug, Clone)]
pub enum Param<'a> {
    /// Plain string content.
    Str(&'a str),
    /// Unsigned integral content.
    Long(u64),
    /// Boolean content, `true`/`false`.
    Bool(bool),
    /// Raw bytes, encoded as `base64Binary`.
    Bytes(&'a [u8]),
    /// A list of strings, one `<string>` child per item.
    StrList(&'a [String]),
}

/// Decoded body of a non-fault reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseBody {
    /// The reply carried no result element.
    Empty,
    /// A single text result (possibly the empty string).
    Text(String),
    /// A string-array result.
    List(Vec<String>),
    /// The endpoint signalled a SOAP fault.
    Fault(SoapFault),
}

/// A SOAP 1.1 fault, with its detail text preserved verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct SoapFault {
    /// Fault code, e.g. `s:Client`.
    pub code: String,
    /// Human-readable fault string.
    pub message: String,
    /// Optional detail text.
    pub detail: Option<String>,
}

/// Build a request envelope for `operation` with the given named parameters.
pub fn build_request(operation: &str, params: &[(&str, Param<'_>)]) -> String {
    let mut xml = String::with_capacity(256);
    xml.push_str(XML_DECL);
    xml.push_str("<s:Envelope xmlns:s=\"");
    xml.push_str(SOAP_ENVELOPE_NS);
    xml.push_str("\"><s:Body>");
    xml.push('<');
    xml.push_str(operation);
    xml.push_str(" xmlns=\"");
    xml.push_str(SERVICE_NAMESPACE);
    xml.push_str("\">");
    for (name, value) in params {
        write_param(&mut xml, name, value);
    }
    xml.push_str("</");
    xml.push_str(operation);
    xml.push('>');
    xml.push_str("</s:Body></s:Envelope>");
    xml
}

fn write_param(xml: &mut String, name: &str, value: &Param<'_>) {
    match value {
        Param::Str(s) => write_tag(xml, name, &escape(s)),
        Param::Long(n) => write_tag(xml, name, &n.to_string()),
        Param::Bool(b) => write_tag(xml, name, if *b { "true" } else { "false" }),
        Param::Bytes(bytes) => write_tag(xml, name, &BASE64.encode(bytes)),
        Param::StrList(items) => {
            xml.push('<');
            xml.push_str(name);
            xml.push('>');
            for item in items.iter() {
                write_tag(xml, "string", &escape(item.as_str()));
            }
            xml.push_str("</");
            xml.push_str(name);
            xml.push('>');
        }
    }
}

fn write_tag(xml: &mut String, name: &str, content: &str) {
    xml.push('<');
    xml.push_str(name);
    xml.push('>');
    xml.push_str(content);
    xml.push_str("</");
    xml.push_str(name);
    xml.push('>');
}

/// Parse a reply envelope into its decoded body.
///
/// The result element is the first child of the operation response wrapper
/// whose local name ends in `Result`; `<string>` children of it form a list
/// result. A `<Fault>` child of the body is decoded into [`SoapFault`].
pub fn parse_response(xml: &str) -> Result<ResponseBody, EnvelopeError> {
    // No trim_text: result and fault text must come back verbatim, padding
    // included. Structural whitespace is dropped by position instead.
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();

    let mut stack: Vec<String> = Vec::new();
    let mut saw_body = false;
    let mut in_fault = false;
    let mut fault_code = String::new();
    let mut fault_message = String::new();
    let mut fault_detail: Vec<String> = Vec::new();
    let mut saw_result = false;
    let mut is_list = false;
    let mut result_text = String::new();
    let mut items: Vec<String> = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                stack.push(local_name(e.local_name().as_ref()));
                note_element(
                    &stack,
                    &mut saw_body,
                    &mut in_fault,
                    &mut saw_result,
                    &mut is_list,
                    &mut items,
                );
            }
            Ok(Event::Empty(ref e)) => {
                let name = local_name(e.local_name().as_ref());
                stack.push(name);
                note_element(
                    &stack,
                    &mut saw_body,
                    &mut in_fault,
                    &mut saw_result,
                    &mut is_list,
                    &mut items,
                );
                stack.pop();
            }
            Ok(Event::End(_)) => {
                stack.pop();
            }
            Ok(Event::Text(e)) => {
                let text = e
                    .unescape()
                    .map_err(|err| EnvelopeError::Xml(err.to_string()))?
                    .into_owned();
                record_text(
                    &stack,
                    in_fault,
                    saw_result,
                    is_list,
                    text,
                    &mut fault_code,
                    &mut fault_message,
                    &mut fault_detail,
                    &mut result_text,
                    &mut items,
                );
            }
            Ok(Event::CData(e)) => {
                let text = String::from_utf8_lossy(&e.into_inner()).into_owned();
                record_text(
                    &stack,
                    in_fault,
                    saw_result,
                    is_list,
                    text,
                    &mut fault_code,
                    &mut fault_message,
                    &mut fault_detail,
                    &mut result_text,
                    &mut items,
                );
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => return Err(EnvelopeError::Xml(err.to_string())),
        }
        buf.clear();
    }

    if !saw_body {
        return Err(EnvelopeError::Shape("no soap body".to_string()));
    }
    if in_fault {
        let detail = if fault_detail.is_empty() {
            None
        } else {
            Some(fault_detail.join(" "))
        };
        return Ok(ResponseBody::Fault(SoapFault {
            code: fault_code,
            message: fault_message,
            detail,
        }));
    }
    if is_list {
        return Ok(ResponseBody::List(items));
    }
    if saw_result {
        return Ok(ResponseBody::Text(result_text));
    }
    Ok(ResponseBody::Empty)
}

/// Update parse state for a newly opened element at the top of `stack`.
fn note_element(
    stack: &[String],
    saw_body: &mut bool,
    in_fault: &mut bool,
    saw_result: &mut bool,
    is_list: &mut bool,
    items: &mut Vec<String>,
) {
    let depth = stack.len();
    let name = stack.last().map(String::as_str).unwrap_or("");
    if depth == 2 && name == "Body" {
        *saw_body = true;
    }
    if depth == 3 && name == "Fault" {
        *in_fault = true;
    }
    if !*in_fault && depth == 4 && name.ends_with("Result") {
        *saw_result = true;
    }
    if !*in_fault && *saw_result && depth == 5 && name == "string" {
        *is_list = true;
        items.push(String::new());
    }
}

/// Route element text into the right accumulator for the current position.
#[allow(clippy::too_many_arguments)]
fn record_text(
    stack: &[String],
    in_fault: bool,
    saw_result: bool,
    is_list: bool,
    text: String,
    fault_code: &mut String,
    fault_message: &mut String,
    fault_detail: &mut Vec<String>,
    result_text: &mut String,
    items: &mut Vec<String>,
) {
    if in_fault {
        match stack.last().map(String::as_str) {
            Some("faultcode") => fault_code.push_str(&text),
            Some("faultstring") => fault_message.push_str(&text),
            // Indentation between detail children is not detail text.
            _ if stack.iter().any(|n| n == "detail") => {
                if !text.trim().is_empty() {
                    fault_detail.push(text);
                }
            }
            _ => {}
        }
        return;
    }
    if is_list && stack.len() == 5 && stack.last().map(String::as_str) == Some("string") {
        if let Some(last) = items.last_mut() {
            last.push_str(&text);
        }
        return;
    }
    // Whitespace-only text at the result element is indentation around
    // <string> children, never a value; anything else is kept verbatim.
    if saw_result && stack.len() == 4 && !text.trim().is_empty() {
        result_text.push_str(&text);
    }
}

fn local_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).into_owned()
}

/// Parse the flat child fields of a wrapper-message envelope.
///
/// Returns the text of every depth-four element under the operation wrapper,
/// keyed by matching entries of `fields`. Elements present but empty map to
/// the empty string.
fn parse_wrapper_fields(
    xml: &str,
    operation: &str,
    fields: &[&'static str],
) -> Result<HashMap<&'static str, String>, EnvelopeError> {
    // No trim_text: field values round-trip verbatim. Text outside a known
    // field element is ignored by the `current` gate below.
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();

    let mut depth = 0usize;
    let mut wrapper_seen = false;
    let mut current: Option<&'static str> = None;
    let mut values: HashMap<&'static str, String> = HashMap::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                depth += 1;
                let name = local_name(e.local_name().as_ref());
                if depth == 3 {
                    if name != operation {
                        return Err(EnvelopeError::Shape(format!(
                            "expected {operation} wrapper, found {name}"
                        )));
                    }
                    wrapper_seen = true;
                }
                if depth == 4 {
                    current = fields.iter().copied().find(|f| *f == name);
                    if let Some(field) = current {
                        values.entry(field).or_default();
                    }
                }
            }
            Ok(Event::Empty(ref e)) => {
                let name = local_name(e.local_name().as_ref());
                if depth == 3 {
                    if let Some(field) = fields.iter().copied().find(|f| *f == name) {
                        values.entry(field).or_default();
                    }
                }
            }
            Ok(Event::End(_)) => {
                if depth == 4 {
                    current = None;
                }
                depth = depth.saturating_sub(1);
            }
            Ok(Event::Text(e)) => {
                if let Some(field) = current {
                    let text = e
                        .unescape()
                        .map_err(|err| EnvelopeError::Xml(err.to_string()))?;
                    values
                        .entry(field)
                        .or_default()
                        .push_str(text.as_ref());
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => return Err(EnvelopeError::Xml(err.to_string())),
        }
        buf.clear();
    }

    if !wrapper_seen {
        return Err(EnvelopeError::Shape(format!(
            "no {operation} wrapper in envelope"
        )));
    }
    Ok(values)
}

fn take_text(
    values: &mut HashMap<&'static str, String>,
    field: &'static str,
) -> Result<String, EnvelopeError> {
    values
        .remove(field)
        .ok_or(EnvelopeError::MissingElement(field))
}

fn take_u64(
    values: &mut HashMap<&'static str, String>,
    field: &'static str,
) -> Result<u64, EnvelopeError> {
    let text = take_text(values, field)?;
    text.parse::<u64>()
        .map_err(|_| EnvelopeError::Numeric { field, value: text })
}

impl AttachmentChunk {
    /// Operation name carried by the chunk wrapper message.
    pub const OPERATION: &'static str = "UploadAttachmentChunk";

    const FIELDS: &'static [&'static str] = &[
        "TransferId",
        "FileName",
        "Payload",
        "Offset",
        "BytesRead",
        "TotalBytes",
    ];

    /// Serialize this chunk as its wrapper-message envelope.
    pub fn to_envelope(&self) -> String {
        build_request(
            Self::OPERATION,
            &[
                ("TransferId", Param::Str(&self.transfer_id)),
                ("FileName", Param::Str(&self.file_name)),
                ("Payload", Param::Bytes(&self.payload)),
                ("Offset", Param::Long(self.offset)),
                ("BytesRead", Param::Long(self.bytes_read)),
                ("TotalBytes", Param::Long(self.total_bytes)),
            ],
        )
    }

    /// Decode a chunk wrapper-message envelope back into its fields.
    pub fn from_envelope(xml: &str) -> Result<Self, EnvelopeError> {
        let mut values = parse_wrapper_fields(xml, Self::OPERATION, Self::FIELDS)?;
        Ok(Self {
            transfer_id: take_text(&mut values, "TransferId")?,
            file_name: take_text(&mut values, "FileName")?,
            payload: BASE64.decode(take_text(&mut values, "Payload")?)?,
            offset: take_u64(&mut values, "Offset")?,
            bytes_read: take_u64(&mut values, "BytesRead")?,
            total_bytes: take_u64(&mut values, "TotalBytes")?,
        })
    }
}

impl Attachment {
    /// Operation name carried by the single-shot wrapper message.
    pub const OPERATION: &'static str = "UploadAttachment";

    const FIELDS: &'static [&'static str] = &[
        "RecordId",
        "CategoryId",
        "TransferId",
        "FileName",
        "Payload",
        "Offset",
        "BytesRead",
        "TotalBytes",
    ];

    /// Serialize this attachment as its wrapper-message envelope.
    pub fn to_envelope(&self) -> String {
        build_request(
            Self::OPERATION,
            &[
                ("RecordId", Param::Str(&self.record_id)),
                ("CategoryId", Param::Str(&self.category_id)),
                ("TransferId", Param::Str(&self.transfer_id)),
                ("FileName", Param::Str(&self.file_name)),
                ("Payload", Param::Bytes(&self.payload)),
                ("Offset", Param::Long(self.offset)),
                ("BytesRead", Param::Long(self.bytes_read)),
                ("TotalBytes", Param::Long(self.total_bytes)),
            ],
        )
    }

    /// Decode a single-shot wrapper-message envelope back into its fields.
    pub fn from_envelope(xml: &str) -> Result<Self, EnvelopeError> {
        let mut values = parse_wrapper_fields(xml, Self::OPERATION, Self::FIELDS)?;
        Ok(Self {
            record_id: take_text(&mut values, "RecordId")?,
            category_id: take_text(&mut values, "CategoryId")?,
            transfer_id: take_text(&mut values, "TransferId")?,
            file_name: take_text(&mut values, "FileName")?,
            payload: BASE64.decode(take_text(&mut values, "Payload")?)?,
            offset: take_u64(&mut values, "Offset")?,
            bytes_read: take_u64(&mut values, "BytesRead")?,
            total_bytes: take_u64(&mut values, "TotalBytes")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn builds_flat_request_with_escaped_text() {
        let xml = build_request(
            "CheckSpelling",
            &[
                ("text", Param::Str("fish & chips")),
                ("language", Param::Str("en-GB")),
            ],
        );
        assert!(xml.contains("<CheckSpelling xmlns=\"http://tempuri.org/\">"));
        assert!(xml.contains("<text>fish &amp; chips</text>"));
        assert!(xml.contains("<language>en-GB</language>"));
    }

    #[test]
    fn builds_string_list_parameters() {
        let codes = vec!["A1".to_string(), "B2".to_string()];
        let xml = build_request("GetExpansionCodes", &[("codes", Param::StrList(&codes))]);
        assert!(xml.contains("<codes><string>A1</string><string>B2</string></codes>"));
    }

    #[test]
    fn parses_text_result() {
        let xml = reply("GetActionsList", "<GetActionsListResult>go &amp; stop</GetActionsListResult>");
        assert_eq!(
            parse_response(&xml).unwrap(),
            ResponseBody::Text("go & stop".to_string())
        );
    }

    #[test]
    fn parses_list_result_with_empty_items() {
        let xml = reply(
            "GetPendingSyncIds",
            "<GetPendingSyncIdsResult><string>alpha</string><string/><string>beta</string></GetPendingSyncIdsResult>",
        );
        assert_eq!(
            parse_response(&xml).unwrap(),
            ResponseBody::List(vec![
                "alpha".to_string(),
                String::new(),
                "beta".to_string()
            ])
        );
    }

    #[test]
    fn padded_text_result_comes_back_verbatim() {
        let xml = reply("GetMappedItem", "<GetMappedItemResult> padded </GetMappedItemResult>");
        assert_eq!(
            parse_response(&xml).unwrap(),
            ResponseBody::Text(" padded ".to_string())
        );
    }

    #[test]
    fn pretty_printed_list_reply_drops_only_indentation() {
        let xml = reply(
            "GetPendingSyncIds",
            "<GetPendingSyncIdsResult>\n  <string>a-1</string>\n  <string> b 2 </string>\n</GetPendingSyncIdsResult>",
        );
        assert_eq!(
            parse_response(&xml).unwrap(),
            ResponseBody::List(vec!["a-1".to_string(), " b 2 ".to_string()])
        );
    }

    #[test]
    fn pretty_printed_fault_keeps_detail_text_clean() {
        let xml = concat!(
            "<s:Envelope xmlns:s=\"http://schemas.xmlsoap.org/soap/envelope/\">",
            "<s:Body><s:Fault>\n",
            "  <faultcode>s:Server</faultcode>\n",
            "  <faultstring>boom</faultstring>\n",
            "  <detail>\n    <error>stage 3 failed</error>\n  </detail>\n",
            "</s:Fault></s:Body></s:Envelope>"
        );
        let body = parse_response(xml).unwrap();
        assert_eq!(
            body,
            ResponseBody::Fault(SoapFault {
                code: "s:Server".to_string(),
                message: "boom".to_string(),
                detail: Some("stage 3 failed".to_string()),
            })
        );
    }

    #[test]
    fn parses_empty_acknowledgement() {
        let xml = reply("Ping", "");
        assert_eq!(parse_response(&xml).unwrap(), ResponseBody::Empty);
    }

    #[test]
    fn empty_result_element_is_empty_text_not_missing() {
        let xml = reply("GetMappedItem", "<GetMappedItemResult/>");
        assert_eq!(
            parse_response(&xml).unwrap(),
            ResponseBody::Text(String::new())
        );
    }

    #[test]
    fn parses_fault_preserving_detail_text() {
        let xml = concat!(
            "<s:Envelope xmlns:s=\"http://schemas.xmlsoap.org/soap/envelope/\">",
            "<s:Body><s:Fault>",
            "<faultcode>s:Client</faultcode>",
            "<faultstring>archetype unknown</faultstring>",
            "<detail><error>no such archetype: Widget</error></detail>",
            "</s:Fault></s:Body></s:Envelope>"
        );
        let body = parse_response(xml).unwrap();
        assert_eq!(
            body,
            ResponseBody::Fault(SoapFault {
                code: "s:Client".to_string(),
                message: "archetype unknown".to_string(),
                detail: Some("no such archetype: Widget".to_string()),
            })
        );
    }

    #[test]
    fn rejects_bodyless_document() {
        let err = parse_response("<root><child/></root>").unwrap_err();
        assert!(matches!(err, EnvelopeError::Shape(_)));
    }

    #[test]
    fn rejects_malformed_xml() {
        let err = parse_response("<s:Envelope><s:Body></mismatch></s:Envelope>").unwrap_err();
        assert!(matches!(err, EnvelopeError::Xml(_)));
    }

    #[test]
    fn chunk_envelope_round_trips_identically() {
        let chunk = AttachmentChunk {
            transfer_id: "t-42".to_string(),
            file_name: "report & notes.pdf".to_string(),
            payload: vec![0, 1, 2, 254, 255],
            offset: 4096,
            bytes_read: 5,
            total_bytes: 4101,
        };
        let decoded = AttachmentChunk::from_envelope(&chunk.to_envelope()).unwrap();
        assert_eq!(decoded, chunk);
    }

    #[test]
    fn chunk_envelope_round_trips_padded_field_values() {
        let chunk = AttachmentChunk {
            transfer_id: " t-1 ".to_string(),
            file_name: " draft.pdf".to_string(),
            payload: vec![9, 8, 7],
            offset: 0,
            bytes_read: 3,
            total_bytes: 3,
        };
        let decoded = AttachmentChunk::from_envelope(&chunk.to_envelope()).unwrap();
        assert_eq!(decoded, chunk);
    }

    #[test]
    fn chunk_envelope_round_trips_with_empty_payload() {
        let chunk = AttachmentChunk {
            transfer_id: "t-0".to_string(),
            file_name: "empty.bin".to_string(),
            payload: Vec::new(),
            offset: 0,
            bytes_read: 0,
            total_bytes: 0,
        };
        let decoded = AttachmentChunk::from_envelope(&chunk.to_envelope()).unwrap();
        assert_eq!(decoded, chunk);
    }

    #[test]
    fn attachment_envelope_round_trips_identically() {
        let attachment = Attachment {
            record_id: "REC-9".to_string(),
            category_id: "IMG".to_string(),
            transfer_id: "t-7".to_string(),
            file_name: "photo.png".to_string(),
            payload: b"binary image bytes".to_vec(),
            offset: 0,
            bytes_read: 18,
            total_bytes: 18,
        };
        let decoded = Attachment::from_envelope(&attachment.to_envelope()).unwrap();
        assert_eq!(decoded, attachment);
    }

    #[test]
    fn wrapper_parse_rejects_wrong_operation() {
        let chunk_xml = AttachmentChunk {
            transfer_id: "t".to_string(),
            file_name: "f".to_string(),
            payload: Vec::new(),
            offset: 0,
            bytes_read: 0,
            total_bytes: 0,
        }
        .to_envelope();
        let err = Attachment::from_envelope(&chunk_xml).unwrap_err();
        assert!(matches!(err, EnvelopeError::Shape(_)));
    }

    fn reply(operation: &str, inner: &str) -> String {
        format!(
            "<s:Envelope xmlns:s=\"http://schemas.xmlsoap.org/soap/envelope/\">\
             <s:Body><{operation}Response xmlns=\"http://tempuri.org/\">{inner}\
             </{operation}Response></s:Body></s:Envelope>"
        )
    }
}
