//! Data-transfer types for the remote processing contract.

use crate::EnvelopeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One fragment of a file upload in progress.
///
/// The caller owns the framing: `offset` must equal the running sum of the
/// previous fragments' `bytes_read`, and the per-fragment `bytes_read` must
/// sum to `total_bytes` across the whole transfer. The client forwards
/// fragments as given and never validates the sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentChunk {
    /// Opaque id associating fragments of one transfer server-side.
    pub transfer_id: String,
    /// Name of the file being uploaded.
    pub file_name: String,
    /// Raw bytes of this fragment.
    pub payload: Vec<u8>,
    /// Byte offset of this fragment within the whole file.
    pub offset: u64,
    /// Number of bytes carried by this fragment.
    pub bytes_read: u64,
    /// Declared size of the whole file.
    pub total_bytes: u64,
}

/// A complete single-shot attachment for payloads small enough to send in
/// one call. Carries the same framing fields as [`AttachmentChunk`] plus the
/// owning record and its category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Identifier of the record the attachment belongs to.
    pub record_id: String,
    /// Type/category identifier for the attachment.
    pub category_id: String,
    /// Opaque transfer id.
    pub transfer_id: String,
    /// Name of the file being uploaded.
    pub file_name: String,
    /// The full file contents.
    pub payload: Vec<u8>,
    /// Byte offset, zero for a single-shot upload.
    pub offset: u64,
    /// Bytes carried, equal to the payload length.
    pub bytes_read: u64,
    /// Declared total size of the file.
    pub total_bytes: u64,
}

/// Selects what metadata a process-execution call returns.
///
/// Serializes to the exact literals `None`, `Keys`, `Timing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ReturnInfo {
    /// No extra metadata.
    #[default]
    None,
    /// Return the keys touched by the process.
    Keys,
    /// Return timing information.
    Timing,
}

impl ReturnInfo {
    /// Wire literal for this variant.
    pub fn as_str(self) -> &'static str {
        match self {
            ReturnInfo::None => "None",
            ReturnInfo::Keys => "Keys",
            ReturnInfo::Timing => "Timing",
        }
    }
}

impl fmt::Display for ReturnInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReturnInfo {
    type Err = EnvelopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "None" => Ok(ReturnInfo::None),
            "Keys" => Ok(ReturnInfo::Keys),
            "Timing" => Ok(ReturnInfo::Timing),
            other => Err(EnvelopeError::Shape(format!(
                "unknown ReturnInfo literal: {other}"
            ))),
        }
    }
}

/// Logical type of a data field, used for typed option lookups.
///
/// Wire literals are the upper-case names with no separators, exactly as the
/// contract spells them (`MULTILANGUAGESTRING`, not `MULTI_LANGUAGE_STRING`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FieldDataType {
    AutoNumber,
    Boolean,
    Date,
    DateTime,
    Decimal,
    Email,
    Guid,
    Integer,
    Image,
    Money,
    MultiLanguageString,
    Narrative,
    Predicate,
    Relationship,
    String,
    Text,
    Url,
}

impl FieldDataType {
    /// Wire literal for this variant.
    pub fn as_str(self) -> &'static str {
        match self {
            FieldDataType::AutoNumber => "AUTONUMBER",
            FieldDataType::Boolean => "BOOLEAN",
            FieldDataType::Date => "DATE",
            FieldDataType::DateTime => "DATETIME",
            FieldDataType::Decimal => "DECIMAL",
            FieldDataType::Email => "EMAIL",
            FieldDataType::Guid => "GUID",
            FieldDataType::Integer => "INTEGER",
            FieldDataType::Image => "IMAGE",
            FieldDataType::Money => "MONEY",
            FieldDataType::MultiLanguageString => "MULTILANGUAGESTRING",
            FieldDataType::Narrative => "NARRATIVE",
            FieldDataType::Predicate => "PREDICATE",
            FieldDataType::Relationship => "RELATIONSHIP",
            FieldDataType::String => "STRING",
            FieldDataType::Text => "TEXT",
            FieldDataType::Url => "URL",
        }
    }
}

impl fmt::Display for FieldDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldDataType {
    type Err = EnvelopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AUTONUMBER" => Ok(FieldDataType::AutoNumber),
            "BOOLEAN" => Ok(FieldDataType::Boolean),
            "DATE" => Ok(FieldDataType::Date),
            "DATETIME" => Ok(FieldDataType::DateTime),
            "DECIMAL" => Ok(FieldDataType::Decimal),
            "EMAIL" => Ok(FieldDataType::Email),
            "GUID" => Ok(FieldDataType::Guid),
            "INTEGER" => Ok(FieldDataType::Integer),
            "IMAGE" => Ok(FieldDataType::Image),
            "MONEY" => Ok(FieldDataType::Money),
            "MULTILANGUAGESTRING" => Ok(FieldDataType::MultiLanguageString),
            "NARRATIVE" => Ok(FieldDataType::Narrative),
            "PREDICATE" => Ok(FieldDataType::Predicate),
            "RELATIONSHIP" => Ok(FieldDataType::Relationship),
            "STRING" => Ok(FieldDataType::String),
            "TEXT" => Ok(FieldDataType::Text),
            "URL" => Ok(FieldDataType::Url),
            other => Err(EnvelopeError::Shape(format!(
                "unknown FieldDataType literal: {other}"
            ))),
        }
    }
}
