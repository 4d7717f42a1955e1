//! A conformant mock endpoint for attachment uploads.
//!
//! Enforces the framing invariant the real contract leaves implicit: per
//! transfer, offsets must be contiguous (each chunk's offset equals the sum
//! of the previous chunks' byte counts) and the declared totals must agree.
//! Violations draw a SOAP fault envelope, which the client is expected to
//! surface as a remote fault rather than reject locally.

use crate::fault_reply;
use async_trait::async_trait;
use parking_lot::Mutex;
use procgate_client::{Transport, TransportError};
use procgate_protocol::{Attachment, AttachmentChunk};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone)]
struct TransferState {
    file_name: String,
    next_offset: u64,
    total_bytes: u64,
    received: Vec<u8>,
}

/// In-memory upload endpoint tracking per-transfer framing.
#[derive(Clone, Default)]
pub struct ChunkSink {
    transfers: Arc<Mutex<HashMap<String, TransferState>>>,
    attachments: Arc<Mutex<Vec<Attachment>>>,
}

impl ChunkSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes received so far for a transfer.
    pub fn received(&self, transfer_id: &str) -> Option<Vec<u8>> {
        self.transfers
            .lock()
            .get(transfer_id)
            .map(|t| t.received.clone())
    }

    /// Whether a transfer has received exactly its declared total.
    pub fn is_complete(&self, transfer_id: &str) -> bool {
        self.transfers
            .lock()
            .get(transfer_id)
            .map(|t| t.next_offset == t.total_bytes)
            .unwrap_or(false)
    }

    /// Single-shot attachments received.
    pub fn attachments(&self) -> Vec<Attachment> {
        self.attachments.lock().clone()
    }

    fn accept_chunk(&self, chunk: AttachmentChunk) -> Result<(), String> {
        if chunk.bytes_read != chunk.payload.len() as u64 {
            return Err(format!(
                "declared {} bytes but payload carries {}",
                chunk.bytes_read,
                chunk.payload.len()
            ));
        }
        let mut transfers = self.transfers.lock();
        let state = transfers
            .entry(chunk.transfer_id.clone())
            .or_insert_with(|| TransferState {
                file_name: chunk.file_name.clone(),
                next_offset: 0,
                total_bytes: chunk.total_bytes,
                received: Vec::new(),
            });
        if state.total_bytes != chunk.total_bytes {
            return Err(format!(
                "total changed mid-transfer: {} then {}",
                state.total_bytes, chunk.total_bytes
            ));
        }
        if state.file_name != chunk.file_name {
            return Err("file name changed mid-transfer".to_string());
        }
        if chunk.offset != state.next_offset {
            return Err(format!(
                "offset {} breaks contiguity, expected {}",
                chunk.offset, state.next_offset
            ));
        }
        if chunk.offset + chunk.bytes_read > state.total_bytes {
            return Err(format!(
                "chunk overruns declared total of {} bytes",
                state.total_bytes
            ));
        }
        state.next_offset += chunk.bytes_read;
        state.received.extend_from_slice(&chunk.payload);
        Ok(())
    }
}

#[async_trait]
impl Transport for ChunkSink {
    async fn send(&self, action: &str, envelope: &str) -> Result<String, TransportError> {
        if action.ends_with(AttachmentChunk::OPERATION) {
            let chunk = AttachmentChunk::from_envelope(envelope)?;
            return Ok(match self.accept_chunk(chunk) {
                Ok(()) => crate::empty_reply(AttachmentChunk::OPERATION),
                Err(reason) => fault_reply("s:Client", "chunk rejected", Some(&reason)),
            });
        }
        if action.ends_with(Attachment::OPERATION) {
            let attachment = Attachment::from_envelope(envelope)?;
            self.attachments.lock().push(attachment);
            return Ok(crate::empty_reply(Attachment::OPERATION));
        }
        Ok(fault_reply(
            "s:Client",
            "unsupported operation",
            Some(action),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn chunk(transfer: &str, offset: u64, payload: &[u8], total: u64) -> AttachmentChunk {
        AttachmentChunk {
            transfer_id: transfer.to_string(),
            file_name: "data.bin".to_string(),
            payload: payload.to_vec(),
            offset,
            bytes_read: payload.len() as u64,
            total_bytes: total,
        }
    }

    #[test]
    fn contiguous_sequence_completes() {
        let sink = ChunkSink::new();
        sink.accept_chunk(chunk("t", 0, b"abc", 6)).unwrap();
        sink.accept_chunk(chunk("t", 3, b"def", 6)).unwrap();
        assert!(sink.is_complete("t"));
        assert_eq!(sink.received("t").unwrap(), b"abcdef".to_vec());
    }

    #[test]
    fn gap_in_offsets_is_rejected() {
        let sink = ChunkSink::new();
        sink.accept_chunk(chunk("t", 0, b"abc", 9)).unwrap();
        let err = sink.accept_chunk(chunk("t", 6, b"ghi", 9)).unwrap_err();
        assert!(err.contains("contiguity"));
    }

    #[test]
    fn overlapping_offsets_are_rejected() {
        let sink = ChunkSink::new();
        sink.accept_chunk(chunk("t", 0, b"abcd", 8)).unwrap();
        assert!(sink.accept_chunk(chunk("t", 2, b"cdef", 8)).is_err());
    }

    #[test]
    fn byte_count_must_match_payload() {
        let sink = ChunkSink::new();
        let mut bad = chunk("t", 0, b"abc", 3);
        bad.bytes_read = 2;
        assert!(sink.accept_chunk(bad).is_err());
    }
}
