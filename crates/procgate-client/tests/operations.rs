//! End-to-end client behavior against in-memory transports.

use pretty_assertions::assert_eq;
use procgate_client::{ClientError, FieldDataType, RemoteProcessingClient, ReturnInfo};
use procgate_protocol::AttachmentChunk;
use procgate_test_utils::{ChunkSink, FailingTransport, FailureMode, ScriptedTransport};
use std::sync::Arc;

fn client_with(transport: ScriptedTransport) -> (RemoteProcessingClient, ScriptedTransport) {
    let client = RemoteProcessingClient::with_transport(Arc::new(transport.clone()));
    (client, transport)
}

#[tokio::test]
async fn text_operation_returns_mock_value_verbatim() {
    let transport = ScriptedTransport::new();
    transport.push_text("GetActionsList", "open;close;archive");
    let (client, transport) = client_with(transport);

    let actions = client.actions_list("user-7").await.unwrap();
    assert_eq!(actions, "open;close;archive");

    let sent = transport.last_request().unwrap();
    assert_eq!(
        sent.action,
        "http://tempuri.org//ServiceExecuteProcess/GetActionsList"
    );
    assert!(sent.envelope.contains("<userId>user-7</userId>"));
}

#[tokio::test]
async fn padded_reply_values_are_not_trimmed() {
    let transport = ScriptedTransport::new();
    transport.push_text("GetMappedItem", " padded ");
    let (client, _) = client_with(transport);

    assert_eq!(client.mapped_item("crm", "k-1").await.unwrap(), " padded ");
}

#[tokio::test]
async fn arguments_are_forwarded_without_mutation() {
    let transport = ScriptedTransport::new();
    transport.push_text("CheckSpelling", "ok");
    let (client, transport) = client_with(transport);

    client
        .check_spelling("naïve <tag> & more", "en-GB")
        .await
        .unwrap();

    let sent = transport.last_request().unwrap();
    // XML-escaped on the wire, byte-for-byte otherwise.
    assert!(
        sent.envelope
            .contains("<text>naïve &lt;tag&gt; &amp; more</text>")
    );
    assert!(sent.envelope.contains("<language>en-GB</language>"));
}

#[tokio::test]
async fn list_operation_returns_all_items() {
    let transport = ScriptedTransport::new();
    transport.push_list("GetPendingSyncIds", &["a-1", "b-2", "c-3"]);
    let (client, _) = client_with(transport);

    let ids = client.pending_sync_ids().await.unwrap();
    assert_eq!(ids, vec!["a-1", "b-2", "c-3"]);
}

#[tokio::test]
async fn empty_list_reply_is_an_empty_vec() {
    let transport = ScriptedTransport::new();
    transport.push_empty("GetOutOfSyncItems");
    let (client, _) = client_with(transport);

    assert_eq!(client.out_of_sync_items("tag-1").await.unwrap(), Vec::<String>::new());
}

#[tokio::test]
async fn ping_accepts_empty_acknowledgement() {
    let transport = ScriptedTransport::new();
    transport.push_empty("Ping");
    let (client, transport) = client_with(transport);

    client.ping().await.unwrap();
    assert_eq!(
        transport.last_request().unwrap().action,
        "http://tempuri.org//ServiceExecuteProcess/Ping"
    );
}

#[tokio::test]
async fn fault_surfaces_as_remote_fault_with_detail() {
    let transport = ScriptedTransport::new();
    transport.push_fault(
        "s:Server",
        "process failed",
        Some("stage 3 raised: divide by zero"),
    );
    let (client, _) = client_with(transport);

    let err = client
        .execute_process("NightlyRollup", "<args/>", ReturnInfo::None)
        .await
        .unwrap_err();
    match err {
        ClientError::RemoteFault(fault) => {
            assert_eq!(fault.code, "s:Server");
            assert_eq!(fault.message, "process failed");
            assert_eq!(fault.detail.as_deref(), Some("stage 3 raised: divide by zero"));
        }
        other => panic!("expected remote fault, got {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_endpoint_is_a_transport_error_not_a_fault() {
    let client = RemoteProcessingClient::with_transport(Arc::new(FailingTransport::unreachable()));
    let err = client.ping().await.unwrap_err();
    assert!(matches!(err, ClientError::Transport(_)));
}

#[tokio::test]
async fn timeout_is_reported_as_transport_error() {
    let client = RemoteProcessingClient::with_transport(Arc::new(FailingTransport::new(
        FailureMode::Timeout,
    )));
    let err = client.update_sync_tag("tag-9").await.unwrap_err();
    assert!(matches!(err, ClientError::Transport(_)));
}

#[tokio::test]
async fn return_info_rides_the_wire_as_its_exact_literal() {
    let transport = ScriptedTransport::new();
    transport.push_text("ExecuteProcess", "done");
    let (client, transport) = client_with(transport);

    client
        .execute_process("Rebuild", "<args/>", ReturnInfo::Timing)
        .await
        .unwrap();
    assert!(
        transport
            .last_request()
            .unwrap()
            .envelope
            .contains("<returnInfo>Timing</returnInfo>")
    );
}

#[tokio::test]
async fn field_data_type_rides_the_wire_as_its_exact_literal() {
    let transport = ScriptedTransport::new();
    transport.push_text("GetFieldOptions", "<options/>");
    let (client, transport) = client_with(transport);

    client
        .field_options("UnitPrice", FieldDataType::Decimal)
        .await
        .unwrap();
    assert!(
        transport
            .last_request()
            .unwrap()
            .envelope
            .contains("<dataType>DECIMAL</dataType>")
    );
}

#[tokio::test]
async fn expansion_codes_sends_one_string_element_per_code() {
    let transport = ScriptedTransport::new();
    transport.push_list("GetExpansionCodes", &["Alpha", "Beta"]);
    let (client, transport) = client_with(transport);

    let codes = vec!["A".to_string(), "B".to_string()];
    let expanded = client.expansion_codes(&codes).await.unwrap();
    assert_eq!(expanded, vec!["Alpha", "Beta"]);
    assert!(
        transport
            .last_request()
            .unwrap()
            .envelope
            .contains("<codes><string>A</string><string>B</string></codes>")
    );
}

#[tokio::test]
async fn ad_hoc_query_carries_all_ten_filters_in_order() {
    let transport = ScriptedTransport::new();
    transport.push_text("ExecuteAdHocQuery", "<rows/>");
    let (client, transport) = client_with(transport);

    client
        .ad_hoc_query("Order", "a", "b", "c", "d", "e", "f", "g", "h", "i", "j")
        .await
        .unwrap();
    let envelope = transport.last_request().unwrap().envelope;
    for (n, value) in ["a", "b", "c", "d", "e", "f", "g", "h", "i", "j"]
        .iter()
        .enumerate()
    {
        assert!(envelope.contains(&format!("<filter{}>{}</filter{}>", n + 1, value, n + 1)));
    }
}

#[tokio::test]
async fn contiguous_chunk_sequence_is_accepted_end_to_end() {
    let sink = ChunkSink::new();
    let client = RemoteProcessingClient::with_transport(Arc::new(sink.clone()));

    let payload: Vec<u8> = (0u8..=255).collect();
    let mut offset = 0u64;
    for part in payload.chunks(100) {
        client
            .upload_attachment_chunk(&AttachmentChunk {
                transfer_id: "xfer-1".to_string(),
                file_name: "payload.bin".to_string(),
                payload: part.to_vec(),
                offset,
                bytes_read: part.len() as u64,
                total_bytes: payload.len() as u64,
            })
            .await
            .unwrap();
        offset += part.len() as u64;
    }

    assert!(sink.is_complete("xfer-1"));
    assert_eq!(sink.received("xfer-1").unwrap(), payload);
}

#[tokio::test]
async fn gapped_chunk_sequence_is_forwarded_and_rejected_by_the_endpoint() {
    let sink = ChunkSink::new();
    let client = RemoteProcessingClient::with_transport(Arc::new(sink.clone()));

    let first = AttachmentChunk {
        transfer_id: "xfer-2".to_string(),
        file_name: "payload.bin".to_string(),
        payload: vec![1, 2, 3],
        offset: 0,
        bytes_read: 3,
        total_bytes: 9,
    };
    client.upload_attachment_chunk(&first).await.unwrap();

    // Skips offsets 3..6. The client must forward it untouched; only the
    // endpoint objects.
    let gapped = AttachmentChunk {
        payload: vec![7, 8, 9],
        offset: 6,
        ..first.clone()
    };
    let err = client.upload_attachment_chunk(&gapped).await.unwrap_err();
    match err {
        ClientError::RemoteFault(fault) => {
            assert!(fault.detail.unwrap().contains("contiguity"));
        }
        other => panic!("expected remote fault, got {other:?}"),
    }
    assert!(!sink.is_complete("xfer-2"));
}

#[tokio::test]
async fn single_shot_attachment_reaches_the_endpoint_intact() {
    let sink = ChunkSink::new();
    let client = RemoteProcessingClient::with_transport(Arc::new(sink.clone()));

    let attachment = procgate_protocol::Attachment {
        record_id: "REC-100".to_string(),
        category_id: "DOC".to_string(),
        transfer_id: "xfer-3".to_string(),
        file_name: "summary.txt".to_string(),
        payload: b"short enough for one call".to_vec(),
        offset: 0,
        bytes_read: 25,
        total_bytes: 25,
    };
    client.upload_attachment(&attachment).await.unwrap();
    assert_eq!(sink.attachments(), vec![attachment]);
}

#[tokio::test]
async fn scripted_replies_are_consumed_in_order() {
    let transport = ScriptedTransport::new();
    transport.push_text("GetMetricData", "first");
    transport.push_text("GetMetricData", "second");
    let (client, _) = client_with(transport);

    assert_eq!(client.metric_data("m", "<keys/>").await.unwrap(), "first");
    assert_eq!(client.metric_data("m", "<keys/>").await.unwrap(), "second");
}
