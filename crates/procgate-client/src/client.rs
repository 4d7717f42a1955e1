//! The typed façade over the remote processing endpoint.

use crate::config::{ClientConfig, ConfigError};
use crate::error::{ClientError, TransportError};
use crate::transport::{Binding, HttpTransport, Transport};
use log::debug;
use procgate_protocol::{
    Attachment, AttachmentChunk, EnvelopeError, FieldDataType, Param, ResponseBody, ReturnInfo,
    build_request, parse_response, soap_action,
};
use std::sync::Arc;

/// Typed client for the `ServiceExecuteProcess` contract.
///
/// Every operation is one synchronous request/response round trip: the call
/// completes when the reply, a remote fault, or a transport error arrives.
/// There is no client-side retry, backoff, queuing, or cancellation beyond
/// the binding timeout, and arguments pass through unmodified.
///
/// Chunked uploads are caller-driven: split the payload, keep offsets
/// contiguous, and invoke [`upload_attachment_chunk`] once per fragment.
/// The client forwards each fragment as-is and never validates the sequence.
///
/// [`upload_attachment_chunk`]: RemoteProcessingClient::upload_attachment_chunk
#[derive(Clone)]
pub struct RemoteProcessingClient {
    transport: Arc<dyn Transport>,
}

impl RemoteProcessingClient {
    /// Connect using a named pre-configured endpoint profile.
    pub fn from_profile(name: &str) -> Result<Self, ConfigError> {
        let config = ClientConfig::load_default()?;
        let profile = config.profile(name)?;
        let address = profile
            .address
            .clone()
            .ok_or_else(|| ConfigError::InvalidProfile {
                name: name.to_string(),
                message: "profile has no address".to_string(),
            })?;
        Self::with_binding(profile.binding(), address).map_err(|err| {
            ConfigError::InvalidProfile {
                name: name.to_string(),
                message: err.to_string(),
            }
        })
    }

    /// Connect to an explicit address using a named profile's binding.
    pub fn from_profile_at(name: &str, address: impl Into<String>) -> Result<Self, ConfigError> {
        let config = ClientConfig::load_default()?;
        let binding = config.profile(name)?.binding();
        Self::with_binding(binding, address).map_err(|err| ConfigError::InvalidProfile {
            name: name.to_string(),
            message: err.to_string(),
        })
    }

    /// Connect to an explicit address with the default binding.
    pub fn connect(address: impl Into<String>) -> Result<Self, TransportError> {
        Self::with_binding(Binding::default(), address)
    }

    /// Connect to an explicit address with an explicit binding.
    pub fn with_binding(
        binding: Binding,
        address: impl Into<String>,
    ) -> Result<Self, TransportError> {
        let transport = HttpTransport::new(&binding, address)?;
        Ok(Self::with_transport(Arc::new(transport)))
    }

    /// Wrap any transport implementation (in-memory transports for tests).
    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    // -- process execution ----------------------------------------------

    /// Execute a named process, selecting what metadata the reply carries.
    pub async fn execute_process(
        &self,
        process_name: &str,
        arguments_xml: &str,
        return_info: ReturnInfo,
    ) -> Result<String, ClientError> {
        self.call_text(
            "ExecuteProcess",
            &[
                ("processName", Param::Str(process_name)),
                ("arguments", Param::Str(arguments_xml)),
                ("returnInfo", Param::Str(return_info.as_str())),
            ],
        )
        .await
    }

    /// Start a named process with its default arguments.
    pub async fn start_process_with_defaults(
        &self,
        process_name: &str,
    ) -> Result<String, ClientError> {
        self.call_text(
            "StartProcessWithDefaults",
            &[("processName", Param::Str(process_name))],
        )
        .await
    }

    /// Cancel every process the session has open.
    pub async fn cancel_open_processes(&self) -> Result<(), ClientError> {
        self.call_empty("CancelOpenProcesses", &[]).await
    }

    // -- metadata and data fetches --------------------------------------

    /// Security rights for a user against an archetype.
    pub async fn security_rights(
        &self,
        user_id: &str,
        archetype: &str,
    ) -> Result<String, ClientError> {
        self.call_text(
            "GetSecurityRights",
            &[
                ("userId", Param::Str(user_id)),
                ("archetype", Param::Str(archetype)),
            ],
        )
        .await
    }

    /// Formatted archetype data for the given keys.
    pub async fn archetype_data(
        &self,
        archetype: &str,
        keys_xml: &str,
    ) -> Result<String, ClientError> {
        self.call_text(
            "GetArchetypeData",
            &[
                ("archetype", Param::Str(archetype)),
                ("keys", Param::Str(keys_xml)),
            ],
        )
        .await
    }

    /// Raw (unformatted) archetype data for the given keys.
    pub async fn archetype_data_raw(
        &self,
        archetype: &str,
        keys_xml: &str,
    ) -> Result<String, ClientError> {
        self.call_text(
            "GetArchetypeDataRaw",
            &[
                ("archetype", Param::Str(archetype)),
                ("keys", Param::Str(keys_xml)),
            ],
        )
        .await
    }

    /// Archetype data selected by an SQL-form query.
    pub async fn archetype_data_sql(&self, sql: &str) -> Result<String, ClientError> {
        self.call_text("GetArchetypeDataSql", &[("sql", Param::Str(sql))])
            .await
    }

    /// Data for a named archetype set.
    pub async fn archetype_set_data(&self, set_name: &str) -> Result<String, ClientError> {
        self.call_text("GetArchetypeSetData", &[("setName", Param::Str(set_name))])
            .await
    }

    /// Formatted metric data for the given keys.
    pub async fn metric_data(&self, metric: &str, keys_xml: &str) -> Result<String, ClientError> {
        self.call_text(
            "GetMetricData",
            &[
                ("metric", Param::Str(metric)),
                ("keys", Param::Str(keys_xml)),
            ],
        )
        .await
    }

    /// Raw metric data for the given keys.
    pub async fn metric_data_raw(
        &self,
        metric: &str,
        keys_xml: &str,
    ) -> Result<String, ClientError> {
        self.call_text(
            "GetMetricDataRaw",
            &[
                ("metric", Param::Str(metric)),
                ("keys", Param::Str(keys_xml)),
            ],
        )
        .await
    }

    /// Formatted metric data scoped to a named table.
    pub async fn metric_data_table(
        &self,
        metric: &str,
        table: &str,
        keys_xml: &str,
    ) -> Result<String, ClientError> {
        self.call_text(
            "GetMetricDataTable",
            &[
                ("metric", Param::Str(metric)),
                ("table", Param::Str(table)),
                ("keys", Param::Str(keys_xml)),
            ],
        )
        .await
    }

    /// Raw metric data scoped to a named table.
    pub async fn metric_data_table_raw(
        &self,
        metric: &str,
        table: &str,
        keys_xml: &str,
    ) -> Result<String, ClientError> {
        self.call_text(
            "GetMetricDataTableRaw",
            &[
                ("metric", Param::Str(metric)),
                ("table", Param::Str(table)),
                ("keys", Param::Str(keys_xml)),
            ],
        )
        .await
    }

    /// Metric data selected by an SQL-form query.
    pub async fn metric_data_sql(&self, sql: &str) -> Result<String, ClientError> {
        self.call_text("GetMetricDataSql", &[("sql", Param::Str(sql))])
            .await
    }

    /// Data for a generic report query.
    pub async fn report_query_data(
        &self,
        query: &str,
        parameters_xml: &str,
    ) -> Result<String, ClientError> {
        self.call_text(
            "GetReportQueryData",
            &[
                ("query", Param::Str(query)),
                ("parameters", Param::Str(parameters_xml)),
            ],
        )
        .await
    }

    /// Layout definition for a named report.
    pub async fn report_layout_data(&self, layout: &str) -> Result<String, ClientError> {
        self.call_text("GetReportLayoutData", &[("layout", Param::Str(layout))])
            .await
    }

    /// Crystal variant of the report layout fetch.
    pub async fn report_layout_data_crystal(&self, layout: &str) -> Result<String, ClientError> {
        self.call_text(
            "GetReportLayoutDataCrystal",
            &[("layout", Param::Str(layout))],
        )
        .await
    }

    /// Ad-hoc query against an archetype with ten positional filters.
    #[allow(clippy::too_many_arguments)]
    pub async fn ad_hoc_query(
        &self,
        archetype: &str,
        filter1: &str,
        filter2: &str,
        filter3: &str,
        filter4: &str,
        filter5: &str,
        filter6: &str,
        filter7: &str,
        filter8: &str,
        filter9: &str,
        filter10: &str,
    ) -> Result<String, ClientError> {
        self.call_text(
            "ExecuteAdHocQuery",
            &[
                ("archetype", Param::Str(archetype)),
                ("filter1", Param::Str(filter1)),
                ("filter2", Param::Str(filter2)),
                ("filter3", Param::Str(filter3)),
                ("filter4", Param::Str(filter4)),
                ("filter5", Param::Str(filter5)),
                ("filter6", Param::Str(filter6)),
                ("filter7", Param::Str(filter7)),
                ("filter8", Param::Str(filter8)),
                ("filter9", Param::Str(filter9)),
                ("filter10", Param::Str(filter10)),
            ],
        )
        .await
    }

    /// Actions available to a user.
    pub async fn actions_list(&self, user_id: &str) -> Result<String, ClientError> {
        self.call_text("GetActionsList", &[("userId", Param::Str(user_id))])
            .await
    }

    /// Methods exposed by a business object.
    pub async fn business_object_methods(
        &self,
        object_name: &str,
    ) -> Result<Vec<String>, ClientError> {
        self.call_list(
            "GetBusinessObjectMethods",
            &[("objectName", Param::Str(object_name))],
        )
        .await
    }

    /// Option values for a field, typed by its logical data type.
    pub async fn field_options(
        &self,
        field_name: &str,
        data_type: FieldDataType,
    ) -> Result<String, ClientError> {
        self.call_text(
            "GetFieldOptions",
            &[
                ("fieldName", Param::Str(field_name)),
                ("dataType", Param::Str(data_type.as_str())),
            ],
        )
        .await
    }

    /// Batch expansion-code lookup.
    pub async fn expansion_codes(&self, codes: &[String]) -> Result<Vec<String>, ClientError> {
        self.call_list("GetExpansionCodes", &[("codes", Param::StrList(codes))])
            .await
    }

    /// Item mapped from an external source key.
    pub async fn mapped_item(&self, source: &str, key: &str) -> Result<String, ClientError> {
        self.call_text(
            "GetMappedItem",
            &[("source", Param::Str(source)), ("key", Param::Str(key))],
        )
        .await
    }

    /// OneNote notebook map lookup.
    pub async fn onenote_map(&self, notebook_id: &str) -> Result<String, ClientError> {
        self.call_text("GetOneNoteMap", &[("notebookId", Param::Str(notebook_id))])
            .await
    }

    /// Client-side XML document built by the server for an archetype.
    pub async fn build_client_xml(
        &self,
        archetype: &str,
        keys_xml: &str,
    ) -> Result<String, ClientError> {
        self.call_text(
            "BuildClientXml",
            &[
                ("archetype", Param::Str(archetype)),
                ("keys", Param::Str(keys_xml)),
            ],
        )
        .await
    }

    // -- sync bookkeeping -----------------------------------------------

    /// Identifiers of records waiting to sync.
    pub async fn pending_sync_ids(&self) -> Result<Vec<String>, ClientError> {
        self.call_list("GetPendingSyncIds", &[]).await
    }

    /// Record a new sync tag.
    pub async fn update_sync_tag(&self, tag: &str) -> Result<String, ClientError> {
        self.call_text("UpdateSyncTag", &[("tag", Param::Str(tag))])
            .await
    }

    /// Items out of sync relative to a tag.
    pub async fn out_of_sync_items(&self, tag: &str) -> Result<Vec<String>, ClientError> {
        self.call_list("GetOutOfSyncItems", &[("tag", Param::Str(tag))])
            .await
    }

    /// Compare a file hash against the server's copy.
    pub async fn check_file_hash(
        &self,
        file_name: &str,
        hash: &str,
    ) -> Result<String, ClientError> {
        self.call_text(
            "CheckFileHash",
            &[
                ("fileName", Param::Str(file_name)),
                ("hash", Param::Str(hash)),
            ],
        )
        .await
    }

    // -- models and misc ------------------------------------------------

    /// Spell-check a piece of text.
    pub async fn check_spelling(&self, text: &str, language: &str) -> Result<String, ClientError> {
        self.call_text(
            "CheckSpelling",
            &[
                ("text", Param::Str(text)),
                ("language", Param::Str(language)),
            ],
        )
        .await
    }

    /// Create a model from a definition document.
    pub async fn create_model(
        &self,
        name: &str,
        definition_xml: &str,
    ) -> Result<String, ClientError> {
        self.call_text(
            "CreateModel",
            &[
                ("name", Param::Str(name)),
                ("definition", Param::Str(definition_xml)),
            ],
        )
        .await
    }

    /// Edit an existing model.
    pub async fn edit_model(
        &self,
        name: &str,
        definition_xml: &str,
    ) -> Result<String, ClientError> {
        self.call_text(
            "EditModel",
            &[
                ("name", Param::Str(name)),
                ("definition", Param::Str(definition_xml)),
            ],
        )
        .await
    }

    /// Test-only data fetch.
    pub async fn test_fetch_data(
        &self,
        archetype: &str,
        keys_xml: &str,
    ) -> Result<String, ClientError> {
        self.call_text(
            "GetTestData",
            &[
                ("archetype", Param::Str(archetype)),
                ("keys", Param::Str(keys_xml)),
            ],
        )
        .await
    }

    /// Test-only raw data fetch.
    pub async fn test_fetch_data_raw(
        &self,
        archetype: &str,
        keys_xml: &str,
    ) -> Result<String, ClientError> {
        self.call_text(
            "GetTestDataRaw",
            &[
                ("archetype", Param::Str(archetype)),
                ("keys", Param::Str(keys_xml)),
            ],
        )
        .await
    }

    /// Liveness check; returns nothing on success.
    pub async fn ping(&self) -> Result<(), ClientError> {
        self.call_empty("Ping", &[]).await
    }

    // -- attachments ----------------------------------------------------

    /// Upload one fragment of a chunked transfer.
    ///
    /// At-most-once from the client's perspective: a failed fragment is not
    /// retried, and all-or-nothing delivery of the whole file is a caller
    /// responsibility layered on top of this primitive.
    pub async fn upload_attachment_chunk(
        &self,
        chunk: &AttachmentChunk,
    ) -> Result<(), ClientError> {
        let body = self
            .dispatch(AttachmentChunk::OPERATION, chunk.to_envelope())
            .await?;
        expect_empty(AttachmentChunk::OPERATION, body)
    }

    /// Upload a complete attachment in one call.
    pub async fn upload_attachment(&self, attachment: &Attachment) -> Result<(), ClientError> {
        let body = self
            .dispatch(Attachment::OPERATION, attachment.to_envelope())
            .await?;
        expect_empty(Attachment::OPERATION, body)
    }

    /// Delete an image attachment from a record.
    pub async fn delete_image_attachment(
        &self,
        record_id: &str,
        image_id: &str,
    ) -> Result<(), ClientError> {
        self.call_empty(
            "DeleteImageAttachment",
            &[
                ("recordId", Param::Str(record_id)),
                ("imageId", Param::Str(image_id)),
            ],
        )
        .await
    }

    // -- plumbing -------------------------------------------------------

    async fn call(
        &self,
        operation: &str,
        params: &[(&str, Param<'_>)],
    ) -> Result<ResponseBody, ClientError> {
        self.dispatch(operation, build_request(operation, params))
            .await
    }

    async fn dispatch(
        &self,
        operation: &str,
        envelope: String,
    ) -> Result<ResponseBody, ClientError> {
        let action = soap_action(operation);
        debug!("{operation} ({} byte request)", envelope.len());
        let reply = self.transport.send(&action, &envelope).await?;
        debug!("{operation} replied ({} bytes)", reply.len());
        match parse_response(&reply).map_err(TransportError::from)? {
            ResponseBody::Fault(fault) => Err(ClientError::RemoteFault(fault)),
            body => Ok(body),
        }
    }

    async fn call_text(
        &self,
        operation: &str,
        params: &[(&str, Param<'_>)],
    ) -> Result<String, ClientError> {
        match self.call(operation, params).await? {
            ResponseBody::Text(text) => Ok(text),
            other => Err(shape_mismatch(operation, "text result", &other)),
        }
    }

    async fn call_list(
        &self,
        operation: &str,
        params: &[(&str, Param<'_>)],
    ) -> Result<Vec<String>, ClientError> {
        match self.call(operation, params).await? {
            ResponseBody::List(items) => Ok(items),
            // An empty string array serializes with no <string> children.
            ResponseBody::Empty => Ok(Vec::new()),
            ResponseBody::Text(text) if text.is_empty() => Ok(Vec::new()),
            other => Err(shape_mismatch(operation, "string-array result", &other)),
        }
    }

    async fn call_empty(
        &self,
        operation: &str,
        params: &[(&str, Param<'_>)],
    ) -> Result<(), ClientError> {
        let body = self.call(operation, params).await?;
        expect_empty(operation, body)
    }
}

fn expect_empty(operation: &str, body: ResponseBody) -> Result<(), ClientError> {
    match body {
        ResponseBody::Empty => Ok(()),
        ResponseBody::Text(text) if text.is_empty() => Ok(()),
        other => Err(shape_mismatch(operation, "empty acknowledgement", &other)),
    }
}

fn shape_mismatch(operation: &str, expected: &str, got: &ResponseBody) -> ClientError {
    let got = match got {
        ResponseBody::Empty => "empty body",
        ResponseBody::Text(_) => "text result",
        ResponseBody::List(_) => "string-array result",
        ResponseBody::Fault(_) => "fault",
    };
    ClientError::Transport(TransportError::Envelope(EnvelopeError::Shape(format!(
        "{operation}: expected {expected}, got {got}"
    ))))
}
