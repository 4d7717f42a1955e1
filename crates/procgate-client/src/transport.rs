//! Transport seam between the typed client and the wire.
//!
//! One trait, one concrete implementation per transport choice: HTTP here,
//! in-memory doubles in `procgate-test-utils`.

use crate::error::TransportError;
use async_trait::async_trait;
use log::debug;
use std::time::Duration;

/// A live connection capable of one SOAP request/response round trip.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Post `envelope` under the given SOAP action and return the raw reply
    /// envelope. Implementations must not retry or reorder calls.
    async fn send(&self, action: &str, envelope: &str) -> Result<String, TransportError>;
}

/// Transport-level settings applied at construction; never reconfigured.
#[derive(Debug, Clone)]
pub struct Binding {
    /// Whole-call timeout. There is no per-operation override.
    pub timeout: Duration,
    /// User-Agent header sent with every request.
    pub user_agent: String,
}

impl Default for Binding {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            user_agent: concat!("procgate/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// SOAP 1.1 over HTTP POST.
pub struct HttpTransport {
    http: reqwest::Client,
    address: String,
}

impl HttpTransport {
    /// Build an HTTP transport for the endpoint at `address`.
    pub fn new(binding: &Binding, address: impl Into<String>) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(binding.timeout)
            .user_agent(binding.user_agent.clone())
            .build()
            .map_err(|err| TransportError::Http(err.to_string()))?;
        Ok(Self {
            http,
            address: address.into(),
        })
    }

    /// Remote address this transport posts to.
    pub fn address(&self) -> &str {
        &self.address
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, action: &str, envelope: &str) -> Result<String, TransportError> {
        debug!("POST {} (action={action})", self.address);
        let response = self
            .http
            .post(&self.address)
            .header("Content-Type", "text/xml; charset=utf-8")
            .header("SOAPAction", format!("\"{action}\""))
            .body(envelope.to_string())
            .send()
            .await
            .map_err(map_reqwest)?;
        let status = response.status();
        let body = response.text().await.map_err(map_reqwest)?;
        // SOAP 1.1 faults arrive on HTTP 500; hand that body back so the
        // envelope parser can surface the fault.
        if status.is_success() || status.as_u16() == 500 {
            Ok(body)
        } else {
            Err(TransportError::Status(status.as_u16()))
        }
    }
}

fn map_reqwest(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else if err.is_connect() {
        TransportError::Connect(err.to_string())
    } else {
        TransportError::Http(err.to_string())
    }
}
