use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::blocking::Client;
use serde_json::Value;
use thiserror::Error;

use super::providers::Registry;
use super::{truncate, ChatMessage, GenerationParams};

/// Why a provider call produced no content.
#[derive(Error, Debug)]
pub enum InvocationError {
    #[error("unknown provider '{0}'")]
    UnknownProvider(String),

    #[error("{provider} request failed{}: {detail}", status_suffix(.status))]
    RequestFailed {
        provider: String,
        status: Option<u16>,
        detail: String,
    },

    #[error("malformed response from {provider}: {detail}")]
    MalformedResponse { provider: String, detail: String },
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

/// Low-level failure of a single HTTP exchange.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("invalid JSON body: {0}")]
    Decode(String),
}

/// Sends one JSON POST and returns the decoded JSON response.
pub trait Transport {
    fn post_json(
        &self,
        url: &str,
        headers: &BTreeMap<String, String>,
        body: &Value,
    ) -> Result<Value, TransportError>;
}

/// Blocking reqwest transport with a bounded timeout.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build HTTP client: {e}"))?;

        Ok(HttpTransport { client })
    }
}

impl Transport for HttpTransport {
    fn post_json(
        &self,
        url: &str,
        headers: &BTreeMap<String, String>,
        body: &Value,
    ) -> Result<Value, TransportError> {
        let mut req = self.client.post(url);
        for (name, value) in headers {
            req = req.header(name.as_str(), value.as_str());
        }

        let resp = req.json(body).send().map_err(network_error)?;

        let status = resp.status();
        let text = resp.text().map_err(network_error)?;

        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        log::trace!("Raw provider response: {}", truncate(&text, 4000));

        serde_json::from_str(&text)
            .map_err(|e| TransportError::Decode(format!("{e}; body: {}", truncate(&text, 500))))
    }
}

/// Full cause chain of a reqwest error, without the URL (it may embed the credential).
fn network_error(e: reqwest::Error) -> TransportError {
    TransportError::Network(format!("{:#}", anyhow::Error::from(e.without_url())))
}

/// Everything needed for one provider call.
#[derive(Debug, Clone)]
pub struct InvocationRequest {
    pub provider: String,
    pub model: String,
    pub credential: String,
    pub messages: Vec<ChatMessage>,
}

/// Runs requests against providers from a registry over a transport.
pub struct Invoker<'a> {
    registry: &'a Registry,
    transport: &'a dyn Transport,
    params: GenerationParams,
}

impl<'a> Invoker<'a> {
    pub fn new(registry: &'a Registry, transport: &'a dyn Transport, params: GenerationParams) -> Self {
        Invoker {
            registry,
            transport,
            params,
        }
    }

    pub fn invoke(&self, req: &InvocationRequest) -> Result<String, InvocationError> {
        let provider = self
            .registry
            .lookup(&req.provider)
            .ok_or_else(|| InvocationError::UnknownProvider(req.provider.clone()))?;

        let url = provider.resolve_endpoint(&req.model, &req.credential);
        let headers = provider.build_headers(&req.credential);
        let payload = provider.build_payload(&req.model, &req.messages, self.params);

        if provider.url_carries_secret() {
            log::info!("Calling {} model {:?}", provider.name, req.model);
        } else {
            log::info!("Calling {} model {:?} at {}", provider.name, req.model, url);
        }
        log::trace!("Request payload: {}", truncate(&payload.to_string(), 4000));

        let response = self
            .transport
            .post_json(&url, &headers, &payload)
            .map_err(|e| match e {
                TransportError::Status { status, body } => InvocationError::RequestFailed {
                    provider: provider.id.to_string(),
                    status: Some(status),
                    detail: if body.trim().is_empty() {
                        format!("empty response body with status {status}")
                    } else {
                        body
                    },
                },
                TransportError::Network(msg) => InvocationError::RequestFailed {
                    provider: provider.id.to_string(),
                    status: None,
                    detail: msg,
                },
                TransportError::Decode(msg) => InvocationError::MalformedResponse {
                    provider: provider.id.to_string(),
                    detail: msg,
                },
            })?;

        if let Some(usage) = response.get("usage") {
            log::debug!("Token usage: {usage}");
        }

        let content = provider.extract_content(&response)?;
        log::debug!("Provider response:\n{}", truncate(&content, 3000));

        Ok(content)
    }
}
