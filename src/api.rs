// API client module: the request envelope understood by the catalog server
// and a small blocking HTTP client that posts it.
//
// Every request goes to the same address as a JSON body; the operation is
// selected by `requestType`, never by the URL path.

use crate::config::Config;
use crate::error::ApiError;
use crate::session::Session;
use reqwest::blocking::Client;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

/// The JSON object sent for every operation.
///
/// `username` and `token` identify the caller and always sit at the top
/// level; `request_data` carries only the operation's own arguments.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestEnvelope {
    pub request_type: String,
    pub username: String,
    pub token: String,
    pub request_data: Map<String, Value>,
}

impl RequestEnvelope {
    pub fn new(request_type: &str, session: &Session, request_data: Map<String, Value>) -> Self {
        RequestEnvelope {
            request_type: request_type.to_string(),
            username: session.username.clone(),
            token: session.token.clone(),
            request_data,
        }
    }
}

/// Anything that can deliver an envelope and hand back the parsed reply.
pub trait Transport {
    fn send(&self, envelope: &RequestEnvelope) -> Result<Value, ApiError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, envelope: &RequestEnvelope) -> Result<Value, ApiError> {
        (**self).send(envelope)
    }
}

/// Blocking reqwest client bound to one API address.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    url: String,
}

impl ApiClient {
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(ApiError::Client)?;
        Ok(ApiClient {
            client,
            url: config.api_url.clone(),
        })
    }

    /// Create a client configured from `CATALOG_API_URL` /
    /// `CATALOG_API_TIMEOUT_SECS`. See `Config::from_env`.
    pub fn from_env() -> anyhow::Result<Self> {
        let config = Config::from_env()?;
        Ok(Self::new(&config)?)
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Transport for ApiClient {
    /// POST the envelope as JSON. Non-2xx replies and non-JSON bodies are
    /// reported as errors carrying the raw body text.
    fn send(&self, envelope: &RequestEnvelope) -> Result<Value, ApiError> {
        let res = self
            .client
            .post(&self.url)
            .json(envelope)
            .send()
            .map_err(ApiError::Network)?;

        let status = res.status();
        let body = res.text().map_err(ApiError::Network)?;
        debug!(status = status.as_u16(), bytes = body.len(), "received response");

        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        serde_json::from_str(&body).map_err(|_| ApiError::MalformedResponse {
            status: status.as_u16(),
            body,
        })
    }
}
