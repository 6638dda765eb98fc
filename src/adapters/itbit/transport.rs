//! itBit Transport
//!
//! Executes one HTTP exchange with the itBit REST API and sorts every
//! outcome into a response or a classified error:
//!
//! | outcome                      | result                              |
//! |------------------------------|-------------------------------------|
//! | status < 400                 | `Ok(ExchangeResponse)`              |
//! | 401 / 404 / 422              | `Ok(ExchangeResponse)` (soft error) |
//! | 502 / 503 / 504              | `Err(ServerUnavailable)` (retry)    |
//! | connect/read timeout         | `Err(Timeout)` (retry)              |
//! | other status, other I/O      | fatal error                         |

use std::fmt;
use std::sync::Arc;

use reqwest::header::CONTENT_TYPE;
use reqwest::{StatusCode, Url};

use crate::adapters::errors::{ExchangeError, ExchangeResult};
use crate::adapters::types::create_http_client;

use super::config::ItBitConfig;
use super::signing::{HttpMethod, NonceCounter, RequestParams, RequestSigner};

/// Statuses the exchange uses for well-formed rejections
const SOFT_ERROR_STATUSES: [u16; 3] = [401, 404, 422];
/// Statuses the exchange returns under transient overload
const RETRYABLE_STATUSES: [u16; 3] = [502, 503, 504];

// =============================================================================
// Exchange Response
// =============================================================================

/// Status line and raw body of one exchange call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeResponse {
    pub status_code: u16,
    /// Canonical phrase for the status code, not the text the server sent
    pub reason_phrase: String,
    pub body: String,
}

impl ExchangeResponse {
    pub fn new(status_code: u16, reason_phrase: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            status_code,
            reason_phrase: reason_phrase.into(),
            body: body.into(),
        }
    }

    /// True when the status is one the exchange uses for soft rejections
    pub fn is_soft_error(&self) -> bool {
        SOFT_ERROR_STATUSES.contains(&self.status_code)
    }
}

impl fmt::Display for ExchangeResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ExchangeResponse [statusCode={}, reasonPhrase={}, payload={}]",
            self.status_code, self.reason_phrase, self.body
        )
    }
}

/// Sort a fully read response into data or a classified error
pub fn classify_response(status: StatusCode, body: String) -> ExchangeResult<ExchangeResponse> {
    let code = status.as_u16();
    let reason = status.canonical_reason().unwrap_or("");

    if code < 400 {
        return Ok(ExchangeResponse::new(code, reason, body));
    }
    if RETRYABLE_STATUSES.contains(&code) {
        tracing::warn!(exchange = "itbit", status = code, "Exchange returned transient 50x");
        return Err(ExchangeError::ServerUnavailable { status: code, body });
    }
    if SOFT_ERROR_STATUSES.contains(&code) {
        tracing::warn!(
            exchange = "itbit",
            status = code,
            body = %body,
            "Exchange has rejected request due to bad data being sent to it"
        );
        return Ok(ExchangeResponse::new(code, reason, body));
    }
    tracing::error!(exchange = "itbit", status = code, body = %body, "Unexpected HTTP status");
    Err(ExchangeError::UnexpectedStatus {
        context: "Failed to connect to Exchange due to unexpected HTTP status".to_string(),
        response: ExchangeResponse::new(code, reason, body),
    })
}

/// Map a reqwest failure onto the error taxonomy
pub fn classify_transport_error(err: &reqwest::Error) -> ExchangeError {
    if err.is_timeout() {
        tracing::error!(exchange = "itbit", error = %err, "Socket timeout");
        ExchangeError::Timeout(err.to_string())
    } else if err.is_builder() {
        ExchangeError::InvalidRequest(format!("Failed to build request: {}", err))
    } else {
        tracing::error!(exchange = "itbit", error = %err, "Unexpected IO error");
        ExchangeError::Transport(err.to_string())
    }
}

// =============================================================================
// Transport Client
// =============================================================================

/// HTTP transport for public and signed itBit calls
pub struct Transport {
    http_client: reqwest::Client,
    base_url: String,
    signer: RequestSigner,
    nonces: Arc<NonceCounter>,
}

impl Transport {
    /// Build a transport; the nonce counter is shared with whoever passed it in
    pub fn new(config: &ItBitConfig, nonces: Arc<NonceCounter>) -> ExchangeResult<Self> {
        Ok(Self {
            http_client: create_http_client("itbit", config.connection_timeout())?,
            base_url: config.base_url.clone(),
            signer: RequestSigner::new(&config.api_key, &config.api_secret, &config.base_url),
            nonces,
        })
    }

    pub fn nonces(&self) -> &NonceCounter {
        &self.nonces
    }

    /// Unauthenticated GET against the public API
    pub async fn send_public(&self, api_path: &str) -> ExchangeResult<ExchangeResponse> {
        let url = parse_url(&format!("{}{}", self.base_url, api_path))?;
        tracing::debug!(exchange = "itbit", url = %url, "Public API call");

        let request = self
            .http_client
            .get(url)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded");
        self.execute(request).await
    }

    /// Signed call against the authenticated API
    ///
    /// Takes a nonce before the request is sent; it is not returned on failure.
    pub async fn send_authenticated(
        &self,
        method: HttpMethod,
        api_path: &str,
        params: &RequestParams,
    ) -> ExchangeResult<ExchangeResponse> {
        let signed = self.signer.sign(&self.nonces, method, api_path, params)?;
        let url = parse_url(&signed.url)?;
        tracing::debug!(
            exchange = "itbit",
            method = %method,
            url = %url,
            nonce = signed.nonce,
            "Authenticated API call"
        );

        let mut request = self.http_client.request(method.into(), url);
        for (name, value) in signed.headers(self.signer.api_key()) {
            request = request.header(name, value);
        }
        if method == HttpMethod::Post {
            request = request.body(signed.body);
        }
        self.execute(request).await
    }

    async fn execute(&self, request: reqwest::RequestBuilder) -> ExchangeResult<ExchangeResponse> {
        let response = request
            .send()
            .await
            .map_err(|e| classify_transport_error(&e))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| classify_transport_error(&e))?;
        classify_response(status, body)
    }
}

fn parse_url(raw: &str) -> ExchangeResult<Url> {
    Url::parse(raw).map_err(|e| ExchangeError::InvalidRequest(format!("Malformed URL '{}': {}", raw, e)))
}
