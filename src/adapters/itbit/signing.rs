//! itBit Signing
//!
//! Builds the canonical URL, the JSON body and the HMAC-SHA512 signature for
//! an authenticated itBit REST call:
//!
//! 1. `message = nonce + json([method, url, body, nonce, timestamp])`
//! 2. `hash = SHA256(message)` as a signed big integer
//! 3. `signature = base64(HMAC-SHA512(secret, url ++ hash))`
//!
//! The exchange verifies the signature itself, so every byte here matters.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use hmac::{Hmac, Mac};
use num_bigint::BigInt;
use serde::ser::{Serialize, SerializeMap, Serializer};
use sha2::{Digest, Sha256, Sha512};

use crate::adapters::errors::{ExchangeError, ExchangeResult};

type HmacSha512 = Hmac<Sha512>;

/// Current wall-clock time in Unix milliseconds
pub fn current_time_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

// =============================================================================
// HTTP Method
// =============================================================================

/// HTTP methods the authenticated API accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = ExchangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "DELETE" => Ok(HttpMethod::Delete),
            other => Err(ExchangeError::InvalidRequest(format!(
                "Don't know how to build secure [{}] request",
                other
            ))),
        }
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

// =============================================================================
// Request Parameters
// =============================================================================

/// Request parameters, kept in insertion order
///
/// Order matters: the query string and the JSON body are signed exactly as
/// they are sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestParams(Vec<(String, String)>);

impl RequestParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a parameter (builder style)
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.push((key.into(), value.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `k=v` pairs joined by `&`, values left unescaped
    pub fn to_query_string(&self) -> String {
        self.0
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&")
    }
}

impl Serialize for RequestParams {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

// =============================================================================
// Nonce
// =============================================================================

/// Strictly increasing nonce for signed calls
///
/// Seeded once from wall-clock seconds; every signed call takes the next
/// value whether or not the call later succeeds. Share one counter through
/// an `Arc` if several adapters use the same API key.
#[derive(Debug)]
pub struct NonceCounter {
    value: AtomicU64,
}

impl NonceCounter {
    /// Seed from seconds since the Unix epoch
    pub fn seeded_from_clock() -> Self {
        Self::starting_at(current_time_ms() / 1000)
    }

    /// Seed with an explicit value; the first `next()` returns `seed + 1`
    pub fn starting_at(seed: u64) -> Self {
        Self {
            value: AtomicU64::new(seed),
        }
    }

    /// Advance by one and return the new value
    pub fn next(&self) -> u64 {
        self.value.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Last value handed out (or the seed)
    pub fn current(&self) -> u64 {
        self.value.load(Ordering::SeqCst)
    }
}

// =============================================================================
// Signed Request
// =============================================================================

/// One fully signed request, built fresh per call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    pub method: HttpMethod,
    /// Exact URL covered by the signature (query string included)
    pub url: String,
    /// JSON body for POST, empty otherwise
    pub body: String,
    pub nonce: u64,
    pub timestamp_ms: u64,
    /// Base64 signature
    pub signature: String,
}

impl SignedRequest {
    /// Authentication and content headers, in the order they are sent
    pub fn headers(&self, api_key: &str) -> Vec<(&'static str, String)> {
        vec![
            ("Authorization", format!("{}:{}", api_key, self.signature)),
            ("X-Auth-Timestamp", self.timestamp_ms.to_string()),
            ("X-Auth-Nonce", self.nonce.to_string()),
            ("Content-Type", "application/json".to_string()),
        ]
    }
}

/// Re-encode big-endian bytes as a minimal two's-complement integer
///
/// The exchange's reference client feeds hashes through a signed big
/// integer, which drops redundant leading 0x00 (or 0xFF) bytes.
pub fn to_signed_minimal_bytes(bytes: &[u8]) -> Vec<u8> {
    BigInt::from_signed_bytes_be(bytes).to_signed_bytes_be()
}

/// Signs authenticated requests for one API key
pub struct RequestSigner {
    api_key: String,
    api_secret: String,
    base_url: String,
}

impl RequestSigner {
    pub fn new(
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            base_url: base_url.into(),
        }
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Sign with the next nonce and the current time
    ///
    /// The nonce is consumed before anything can fail, so a failed call
    /// never hands its nonce to a later one.
    pub fn sign(
        &self,
        nonces: &NonceCounter,
        method: HttpMethod,
        api_path: &str,
        params: &RequestParams,
    ) -> ExchangeResult<SignedRequest> {
        let nonce = nonces.next();
        self.sign_with(method, api_path, params, nonce, current_time_ms())
    }

    /// Deterministic signing with explicit nonce and timestamp
    pub fn sign_with(
        &self,
        method: HttpMethod,
        api_path: &str,
        params: &RequestParams,
        nonce: u64,
        timestamp_ms: u64,
    ) -> ExchangeResult<SignedRequest> {
        let mut url = format!("{}{}", self.base_url, api_path);
        let body = match method {
            HttpMethod::Get => {
                if !params.is_empty() {
                    url.push('?');
                    url.push_str(&params.to_query_string());
                }
                String::new()
            }
            HttpMethod::Post => serde_json::to_string(params)
                .map_err(|e| ExchangeError::Signing(format!("Failed to serialize request body: {}", e)))?,
            HttpMethod::Delete => String::new(),
        };

        let nonce_str = nonce.to_string();
        let timestamp_str = timestamp_ms.to_string();
        let signature_params = serde_json::to_string(&[
            method.as_str(),
            url.as_str(),
            body.as_str(),
            nonce_str.as_str(),
            timestamp_str.as_str(),
        ])
        .map_err(|e| ExchangeError::Signing(format!("Failed to serialize signature params: {}", e)))?;

        let message = format!("{}{}", nonce_str, signature_params);
        let message_hash = to_signed_minimal_bytes(&Sha256::digest(message.as_bytes()));

        tracing::debug!(
            exchange = "itbit",
            method = %method,
            url = %url,
            nonce,
            timestamp_ms,
            message_hash = %hex::encode(&message_hash),
            "Signature params: {}",
            signature_params
        );

        let mut mac = HmacSha512::new_from_slice(self.api_secret.as_bytes())
            .map_err(|e| ExchangeError::Signing(format!("Invalid HMAC key: {}", e)))?;
        mac.update(url.as_bytes());
        mac.update(&message_hash);
        let signature = BASE64.encode(to_signed_minimal_bytes(&mac.finalize().into_bytes()));

        Ok(SignedRequest {
            method,
            url,
            body,
            nonce,
            timestamp_ms,
            signature,
        })
    }
}

impl fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestSigner")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://api.itbit.com/v1/";
    const NONCE: u64 = 1_443_900_000;
    const TS: u64 = 1_443_900_000_123;

    fn signer() -> RequestSigner {
        RequestSigner::new("test-key", "test-secret", BASE)
    }

    /// Independent re-derivation of the signature, step by step
    fn reference_signature(secret: &str, method: &str, url: &str, body: &str, nonce: u64, ts: u64) -> String {
        let json = format!(
            r#"["{}","{}","{}","{}","{}"]"#,
            method, url, body.replace('"', "\\\""), nonce, ts
        );
        let message = format!("{}{}", nonce, json);
        let hash = to_signed_minimal_bytes(&Sha256::digest(message.as_bytes()));
        let mut mac = HmacSha512::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(url.as_bytes());
        mac.update(&hash);
        BASE64.encode(to_signed_minimal_bytes(&mac.finalize().into_bytes()))
    }

    #[test]
    fn test_http_method_from_str() {
        assert_eq!("GET".parse::<HttpMethod>().unwrap(), HttpMethod::Get);
        assert_eq!("POST".parse::<HttpMethod>().unwrap(), HttpMethod::Post);
        assert_eq!("DELETE".parse::<HttpMethod>().unwrap(), HttpMethod::Delete);
    }

    #[test]
    fn test_unsupported_method_is_fatal() {
        let err = "PATCH".parse::<HttpMethod>().unwrap_err();
        assert!(matches!(err, ExchangeError::InvalidRequest(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_nonce_starts_after_seed_and_increments_by_one() {
        let nonces = NonceCounter::starting_at(100);
        assert_eq!(nonces.current(), 100);
        assert_eq!(nonces.next(), 101);
        assert_eq!(nonces.next(), 102);
        assert_eq!(nonces.current(), 102);
    }

    #[test]
    fn test_nonce_seeded_from_clock_in_seconds() {
        let nonces = NonceCounter::seeded_from_clock();
        let now_secs = current_time_ms() / 1000;
        assert!(nonces.current() <= now_secs);
        assert!(nonces.current() + 5 >= now_secs);
    }

    #[test]
    fn test_sign_consumes_one_nonce_per_call() {
        let nonces = NonceCounter::starting_at(NONCE);
        let s = signer();
        let first = s.sign(&nonces, HttpMethod::Get, "wallets", &RequestParams::new()).unwrap();
        let second = s.sign(&nonces, HttpMethod::Delete, "wallets/w/orders/1", &RequestParams::new()).unwrap();
        assert_eq!(first.nonce, NONCE + 1);
        assert_eq!(second.nonce, NONCE + 2);
    }

    #[test]
    fn test_get_url_keeps_param_order_and_raw_values() {
        let params = RequestParams::new()
            .with("userId", "5591A5B5-2F51-4D7C-9B69-5F0D1E7E1A26")
            .with("status", "open");
        let req = signer().sign_with(HttpMethod::Get, "wallets", &params, NONCE, TS).unwrap();
        assert_eq!(
            req.url,
            "https://api.itbit.com/v1/wallets?userId=5591A5B5-2F51-4D7C-9B69-5F0D1E7E1A26&status=open"
        );
        assert_eq!(req.body, "");
    }

    #[test]
    fn test_get_without_params_has_no_query() {
        let req = signer()
            .sign_with(HttpMethod::Get, "wallets", &RequestParams::new(), NONCE, TS)
            .unwrap();
        assert_eq!(req.url, "https://api.itbit.com/v1/wallets");
    }

    #[test]
    fn test_post_body_is_compact_json_in_insertion_order() {
        let params = RequestParams::new()
            .with("side", "buy")
            .with("type", "limit")
            .with("amount", "1.5");
        let req = signer().sign_with(HttpMethod::Post, "wallets/w1/orders", &params, NONCE, TS).unwrap();
        assert_eq!(req.url, "https://api.itbit.com/v1/wallets/w1/orders");
        assert_eq!(req.body, r#"{"side":"buy","type":"limit","amount":"1.5"}"#);
    }

    #[test]
    fn test_delete_ignores_params() {
        let params = RequestParams::new().with("ignored", "x");
        let req = signer().sign_with(HttpMethod::Delete, "wallets/w1/orders/o1", &params, NONCE, TS).unwrap();
        assert_eq!(req.url, "https://api.itbit.com/v1/wallets/w1/orders/o1");
        assert_eq!(req.body, "");
    }

    #[test]
    fn test_signature_matches_reference_derivation() {
        let params = RequestParams::new().with("userId", "u=1");
        let req = signer().sign_with(HttpMethod::Get, "wallets", &params, NONCE, TS).unwrap();
        let expected = reference_signature("test-secret", "GET", &req.url, "", NONCE, TS);
        assert_eq!(req.signature, expected);
        assert!(req.url.contains("u=1"), "'=' must stay literal: {}", req.url);
    }

    #[test]
    fn test_post_signature_matches_reference_derivation() {
        let params = RequestParams::new().with("amount", "2").with("price", "250.18");
        let req = signer().sign_with(HttpMethod::Post, "wallets/w/orders", &params, NONCE, TS).unwrap();
        let expected = reference_signature("test-secret", "POST", &req.url, &req.body, NONCE, TS);
        assert_eq!(req.signature, expected);
    }

    #[test]
    fn test_signature_determinism() {
        let params = RequestParams::new().with("status", "open");
        let a = signer().sign_with(HttpMethod::Get, "wallets/w/orders", &params, NONCE, TS).unwrap();
        let b = signer().sign_with(HttpMethod::Get, "wallets/w/orders", &params, NONCE, TS).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_signature_is_base64_of_at_most_65_bytes() {
        let req = signer()
            .sign_with(HttpMethod::Get, "wallets", &RequestParams::new(), NONCE, TS)
            .unwrap();
        let decoded = BASE64.decode(&req.signature).unwrap();
        assert!(!decoded.is_empty() && decoded.len() <= 65, "len {}", decoded.len());
    }

    #[test]
    fn test_minimal_bytes_strip_redundant_sign_bytes() {
        assert_eq!(to_signed_minimal_bytes(&[0x00, 0x01]), vec![0x01]);
        assert_eq!(to_signed_minimal_bytes(&[0x00, 0x80]), vec![0x00, 0x80]);
        assert_eq!(to_signed_minimal_bytes(&[0xff, 0xff, 0x80]), vec![0x80]);
        assert_eq!(to_signed_minimal_bytes(&[0xff, 0x7f]), vec![0xff, 0x7f]);
        assert_eq!(to_signed_minimal_bytes(&[0x00, 0x00]), vec![0x00]);
        assert_eq!(to_signed_minimal_bytes(&[0x12, 0x34]), vec![0x12, 0x34]);
    }

    #[test]
    fn test_headers() {
        let req = signer()
            .sign_with(HttpMethod::Get, "wallets", &RequestParams::new(), NONCE, TS)
            .unwrap();
        let headers = req.headers("test-key");
        assert_eq!(headers[0], ("Authorization", format!("test-key:{}", req.signature)));
        assert_eq!(headers[1], ("X-Auth-Timestamp", TS.to_string()));
        assert_eq!(headers[2], ("X-Auth-Nonce", NONCE.to_string()));
        assert_eq!(headers[3], ("Content-Type", "application/json".to_string()));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let debug = format!("{:?}", signer());
        assert!(!debug.contains("test-secret"), "Got: {}", debug);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn sign(secret: &str, path: &str, value: &str, nonce: u64, ts: u64) -> String {
            RequestSigner::new("k", secret, BASE)
                .sign_with(HttpMethod::Post, path, &RequestParams::new().with("v", value), nonce, ts)
                .unwrap()
                .signature
        }

        proptest! {
            #[test]
            fn deterministic(value in "[a-zA-Z0-9=&.]{0,16}", nonce in 1u64..u64::MAX / 2, ts in 1u64..u64::MAX / 2) {
                prop_assert_eq!(sign("s", "p", &value, nonce, ts), sign("s", "p", &value, nonce, ts));
            }

            #[test]
            fn sensitive_to_nonce(nonce in 1u64..u64::MAX / 2) {
                prop_assert_ne!(sign("s", "p", "v", nonce, 7), sign("s", "p", "v", nonce + 1, 7));
            }

            #[test]
            fn sensitive_to_timestamp(ts in 1u64..u64::MAX / 2) {
                prop_assert_ne!(sign("s", "p", "v", 7, ts), sign("s", "p", "v", 7, ts + 1));
            }

            #[test]
            fn sensitive_to_params(a in "[a-z0-9]{1,12}", b in "[a-z0-9]{1,12}") {
                prop_assume!(a != b);
                prop_assert_ne!(sign("s", "p", &a, 7, 7), sign("s", "p", &b, 7, 7));
            }

            #[test]
            fn sensitive_to_path(a in "[a-z]{1,12}", b in "[a-z]{1,12}") {
                prop_assume!(a != b);
                prop_assert_ne!(sign("s", &a, "v", 7, 7), sign("s", &b, "v", 7, 7));
            }

            #[test]
            fn sensitive_to_secret(a in "[a-z]{1,12}", b in "[a-z]{1,12}") {
                prop_assume!(a != b);
                prop_assert_ne!(sign(&a, "p", "v", 7, 7), sign(&b, "p", "v", 7, 7));
            }
        }

        #[test]
        fn sensitive_to_method() {
            let s = signer();
            let get = s.sign_with(HttpMethod::Get, "p", &RequestParams::new(), 7, 7).unwrap();
            let delete = s.sign_with(HttpMethod::Delete, "p", &RequestParams::new(), 7, 7).unwrap();
            assert_ne!(get.signature, delete.signature);
        }
    }
}
