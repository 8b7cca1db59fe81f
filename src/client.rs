//! Client call engine.
//!
//! [`SeamClient`] issues named calls against a seam-rpc server. It is an
//! explicitly constructed handle: build one with [`ClientBuilder`], share
//! it freely (calls are independent and may run concurrently), and pass it
//! where it is needed instead of relying on any ambient singleton.
//!
//! # Example
//!
//! ```ignore
//! use seam_rpc::{Attachment, SeamClient, Value};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = SeamClient::builder("http://localhost:3000").build();
//!
//!     let result = client
//!         .call(
//!             "users",
//!             "createUser",
//!             vec![
//!                 Value::from("john"),
//!                 Value::from(Attachment::new(vec![0u8; 10])),
//!             ],
//!         )
//!         .await?;
//!
//!     println!("{:?}", result);
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::StatusCode;

use crate::error::{Result, SeamError};
use crate::value::Value;
use crate::wire;

/// Observes (and may mutate) a pending request before it is sent.
///
/// Interceptors run sequentially in registration order. A failing
/// interceptor aborts the call before any network I/O.
#[async_trait]
pub trait RequestInterceptor: Send + Sync {
    /// Called once per call, before the network exchange.
    async fn before_send(&self, ctx: &mut RequestContext<'_>) -> Result<()>;
}

/// Observes a completed call after its result has been decoded.
///
/// Runs sequentially in registration order; purely observational with
/// respect to the result value.
#[async_trait]
pub trait ResponseInterceptor: Send + Sync {
    /// Called once per successful call, after decode.
    async fn after_receive(&self, ctx: &ResponseContext<'_>) -> Result<()>;
}

/// Context handed to request interceptors.
pub struct RequestContext<'a> {
    /// Name of the router the call targets.
    pub router_name: &'a str,
    /// Name of the function within the router.
    pub func_name: &'a str,
    /// The positional arguments, as built by the caller.
    pub args: &'a [Value],
    /// Outgoing headers; interceptors may add or replace entries.
    pub headers: &'a mut HeaderMap,
}

/// Context handed to response interceptors.
pub struct ResponseContext<'a> {
    /// Name of the router the call targeted.
    pub router_name: &'a str,
    /// Name of the function within the router.
    pub func_name: &'a str,
    /// The positional arguments the call was made with.
    pub args: &'a [Value],
    /// Response status (always a success status here).
    pub status: StatusCode,
    /// The decoded result value.
    pub result: &'a Value,
}

/// Builder for configuring and creating a [`SeamClient`].
pub struct ClientBuilder {
    base_url: String,
    http: Option<reqwest::Client>,
    request_interceptors: Vec<Arc<dyn RequestInterceptor>>,
    response_interceptors: Vec<Arc<dyn ResponseInterceptor>>,
}

impl ClientBuilder {
    /// Create a builder targeting `base_url` (scheme + host + optional
    /// path prefix, no trailing slash required).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http: None,
            request_interceptors: Vec::new(),
            response_interceptors: Vec::new(),
        }
    }

    /// Use a preconfigured HTTP client (timeouts, proxies, TLS).
    ///
    /// There is no built-in call timeout; configure one here if needed.
    pub fn http_client(mut self, http: reqwest::Client) -> Self {
        self.http = Some(http);
        self
    }

    /// Append a pre-request interceptor.
    pub fn request_interceptor(mut self, interceptor: impl RequestInterceptor + 'static) -> Self {
        self.request_interceptors.push(Arc::new(interceptor));
        self
    }

    /// Append a post-response interceptor.
    pub fn response_interceptor(mut self, interceptor: impl ResponseInterceptor + 'static) -> Self {
        self.response_interceptors.push(Arc::new(interceptor));
        self
    }

    /// Build the client. Configuration is immutable afterwards.
    pub fn build(self) -> SeamClient {
        SeamClient {
            base_url: self.base_url.trim_end_matches('/').to_string(),
            http: self.http.unwrap_or_default(),
            request_interceptors: self.request_interceptors,
            response_interceptors: self.response_interceptors,
        }
    }
}

/// A handle for issuing calls against a seam-rpc server.
///
/// Cheap to clone; all clones share the same HTTP connection pool and
/// interceptor configuration.
#[derive(Clone)]
pub struct SeamClient {
    base_url: String,
    http: reqwest::Client,
    request_interceptors: Vec<Arc<dyn RequestInterceptor>>,
    response_interceptors: Vec<Arc<dyn ResponseInterceptor>>,
}

impl SeamClient {
    /// Create a new client builder.
    pub fn builder(base_url: impl Into<String>) -> ClientBuilder {
        ClientBuilder::new(base_url)
    }

    /// The configured base URL (trailing slash stripped).
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issue one call: `POST {base}/{router}/{func}` with the framed
    /// argument list, returning the decoded result value.
    ///
    /// # Errors
    ///
    /// - [`SeamError::Api`] when the handler rejected the call; carries
    ///   the handler's message verbatim.
    /// - [`SeamError::Transport`] when no response was received.
    /// - [`SeamError::Status`] for any other non-success status.
    /// - Decode-side errors ([`SeamError::UnsupportedEncoding`],
    ///   [`SeamError::Protocol`], …) when the response body is not a
    ///   well-formed result envelope.
    pub async fn call(&self, router_name: &str, func_name: &str, args: Vec<Value>) -> Result<Value> {
        let envelope = Value::Array(args);
        let message = wire::encode(&envelope)?;

        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_str(&message.content_type)
                .map_err(|e| SeamError::Protocol(format!("invalid content type: {}", e)))?,
        );

        // Borrow the argument list back out of the envelope for the
        // interceptor contexts.
        let args = envelope.as_array().map(Vec::as_slice).unwrap_or(&[]);

        for interceptor in &self.request_interceptors {
            let mut ctx = RequestContext {
                router_name,
                func_name,
                args,
                headers: &mut headers,
            };
            interceptor.before_send(&mut ctx).await?;
        }

        let url = format!("{}/{}/{}", self.base_url, router_name, func_name);
        tracing::debug!(url = %url, "Sending call");

        let response = self
            .http
            .post(&url)
            .headers(headers)
            .body(message.body)
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            if status == StatusCode::BAD_REQUEST {
                let body = response.bytes().await?;
                return Err(SeamError::Api(parse_error_envelope(&body)));
            }
            return Err(SeamError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("").to_string(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        let body = response.bytes().await?;

        let envelope = wire::decode_value(&content_type, body).await?;
        let result = match envelope {
            Value::Object(mut map) => map.remove("result").unwrap_or(Value::Null),
            other => {
                return Err(SeamError::Protocol(format!(
                    "result envelope is not an object: {:?}",
                    other
                )))
            }
        };

        for interceptor in &self.response_interceptors {
            let ctx = ResponseContext {
                router_name,
                func_name,
                args,
                status,
                result: &result,
            };
            interceptor.after_receive(&ctx).await?;
        }

        Ok(result)
    }
}

/// Pull the message out of a `{"error": …}` body, falling back to the raw
/// body text for anything that does not parse.
fn parse_error_envelope(body: &Bytes) -> String {
    serde_json::from_slice::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or_else(|| String::from_utf8_lossy(body).to_string())
}
