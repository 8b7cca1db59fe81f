//! Request context injected into handlers.

use axum::http::{request::Parts, HeaderMap, Method, Uri};

/// Context passed to each handler as the trailing parameter.
///
/// Carries the routing coordinates of the call plus the request head, so
/// handlers can read headers (auth tokens, trace IDs) without the
/// dispatcher having to understand them.
#[derive(Debug, Clone)]
pub struct CallContext {
    router_path: String,
    function_name: String,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
}

impl CallContext {
    pub(crate) fn new(router_path: impl Into<String>, function_name: &str, parts: &Parts) -> Self {
        Self {
            router_path: router_path.into(),
            function_name: function_name.to_string(),
            method: parts.method.clone(),
            uri: parts.uri.clone(),
            headers: parts.headers.clone(),
        }
    }

    /// Context with an empty request head, for exercising handlers
    /// directly in tests.
    pub fn for_tests(router_path: &str, function_name: &str) -> Self {
        Self {
            router_path: router_path.to_string(),
            function_name: function_name.to_string(),
            method: Method::POST,
            uri: Uri::default(),
            headers: HeaderMap::new(),
        }
    }

    /// Mount path of the router table the call addressed, e.g. `/users`.
    pub fn router_path(&self) -> &str {
        &self.router_path
    }

    /// Name of the invoked function.
    pub fn function_name(&self) -> &str {
        &self.function_name
    }

    /// HTTP method of the inbound request.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// URI of the inbound request.
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Headers of the inbound request.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}
