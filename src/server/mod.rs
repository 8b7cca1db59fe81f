//! Server dispatcher.
//!
//! [`SeamSpace`] binds named router tables to a single inbound endpoint,
//! `POST /{router}/{func}`. Per inbound call the dispatcher runs one pass:
//! lookup, content negotiation, body parse, argument reconstruction,
//! handler invocation, result framing. Each call is an independent task;
//! the only shared state is the read-only routing configuration.
//!
//! # Example
//!
//! ```ignore
//! use seam_rpc::{HandlerError, RouterTable, SeamSpace, Value};
//!
//! #[tokio::main]
//! async fn main() {
//!     let space = SeamSpace::new().router(
//!         RouterTable::new("users")
//!             .function("getUsers", |_args, _ctx| async {
//!                 Ok(Value::Array(vec![Value::from("john")]))
//!             })
//!             .function("createUser", |args, _ctx| async move {
//!                 let name = args
//!                     .first()
//!                     .and_then(Value::as_str)
//!                     .ok_or_else(|| HandlerError::msg("name required"))?;
//!                 Ok(Value::from(format!("created {}", name)))
//!             }),
//!     );
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
//!     axum::serve(listener, space.into_router()).await.unwrap();
//! }
//! ```

mod context;
mod events;
mod registry;

pub use context::CallContext;
pub use events::{ErrorContext, ErrorObserver};
pub use registry::{BoxFuture, Handler, HandlerResult, RouterTable};

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Path as UrlPath, State};
use axum::http::{header, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use bytes::Bytes;

use crate::value::Value;
use crate::wire;

use events::ObserverSet;

/// Default cap on inbound body size (32 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 32 * 1024 * 1024;

/// The server-side registration surface: a set of router tables plus
/// error observers, convertible into an [`axum::Router`].
pub struct SeamSpace {
    routers: HashMap<String, RouterTable>,
    observers: ObserverSet,
    max_body_bytes: usize,
}

impl SeamSpace {
    /// Create an empty space.
    pub fn new() -> Self {
        Self {
            routers: HashMap::new(),
            observers: ObserverSet::new(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    /// Register a router table under its name.
    ///
    /// A table registered under an already-used name replaces the earlier
    /// one.
    pub fn router(mut self, table: RouterTable) -> Self {
        self.routers.insert(table.name().to_string(), table);
        self
    }

    /// Register an error observer. Observers receive `apiError` and
    /// `internalError` notifications for every failed call.
    pub fn observer(mut self, observer: impl ErrorObserver + 'static) -> Self {
        self.observers.push(Arc::new(observer));
        self
    }

    /// Cap inbound request bodies at `limit` bytes.
    ///
    /// Default: [`DEFAULT_MAX_BODY_BYTES`].
    pub fn max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = limit;
        self
    }

    /// Finalize registration and produce the axum router with the single
    /// dispatch route. Routing state is read-only from here on.
    pub fn into_router(self) -> axum::Router {
        let shared = Arc::new(Shared {
            routers: self.routers,
            observers: self.observers,
            max_body_bytes: self.max_body_bytes,
        });

        axum::Router::new()
            .route("/{router}/{func}", post(dispatch))
            .with_state(shared)
    }
}

impl Default for SeamSpace {
    fn default() -> Self {
        Self::new()
    }
}

struct Shared {
    routers: HashMap<String, RouterTable>,
    observers: ObserverSet,
    max_body_bytes: usize,
}

async fn dispatch(
    State(shared): State<Arc<Shared>>,
    UrlPath((router_name, func_name)): UrlPath<(String, String)>,
    request: Request<Body>,
) -> Response {
    // 1. Lookup: unknown router or function means 404, empty body.
    let Some(table) = shared.routers.get(&router_name) else {
        tracing::debug!(router = %router_name, "Unknown router");
        return StatusCode::NOT_FOUND.into_response();
    };
    let Some(handler) = table.get(&func_name) else {
        tracing::debug!(router = %router_name, func = %func_name, "Unknown function");
        return StatusCode::NOT_FOUND.into_response();
    };

    // 2. Negotiate content type.
    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    if !content_type.starts_with(wire::CONTENT_TYPE_JSON)
        && !content_type.starts_with(wire::MULTIPART_PREFIX)
    {
        return (StatusCode::UNSUPPORTED_MEDIA_TYPE, "Unsupported content type").into_response();
    }

    let (parts, body) = request.into_parts();
    let error_ctx = ErrorContext {
        router_path: table.path(),
        function_name: func_name.clone(),
        method: parts.method.clone(),
        uri: parts.uri.clone(),
        headers: parts.headers.clone(),
    };

    // 3. Parse the body. Collection enforces the size limit and cleans up
    // after itself whether or not it succeeds.
    let bytes = match axum::body::to_bytes(body, shared.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, &e.to_string()),
    };

    // 4. Reconstruct the argument list.
    let envelope = match wire::decode_value(&content_type, bytes).await {
        Ok(envelope) => envelope,
        Err(e) => {
            tracing::debug!(error = %e, "Failed to decode call body");
            return error_response(StatusCode::BAD_REQUEST, &e.to_string());
        }
    };
    let args = match envelope {
        Value::Array(items) => items,
        _ => return error_response(StatusCode::BAD_REQUEST, "arguments must be an array"),
    };

    // 5. Invoke the handler.
    let ctx = CallContext::new(table.path(), &func_name, &parts);
    match handler.call(args, ctx).await {
        // 6. Handler rejection: observable event, then the dedicated
        // handler-rejected status with the stringified error.
        Err(error) => {
            tracing::debug!(func = %func_name, error = %error, "Handler rejected call");
            shared.observers.notify_api_error(&error, &error_ctx);
            error_response(StatusCode::BAD_REQUEST, error.message())
        }
        // 7. Success: frame `{result}` as JSON or multipart.
        Ok(result) => {
            let envelope = Value::Object(BTreeMap::from([("result".to_string(), result)]));
            match wire::encode(&envelope) {
                Ok(message) => success_response(message.content_type, message.body),
                // 8. Post-success encoding failure is a framework fault,
                // distinct from a business-logic rejection.
                Err(error) => {
                    tracing::error!(func = %func_name, error = %error, "Failed to encode result");
                    shared.observers.notify_internal_error(&error, &error_ctx);
                    error_response(StatusCode::INTERNAL_SERVER_ERROR, &error.to_string())
                }
            }
        }
    }
}

fn success_response(content_type: String, body: Bytes) -> Response {
    ([(header::CONTENT_TYPE, content_type)], body).into_response()
}

fn error_response(status: StatusCode, message: &str) -> Response {
    let body = serde_json::json!({ "error": message }).to_string();
    (
        status,
        [(header::CONTENT_TYPE, wire::CONTENT_TYPE_JSON)],
        body,
    )
        .into_response()
}
