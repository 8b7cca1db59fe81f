//! # seam-rpc
//!
//! RPC over HTTP with transparent binary attachments.
//!
//! A client issues a named call (router name, function name, ordered
//! argument list) against a server, which dispatches it to a registered
//! handler and returns a result or a structured error. Arguments and
//! results are [`Value`] trees that may carry raw binary [`Attachment`]s
//! at any position; the marshaling layer moves them losslessly over a
//! transport that natively speaks either pure JSON or pure multipart,
//! never a mix.
//!
//! ## Architecture
//!
//! - **[`codec`]**: splits a value into a JSON-safe skeleton plus an
//!   ordered `(path, attachment)` list, and reassembles it.
//! - **[`wire`]**: picks JSON vs. multipart framing and produces/parses
//!   the bytes, including the `json` / `paths` / `file-{i}` part scheme.
//! - **[`client`]**: builds calls, runs interceptor chains, performs the
//!   exchange, raises typed errors.
//! - **[`server`]**: binds router tables to `POST /{router}/{func}`,
//!   reconstructs arguments, invokes handlers, reports failures to
//!   error observers.
//!
//! ## Example
//!
//! ```ignore
//! use seam_rpc::{Attachment, RouterTable, SeamClient, SeamSpace, Value};
//!
//! let space = SeamSpace::new().router(
//!     RouterTable::new("users").function("createUser", |args, _ctx| async move {
//!         Ok(Value::from(format!("created {:?}", args.first())))
//!     }),
//! );
//! // axum::serve(listener, space.into_router()) ...
//!
//! let client = SeamClient::builder("http://localhost:3000").build();
//! // client.call("users", "createUser", vec![
//! //     Value::from("john"),
//! //     Value::from(Attachment::new(avatar_bytes)),
//! // ]).await?;
//! ```

pub mod client;
pub mod codec;
pub mod error;
pub mod server;
pub mod value;
pub mod wire;

pub use client::{ClientBuilder, RequestInterceptor, ResponseInterceptor, SeamClient};
pub use error::{HandlerError, Result, SeamError};
pub use server::{CallContext, ErrorContext, ErrorObserver, RouterTable, SeamSpace};
pub use value::{Attachment, Path, PathSegment, Value};
