//! Error observation hooks.
//!
//! The dispatcher reports two kinds of failure to registered observers:
//! `apiError` (a handler rejected the call) and `internalError` (framing
//! a successful result failed). Zero or more observers may be registered;
//! call order is unspecified, and a panicking observer is caught and
//! logged so it can never abort the response already being written.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use axum::http::{HeaderMap, Method, Uri};

use crate::error::{HandlerError, SeamError};

/// Call coordinates delivered alongside every error notification.
#[derive(Debug, Clone)]
pub struct ErrorContext {
    /// Mount path of the router table, e.g. `/users`.
    pub router_path: String,
    /// Name of the invoked function.
    pub function_name: String,
    /// HTTP method of the inbound request.
    pub method: Method,
    /// URI of the inbound request.
    pub uri: Uri,
    /// Headers of the inbound request.
    pub headers: HeaderMap,
}

/// Observer interface for dispatcher failures.
///
/// Both methods default to no-ops so an observer can implement only the
/// event it cares about.
pub trait ErrorObserver: Send + Sync {
    /// A handler rejected a call. The response (handler-rejected status,
    /// `{"error": …}` body) is written after all observers ran.
    fn on_api_error(&self, _error: &HandlerError, _ctx: &ErrorContext) {}

    /// Framing a successful result failed. Indicates a framework-level
    /// defect, not a business-logic rejection.
    fn on_internal_error(&self, _error: &SeamError, _ctx: &ErrorContext) {}
}

/// The set of registered observers, shared read-only by the dispatcher.
#[derive(Clone, Default)]
pub(crate) struct ObserverSet {
    observers: Vec<Arc<dyn ErrorObserver>>,
}

impl ObserverSet {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, observer: Arc<dyn ErrorObserver>) {
        self.observers.push(observer);
    }

    pub(crate) fn notify_api_error(&self, error: &HandlerError, ctx: &ErrorContext) {
        for observer in &self.observers {
            if catch_unwind(AssertUnwindSafe(|| observer.on_api_error(error, ctx))).is_err() {
                tracing::warn!(func = %ctx.function_name, "apiError observer panicked");
            }
        }
    }

    pub(crate) fn notify_internal_error(&self, error: &SeamError, ctx: &ErrorContext) {
        for observer in &self.observers {
            if catch_unwind(AssertUnwindSafe(|| observer.on_internal_error(error, ctx))).is_err() {
                tracing::warn!(func = %ctx.function_name, "internalError observer panicked");
            }
        }
    }
}
