//! Router tables: named sets of async call handlers.
//!
//! A [`RouterTable`] maps function names to handlers with a fixed
//! polymorphic signature (positional [`Value`] arguments plus a
//! [`CallContext`], returning an async result). Membership is validated
//! by the dispatcher before invocation.
//!
//! # Example
//!
//! ```
//! use seam_rpc::{HandlerError, RouterTable, Value};
//!
//! let table = RouterTable::new("users")
//!     .function("getUsers", |_args, _ctx| async { Ok(Value::Array(vec![])) })
//!     .function("createUser", |args: Vec<Value>, _ctx| async move {
//!         args.first()
//!             .and_then(Value::as_str)
//!             .map(Value::from)
//!             .ok_or_else(|| HandlerError::msg("name required"))
//!     });
//!
//! assert!(table.contains("getUsers"));
//! assert!(!table.contains("missingFn"));
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::HandlerError;
use crate::value::Value;

use super::context::CallContext;

/// Result type for handler functions: a result [`Value`] on success, a
/// rejection message on failure.
pub type HandlerResult = std::result::Result<Value, HandlerError>;

/// Boxed future for handler results.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Trait for call handlers.
///
/// Implemented automatically for async closures taking
/// `(Vec<Value>, CallContext)`.
pub trait Handler: Send + Sync + 'static {
    /// Handle one call with its reconstructed positional arguments.
    fn call(&self, args: Vec<Value>, ctx: CallContext) -> BoxFuture<'static, HandlerResult>;
}

impl<F, Fut> Handler for F
where
    F: Fn(Vec<Value>, CallContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn call(&self, args: Vec<Value>, ctx: CallContext) -> BoxFuture<'static, HandlerResult> {
        Box::pin(self(args, ctx))
    }
}

/// A named table of call handlers, bound as one routing unit.
pub struct RouterTable {
    name: String,
    functions: HashMap<String, Arc<dyn Handler>>,
}

impl RouterTable {
    /// Create an empty table. `name` is the path segment calls address
    /// the table by; a leading slash is tolerated and stripped.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            name: name.trim_matches('/').to_string(),
            functions: HashMap::new(),
        }
    }

    /// Register a handler under `func_name`.
    pub fn function(mut self, func_name: &str, handler: impl Handler) -> Self {
        self.functions.insert(func_name.to_string(), Arc::new(handler));
        self
    }

    /// The table's name (no slashes).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The mount path the table answers under, e.g. `/users`.
    pub fn path(&self) -> String {
        format!("/{}", self.name)
    }

    /// Whether a function is registered.
    pub fn contains(&self, func_name: &str) -> bool {
        self.functions.contains_key(func_name)
    }

    /// Names of all registered functions, in no particular order.
    pub fn function_names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }

    pub(crate) fn get(&self, func_name: &str) -> Option<Arc<dyn Handler>> {
        self.functions.get(func_name).cloned()
    }
}
