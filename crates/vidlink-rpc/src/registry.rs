//! Name-keyed registry of executable operations.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use futures_core::future::BoxFuture;
use serde_json::Value;

/// Outcome of one operation: a success value or an error value, both of
/// which travel the wire verbatim.
pub type OpOutcome = std::result::Result<Value, Value>;

/// An executable remote operation.
///
/// Operations receive the call's positional arguments and eventually yield
/// exactly one outcome. Argument validation is the operation's own business;
/// the dispatcher only routes.
pub trait Operation: Send + Sync {
    fn invoke(&self, args: Vec<Value>) -> BoxFuture<'static, OpOutcome>;
}

struct FnOperation<F> {
    f: F,
}

impl<F, Fut> Operation for FnOperation<F>
where
    F: Fn(Vec<Value>) -> Fut + Send + Sync,
    Fut: Future<Output = OpOutcome> + Send + 'static,
{
    fn invoke(&self, args: Vec<Value>) -> BoxFuture<'static, OpOutcome> {
        Box::pin((self.f)(args))
    }
}

/// Name-keyed registry of operations a worker serves.
#[derive(Default)]
pub struct OperationRegistry {
    ops: HashMap<String, Arc<dyn Operation>>,
}

impl OperationRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an operation under a name. Re-registering a name replaces
    /// the previous operation.
    pub fn register(&mut self, name: impl Into<String>, op: Arc<dyn Operation>) {
        let name = name.into();
        if self.ops.insert(name.clone(), op).is_some() {
            tracing::debug!(%name, "replaced previously registered operation");
        }
    }

    /// Register an async closure under a name.
    pub fn register_fn<F, Fut>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = OpOutcome> + Send + 'static,
    {
        self.register(name, Arc::new(FnOperation { f }));
    }

    /// Look up an operation by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Operation>> {
        self.ops.get(name).cloned()
    }

    /// Check if a name has a registered operation.
    pub fn contains(&self, name: &str) -> bool {
        self.ops.contains_key(name)
    }

    /// Get registered operation names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.ops.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

impl std::fmt::Debug for OperationRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationRegistry")
            .field("names", &self.names())
            .finish()
    }
}
