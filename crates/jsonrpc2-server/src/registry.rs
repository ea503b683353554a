use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::handler::MethodHandler;

/// Shared handle to a registered handler.
pub type SharedHandler = Arc<dyn MethodHandler>;

/// Method name to handler table.
///
/// Readers share the lock; a registration holds it exclusively for a single
/// map insert. The lock is never held across an `.await`, lookups clone the
/// `Arc` out and release it before the handler runs.
#[derive(Default)]
pub struct MethodRegistry {
    handlers: RwLock<HashMap<String, SharedHandler>>,
}

impl MethodRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `handler` under `method`, replacing any previous one.
    pub fn register<H>(&self, method: impl Into<String>, handler: H)
    where
        H: MethodHandler + 'static,
    {
        self.register_shared(method, Arc::new(handler));
    }

    /// Same as [`register`](Self::register) for a handler that is already
    /// shared, e.g. one handler serving several names.
    pub fn register_shared(&self, method: impl Into<String>, handler: SharedHandler) {
        let method = method.into();
        let replaced = self.handlers.write().insert(method.clone(), handler);
        debug!(method = %method, replaced = replaced.is_some(), "Registered method");
    }

    pub fn lookup(&self, method: &str) -> Option<SharedHandler> {
        self.handlers.read().get(method).cloned()
    }

    pub fn contains(&self, method: &str) -> bool {
        self.handlers.read().contains_key(method)
    }

    /// Registered method names, sorted.
    pub fn methods(&self) -> Vec<String> {
        let mut methods: Vec<String> = self.handlers.read().keys().cloned().collect();
        methods.sort();
        methods
    }

    pub fn len(&self) -> usize {
        self.handlers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.read().is_empty()
    }
}

impl std::fmt::Debug for MethodRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodRegistry")
            .field("methods", &self.methods())
            .finish()
    }
}
