//! The ambient value a chain threads through every handler of a request.
//!
//! A [`Context`] is immutable: [`Context::with_value`] returns a new context
//! and leaves the receiver untouched, so a value added by a downstream handler
//! is never seen by the code that called it. Use [`Scratch`](crate::Scratch)
//! when data has to travel back up the chain.

use http::Extensions;
use triomphe::Arc;

/// Typed, immutable request-scoped values.
///
/// Values are keyed by their type, at most one value per type. Cloning a
/// context is a reference count bump.
#[derive(Debug, Clone)]
pub struct Context {
    values: Arc<Extensions>,
}

impl Context {
    /// An empty context, used when a chain is finalized without one.
    pub fn background() -> Self {
        Self { values: Arc::new(Extensions::new()) }
    }

    /// Returns a new context holding every value of `self` plus `value`,
    /// replacing any previous value of the same type.
    #[must_use]
    pub fn with_value<T>(&self, value: T) -> Self
    where
        T: Clone + Send + Sync + 'static,
    {
        let mut values = Extensions::clone(&self.values);
        values.insert(value);
        Self { values: Arc::new(values) }
    }

    pub fn get<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.values.get::<T>()
    }

    pub fn contains<T: Send + Sync + 'static>(&self) -> bool {
        self.get::<T>().is_some()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::background()
    }
}
