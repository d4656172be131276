//! Passing data back up the chain.
//!
//! [`Context`] values only travel downstream: a handler that derives a new
//! context with [`Context::with_value`] hands it to its inner handler, and the
//! wrappers around it never see the change. When code running after the
//! downstream call needs results produced further in, put a [`ScratchWrapper`]
//! in front of it. For every request it creates a fresh [`Scratch`], a typed
//! map owned by that request, and makes it reachable from the context:
//!
//! ```text
//! scratch() ──> auth ──> terminal          terminal: Scratch::from_context(ctx)?.insert(UserId(7))
//!    │                                     auth (after next returns): sees UserId(7)
//!    └─ on_complete(scratch, ..)           hook: sees UserId(7)
//! ```
//!
//! A scratch is never shared between requests, each call through the wrapper
//! starts with an empty one.

use crate::context::Context;
use crate::handler::{Handler, HandlerResult, Request, SharedHandler};
use crate::response::ResponseWriter;
use crate::wrapper::Wrapper;
use arc_swap::ArcSwap;
use http::Extensions;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// Request-scoped mutable values, keyed by type.
///
/// Cloning a scratch yields another handle to the same map.
#[derive(Clone)]
pub struct Scratch {
    values: Arc<ArcSwap<Extensions>>,
}

impl Scratch {
    pub fn new() -> Self {
        Self { values: Arc::new(ArcSwap::from_pointee(Extensions::new())) }
    }

    /// The scratch installed by an upstream [`ScratchWrapper`], if any.
    pub fn from_context(ctx: &Context) -> Option<Self> {
        ctx.get::<Self>().cloned()
    }

    /// Inserts `value`, returning the previous value of the same type.
    pub fn insert<T>(&self, value: T) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        let previous = self.values.rcu(|current| {
            let mut next = Extensions::clone(current);
            next.insert(value.clone());
            next
        });
        previous.get::<T>().cloned()
    }

    pub fn get<T>(&self) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.values.load().get::<T>().cloned()
    }

    pub fn contains<T: Send + Sync + 'static>(&self) -> bool {
        self.values.load().get::<T>().is_some()
    }

    pub fn remove<T>(&self) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        let previous = self.values.rcu(|current| {
            let mut next = Extensions::clone(current);
            next.remove::<T>();
            next
        });
        previous.get::<T>().cloned()
    }

    pub fn len(&self) -> usize {
        self.values.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.load().is_empty()
    }
}

impl Default for Scratch {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Scratch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scratch").field("len", &self.len()).finish()
    }
}

type CompleteHook = dyn Fn(&Scratch, &mut dyn ResponseWriter, &Request) -> HandlerResult + Send + Sync;

/// Creates a [`ScratchWrapper`]
pub fn scratch() -> ScratchWrapper {
    ScratchWrapper::default()
}

/// Installs a fresh [`Scratch`] into the context of every request.
#[derive(Clone, Default)]
pub struct ScratchWrapper {
    on_complete: Option<Arc<CompleteHook>>,
}

impl ScratchWrapper {
    /// Runs `f` with the request's scratch once the downstream handler returned
    /// successfully.
    #[must_use]
    pub fn on_complete<F>(self, f: F) -> Self
    where
        F: Fn(&Scratch, &mut dyn ResponseWriter, &Request) -> HandlerResult + Send + Sync + 'static,
    {
        Self { on_complete: Some(Arc::new(f)) }
    }
}

impl fmt::Debug for ScratchWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScratchWrapper").field("on_complete", &self.on_complete.is_some()).finish()
    }
}

impl Wrapper for ScratchWrapper {
    fn wrap(&self, handler: SharedHandler) -> SharedHandler {
        Arc::new(ScratchHandler { next: handler, on_complete: self.on_complete.clone() })
    }
}

struct ScratchHandler {
    next: SharedHandler,
    on_complete: Option<Arc<CompleteHook>>,
}

impl Handler for ScratchHandler {
    fn serve(&self, ctx: &Context, writer: &mut dyn ResponseWriter, req: &Request) -> HandlerResult {
        let scratch = Scratch::new();
        let ctx = ctx.with_value(scratch.clone());

        self.next.serve(&ctx, writer, req)?;

        if let Some(on_complete) = &self.on_complete {
            trace!(values = scratch.len(), "running scratch completion hook");
            on_complete(&scratch, writer, req)?;
        }
        Ok(())
    }
}
