//! Running plain wrappers inside a context aware chain.
//!
//! A [`PlainWrapper`] only knows how to wrap a [`PlainHandler`]. [`bridge`]
//! turns it into a [`Wrapper`]: on every request the downstream handler is
//! presented to the plain wrapper as a [`ContextProxy`], a plain handler that
//! forwards to the context aware one with the context of that very request.
//!
//! ```text
//!  ctx ──> BridgedHandler ──> plain wrapper ──> ContextProxy(ctx) ──> next(ctx)
//! ```
//!
//! The context is captured per request, not when the bridge is built, so the
//! same bridged wrapper can serve chains with different contexts.

use crate::context::Context;
use crate::handler::{Handler, HandlerResult, PlainHandler, Request, SharedHandler, SharedPlainHandler};
use crate::response::ResponseWriter;
use crate::wrapper::{PlainWrapper, Wrapper};
use std::fmt;
use std::sync::Arc;

/// Adapts `wrapper` so it can be part of a [`Chain`](crate::Chain).
pub fn bridge<W: PlainWrapper + 'static>(wrapper: W) -> Bridge<W> {
    Bridge { wrapper: Arc::new(wrapper) }
}

/// A [`Wrapper`] built from a [`PlainWrapper`], see [`bridge`].
pub struct Bridge<W> {
    wrapper: Arc<W>,
}

impl<W> Clone for Bridge<W> {
    fn clone(&self) -> Self {
        Self { wrapper: Arc::clone(&self.wrapper) }
    }
}

impl<W> fmt::Debug for Bridge<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bridge").finish_non_exhaustive()
    }
}

impl<W: PlainWrapper + 'static> Wrapper for Bridge<W> {
    fn wrap(&self, handler: SharedHandler) -> SharedHandler {
        Arc::new(BridgedHandler { wrapper: Arc::clone(&self.wrapper), next: handler })
    }
}

struct BridgedHandler<W> {
    wrapper: Arc<W>,
    next: SharedHandler,
}

impl<W: PlainWrapper> Handler for BridgedHandler<W> {
    fn serve(&self, ctx: &Context, writer: &mut dyn ResponseWriter, req: &Request) -> HandlerResult {
        let proxy: SharedPlainHandler = Arc::new(ContextProxy::new(ctx.clone(), Arc::clone(&self.next)));
        let plain = PlainWrapper::wrap(&*self.wrapper, proxy);
        PlainHandler::serve(&plain, writer, req)
    }
}

/// A plain handler serving a context aware handler with a fixed context.
pub struct ContextProxy {
    ctx: Context,
    next: SharedHandler,
}

impl ContextProxy {
    pub fn new(ctx: Context, next: SharedHandler) -> Self {
        Self { ctx, next }
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }
}

impl PlainHandler for ContextProxy {
    #[inline]
    fn serve(&self, writer: &mut dyn ResponseWriter, req: &Request) -> HandlerResult {
        self.next.serve(&self.ctx, writer, req)
    }
}

impl fmt::Debug for ContextProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextProxy").field("ctx", &self.ctx).finish_non_exhaustive()
    }
}
