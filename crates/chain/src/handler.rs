//! Handler traits for both calling conventions and their closure adapters.
//!
//! A [`Handler`] is context aware: it receives the chain's [`Context`] next to
//! the response sink and the request. A [`PlainHandler`] only sees the sink and
//! the request, which is the shape most third-party decorators are written
//! against and the shape a finalized chain hands to the transport.

use crate::context::Context;
use crate::response::ResponseWriter;
use bytes::Bytes;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

/// The request value every handler receives.
pub type Request = http::Request<Bytes>;

/// Error produced by a handler, propagated untouched through the chain.
pub type HandlerError = Box<dyn Error + Send + Sync>;

pub type HandlerResult = Result<(), HandlerError>;

pub type SharedHandler = Arc<dyn Handler>;

pub type SharedPlainHandler = Arc<dyn PlainHandler>;

/// A bare terminal function, mainly useful to name an absent one:
/// `chain.end(None::<HandlerFn<ServeFn>>)`.
pub type ServeFn = fn(&Context, &mut dyn ResponseWriter, &Request) -> HandlerResult;

/// A context aware request handler.
pub trait Handler: Send + Sync {
    fn serve(&self, ctx: &Context, writer: &mut dyn ResponseWriter, req: &Request) -> HandlerResult;

    /// `true` for the capability-absent value (`None`), which a chain replaces
    /// with [`NoopHandler`] when it is used as the terminal handler.
    fn is_absent(&self) -> bool {
        false
    }
}

/// A request handler without access to the ambient context.
pub trait PlainHandler: Send + Sync {
    fn serve(&self, writer: &mut dyn ResponseWriter, req: &Request) -> HandlerResult;
}

impl<H: Handler + ?Sized> Handler for Arc<H> {
    #[inline]
    fn serve(&self, ctx: &Context, writer: &mut dyn ResponseWriter, req: &Request) -> HandlerResult {
        (**self).serve(ctx, writer, req)
    }

    fn is_absent(&self) -> bool {
        (**self).is_absent()
    }
}

impl<H: Handler + ?Sized> Handler for Box<H> {
    #[inline]
    fn serve(&self, ctx: &Context, writer: &mut dyn ResponseWriter, req: &Request) -> HandlerResult {
        (**self).serve(ctx, writer, req)
    }

    fn is_absent(&self) -> bool {
        (**self).is_absent()
    }
}

impl<H: Handler + ?Sized> Handler for &H {
    #[inline]
    fn serve(&self, ctx: &Context, writer: &mut dyn ResponseWriter, req: &Request) -> HandlerResult {
        (**self).serve(ctx, writer, req)
    }

    fn is_absent(&self) -> bool {
        (**self).is_absent()
    }
}

impl<H: Handler> Handler for Option<H> {
    fn serve(&self, ctx: &Context, writer: &mut dyn ResponseWriter, req: &Request) -> HandlerResult {
        match self {
            Some(handler) => handler.serve(ctx, writer, req),
            None => Handler::serve(&NoopHandler, ctx, writer, req),
        }
    }

    fn is_absent(&self) -> bool {
        self.as_ref().is_none_or(Handler::is_absent)
    }
}

impl<H: PlainHandler + ?Sized> PlainHandler for Arc<H> {
    #[inline]
    fn serve(&self, writer: &mut dyn ResponseWriter, req: &Request) -> HandlerResult {
        (**self).serve(writer, req)
    }
}

impl<H: PlainHandler + ?Sized> PlainHandler for Box<H> {
    #[inline]
    fn serve(&self, writer: &mut dyn ResponseWriter, req: &Request) -> HandlerResult {
        (**self).serve(writer, req)
    }
}

impl<H: PlainHandler + ?Sized> PlainHandler for &H {
    #[inline]
    fn serve(&self, writer: &mut dyn ResponseWriter, req: &Request) -> HandlerResult {
        (**self).serve(writer, req)
    }
}

impl<H: PlainHandler> PlainHandler for Option<H> {
    fn serve(&self, writer: &mut dyn ResponseWriter, req: &Request) -> HandlerResult {
        match self {
            Some(handler) => handler.serve(writer, req),
            None => PlainHandler::serve(&NoopHandler, writer, req),
        }
    }
}

/// Does nothing and always succeeds, the terminal of a chain ended with `None`.
#[derive(Debug, Default, Copy, Clone)]
pub struct NoopHandler;

impl Handler for NoopHandler {
    #[inline]
    fn serve(&self, _ctx: &Context, _writer: &mut dyn ResponseWriter, _req: &Request) -> HandlerResult {
        Ok(())
    }
}

impl PlainHandler for NoopHandler {
    #[inline]
    fn serve(&self, _writer: &mut dyn ResponseWriter, _req: &Request) -> HandlerResult {
        Ok(())
    }
}

/// a closure holder which represents a context aware [`Handler`]
#[derive(Copy, Clone)]
pub struct HandlerFn<F> {
    f: F,
}

impl<F> HandlerFn<F>
where
    F: Fn(&Context, &mut dyn ResponseWriter, &Request) -> HandlerResult,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

pub fn handler_fn<F>(f: F) -> HandlerFn<F>
where
    F: Fn(&Context, &mut dyn ResponseWriter, &Request) -> HandlerResult,
{
    HandlerFn::new(f)
}

impl<F> Handler for HandlerFn<F>
where
    F: Fn(&Context, &mut dyn ResponseWriter, &Request) -> HandlerResult + Send + Sync,
{
    #[inline]
    fn serve(&self, ctx: &Context, writer: &mut dyn ResponseWriter, req: &Request) -> HandlerResult {
        (self.f)(ctx, writer, req)
    }
}

impl<F> fmt::Debug for HandlerFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerFn").finish_non_exhaustive()
    }
}

/// a closure holder which represents a [`PlainHandler`]
#[derive(Copy, Clone)]
pub struct PlainHandlerFn<F> {
    f: F,
}

impl<F> PlainHandlerFn<F>
where
    F: Fn(&mut dyn ResponseWriter, &Request) -> HandlerResult,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

pub fn plain_handler_fn<F>(f: F) -> PlainHandlerFn<F>
where
    F: Fn(&mut dyn ResponseWriter, &Request) -> HandlerResult,
{
    PlainHandlerFn::new(f)
}

impl<F> PlainHandler for PlainHandlerFn<F>
where
    F: Fn(&mut dyn ResponseWriter, &Request) -> HandlerResult + Send + Sync,
{
    #[inline]
    fn serve(&self, writer: &mut dyn ResponseWriter, req: &Request) -> HandlerResult {
        (self.f)(writer, req)
    }
}

impl<F> fmt::Debug for PlainHandlerFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlainHandlerFn").finish_non_exhaustive()
    }
}
