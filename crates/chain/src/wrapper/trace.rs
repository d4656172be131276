//! Request tracing for a chain.
//!
//! [`TraceWrapper`] opens an `info` span carrying the request method and uri
//! around everything downstream of it, so events emitted by inner wrappers and
//! the terminal handler are attributed to the request. Failures are logged and
//! then returned unchanged.

use crate::context::Context;
use crate::handler::{Handler, HandlerResult, Request, SharedHandler};
use crate::response::ResponseWriter;
use crate::wrapper::Wrapper;
use std::sync::Arc;
use tracing::{debug, info_span, warn};

/// Creates a [`TraceWrapper`]
pub fn trace() -> TraceWrapper {
    TraceWrapper
}

/// A wrapper that traces each request passing through it.
#[derive(Debug, Default, Copy, Clone)]
pub struct TraceWrapper;

/// The handler produced by [`TraceWrapper`].
struct TraceHandler {
    handler: SharedHandler,
}

impl Wrapper for TraceWrapper {
    fn wrap(&self, handler: SharedHandler) -> SharedHandler {
        Arc::new(TraceHandler { handler })
    }
}

impl Handler for TraceHandler {
    fn serve(&self, ctx: &Context, writer: &mut dyn ResponseWriter, req: &Request) -> HandlerResult {
        let span = info_span!("request", method = %req.method(), uri = %req.uri());
        let _enter = span.enter();

        match self.handler.serve(ctx, writer, req) {
            Ok(()) => {
                debug!(status = ?writer.status(), "request served");
                Ok(())
            }
            Err(e) => {
                warn!(cause = %e, "request failed");
                Err(e)
            }
        }
    }
}
