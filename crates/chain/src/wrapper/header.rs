//! Static response headers.
//!
//! The header is inserted before the downstream handler runs, so an inner
//! handler can still overwrite it.

use crate::context::Context;
use crate::handler::{Handler, HandlerResult, Request, SharedHandler};
use crate::response::ResponseWriter;
use crate::wrapper::Wrapper;
use http::{HeaderName, HeaderValue};
use std::sync::Arc;

/// Creates a [`SetHeaderWrapper`] inserting `name: value` into every response.
pub fn set_header(name: HeaderName, value: HeaderValue) -> SetHeaderWrapper {
    SetHeaderWrapper { name, value }
}

#[derive(Debug, Clone)]
pub struct SetHeaderWrapper {
    name: HeaderName,
    value: HeaderValue,
}

struct SetHeaderHandler {
    name: HeaderName,
    value: HeaderValue,
    handler: SharedHandler,
}

impl Wrapper for SetHeaderWrapper {
    fn wrap(&self, handler: SharedHandler) -> SharedHandler {
        Arc::new(SetHeaderHandler { name: self.name.clone(), value: self.value.clone(), handler })
    }
}

impl Handler for SetHeaderHandler {
    fn serve(&self, ctx: &Context, writer: &mut dyn ResponseWriter, req: &Request) -> HandlerResult {
        writer.headers_mut().insert(self.name.clone(), self.value.clone());
        self.handler.serve(ctx, writer, req)
    }
}
