use micro_chain::{
    Chain, ComposedHandler, Context, Handler, HandlerResult, PlainHandler, Request, ResponseWriter, SharedHandler,
    SharedWrapper, handler_fn,
};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Copy, Clone)]
pub struct TestCase {
    name: &'static str,
    group: TestGroup,
    depth: usize,
}

impl TestCase {
    pub fn new(name: &'static str, group: TestGroup, depth: usize) -> Self {
        Self { name, group, depth }
    }

    pub fn chained(name: &'static str, depth: usize) -> Self {
        Self::new(name, TestGroup::Chained, depth)
    }

    pub fn nested(name: &'static str, depth: usize) -> Self {
        Self::new(name, TestGroup::Nested, depth)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn group(&self) -> TestGroup {
        self.group
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Builds the handler under test: `depth` pass-through wrappers around an
    /// empty terminal, either applied by a [`Chain`] or nested by hand.
    pub fn subject(&self) -> Subject {
        let terminal: SharedHandler = Arc::new(handler_fn(empty_handler));
        match self.group {
            TestGroup::Chained => Subject::Chained(Chain::new((0..self.depth).map(|_| empty_wrapper())).end(terminal)),
            TestGroup::Nested => Subject::Nested {
                handler: (0..self.depth).fold(terminal, |handler, _| empty_nested(handler)),
                ctx: Context::background(),
            },
        }
    }
}

/// A handler under test, served the way its group would be served in practice.
pub enum Subject {
    Chained(ComposedHandler),
    Nested { handler: SharedHandler, ctx: Context },
}

impl Subject {
    pub fn serve(&self, writer: &mut dyn ResponseWriter, req: &Request) -> HandlerResult {
        match self {
            Subject::Chained(handler) => handler.serve(writer, req),
            Subject::Nested { handler, ctx } => handler.serve(ctx, writer, req),
        }
    }
}

impl fmt::Debug for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subject::Chained(handler) => f.debug_tuple("Chained").field(handler).finish(),
            Subject::Nested { ctx, .. } => f.debug_struct("Nested").field("ctx", ctx).finish_non_exhaustive(),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub enum TestGroup {
    Chained,
    Nested,
}

pub fn empty_nested(next: SharedHandler) -> SharedHandler {
    Arc::new(handler_fn(move |ctx, writer, req| next.serve(ctx, writer, req)))
}

pub fn empty_wrapper() -> SharedWrapper {
    Arc::new(empty_nested)
}

pub fn empty_handler(_ctx: &Context, _writer: &mut dyn ResponseWriter, _req: &Request) -> HandlerResult {
    Ok(())
}
