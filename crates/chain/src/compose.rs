//! Ordered wrapper chains and their finalization.
//!
//! A [`Chain`] never changes once built. [`append`](Chain::append),
//! [`merge`](Chain::merge) and [`set_context`](Chain::set_context) all return
//! a new chain, and the wrapper sequence lives in an exactly sized shared
//! slice, so chains derived from the same base never observe each other.
//!
//! [`end`](Chain::end) applies the wrappers around a terminal handler, the
//! first wrapper of the sequence ending up outermost:
//!
//! ```text
//! Chain [W0, W1, W2] + T  =>  W0(W1(W2(T)))
//!
//! request  -> W0 -> W1 -> W2 -> T
//! response <- W0 <- W1 <- W2 <-
//! ```

use crate::context::Context;
use crate::handler::{
    Handler, HandlerFn, HandlerResult, NoopHandler, PlainHandler, Request, SharedHandler, handler_fn,
};
use crate::response::ResponseWriter;
use crate::wrapper::{SharedWrapper, Wrapper};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// Builds a [`Chain`] from wrapper values, in order.
///
/// ```
/// use micro_chain::{chain, trace, IdentityWrapper};
///
/// let chain = chain![trace(), IdentityWrapper];
/// assert_eq!(chain.len(), 2);
/// ```
#[macro_export]
macro_rules! chain {
    () => {
        $crate::Chain::empty()
    };
    ($($wrapper:expr),+ $(,)?) => {
        $crate::Chain::new([$(::std::sync::Arc::new($wrapper) as $crate::SharedWrapper),+])
    };
}

/// An ordered sequence of wrappers plus an optional ambient context.
#[derive(Clone)]
pub struct Chain {
    context: Option<Context>,
    wrappers: Arc<[SharedWrapper]>,
}

impl Chain {
    /// Creates a chain holding exactly `wrappers`, in order.
    pub fn new<I>(wrappers: I) -> Self
    where
        I: IntoIterator<Item = SharedWrapper>,
    {
        Self { context: None, wrappers: wrappers.into_iter().collect() }
    }

    /// A chain without wrappers, finalizing it yields the terminal handler itself.
    pub fn empty() -> Self {
        Self { context: None, wrappers: Arc::new([]) }
    }

    /// Returns a new chain with `wrappers` after the receiver's wrappers.
    #[must_use]
    pub fn append<I>(&self, wrappers: I) -> Self
    where
        I: IntoIterator<Item = SharedWrapper>,
    {
        let wrappers = self.wrappers.iter().map(Arc::clone).chain(wrappers).collect();
        Self { context: self.context.clone(), wrappers }
    }

    /// Returns a new chain with a single `wrapper` after the receiver's wrappers.
    #[must_use]
    pub fn wrap<W: Wrapper + 'static>(&self, wrapper: W) -> Self {
        self.append([Arc::new(wrapper) as SharedWrapper])
    }

    /// Returns a new chain with the wrappers of every chain in `chains`
    /// after the receiver's wrappers, in argument order.
    ///
    /// Only wrappers are merged: the receiver's context is kept, the contexts
    /// of `chains` are ignored.
    #[must_use]
    pub fn merge<'a, I>(&self, chains: I) -> Self
    where
        I: IntoIterator<Item = &'a Chain>,
    {
        let wrappers = self
            .wrappers
            .iter()
            .chain(chains.into_iter().flat_map(|chain| chain.wrappers.iter()))
            .map(Arc::clone)
            .collect();
        Self { context: self.context.clone(), wrappers }
    }

    /// Returns a new chain whose ambient context is `ctx`.
    #[must_use]
    pub fn set_context(&self, ctx: Context) -> Self {
        Self { context: Some(ctx), wrappers: Arc::clone(&self.wrappers) }
    }

    pub fn context(&self) -> Option<&Context> {
        self.context.as_ref()
    }

    pub fn len(&self) -> usize {
        self.wrappers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wrappers.is_empty()
    }

    /// Applies every wrapper around `terminal` and returns the composed handler.
    ///
    /// An absent terminal (`None`) is replaced by [`NoopHandler`]. The chain is
    /// left untouched and can be finalized again.
    pub fn end<H: Handler + 'static>(&self, terminal: H) -> ComposedHandler {
        let terminal: SharedHandler = if terminal.is_absent() {
            trace!("terminal handler absent, using no-op handler");
            Arc::new(NoopHandler)
        } else {
            Arc::new(terminal)
        };

        let handler = self.wrappers.iter().rev().fold(terminal, |handler, wrapper| wrapper.wrap(handler));

        debug!(wrappers = self.wrappers.len(), has_context = self.context.is_some(), "chain finalized");
        ComposedHandler { context: self.context.clone().unwrap_or_default(), handler }
    }

    /// Same as [`end`](Chain::end) with a bare function as the terminal handler.
    pub fn end_fn<F>(&self, f: F) -> ComposedHandler
    where
        F: Fn(&Context, &mut dyn ResponseWriter, &Request) -> HandlerResult + Send + Sync + 'static,
    {
        self.end(handler_fn(f))
    }

    /// Same as [`end_fn`](Chain::end_fn), `None` behaves like an absent handler.
    pub fn end_fn_opt<F>(&self, f: Option<F>) -> ComposedHandler
    where
        F: Fn(&Context, &mut dyn ResponseWriter, &Request) -> HandlerResult + Send + Sync + 'static,
    {
        self.end(f.map(HandlerFn::new))
    }
}

impl Default for Chain {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain").field("context", &self.context).field("wrappers", &self.wrappers.len()).finish()
    }
}

/// A finalized chain, ready to be handed to a transport.
///
/// Serving it as a [`PlainHandler`] uses the context the chain carried when it
/// was finalized.
#[derive(Clone)]
pub struct ComposedHandler {
    context: Context,
    handler: SharedHandler,
}

impl ComposedHandler {
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Serves the request with `ctx` instead of the context fixed at finalization.
    pub fn serve_with_context(&self, ctx: &Context, writer: &mut dyn ResponseWriter, req: &Request) -> HandlerResult {
        self.handler.serve(ctx, writer, req)
    }
}

impl PlainHandler for ComposedHandler {
    fn serve(&self, writer: &mut dyn ResponseWriter, req: &Request) -> HandlerResult {
        self.handler.serve(&self.context, writer, req)
    }
}

impl fmt::Debug for ComposedHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComposedHandler").field("context", &self.context).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::{Chain, ComposedHandler};
    use crate::context::Context;
    use crate::handler::{
        Handler, HandlerFn, HandlerResult, NoopHandler, PlainHandler, Request, ServeFn, SharedHandler, handler_fn,
    };
    use crate::response::{BufferedResponse, MockResponseWriter, ResponseWriter};
    use crate::wrapper::SharedWrapper;
    use bytes::Bytes;
    use std::sync::{Arc, Mutex};

    const B0: &str = "0";
    const B1: &str = "1";
    const B_END: &str = "END";

    fn nested(tag: &'static str) -> SharedWrapper {
        Arc::new(move |next: SharedHandler| -> SharedHandler {
            Arc::new(handler_fn(move |ctx, writer, req| {
                writer.write(tag.as_bytes())?;
                next.serve(ctx, writer, req)?;
                writer.write(tag.as_bytes())?;
                Ok(())
            }))
        })
    }

    fn nested0() -> SharedWrapper {
        nested(B0)
    }

    fn nested1() -> SharedWrapper {
        nested(B1)
    }

    fn empty_nested() -> SharedWrapper {
        Arc::new(|next: SharedHandler| next)
    }

    fn end_handler(_ctx: &Context, writer: &mut dyn ResponseWriter, _req: &Request) -> HandlerResult {
        writer.write(B_END.as_bytes())?;
        Ok(())
    }

    fn record(handler: &ComposedHandler) -> BufferedResponse {
        let mut writer = BufferedResponse::new();
        handler.serve(&mut writer, &Request::new(Bytes::new())).unwrap();
        writer
    }

    fn body(handler: &ComposedHandler) -> String {
        record(handler).body_str().unwrap().to_owned()
    }

    #[test]
    fn test_new() {
        let chain = Chain::new([empty_nested()]);
        assert_eq!(chain.len(), 1);
        assert!(chain.context().is_none());
    }

    #[test]
    fn test_append() {
        let chain = Chain::new([empty_nested()]).append([empty_nested()]);
        assert_eq!(chain.len(), 2);
    }

    #[test]
    fn test_merge() {
        let c1 = Chain::new([empty_nested()]);
        let c2 = Chain::new([empty_nested(), empty_nested()]);
        let c3 = c1.merge([&c2]);

        assert_eq!(c3.len(), 3);
        assert_eq!(c1.len(), 1);
        assert_eq!(c2.len(), 2);
    }

    #[test]
    fn test_end() {
        let handler = Chain::new([nested0()]).end(handler_fn(end_handler));
        assert_eq!(body(&handler), format!("{B0}{B_END}{B0}"));
    }

    #[test]
    fn test_end_fn() {
        let handler = Chain::new([empty_nested()]).end_fn(end_handler);
        let writer = record(&handler);
        assert_eq!(writer.status(), Some(http::StatusCode::OK));
        assert_eq!(writer.body_str(), Some(B_END));
    }

    #[test]
    fn test_empty_chain_passes_through() {
        let handler = Chain::empty().end_fn(end_handler);
        assert_eq!(body(&handler), B_END);

        let handler = crate::chain![].end_fn(end_handler);
        assert_eq!(body(&handler), B_END);
    }

    #[test]
    fn test_order() {
        let handler = Chain::new([nested0(), nested0(), nested1()]).end_fn(end_handler);
        assert_eq!(body(&handler), "001END100");
    }

    #[test]
    fn test_order_is_onion() {
        let events = Arc::new(Mutex::new(Vec::new()));

        let step = |name: &'static str| -> SharedWrapper {
            let events = Arc::clone(&events);
            Arc::new(move |next: SharedHandler| -> SharedHandler {
                let events = Arc::clone(&events);
                Arc::new(handler_fn(move |ctx, writer, req| {
                    events.lock().unwrap().push(format!("{name} before"));
                    let result = next.serve(ctx, writer, req);
                    events.lock().unwrap().push(format!("{name} after"));
                    result
                }))
            })
        };

        let terminal_events = Arc::clone(&events);
        let handler = Chain::new([step("w0"), step("w1"), step("w2")]).end_fn(move |_ctx, _writer, _req| {
            terminal_events.lock().unwrap().push("terminal".to_owned());
            Ok(())
        });
        record(&handler);

        assert_eq!(
            *events.lock().unwrap(),
            ["w0 before", "w1 before", "w2 before", "terminal", "w2 after", "w1 after", "w0 after"]
        );
    }

    #[test]
    fn test_append_matches_new() {
        let appended = Chain::new([nested0(), nested1()]).append([nested1(), nested0()]).end_fn(end_handler);
        let built = Chain::new([nested0(), nested1(), nested1(), nested0()]).end_fn(end_handler);
        assert_eq!(body(&appended), body(&built));
    }

    #[test]
    fn test_merge_matches_new() {
        let merged = Chain::new([nested0()])
            .merge([&Chain::new([nested1()]), &Chain::new([nested0()])])
            .end_fn(end_handler);
        let built = Chain::new([nested0(), nested1(), nested0()]).end_fn(end_handler);
        assert_eq!(body(&merged), body(&built));
        assert_eq!(body(&merged), "010END010");
    }

    #[test]
    fn test_append_and_merge() {
        let c = Chain::new([nested0(), nested0()]).append([nested1(), nested1()]);
        let c = c.merge([&Chain::new([nested0(), nested0()])]);

        assert_eq!(body(&c.end_fn(end_handler)), "001100END001100");
    }

    #[test]
    fn test_merge_of_appended() {
        let ch1001 = Chain::new([nested1()]).merge([&Chain::new([nested0(), nested0()]).append([nested1()])]);
        assert_eq!(body(&ch1001.end_fn(end_handler)), "1001END1001");
    }

    #[test]
    fn test_derived_chains_do_not_alias() {
        let base = Chain::new([nested0()]);
        let c1 = base.append([nested1()]);
        let c2 = base.append([nested(B_END)]);
        let c3 = c1.append([nested0()]);
        let c4 = c1.append([nested1()]);

        assert_eq!(body(&base.end(None::<NoopHandler>)), "00");
        assert_eq!(body(&c1.end(None::<NoopHandler>)), "0110");
        assert_eq!(body(&c2.end(None::<NoopHandler>)), "0ENDEND0");
        assert_eq!(body(&c3.end(None::<NoopHandler>)), "010010");
        assert_eq!(body(&c4.end(None::<NoopHandler>)), "011110");
    }

    struct Tag(&'static str);

    impl Handler for Tag {
        fn serve(&self, _ctx: &Context, writer: &mut dyn ResponseWriter, _req: &Request) -> HandlerResult {
            writer.write(self.0.as_bytes())?;
            Ok(())
        }
    }

    static STATIC_END: Tag = Tag(B_END);
    static STATIC_NOOP: NoopHandler = NoopHandler;

    #[test]
    fn test_end_with_static_handler() {
        let chain = Chain::new([nested0()]);
        assert_eq!(body(&chain.end(&STATIC_END)), "0END0");

        let writer = record(&chain.end(&STATIC_NOOP));
        assert_eq!(writer.body_str(), Some("00"));
    }

    #[test]
    fn test_end_with_boxed_handler() {
        let handler = Chain::new([nested1()]).end(Box::new(handler_fn(end_handler)));
        assert_eq!(body(&handler), "1END1");

        let boxed: Box<dyn Handler> = Box::new(Tag("boxed"));
        assert_eq!(body(&Chain::new([nested0()]).end(boxed)), "0boxed0");

        let writer = record(&Chain::empty().end(Box::new(None::<NoopHandler>)));
        assert_eq!(writer.status(), None);
        assert!(writer.body().is_empty());
    }

    #[test]
    fn test_end_with_absent_handler() {
        let handler = Chain::new([empty_nested()]).end(None::<NoopHandler>);
        let writer = record(&handler);
        assert_eq!(writer.status(), None);
        assert!(writer.body().is_empty());

        let writer = record(&Chain::empty().end(None::<HandlerFn<ServeFn>>));
        assert!(writer.body().is_empty());
    }

    #[test]
    fn test_end_fn_with_absent_fn() {
        let handler = Chain::new([empty_nested()]).end_fn_opt(None::<ServeFn>);
        let writer = record(&handler);
        assert_eq!(writer.status(), None);
        assert!(writer.body().is_empty());

        let handler = Chain::new([nested0()]).end_fn_opt(Some(end_handler as ServeFn));
        assert_eq!(body(&handler), "0END0");
    }

    #[test]
    fn test_absent_terminal_never_touches_writer() {
        let mut writer = MockResponseWriter::new();
        writer.expect_write().never();
        writer.expect_write_status().never();
        writer.expect_headers_mut().never();

        let handler = Chain::new([empty_nested(), empty_nested()]).end(None::<NoopHandler>);
        handler.serve(&mut writer, &Request::new(Bytes::new())).unwrap();
    }

    #[test]
    fn test_end_is_repeatable() {
        let chain = Chain::new([nested0()]);
        let first = chain.end_fn(end_handler);
        let second = chain.end_fn(|_ctx, writer, _req| {
            writer.write(b"other")?;
            Ok(())
        });

        assert_eq!(body(&first), "0END0");
        assert_eq!(body(&second), "0other0");
        assert_eq!(chain.len(), 1);
        assert_eq!(body(&chain.append([nested1()]).end_fn(end_handler)), "01END10");
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Greeting(&'static str);

    fn greet(ctx: &Context, writer: &mut dyn ResponseWriter, _req: &Request) -> HandlerResult {
        let greeting = ctx.get::<Greeting>().map_or("none", |greeting| greeting.0);
        writer.write(greeting.as_bytes())?;
        Ok(())
    }

    #[test]
    fn test_context() {
        let chain = Chain::new([nested0()]);
        let with_context = chain.set_context(Context::background().with_value(Greeting("hello")));

        assert!(chain.context().is_none());
        assert_eq!(with_context.len(), 1);
        assert_eq!(body(&chain.end_fn(greet)), "0none0");
        assert_eq!(body(&with_context.end_fn(greet)), "0hello0");
    }

    #[test]
    fn test_context_replaced_wholesale() {
        #[derive(Debug, Clone)]
        struct Other;

        let chain = Chain::empty()
            .set_context(Context::background().with_value(Other))
            .set_context(Context::background().with_value(Greeting("hi")));

        let ctx = chain.context().unwrap();
        assert!(!ctx.contains::<Other>());
        assert_eq!(body(&chain.end_fn(greet)), "hi");
    }

    #[test]
    fn test_context_survives_append_and_merge() {
        let chain = Chain::empty().set_context(Context::background().with_value(Greeting("kept")));
        let other = Chain::new([nested1()]).set_context(Context::background().with_value(Greeting("ignored")));

        let merged = chain.append([nested0()]).merge([&other]);
        assert_eq!(body(&merged.end_fn(greet)), "01kept10");
    }

    #[test]
    fn test_serve_with_context() {
        let handler = Chain::new([nested0()])
            .set_context(Context::background().with_value(Greeting("fixed")))
            .end_fn(greet);

        let mut writer = BufferedResponse::new();
        let ctx = Context::background().with_value(Greeting("live"));
        handler.serve_with_context(&ctx, &mut writer, &Request::new(Bytes::new())).unwrap();

        assert_eq!(writer.body_str(), Some("0live0"));
        assert_eq!(handler.context().get::<Greeting>(), Some(&Greeting("fixed")));
    }

    #[test]
    fn test_errors_propagate_untouched() {
        let handler = Chain::new([nested0()]).end_fn(|_ctx, _writer, _req| Err("terminal failed".into()));

        let mut writer = BufferedResponse::new();
        let error = handler.serve(&mut writer, &Request::new(Bytes::new())).unwrap_err();

        assert_eq!(error.to_string(), "terminal failed");
        assert_eq!(writer.body_str(), Some(B0));
    }

    #[test]
    fn test_shared_across_threads() {
        let handler = Chain::new([nested0(), nested1()]).end_fn(end_handler);

        let bodies = std::thread::scope(|scope| {
            let workers = (0..4).map(|_| scope.spawn(|| body(&handler))).collect::<Vec<_>>();
            workers.into_iter().map(|worker| worker.join().unwrap()).collect::<Vec<_>>()
        });

        assert!(bodies.iter().all(|body| body == "01END10"));
    }

    #[test]
    fn test_finalized_concurrently() {
        let chain = Chain::new([nested0(), nested1()]);
        let shared = &chain;

        let bodies = std::thread::scope(|scope| {
            let workers = [B0, B1, B_END, "other"]
                .map(|tag| {
                    scope.spawn(move || {
                        let handler = shared.end_fn(move |_ctx, writer, _req| {
                            writer.write(tag.as_bytes())?;
                            Ok(())
                        });
                        body(&handler)
                    })
                })
                .into_iter()
                .collect::<Vec<_>>();
            workers.into_iter().map(|worker| worker.join().unwrap()).collect::<Vec<_>>()
        });

        assert_eq!(bodies, ["01010", "01110", "01END10", "01other10"]);
        assert_eq!(chain.len(), 2);
    }
}
