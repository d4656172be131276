//! Composable handler wrapper chains carrying request-scoped context.
//!
//! A [`Chain`] is an ordered list of [`Wrapper`]s. Chains are values: they can
//! be extended with [`Chain::append`], combined with [`Chain::merge`] and given
//! an ambient [`Context`] with [`Chain::set_context`], each call returning a new
//! chain and leaving the receiver as it was. [`Chain::end`] finally applies
//! every wrapper around a terminal handler and returns a [`ComposedHandler`]
//! that a transport can serve requests with.
//!
//! # Example
//!
//! ```
//! use micro_chain::{handler_fn, BufferedResponse, Chain, Context, Handler, HandlerResult, PlainHandler, Request, ResponseWriter, SharedHandler, SharedWrapper};
//! use std::sync::Arc;
//!
//! fn tag(tag: &'static str) -> SharedWrapper {
//!     Arc::new(move |next: SharedHandler| -> SharedHandler {
//!         Arc::new(handler_fn(move |ctx, writer, req| {
//!             writer.write(tag.as_bytes())?;
//!             next.serve(ctx, writer, req)?;
//!             writer.write(tag.as_bytes())?;
//!             Ok(())
//!         }))
//!     })
//! }
//!
//! fn end(_ctx: &Context, writer: &mut dyn ResponseWriter, _req: &Request) -> HandlerResult {
//!     writer.write(b"_END_")?;
//!     Ok(())
//! }
//!
//! let ch00 = Chain::new([tag("0"), tag("0")]);
//! let ch001 = ch00.append([tag("1")]);
//! let ch1001 = Chain::new([tag("1")]).merge([&ch001]);
//!
//! for (chain, expected) in [(&ch00, "00_END_00"), (&ch001, "001_END_100"), (&ch1001, "1001_END_1001")] {
//!     let mut writer = BufferedResponse::new();
//!     chain.end_fn(end).serve(&mut writer, &Request::new(Default::default())).unwrap();
//!     assert_eq!(writer.body_str(), Some(expected));
//! }
//! ```
//!
//! # Calling conventions
//!
//! Wrappers in a chain are context aware: they wrap a [`Handler`], which is
//! served with the [`Context`]. Wrappers written for the plain convention
//! ([`PlainWrapper`] over [`PlainHandler`]) join a chain through [`bridge`].
//!
//! # Data flowing back up
//!
//! Contexts are immutable, a value added downstream is invisible upstream.
//! A [`scratch`] wrapper installs a per-request [`Scratch`] map that inner
//! handlers can write and outer wrappers can read once the call returns.
//!
//! # Errors
//!
//! Building and finalizing chains can not fail. Handlers return
//! [`HandlerResult`]; an error raised anywhere propagates out of the composed
//! handler unchanged, the chain itself never inspects it.

mod bridge;
mod compose;
mod context;
mod handler;
mod response;
mod scratch;

pub mod wrapper;

pub use bridge::{Bridge, ContextProxy, bridge};
pub use compose::{Chain, ComposedHandler};
pub use context::Context;
pub use handler::{
    Handler, HandlerError, HandlerFn, HandlerResult, NoopHandler, PlainHandler, PlainHandlerFn, Request, ServeFn,
    SharedHandler, SharedPlainHandler, handler_fn, plain_handler_fn,
};
pub use response::{BufferedResponse, ResponseError, ResponseWriter};
pub use scratch::{Scratch, ScratchWrapper, scratch};
pub use wrapper::{
    IdentityWrapper, PlainWrapper, SharedWrapper, Wrapper, plain_wrapper_fn, set_header, trace, wrapper_fn,
};
