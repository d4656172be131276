//! Wrappers decorate a handler with behavior that runs before and after it.
//!
//! Any `Fn(SharedHandler) -> SharedHandler` closure or function is a
//! [`Wrapper`], and any `Fn(SharedPlainHandler) -> SharedPlainHandler` is a
//! [`PlainWrapper`]. Plain wrappers join a [`Chain`](crate::Chain) through
//! [`bridge`](crate::bridge).

mod header;
mod trace;

use crate::handler::{SharedHandler, SharedPlainHandler};
use std::fmt;
use std::sync::Arc;

pub use header::{SetHeaderWrapper, set_header};
pub use trace::{TraceWrapper, trace};

/// A wrapper that can wrap a context aware handler to another
pub trait Wrapper: Send + Sync {
    /// wrap the handler to another
    fn wrap(&self, handler: SharedHandler) -> SharedHandler;
}

/// A wrapper written against the plain handler convention
pub trait PlainWrapper: Send + Sync {
    /// wrap the handler to another
    fn wrap(&self, handler: SharedPlainHandler) -> SharedPlainHandler;
}

pub type SharedWrapper = Arc<dyn Wrapper>;

impl<F> Wrapper for F
where
    F: Fn(SharedHandler) -> SharedHandler + Send + Sync,
{
    #[inline]
    fn wrap(&self, handler: SharedHandler) -> SharedHandler {
        (self)(handler)
    }
}

impl<F> PlainWrapper for F
where
    F: Fn(SharedPlainHandler) -> SharedPlainHandler + Send + Sync,
{
    #[inline]
    fn wrap(&self, handler: SharedPlainHandler) -> SharedPlainHandler {
        (self)(handler)
    }
}

/// A wrapper that does not do any wrapping
#[derive(Debug, Default, Copy, Clone)]
pub struct IdentityWrapper;

impl Wrapper for IdentityWrapper {
    #[inline]
    fn wrap(&self, handler: SharedHandler) -> SharedHandler {
        handler
    }
}

#[derive(Copy, Clone)]
pub struct WrapperFn<F> {
    f: F,
}

/// Turns a closure into a [`Wrapper`], pinning down the closure's argument type.
pub fn wrapper_fn<F>(f: F) -> WrapperFn<F>
where
    F: Fn(SharedHandler) -> SharedHandler,
{
    WrapperFn { f }
}

impl<F> Wrapper for WrapperFn<F>
where
    F: Fn(SharedHandler) -> SharedHandler + Send + Sync,
{
    fn wrap(&self, handler: SharedHandler) -> SharedHandler {
        (self.f)(handler)
    }
}

impl<F> fmt::Debug for WrapperFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WrapperFn").finish_non_exhaustive()
    }
}

#[derive(Copy, Clone)]
pub struct PlainWrapperFn<F> {
    f: F,
}

/// Turns a closure into a [`PlainWrapper`], pinning down the closure's argument type.
pub fn plain_wrapper_fn<F>(f: F) -> PlainWrapperFn<F>
where
    F: Fn(SharedPlainHandler) -> SharedPlainHandler,
{
    PlainWrapperFn { f }
}

impl<F> PlainWrapper for PlainWrapperFn<F>
where
    F: Fn(SharedPlainHandler) -> SharedPlainHandler + Send + Sync,
{
    fn wrap(&self, handler: SharedPlainHandler) -> SharedPlainHandler {
        (self.f)(handler)
    }
}

impl<F> fmt::Debug for PlainWrapperFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlainWrapperFn").finish_non_exhaustive()
    }
}
