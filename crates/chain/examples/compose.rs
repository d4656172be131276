//! Composes a small wrapper chain and serves a few requests through it with an
//! in-memory response, logging with a tracing subscriber.

use http::{HeaderValue, Method, StatusCode};
use micro_chain::{
    BufferedResponse, Context, Handler, HandlerResult, PlainHandler, Request, ResponseWriter, Scratch, SharedHandler,
    SharedPlainHandler, SharedWrapper, bridge, chain, handler_fn, plain_handler_fn, scratch, set_header, trace,
};
use std::sync::Arc;
use tracing::{Level, info, warn};
use tracing_subscriber::FmtSubscriber;

#[derive(Debug, Clone)]
struct Greeting(&'static str);

#[derive(Debug, Clone)]
struct Principal(String);

/// A third-party style decorator, written against the plain convention.
fn require_token(next: SharedPlainHandler) -> SharedPlainHandler {
    Arc::new(plain_handler_fn(move |writer, req| {
        if req.headers().contains_key(http::header::AUTHORIZATION) {
            next.serve(writer, req)
        } else {
            writer.write_status(StatusCode::UNAUTHORIZED)?;
            Ok(())
        }
    }))
}

/// Records who was served, once everything downstream has returned.
fn audit(next: SharedHandler) -> SharedHandler {
    Arc::new(handler_fn(move |ctx, writer, req| {
        next.serve(ctx, writer, req)?;
        let principal = Scratch::from_context(ctx).and_then(|scratch| scratch.get::<Principal>());
        info!(principal = ?principal, status = ?writer.status(), "audit");
        Ok(())
    }))
}

fn hello(ctx: &Context, writer: &mut dyn ResponseWriter, req: &Request) -> HandlerResult {
    let greeting = ctx.get::<Greeting>().map_or("hello", |greeting| greeting.0);
    let name = req.uri().path().trim_start_matches('/');

    if let Some(scratch) = Scratch::from_context(ctx) {
        scratch.insert(Principal(name.to_owned()));
    }

    writer.write(format!("{greeting}, {name}!").as_bytes())?;
    Ok(())
}

fn request(path: &str, token: Option<&'static str>) -> Request {
    let mut request = Request::new(Default::default());
    *request.method_mut() = Method::GET;
    *request.uri_mut() = path.parse().unwrap_or_default();
    if let Some(token) = token {
        request.headers_mut().insert(http::header::AUTHORIZATION, HeaderValue::from_static(token));
    }
    request
}

fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::TRACE).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let common = chain![trace(), set_header(http::header::SERVER, HeaderValue::from_static("micro-chain"))];
    let protected = common
        .append([Arc::new(scratch()) as SharedWrapper, Arc::new(audit) as SharedWrapper])
        .wrap(bridge(require_token))
        .set_context(Context::background().with_value(Greeting("hi")));

    let handler = protected.end_fn(hello);

    for req in [request("/alice", Some("Bearer abc")), request("/mallory", None)] {
        let mut writer = BufferedResponse::new();
        if let Err(e) = handler.serve(&mut writer, &req) {
            warn!(cause = %e, "request failed");
            continue;
        }

        let response = writer.into_response();
        info!(
            status = %response.status(),
            server = ?response.headers().get(http::header::SERVER),
            body = %String::from_utf8_lossy(response.body()),
            "response"
        );
    }
}
