//! Response sinks that handlers write into.
//!
//! The transport owns the real connection, so handlers only ever see a
//! [`ResponseWriter`]. [`BufferedResponse`] is the in-memory implementation: it
//! collects status, headers and body and can be turned into an
//! [`http::Response`] once the composed handler returns.

mod error;

pub use error::ResponseError;

use bytes::{Bytes, BytesMut};
use http::{HeaderMap, Response, StatusCode};

/// The response side of a request, as seen by handlers and wrappers.
///
/// The status is committed either explicitly through [`write_status`] or
/// implicitly as `200 OK` by the first [`write`]. Once committed it can not be
/// changed.
///
/// [`write_status`]: ResponseWriter::write_status
/// [`write`]: ResponseWriter::write
#[cfg_attr(test, mockall::automock)]
pub trait ResponseWriter {
    /// Headers that will be sent with the response.
    fn headers_mut(&mut self) -> &mut HeaderMap;

    /// The committed status, `None` while nothing has been written.
    fn status(&self) -> Option<StatusCode>;

    /// Commit the response status.
    fn write_status(&mut self, status: StatusCode) -> Result<(), ResponseError>;

    /// Append `data` to the body, returning the number of bytes accepted.
    fn write(&mut self, data: &[u8]) -> Result<usize, ResponseError>;
}

/// A [`ResponseWriter`] that keeps the whole response in memory.
#[derive(Debug, Default)]
pub struct BufferedResponse {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: BytesMut,
    max_body_size: Option<usize>,
}

impl BufferedResponse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a buffer that rejects writes growing the body past `max_size` bytes.
    pub fn with_body_limit(max_size: usize) -> Self {
        Self { max_body_size: Some(max_size), ..Self::default() }
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// The body as utf-8, `None` if it is not valid utf-8
    pub fn body_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.body).ok()
    }

    /// Converts the buffer into a response, an uncommitted status becomes `200 OK`.
    pub fn into_response(self) -> Response<Bytes> {
        let mut response = Response::new(self.body.freeze());
        *response.status_mut() = self.status.unwrap_or(StatusCode::OK);
        *response.headers_mut() = self.headers;
        response
    }
}

impl ResponseWriter for BufferedResponse {
    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn status(&self) -> Option<StatusCode> {
        self.status
    }

    fn write_status(&mut self, status: StatusCode) -> Result<(), ResponseError> {
        if let Some(current) = self.status {
            return Err(ResponseError::status_already_written(current));
        }
        self.status = Some(status);
        Ok(())
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, ResponseError> {
        let current_size = self.body.len() + data.len();
        if let Some(max_size) = self.max_body_size
            && current_size > max_size
        {
            return Err(ResponseError::body_too_large(current_size, max_size));
        }

        self.status.get_or_insert(StatusCode::OK);
        self.body.extend_from_slice(data);
        Ok(data.len())
    }
}
