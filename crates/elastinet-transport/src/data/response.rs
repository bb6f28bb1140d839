use std::borrow::Cow;
use std::time::Duration;

use bytes::Bytes;

use super::request::Method;
use crate::error::TransportFailure;

/// The uniform outcome of one call.
///
/// Every call produces exactly one `Response`, whether the exchange
/// succeeded, the server returned an error status, or the transport failed.
#[derive(Debug, Clone)]
pub struct Response {
    pub(crate) status: Option<u16>,
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) request_body: Option<Bytes>,
    pub(crate) body: Option<Bytes>,
    pub(crate) success: bool,
    pub(crate) failure: Option<TransportFailure>,
    pub(crate) elapsed: Duration,
}

impl Response {
    /// HTTP status code, absent when no response was received.
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn method(&self) -> Method {
        self.method
    }

    /// The absolute URI that was requested.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn request_body(&self) -> Option<&Bytes> {
        self.request_body.as_ref()
    }

    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Response body as UTF-8 text, with invalid sequences replaced.
    pub fn text(&self) -> Option<Cow<'_, str>> {
        self.body.as_deref().map(String::from_utf8_lossy)
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn failure(&self) -> Option<&TransportFailure> {
        self.failure.as_ref()
    }

    /// Wall time from the start of the call until the response was built.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}
