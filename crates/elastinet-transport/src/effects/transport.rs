use std::future::Future;
use std::io::Read;

use bytes::Bytes;

use crate::data::RequestDescriptor;
use crate::error::ExchangeError;

/// Status line and still-unread body of a response.
#[derive(Debug)]
pub struct ResponseHead<B> {
    pub status: u16,
    pub body: B,
}

/// Asynchronous HTTP transport abstraction.
///
/// An exchange is driven one step at a time so the caller controls the
/// order of suspension points:
///
/// ```text
/// begin → open_request_stream → write_body → response → read_chunk* → (empty chunk)
/// ```
///
/// The body steps are skipped for requests without a body.
///
/// # Implementations
///
/// - [`ReqwestTransport`](crate::ReqwestTransport): production implementation using `reqwest`
/// - Stub implementations for testing
///
/// # Errors
///
/// Every step returns [`ExchangeError`]. Implementations must report
/// anything intrinsic to the network exchange (connect, DNS, TLS, timeout,
/// stream I/O) as [`ExchangeError::Failure`] and reserve
/// [`ExchangeError::Fault`] for defects in the request or in how the
/// exchange is driven.
pub trait Transport: Send + Sync {
    type Exchange: Exchange;

    /// Prepare an exchange for `request`. No I/O happens here.
    fn begin(&self, request: &RequestDescriptor) -> Result<Self::Exchange, ExchangeError>;
}

/// One in-flight asynchronous request/response cycle.
pub trait Exchange: Send {
    type Body: ResponseBody;

    /// Open the stream the request body is written to.
    fn open_request_stream(&mut self) -> impl Future<Output = Result<(), ExchangeError>> + Send;

    /// Write the full request body to the opened stream.
    fn write_body(&mut self, body: Bytes) -> impl Future<Output = Result<(), ExchangeError>> + Send;

    /// Send the request and wait for the response status and headers.
    fn response(
        self,
    ) -> impl Future<Output = Result<ResponseHead<Self::Body>, ExchangeError>> + Send;
}

/// The body of an asynchronous response, read chunk by chunk.
pub trait ResponseBody: Send {
    /// Read the next chunk. A zero-length chunk signals end of stream.
    fn read_chunk(&mut self) -> impl Future<Output = Result<Bytes, ExchangeError>> + Send;
}

/// Blocking HTTP transport abstraction, run on the calling thread.
pub trait BlockingTransport: Send + Sync {
    type Exchange: BlockingExchange;

    /// Prepare an exchange for `request`. No I/O happens here.
    fn begin_blocking(&self, request: &RequestDescriptor) -> Result<Self::Exchange, ExchangeError>;
}

/// One blocking request/response cycle.
pub trait BlockingExchange {
    type Body: Read;

    /// Open the request stream and write the full body to it.
    fn write_body(&mut self, body: &[u8]) -> Result<(), ExchangeError>;

    /// Send the request and block until the status and headers arrive.
    fn response(self) -> Result<ResponseHead<Self::Body>, ExchangeError>;
}
