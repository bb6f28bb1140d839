//! Asynchronous execution as an explicit state machine.
//!
//! ```text
//! Idle → OpeningStream? → WritingBody? → AwaitingResponse → ReadingBody* → Done
//!   \__________________________ any failure ___________________________/→ Failed
//! ```
//!
//! Each state performs at most one suspension point. Steps never overlap:
//! the next state is only entered once the previous step's future resolved.

use std::fmt;
use std::future::Future;
use std::time::Instant;

use bytes::{Bytes, BytesMut};
use tracing::{debug, trace};

use super::response::ResponseBuilder;
use super::transport::{Exchange, ResponseBody, Transport};
use crate::data::{RequestDescriptor, Response};
use crate::error::{ContractFault, ExchangeError, TransportFailure};

enum Stage<X: Exchange> {
    Idle,
    OpeningStream(X),
    WritingBody(X),
    AwaitingResponse(X),
    ReadingBody {
        status: u16,
        body: X::Body,
        buffer: BytesMut,
    },
    Done {
        status: u16,
        body: Bytes,
    },
}

impl<X: Exchange> Stage<X> {
    fn name(&self) -> &'static str {
        match self {
            Stage::Idle => "idle",
            Stage::OpeningStream(_) => "opening request stream",
            Stage::WritingBody(_) => "writing body",
            Stage::AwaitingResponse(_) => "awaiting response",
            Stage::ReadingBody { .. } => "reading body",
            Stage::Done { .. } => "done",
        }
    }
}

/// Drives one request through the asynchronous exchange.
///
/// All suspension points share one deadline of `request.timeout`, so a
/// stalled transport fails with a protocol timeout instead of hanging.
/// A timeout too large to be represented as an instant means no deadline.
pub struct AsyncPipeline<'a, T> {
    transport: &'a T,
    request: &'a RequestDescriptor,
    deadline: Option<tokio::time::Instant>,
}

impl<'a, T> fmt::Debug for AsyncPipeline<'a, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncPipeline")
            .field("request", &self.request)
            .field("deadline", &self.deadline)
            .finish()
    }
}

impl<'a, T: Transport> AsyncPipeline<'a, T> {
    pub fn new(transport: &'a T, request: &'a RequestDescriptor) -> Self {
        Self {
            transport,
            request,
            deadline: tokio::time::Instant::now().checked_add(request.timeout),
        }
    }

    /// Run the exchange and build its [`Response`].
    ///
    /// A transport-class failure at any step short-circuits into a failed
    /// response. A contract fault is returned as `Err`.
    pub async fn execute(
        self,
        responses: &ResponseBuilder,
        started: Instant,
    ) -> Result<Response, ContractFault> {
        let request = self.request;
        match self.run().await {
            Ok((status, body)) => Ok(responses.completed(status, request, body, started)),
            Err(ExchangeError::Failure(failure)) => {
                debug!(method = %request.method, uri = %request.uri, %failure, "request failed");
                Ok(responses.failed(failure, request, started))
            }
            Err(ExchangeError::Fault(fault)) => Err(fault),
        }
    }

    /// Run the exchange, returning the status and the complete body.
    pub async fn run(self) -> Result<(u16, Bytes), ExchangeError> {
        let mut stage = Stage::Idle;
        loop {
            trace!(stage = stage.name(), uri = %self.request.uri, "pipeline step");
            stage = match stage {
                Stage::Idle => {
                    let exchange = self.transport.begin(self.request)?;
                    if self.request.body.is_some() {
                        Stage::OpeningStream(exchange)
                    } else {
                        Stage::AwaitingResponse(exchange)
                    }
                }
                Stage::OpeningStream(mut exchange) => {
                    self.suspend("opening request stream", exchange.open_request_stream())
                        .await?;
                    Stage::WritingBody(exchange)
                }
                Stage::WritingBody(mut exchange) => {
                    let body = self.request.body.clone().unwrap_or_default();
                    self.suspend("writing body", exchange.write_body(body)).await?;
                    Stage::AwaitingResponse(exchange)
                }
                Stage::AwaitingResponse(exchange) => {
                    let head = self.suspend("awaiting response", exchange.response()).await?;
                    Stage::ReadingBody {
                        status: head.status,
                        body: head.body,
                        buffer: BytesMut::new(),
                    }
                }
                Stage::ReadingBody {
                    status,
                    mut body,
                    mut buffer,
                } => {
                    let chunk = self.suspend("reading body", body.read_chunk()).await?;
                    if chunk.is_empty() {
                        Stage::Done {
                            status,
                            body: buffer.freeze(),
                        }
                    } else {
                        buffer.extend_from_slice(&chunk);
                        Stage::ReadingBody {
                            status,
                            body,
                            buffer,
                        }
                    }
                }
                Stage::Done { status, body } => return Ok((status, body)),
            };
        }
    }

    async fn suspend<F, O>(&self, step: &'static str, future: F) -> Result<O, ExchangeError>
    where
        F: Future<Output = Result<O, ExchangeError>>,
    {
        let Some(deadline) = self.deadline else {
            return future.await;
        };
        match tokio::time::timeout_at(deadline, future).await {
            Ok(result) => result,
            Err(_) => Err(TransportFailure::protocol_timeout(format!(
                "{step} did not complete within {}ms",
                self.request.timeout.as_millis()
            ))
            .into()),
        }
    }
}
