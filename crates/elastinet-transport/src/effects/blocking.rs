//! Blocking execution on the calling thread.

use std::io::Read;
use std::time::Instant;

use bytes::Bytes;
use tracing::debug;

use super::response::ResponseBuilder;
use super::transport::{BlockingExchange, BlockingTransport};
use crate::data::{RequestDescriptor, Response};
use crate::error::{ContractFault, ExchangeError};

/// Runs one request end to end, blocking for the body write and the full
/// response read.
pub struct SyncExecutor<'a, T> {
    transport: &'a T,
    responses: &'a ResponseBuilder,
}

impl<'a, T: BlockingTransport> SyncExecutor<'a, T> {
    pub fn new(transport: &'a T, responses: &'a ResponseBuilder) -> Self {
        Self {
            transport,
            responses,
        }
    }

    /// Execute `request`.
    ///
    /// Transport-class failures become a failed [`Response`]; contract
    /// faults are returned as `Err`.
    pub fn execute(
        &self,
        request: &RequestDescriptor,
        started: Instant,
    ) -> Result<Response, ContractFault> {
        match self.exchange(request) {
            Ok((status, body)) => Ok(self.responses.completed(status, request, body, started)),
            Err(ExchangeError::Failure(failure)) => {
                debug!(method = %request.method, uri = %request.uri, %failure, "blocking request failed");
                Ok(self.responses.failed(failure, request, started))
            }
            Err(ExchangeError::Fault(fault)) => Err(fault),
        }
    }

    fn exchange(&self, request: &RequestDescriptor) -> Result<(u16, Bytes), ExchangeError> {
        let mut exchange = self.transport.begin_blocking(request)?;
        if let Some(body) = &request.body {
            exchange.write_body(body)?;
        }

        let mut head = exchange.response()?;
        let mut buffer = Vec::new();
        head.body.read_to_end(&mut buffer)?;

        Ok((head.status, Bytes::from(buffer)))
    }
}
