use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;

use super::observer::{StatusHandler, TraceHook, TraceRecord};
use crate::core::is_success_status;
use crate::data::{RequestDescriptor, Response};
use crate::error::TransportFailure;

/// Turns finished exchanges into [`Response`]s and notifies observers.
///
/// Each built response is passed to the trace hook and then to the status
/// handler, once each.
#[derive(Clone)]
pub struct ResponseBuilder {
    status_handler: Arc<dyn StatusHandler>,
    trace_hook: Arc<dyn TraceHook>,
}

impl fmt::Debug for ResponseBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseBuilder")
            .field("status_handler", &"{ ... }")
            .field("trace_hook", &"{ ... }")
            .finish()
    }
}

impl ResponseBuilder {
    pub fn new(status_handler: Arc<dyn StatusHandler>, trace_hook: Arc<dyn TraceHook>) -> Self {
        Self {
            status_handler,
            trace_hook,
        }
    }

    pub(crate) fn set_status_handler(&mut self, handler: Arc<dyn StatusHandler>) {
        self.status_handler = handler;
    }

    pub(crate) fn set_trace_hook(&mut self, hook: Arc<dyn TraceHook>) {
        self.trace_hook = hook;
    }

    /// Response for an exchange that ran to completion.
    ///
    /// A non-2xx status keeps its code and body but is not a success.
    pub fn completed(
        &self,
        status: u16,
        request: &RequestDescriptor,
        body: Bytes,
        started: Instant,
    ) -> Response {
        let success = is_success_status(status);
        self.publish(Response {
            status: Some(status),
            method: request.method,
            path: request.uri.to_string(),
            request_body: request.body.clone(),
            body: Some(body),
            success,
            failure: (!success).then(|| TransportFailure::status(status)),
            elapsed: started.elapsed(),
        })
    }

    /// Response for an exchange that failed or never started.
    pub fn failed(
        &self,
        failure: TransportFailure,
        request: &RequestDescriptor,
        started: Instant,
    ) -> Response {
        self.publish(Response {
            status: None,
            method: request.method,
            path: request.uri.to_string(),
            request_body: request.body.clone(),
            body: None,
            success: false,
            failure: Some(failure),
            elapsed: started.elapsed(),
        })
    }

    fn publish(&self, response: Response) -> Response {
        self.trace_hook.trace(&TraceRecord::of(&response));
        self.status_handler.on_response(&response);
        response
    }
}
