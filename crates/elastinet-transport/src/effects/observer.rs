//! Observers notified once per finished request.

use std::time::Duration;

use tracing::{info, trace};

use crate::data::{Method, Response};
use crate::error::FailureKind;

/// Callback invoked exactly once per request with its final response.
///
/// Implementations must not panic.
pub trait StatusHandler: Send + Sync {
    fn on_response(&self, response: &Response);
}

impl<F> StatusHandler for F
where
    F: Fn(&Response) + Send + Sync,
{
    fn on_response(&self, response: &Response) {
        self(response)
    }
}

/// Status handler that ignores every response.
#[derive(Debug, Clone, Copy, Default)]
pub struct IgnoreStatus;

impl StatusHandler for IgnoreStatus {
    fn on_response(&self, _response: &Response) {}
}

/// Diagnostic summary of one finished request.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceRecord<'a> {
    pub method: Method,
    pub path: &'a str,
    pub status: Option<u16>,
    pub success: bool,
    pub failure: Option<FailureKind>,
    pub elapsed: Duration,
}

impl<'a> TraceRecord<'a> {
    pub fn of(response: &'a Response) -> Self {
        Self {
            method: response.method(),
            path: response.path(),
            status: response.status(),
            success: response.is_success(),
            failure: response.failure().map(|f| f.kind()),
            elapsed: response.elapsed(),
        }
    }
}

/// Diagnostic hook, invoked for every response.
pub trait TraceHook: Send + Sync {
    fn trace(&self, record: &TraceRecord<'_>);
}

/// Writes trace records through `tracing`.
///
/// With tracing enabled in the settings records are emitted at `info`,
/// otherwise at `trace`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogTraceHook {
    enabled: bool,
}

impl LogTraceHook {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

impl TraceHook for LogTraceHook {
    fn trace(&self, record: &TraceRecord<'_>) {
        let elapsed_ms = u64::try_from(record.elapsed.as_millis()).unwrap_or(u64::MAX);
        let failure = record.failure.map(|k| k.to_string());
        if self.enabled {
            info!(
                method = %record.method,
                path = record.path,
                status = record.status,
                success = record.success,
                failure,
                elapsed_ms,
                "request finished"
            );
        } else {
            trace!(
                method = %record.method,
                path = record.path,
                status = record.status,
                success = record.success,
                failure,
                elapsed_ms,
                "request finished"
            );
        }
    }
}
