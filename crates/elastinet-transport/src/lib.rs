//! Request execution engine for an Elasticsearch client.
//!
//! Issues HTTP requests against a single configured endpoint, blocking or
//! asynchronously, bounds how many asynchronous requests are in flight, and
//! normalizes every outcome into one [`Response`] value.
//!
//! # Architecture
//!
//! This crate follows the three-layer pattern:
//! - [`data`] - Immutable settings, request descriptors and responses
//! - [`core`] - Pure request construction
//! - [`effects`] - Transports, admission control and executors
//!
//! # Failure model
//!
//! - Transport-class failures (connect, DNS, TLS, timeouts, stream I/O,
//!   waiting too long for a slot) become a failed [`Response`].
//! - [`ContractFault`]s (e.g. a path that cannot be resolved) are returned
//!   as `Err` and never turned into a response.

pub mod core;
pub mod data;
pub mod effects;
mod error;

pub use data::{
    ClientCertificate, ConnectionSettings, Method, ProxyConfig, RequestDescriptor, Response,
    SettingsFile,
};
pub use effects::{
    AdmissionSlot, AsyncPipeline, BlockingExchange, BlockingTransport, ConcurrencyGate,
    Connection, Exchange, IgnoreStatus, LogTraceHook, ResponseBody, ResponseBuilder,
    ResponseHead, StatusHandler, SyncExecutor, TraceHook, TraceRecord, Transport,
};

#[cfg(feature = "reqwest")]
pub use effects::ReqwestTransport;

pub use error::{
    ConfigError, ContractFault, ExchangeError, FailureKind, Result, TransportFailure,
};
