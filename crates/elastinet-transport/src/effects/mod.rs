//! I/O operations: transports, admission control, executors and the
//! connection that wires them together.

mod blocking;
mod connection;
mod gate;
mod observer;
mod pipeline;
mod response;
mod transport;

#[cfg(feature = "reqwest")]
mod reqwest_impl;

pub use blocking::SyncExecutor;
pub use connection::Connection;
pub use gate::{AdmissionSlot, ConcurrencyGate};
pub use observer::{IgnoreStatus, LogTraceHook, StatusHandler, TraceHook, TraceRecord};
pub use pipeline::AsyncPipeline;
pub use response::ResponseBuilder;
pub use transport::{
    BlockingExchange, BlockingTransport, Exchange, ResponseBody, ResponseHead, Transport,
};

#[cfg(feature = "reqwest")]
pub use reqwest_impl::{
    BlockingReqwestBody, BlockingReqwestExchange, ReqwestBody, ReqwestExchange, ReqwestTransport,
};
