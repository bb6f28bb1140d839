//! Immutable data types for the transport layer.
//!
//! Settings are built once and shared read-only; descriptors are created
//! fresh for each call; responses are immutable once built.

pub mod request;
pub mod response;
pub mod settings;

pub use request::{Method, RequestDescriptor};
pub use response::Response;
pub use settings::{ClientCertificate, ConnectionSettings, ProxyConfig, SettingsFile};
