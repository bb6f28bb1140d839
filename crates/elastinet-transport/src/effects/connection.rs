use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use tracing::{debug, warn};

use super::blocking::SyncExecutor;
use super::gate::ConcurrencyGate;
use super::observer::{IgnoreStatus, LogTraceHook, StatusHandler, TraceHook};
use super::pipeline::AsyncPipeline;
use super::response::ResponseBuilder;
use super::transport::{BlockingTransport, Transport};
use crate::core::build_request;
use crate::data::{ConnectionSettings, Method, RequestDescriptor, Response};
use crate::error::{ContractFault, TransportFailure};

#[cfg(feature = "reqwest")]
use super::reqwest_impl::ReqwestTransport;
#[cfg(feature = "reqwest")]
use crate::error::ConfigError;

/// Entry point for issuing requests against one configured endpoint.
///
/// Every call resolves to a [`Response`]; transport failures never escape
/// as errors. Only [`ContractFault`]s, such as a path that cannot be
/// resolved, are returned as `Err`.
///
/// Asynchronous calls pass through a [`ConcurrencyGate`] sized by
/// [`ConnectionSettings::maximum_async_connections`]; a slot is held for the
/// whole exchange. Blocking calls are not gated.
///
/// # Examples
///
/// ```no_run
/// use elastinet_transport::{Connection, ConnectionSettings};
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let settings = ConnectionSettings::new("http://localhost:9200")?
///     .maximum_async_connections(20);
/// let connection = Connection::new(settings)?
///     .with_status_handler(|response: &elastinet_transport::Response| {
///         println!("{} {} -> {:?}", response.method(), response.path(), response.status());
///     });
///
/// let response = connection.get("_cluster/health").await?;
/// if response.is_success() {
///     println!("{}", response.text().unwrap_or_default());
/// }
/// # Ok(())
/// # }
/// ```
pub struct Connection<T> {
    settings: Arc<ConnectionSettings>,
    transport: T,
    gate: ConcurrencyGate,
    responses: ResponseBuilder,
}

impl<T> fmt::Debug for Connection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("settings", &self.settings)
            .field("gate", &self.gate)
            .finish_non_exhaustive()
    }
}

impl<T> Connection<T> {
    /// Wire `transport` to `settings`.
    pub fn with_transport(settings: impl Into<Arc<ConnectionSettings>>, transport: T) -> Self {
        let settings = settings.into();
        let gate = ConcurrencyGate::new(settings.max_async_connections());
        let responses = ResponseBuilder::new(
            Arc::new(IgnoreStatus),
            Arc::new(LogTraceHook::new(settings.trace_enabled())),
        );
        Self {
            settings,
            transport,
            gate,
            responses,
        }
    }

    /// Invoke `handler` exactly once per request with its final response.
    #[must_use]
    pub fn with_status_handler(mut self, handler: impl StatusHandler + 'static) -> Self {
        self.responses.set_status_handler(Arc::new(handler));
        self
    }

    /// Replace the default [`LogTraceHook`].
    #[must_use]
    pub fn with_trace_hook(mut self, hook: impl TraceHook + 'static) -> Self {
        self.responses.set_trace_hook(Arc::new(hook));
        self
    }

    pub fn settings(&self) -> &ConnectionSettings {
        &self.settings
    }

    pub fn gate(&self) -> &ConcurrencyGate {
        &self.gate
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Bytes>,
    ) -> Result<RequestDescriptor, ContractFault> {
        build_request(&self.settings, method, path, body)
    }
}

#[cfg(feature = "reqwest")]
impl Connection<ReqwestTransport> {
    /// Connection using [`ReqwestTransport`], serving both blocking and
    /// asynchronous calls.
    pub fn new(settings: ConnectionSettings) -> Result<Self, ConfigError> {
        let transport = ReqwestTransport::from_settings(&settings)?;
        Ok(Self::with_transport(settings, transport))
    }
}

impl<T: BlockingTransport> Connection<T> {
    /// Run one request on the calling thread.
    pub fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<Bytes>,
    ) -> Result<Response, ContractFault> {
        let started = Instant::now();
        let request = self.request(method, path, body)?;
        debug!(%method, uri = %request.uri, "executing blocking request");
        SyncExecutor::new(&self.transport, &self.responses).execute(&request, started)
    }

    pub fn get_sync(&self, path: &str) -> Result<Response, ContractFault> {
        self.execute(Method::Get, path, None)
    }

    pub fn head_sync(&self, path: &str) -> Result<Response, ContractFault> {
        self.execute(Method::Head, path, None)
    }

    pub fn post_sync(&self, path: &str, body: impl Into<Bytes>) -> Result<Response, ContractFault> {
        self.execute(Method::Post, path, Some(body.into()))
    }

    pub fn put_sync(&self, path: &str, body: impl Into<Bytes>) -> Result<Response, ContractFault> {
        self.execute(Method::Put, path, Some(body.into()))
    }

    pub fn delete_sync(&self, path: &str, body: Option<Bytes>) -> Result<Response, ContractFault> {
        self.execute(Method::Delete, path, body)
    }
}

impl<T: Transport> Connection<T> {
    /// Run one request without blocking the calling thread.
    ///
    /// When the connection is bounded, waits up to the configured timeout
    /// for an admission slot. If none frees up, the call resolves to a
    /// failed response with [`FailureKind::AdmissionTimeout`] and no
    /// network attempt is made.
    ///
    /// [`FailureKind::AdmissionTimeout`]: crate::FailureKind::AdmissionTimeout
    pub async fn execute_async(
        &self,
        method: Method,
        path: &str,
        body: Option<Bytes>,
    ) -> Result<Response, ContractFault> {
        let started = Instant::now();
        let request = self.request(method, path, body)?;

        let timeout = self.settings.timeout_duration();
        let Some(slot) = self.gate.acquire(timeout).await else {
            warn!(
                %method,
                uri = %request.uri,
                timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                "no connection slot became available"
            );
            let failure = TransportFailure::admission_timeout(timeout);
            return Ok(self.responses.failed(failure, &request, started));
        };

        debug!(%method, uri = %request.uri, "executing request");
        let response = AsyncPipeline::new(&self.transport, &request)
            .execute(&self.responses, started)
            .await;
        slot.release();
        response
    }

    pub async fn get(&self, path: &str) -> Result<Response, ContractFault> {
        self.execute_async(Method::Get, path, None).await
    }

    pub async fn head(&self, path: &str) -> Result<Response, ContractFault> {
        self.execute_async(Method::Head, path, None).await
    }

    pub async fn post(&self, path: &str, body: impl Into<Bytes>) -> Result<Response, ContractFault> {
        self.execute_async(Method::Post, path, Some(body.into())).await
    }

    pub async fn put(&self, path: &str, body: impl Into<Bytes>) -> Result<Response, ContractFault> {
        self.execute_async(Method::Put, path, Some(body.into())).await
    }

    pub async fn delete(&self, path: &str, body: Option<Bytes>) -> Result<Response, ContractFault> {
        self.execute_async(Method::Delete, path, body).await
    }
}
