//! Production transport backed by `reqwest`.
//!
//! Proxy and client certificates are client-wide in reqwest, so they are
//! applied when a client is built. Everything else (URI, method, headers,
//! timeout, body) is taken from each [`RequestDescriptor`].

use std::io::Read;
use std::sync::{Arc, OnceLock};

use bytes::Bytes;
use tracing::{debug, warn};

use super::transport::{
    BlockingExchange, BlockingTransport, Exchange, ResponseBody, ResponseHead, Transport,
};
use crate::data::{ClientCertificate, ConnectionSettings, Method, ProxyConfig, RequestDescriptor};
use crate::error::{ConfigError, ContractFault, ExchangeError, TransportFailure};

fn to_reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Head => reqwest::Method::HEAD,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Delete => reqwest::Method::DELETE,
    }
}

/// Sort a reqwest error into the failure taxonomy.
fn classify(e: reqwest::Error) -> ExchangeError {
    if e.is_builder() {
        ContractFault::InvalidRequest(e.to_string()).into()
    } else if e.is_timeout() {
        TransportFailure::protocol_timeout(e.to_string()).into()
    } else {
        TransportFailure::transport(e.to_string()).into()
    }
}

/// Client-wide options shared by the async and the blocking client.
#[derive(Debug, Clone, Default)]
struct ClientSetup {
    proxy: Option<ProxyConfig>,
    certificates: Arc<[ClientCertificate]>,
}

impl ClientSetup {
    fn from_settings(settings: &ConnectionSettings) -> Self {
        let certificates = settings.client_certificates();
        if certificates.len() > 1 {
            warn!(
                count = certificates.len(),
                "reqwest supports a single client identity; using the first certificate"
            );
        }
        Self {
            proxy: settings.proxy_config().cloned(),
            certificates: Arc::clone(certificates),
        }
    }

    fn proxy(&self) -> reqwest::Result<Option<reqwest::Proxy>> {
        let Some(config) = &self.proxy else {
            return Ok(None);
        };
        let mut proxy = reqwest::Proxy::all(config.address.as_str())?;
        if let Some(username) = &config.username {
            proxy = proxy.basic_auth(username, config.password.as_deref().unwrap_or_default());
        }
        Ok(Some(proxy))
    }

    fn identity(&self) -> reqwest::Result<Option<reqwest::Identity>> {
        self.certificates
            .first()
            .map(|cert| reqwest::Identity::from_pkcs12_der(cert.der(), cert.password()))
            .transpose()
    }

    fn async_client(&self) -> reqwest::Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder().tcp_nodelay(true);
        if let Some(proxy) = self.proxy()? {
            builder = builder.proxy(proxy);
        }
        if let Some(identity) = self.identity()? {
            builder = builder.identity(identity);
        }
        builder.build()
    }

    fn blocking_client(&self) -> reqwest::Result<reqwest::blocking::Client> {
        let mut builder = reqwest::blocking::Client::builder().tcp_nodelay(true);
        if let Some(proxy) = self.proxy()? {
            builder = builder.proxy(proxy);
        }
        if let Some(identity) = self.identity()? {
            builder = builder.identity(identity);
        }
        builder.build()
    }
}

/// Transport serving both asynchronous and blocking calls with `reqwest`.
///
/// Asynchronous calls use a `reqwest::Client` built up front. Blocking calls
/// use a `reqwest::blocking::Client` with the same proxy and identity, built
/// on the first blocking call and shared by every clone of the transport.
///
/// reqwest's blocking client runs its own runtime, so blocking calls must
/// not be made from inside an asynchronous task. Use a plain thread or
/// `tokio::task::spawn_blocking`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    blocking: Arc<OnceLock<reqwest::blocking::Client>>,
    setup: ClientSetup,
}

impl ReqwestTransport {
    pub fn from_settings(settings: &ConnectionSettings) -> Result<Self, ConfigError> {
        let setup = ClientSetup::from_settings(settings);
        Ok(Self {
            client: setup.async_client()?,
            blocking: Arc::default(),
            setup,
        })
    }

    /// Use a preconfigured client for asynchronous calls. Blocking calls get
    /// a client without proxy or identity.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            blocking: Arc::default(),
            setup: ClientSetup::default(),
        }
    }

    fn blocking_client(&self) -> Result<&reqwest::blocking::Client, ExchangeError> {
        if let Some(client) = self.blocking.get() {
            return Ok(client);
        }
        debug!("building blocking client");
        let client = self.setup.blocking_client().map_err(classify)?;
        Ok(self.blocking.get_or_init(|| client))
    }
}

/// A request staged on the async client.
///
/// reqwest connects and streams the body only once the request is sent, so
/// opening the stream and writing the body merely stage the request. Connect
/// and write failures surface from [`Exchange::response`].
pub struct ReqwestExchange {
    request: reqwest::RequestBuilder,
    body: Option<Bytes>,
}

pub struct ReqwestBody {
    response: reqwest::Response,
}

impl Transport for ReqwestTransport {
    type Exchange = ReqwestExchange;

    fn begin(&self, request: &RequestDescriptor) -> Result<ReqwestExchange, ExchangeError> {
        let mut builder = self
            .client
            .request(to_reqwest_method(request.method), request.uri.clone())
            .timeout(request.timeout);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        Ok(ReqwestExchange {
            request: builder,
            body: None,
        })
    }
}

impl Exchange for ReqwestExchange {
    type Body = ReqwestBody;

    async fn open_request_stream(&mut self) -> Result<(), ExchangeError> {
        Ok(())
    }

    async fn write_body(&mut self, body: Bytes) -> Result<(), ExchangeError> {
        if self.body.replace(body).is_some() {
            return Err(ContractFault::ExchangeReused.into());
        }
        Ok(())
    }

    async fn response(self) -> Result<ResponseHead<ReqwestBody>, ExchangeError> {
        let mut request = self.request;
        if let Some(body) = self.body {
            request = request.body(body);
        }
        let response = request.send().await.map_err(classify)?;
        Ok(ResponseHead {
            status: response.status().as_u16(),
            body: ReqwestBody { response },
        })
    }
}

impl ResponseBody for ReqwestBody {
    async fn read_chunk(&mut self) -> Result<Bytes, ExchangeError> {
        loop {
            match self.response.chunk().await.map_err(classify)? {
                Some(chunk) if chunk.is_empty() => continue,
                Some(chunk) => return Ok(chunk),
                None => return Ok(Bytes::new()),
            }
        }
    }
}

/// A request staged on the blocking client. As with [`ReqwestExchange`],
/// the body is sent by [`BlockingExchange::response`].
pub struct BlockingReqwestExchange {
    request: reqwest::blocking::RequestBuilder,
    body: Option<Vec<u8>>,
}

pub struct BlockingReqwestBody {
    response: reqwest::blocking::Response,
}

impl Read for BlockingReqwestBody {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.response.read(buf)
    }
}

impl BlockingTransport for ReqwestTransport {
    type Exchange = BlockingReqwestExchange;

    fn begin_blocking(
        &self,
        request: &RequestDescriptor,
    ) -> Result<BlockingReqwestExchange, ExchangeError> {
        let mut builder = self
            .blocking_client()?
            .request(to_reqwest_method(request.method), request.uri.clone())
            .timeout(request.timeout);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        Ok(BlockingReqwestExchange {
            request: builder,
            body: None,
        })
    }
}

impl BlockingExchange for BlockingReqwestExchange {
    type Body = BlockingReqwestBody;

    fn write_body(&mut self, body: &[u8]) -> Result<(), ExchangeError> {
        if self.body.replace(body.to_vec()).is_some() {
            return Err(ContractFault::ExchangeReused.into());
        }
        Ok(())
    }

    fn response(self) -> Result<ResponseHead<BlockingReqwestBody>, ExchangeError> {
        let mut request = self.request;
        if let Some(body) = self.body {
            request = request.body(body);
        }
        let response = request.send().map_err(classify)?;
        Ok(ResponseHead {
            status: response.status().as_u16(),
            body: BlockingReqwestBody { response },
        })
    }
}
