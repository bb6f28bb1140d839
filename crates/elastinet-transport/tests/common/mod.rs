//! Scripted transports shared by the integration tests.

#![allow(dead_code)]

use std::io::{self, Cursor, Read};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use elastinet_transport::{
    BlockingExchange, BlockingTransport, ContractFault, Exchange, ExchangeError,
    RequestDescriptor, Response, ResponseBody, ResponseHead, Transport, TransportFailure,
};

/// Steps of an exchange, in the order a transport sees them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Begin,
    OpenStream,
    WriteBody,
    Response,
    ReadChunk,
}

#[derive(Debug, Clone)]
enum Trouble {
    Failure(TransportFailure),
    Fault,
}

impl Trouble {
    fn raise(&self) -> ExchangeError {
        match self {
            Trouble::Failure(f) => f.clone().into(),
            Trouble::Fault => ContractFault::InvalidRequest("scripted fault".to_string()).into(),
        }
    }
}

#[derive(Default)]
struct Shared {
    status: u16,
    body: Vec<u8>,
    chunk_size: usize,
    trouble: Option<(Step, Trouble)>,
    response_delay: Duration,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    requests: Mutex<Vec<RequestDescriptor>>,
    steps: Mutex<Vec<Step>>,
    written: Mutex<Vec<Bytes>>,
}

impl Shared {
    fn step(&self, step: Step) -> Result<(), ExchangeError> {
        self.steps.lock().unwrap().push(step);
        match &self.trouble {
            Some((at, trouble)) if *at == step => Err(trouble.raise()),
            _ => Ok(()),
        }
    }
}

/// Counts an exchange as in flight until dropped.
struct InFlight(Arc<Shared>);

impl InFlight {
    fn enter(shared: &Arc<Shared>) -> Self {
        let now = shared.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        shared.max_in_flight.fetch_max(now, Ordering::SeqCst);
        Self(Arc::clone(shared))
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Deterministic transport that answers from a script and records what
/// it was asked to do.
#[derive(Clone)]
pub struct StubTransport {
    shared: Arc<Shared>,
}

impl StubTransport {
    pub fn responding(status: u16, body: &str) -> Self {
        Self {
            shared: Arc::new(Shared {
                status,
                body: body.as_bytes().to_vec(),
                chunk_size: 4,
                ..Shared::default()
            }),
        }
    }

    pub fn failing_at(step: Step, failure: TransportFailure) -> Self {
        Self::responding(200, "{}").with_trouble(step, Trouble::Failure(failure))
    }

    pub fn faulting_at(step: Step) -> Self {
        Self::responding(200, "{}").with_trouble(step, Trouble::Fault)
    }

    fn with_trouble(self, step: Step, trouble: Trouble) -> Self {
        self.map(|s| s.trouble = Some((step, trouble)))
    }

    /// Delay before the response head is produced.
    pub fn with_delay(self, delay: Duration) -> Self {
        self.map(|s| s.response_delay = delay)
    }

    fn map(self, f: impl FnOnce(&mut Shared)) -> Self {
        let mut shared = Arc::try_unwrap(self.shared)
            .unwrap_or_else(|_| panic!("stub configured after being shared"));
        f(&mut shared);
        Self {
            shared: Arc::new(shared),
        }
    }

    /// Number of exchanges started.
    pub fn calls(&self) -> usize {
        self.shared.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.shared.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn in_flight(&self) -> usize {
        self.shared.in_flight.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<RequestDescriptor> {
        self.shared.requests.lock().unwrap().clone()
    }

    pub fn steps(&self) -> Vec<Step> {
        self.shared.steps.lock().unwrap().clone()
    }

    pub fn written(&self) -> Vec<Bytes> {
        self.shared.written.lock().unwrap().clone()
    }

    fn start(&self, request: &RequestDescriptor) -> Result<InFlight, ExchangeError> {
        self.shared.calls.fetch_add(1, Ordering::SeqCst);
        self.shared.requests.lock().unwrap().push(request.clone());
        let guard = InFlight::enter(&self.shared);
        self.shared.step(Step::Begin)?;
        Ok(guard)
    }
}

pub struct StubExchange {
    guard: InFlight,
}

pub struct StubBody {
    guard: InFlight,
    remaining: Bytes,
}

impl Transport for StubTransport {
    type Exchange = StubExchange;

    fn begin(&self, request: &RequestDescriptor) -> Result<StubExchange, ExchangeError> {
        Ok(StubExchange {
            guard: self.start(request)?,
        })
    }
}

impl Exchange for StubExchange {
    type Body = StubBody;

    async fn open_request_stream(&mut self) -> Result<(), ExchangeError> {
        tokio::task::yield_now().await;
        self.guard.0.step(Step::OpenStream)
    }

    async fn write_body(&mut self, body: Bytes) -> Result<(), ExchangeError> {
        tokio::task::yield_now().await;
        self.guard.0.step(Step::WriteBody)?;
        self.guard.0.written.lock().unwrap().push(body);
        Ok(())
    }

    async fn response(self) -> Result<ResponseHead<StubBody>, ExchangeError> {
        let shared = Arc::clone(&self.guard.0);
        tokio::time::sleep(shared.response_delay).await;
        shared.step(Step::Response)?;
        Ok(ResponseHead {
            status: shared.status,
            body: StubBody {
                remaining: Bytes::from(shared.body.clone()),
                guard: self.guard,
            },
        })
    }
}

impl ResponseBody for StubBody {
    async fn read_chunk(&mut self) -> Result<Bytes, ExchangeError> {
        tokio::task::yield_now().await;
        self.guard.0.step(Step::ReadChunk)?;
        let n = self.guard.0.chunk_size.min(self.remaining.len());
        Ok(self.remaining.split_to(n))
    }
}

pub struct BlockingStubExchange {
    guard: InFlight,
}

pub struct BlockingStubBody {
    guard: InFlight,
    inner: Cursor<Vec<u8>>,
}

impl Read for BlockingStubBody {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if let Err(e) = self.guard.0.step(Step::ReadChunk) {
            return Err(io::Error::new(io::ErrorKind::ConnectionReset, e.to_string()));
        }
        self.inner.read(buf)
    }
}

impl BlockingTransport for StubTransport {
    type Exchange = BlockingStubExchange;

    fn begin_blocking(
        &self,
        request: &RequestDescriptor,
    ) -> Result<BlockingStubExchange, ExchangeError> {
        Ok(BlockingStubExchange {
            guard: self.start(request)?,
        })
    }
}

impl BlockingExchange for BlockingStubExchange {
    type Body = BlockingStubBody;

    fn write_body(&mut self, body: &[u8]) -> Result<(), ExchangeError> {
        self.guard.0.step(Step::OpenStream)?;
        self.guard.0.step(Step::WriteBody)?;
        self.guard
            .0
            .written
            .lock()
            .unwrap()
            .push(Bytes::copy_from_slice(body));
        Ok(())
    }

    fn response(self) -> Result<ResponseHead<BlockingStubBody>, ExchangeError> {
        let shared = Arc::clone(&self.guard.0);
        std::thread::sleep(shared.response_delay);
        shared.step(Step::Response)?;
        Ok(ResponseHead {
            status: shared.status,
            body: BlockingStubBody {
                inner: Cursor::new(shared.body.clone()),
                guard: self.guard,
            },
        })
    }
}

/// Status handler that keeps every response it is given.
#[derive(Clone, Default)]
pub struct Collected(pub Arc<Mutex<Vec<Response>>>);

impl Collected {
    pub fn handler(&self) -> impl Fn(&Response) + Send + Sync + 'static {
        let seen = Arc::clone(&self.0);
        move |response: &Response| seen.lock().unwrap().push(response.clone())
    }

    pub fn count(&self) -> usize {
        self.0.lock().unwrap().len()
    }

    pub fn last(&self) -> Option<Response> {
        self.0.lock().unwrap().last().cloned()
    }
}

/// Route `tracing` output to the test harness. Filter with `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
