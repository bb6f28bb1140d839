use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use url::Url;

use super::settings::{ClientCertificate, ProxyConfig};

/// HTTP methods the transport issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully configured outbound request.
///
/// Owned by whichever executor runs the call and dropped once the call
/// completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    /// Absolute target URI, with credentials removed.
    pub uri: Url,
    pub method: Method,
    pub body: Option<Bytes>,
    /// Applies to the request as a whole and to each read/write.
    pub timeout: Duration,
    pub headers: Vec<(String, String)>,
    pub proxy: Option<ProxyConfig>,
    pub client_certificates: Arc<[ClientCertificate]>,
}

impl RequestDescriptor {
    /// Get the first header value matching `name` (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}
