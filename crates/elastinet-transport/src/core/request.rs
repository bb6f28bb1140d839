use bytes::Bytes;

use super::auth::basic_authorization;
use super::uri::request_uri;
use crate::data::{ConnectionSettings, Method, RequestDescriptor};
use crate::error::ContractFault;

/// Content type negotiated for every API except the cat family.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Paths with this prefix return plain text.
pub const CAT_API_PREFIX: &str = "_cat";

/// Returns `true` if `path` addresses the plain-text cat APIs.
pub fn is_cat_api(path: &str) -> bool {
    path.starts_with(CAT_API_PREFIX)
}

/// Build the descriptor for one call.
///
/// Steps, in order:
/// 1. resolve `path` against the endpoint and append global query parameters
/// 2. set the method
/// 3. negotiate JSON unless `path` addresses the cat APIs
/// 4. attach client certificates
/// 5. apply the configured timeout
/// 6. add basic auth when the endpoint carries user-info
/// 7. attach the proxy when one is configured
///
/// # Errors
///
/// Returns [`ContractFault::InvalidPath`] if `path` cannot be resolved
/// against the endpoint.
///
/// # Examples
///
/// ```
/// use elastinet_transport::core::build_request;
/// use elastinet_transport::{ConnectionSettings, Method};
///
/// let settings = ConnectionSettings::default();
/// let request = build_request(&settings, Method::Get, "_cat/health", None).unwrap();
///
/// assert_eq!(request.uri.as_str(), "http://localhost:9200/_cat/health");
/// assert_eq!(request.header("Content-Type"), None);
/// ```
pub fn build_request(
    settings: &ConnectionSettings,
    method: Method,
    path: &str,
    body: Option<Bytes>,
) -> Result<RequestDescriptor, ContractFault> {
    let uri = request_uri(settings.uri(), path, settings.query_parameters()).map_err(|source| {
        ContractFault::InvalidPath {
            path: path.to_string(),
            source,
        }
    })?;

    let mut headers = Vec::new();
    if !is_cat_api(path) {
        headers.push(("Accept".to_string(), JSON_CONTENT_TYPE.to_string()));
        headers.push(("Content-Type".to_string(), JSON_CONTENT_TYPE.to_string()));
    }

    let client_certificates = settings.client_certificates().clone();
    let timeout = settings.timeout_duration();

    if let Some(value) = basic_authorization(settings.uri()) {
        headers.push(("Authorization".to_string(), value));
    }

    let proxy = settings.proxy_config().cloned();

    Ok(RequestDescriptor {
        uri,
        method,
        body,
        timeout,
        headers,
        proxy,
        client_certificates,
    })
}
