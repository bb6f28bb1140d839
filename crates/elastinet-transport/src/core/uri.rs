use url::Url;

/// Resolve `path` against `base` and append the global query parameters.
///
/// Parameters are appended with `?` when the resolved URI has no query yet
/// and with `&` otherwise. Credentials are removed from the result; they
/// travel in the `Authorization` header instead.
///
/// # Examples
///
/// ```
/// use elastinet_transport::core::request_uri;
/// use url::Url;
///
/// let base = Url::parse("http://localhost:9200/").unwrap();
/// let params = vec![("pretty".to_string(), "true".to_string())];
///
/// let uri = request_uri(&base, "index/_search", &params).unwrap();
/// assert_eq!(uri.as_str(), "http://localhost:9200/index/_search?pretty=true");
///
/// let uri = request_uri(&base, "index/_search?q=x", &params).unwrap();
/// assert_eq!(uri.as_str(), "http://localhost:9200/index/_search?q=x&pretty=true");
/// ```
pub fn request_uri(
    base: &Url,
    path: &str,
    query: &[(String, String)],
) -> Result<Url, url::ParseError> {
    let mut uri = if path.is_empty() {
        base.clone()
    } else {
        base.join(path)?
    };

    if !query.is_empty() {
        uri.query_pairs_mut().extend_pairs(query);
    }

    // Both only fail for URIs that cannot be a base, which `join` never yields.
    let _ = uri.set_username("");
    let _ = uri.set_password(None);

    Ok(uri)
}
