/// Returns `true` if the HTTP status code indicates success (2xx).
///
/// # Examples
///
/// ```
/// use elastinet_transport::core::is_success_status;
///
/// assert!(is_success_status(200));
/// assert!(is_success_status(201));
/// assert!(!is_success_status(404));
/// ```
pub fn is_success_status(status: u16) -> bool {
    (200..300).contains(&status)
}
