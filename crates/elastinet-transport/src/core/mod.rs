//! Pure transformations for request construction.
//!
//! Nothing in this module performs I/O; identical inputs always produce
//! identical outputs.

mod auth;
mod request;
mod status;
mod uri;

pub use auth::basic_authorization;
pub use request::{CAT_API_PREFIX, JSON_CONTENT_TYPE, build_request, is_cat_api};
pub use status::is_success_status;
pub use uri::request_uri;
