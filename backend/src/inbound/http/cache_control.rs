//! Shared response header policies for HTTP handlers.

use actix_web::http::header::{CACHE_CONTROL, HeaderName, X_CONTENT_TYPE_OPTIONS};

/// Command replies must never be reused without revalidation.
pub const NO_CACHE: &str = "no-cache";

/// Static assets are fingerprinted by the front-end build and never change.
pub const IMMUTABLE_ASSET: &str = "max-age=31536000, immutable";

/// Content type of every command reply.
pub const JSON_UTF8: &str = "application/json; charset=UTF-8";

/// Cache-control header tuple for command replies.
pub const fn no_cache_header() -> (HeaderName, &'static str) {
    (CACHE_CONTROL, NO_CACHE)
}

/// Cache-control header tuple for static assets.
pub const fn immutable_asset_header() -> (HeaderName, &'static str) {
    (CACHE_CONTROL, IMMUTABLE_ASSET)
}

/// Disable MIME sniffing in browsers.
pub const fn nosniff_header() -> (HeaderName, &'static str) {
    (X_CONTENT_TYPE_OPTIONS, "nosniff")
}
