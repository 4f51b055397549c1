//! Reconstruct the absolute URL of the current request (without its query).
//!
//! This is the "request URL" half of the service URL. It must come out the
//! same way here as when the login redirect to CAS was built, so keep both
//! sides on this function.

use axum::http::{HeaderMap, Uri, header};

pub fn request_url(headers: &HeaderMap, uri: &Uri, public_base_url: Option<&str>) -> String {
    if let Some(base) = public_base_url {
        if let Ok(url) = request_url_from_base(base, uri) {
            return url;
        }
        // If PUBLIC_BASE_URL is misconfigured, fall back to forwarded headers.
    }
    request_url_from_forwarded(headers, uri)
}

fn request_url_from_base(base: &str, uri: &Uri) -> Result<String, url::ParseError> {
    // `base` should be like: https://app.example.org
    let mut url = url::Url::parse(base)?;

    url.set_path(uri.path());
    url.set_query(None);
    url.set_fragment(None);

    Ok(url.to_string())
}

fn request_url_from_forwarded(headers: &HeaderMap, uri: &Uri) -> String {
    // Prefer proxy headers when present.
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("http");

    let host = headers
        .get("x-forwarded-host")
        .or_else(|| headers.get(header::HOST))
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");

    format!("{}://{}{}", scheme, host, uri.path())
}
