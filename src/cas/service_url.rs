//! Service URL canonicalization.
//!
//! The service URL sent to `serviceValidate` must match the one used when the
//! login redirect was issued, byte for byte apart from the `ticket` parameter.
//! Nothing here normalizes case, paths or ports: `ticket` is removed and the
//! rest of the URL is reassembled as it came in.

use std::fmt;

use url::form_urlencoded;

/// Query parameter CAS uses to hand the service ticket back to the application.
pub const TICKET_PARAM: &str = "ticket";

/// Absolute URL of the protected resource, guaranteed free of a `ticket` parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServiceUrl(String);

impl ServiceUrl {
    /// Build a service URL from an arbitrary absolute URL, stripping `ticket`.
    pub fn new(url: &str) -> Self {
        Self(strip_ticket(url))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ServiceUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ServiceUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<ServiceUrl> for String {
    fn from(url: ServiceUrl) -> Self {
        url.0
    }
}

/// Drop every `ticket` query parameter from `url`, preserving everything else.
///
/// The remaining pairs keep their original order and are re-encoded as
/// `application/x-www-form-urlencoded`. An emptied query (or fragment) is
/// dropped together with its `?` (or `#`) separator.
pub fn strip_ticket(url: &str) -> String {
    let (rest, fragment) = match url.split_once('#') {
        Some((rest, fragment)) => (rest, Some(fragment)),
        None => (url, None),
    };
    let (base, query) = match rest.split_once('?') {
        Some((base, query)) => (base, Some(query)),
        None => (rest, None),
    };

    let mut out = String::with_capacity(url.len());
    out.push_str(base);

    if let Some(query) = query {
        let kept = strip_ticket_from_query(query);
        if !kept.is_empty() {
            out.push('?');
            out.push_str(&kept);
        }
    }

    if let Some(fragment) = fragment.filter(|f| !f.is_empty()) {
        out.push('#');
        out.push_str(fragment);
    }

    out
}

fn strip_ticket_from_query(query: &str) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        if key != TICKET_PARAM {
            serializer.append_pair(&key, &value);
        }
    }
    serializer.finish()
}

/// Derive the service URL for the current request.
///
/// - `request_url`: the requested URL without its query string
/// - `query_string`: the raw query string, if any (without the leading `?`)
///
/// Without a query string the request URL is returned unchanged.
pub fn build_service_url(request_url: &str, query_string: Option<&str>) -> ServiceUrl {
    match query_string.filter(|q| !q.is_empty()) {
        Some(query) => ServiceUrl::new(&format!("{}?{}", request_url, query)),
        None => ServiceUrl(request_url.to_string()),
    }
}
