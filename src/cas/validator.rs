//! CAS `serviceValidate` ticket validation.
//!
//! One validation is one GET against the CAS server. Nothing is retried and
//! nothing escapes as an error: transport, TLS and parse failures all end in a
//! `ValidationOutcome`, which is handed to the configured observer before it
//! is returned.

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use url::form_urlencoded;

use crate::cas::observer::{TracingObserver, ValidationObserver};
use crate::cas::outcome::{
    TlsFailure, TransportFailure, TransportFailureKind, UserId, ValidationOutcome,
};
use crate::cas::response::ServiceResponse;
use crate::config::{CasConfig, ClientConfig};
use crate::error::CasError;

pub const SERVICE_VALIDATE_PATH: &str = "/serviceValidate";

/// Build the `serviceValidate` URL.
///
/// The service URL is percent-encoded as a single query value. The ticket is
/// appended as-is: CAS tickets are URL-safe.
pub fn validation_url(cas_server_url: &str, service_url: &str, ticket: &str) -> String {
    let service: String = form_urlencoded::byte_serialize(service_url.as_bytes()).collect();
    format!(
        "{}{}?service={}&ticket={}",
        cas_server_url.trim_end_matches('/'),
        SERVICE_VALIDATE_PATH,
        service,
        ticket
    )
}

/// Validates service tickets against a CAS server.
///
/// Cheap to clone; clones share the HTTP connection pool.
#[derive(Clone)]
pub struct TicketValidator {
    client: reqwest::Client,
    observer: Arc<dyn ValidationObserver>,
}

impl fmt::Debug for TicketValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TicketValidator")
            .field("client", &self.client)
            .finish_non_exhaustive()
    }
}

impl TicketValidator {
    /// Validator with its own HTTP client, reporting through `tracing`.
    pub fn new(config: &ClientConfig) -> Result<Self, CasError> {
        let client = config.build_client()?;
        Ok(Self::with_client(client, Arc::new(TracingObserver)))
    }

    pub fn from_config(config: &CasConfig) -> Result<Self, CasError> {
        Self::new(&config.client)
    }

    /// Use a caller-provided client (it must keep certificate validation on).
    pub fn with_client(client: reqwest::Client, observer: Arc<dyn ValidationObserver>) -> Self {
        Self { client, observer }
    }

    pub fn with_observer(mut self, observer: Arc<dyn ValidationObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Validate `ticket` for `service_url` and report the detailed outcome.
    pub async fn validate(
        &self,
        ticket: &str,
        cas_server_url: &str,
        service_url: &str,
    ) -> ValidationOutcome {
        let url = validation_url(cas_server_url, service_url, ticket);
        let outcome = self.exchange(&url).await;
        self.observer.observe(&url, &outcome);
        outcome
    }

    /// Same as `validate`, collapsed to the authenticated user (if any).
    pub async fn validate_ticket(
        &self,
        ticket: &str,
        cas_server_url: &str,
        service_url: &str,
    ) -> Option<UserId> {
        self.validate(ticket, cas_server_url, service_url)
            .await
            .into_user_id()
    }

    async fn exchange(&self, url: &str) -> ValidationOutcome {
        // 1) request
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => return classify_request_error(&e, TransportFailureKind::Request),
        };

        // 2) status
        let status = response.status();
        if !status.is_success() {
            return ValidationOutcome::TransportFailure(TransportFailure::status(status));
        }

        // 3) body
        let body = match response.bytes().await {
            Ok(body) => body,
            Err(e) => return classify_request_error(&e, TransportFailureKind::Body),
        };

        // 4) CAS document
        match ServiceResponse::parse(&body) {
            Ok(ServiceResponse::Success { user: Some(user) }) => {
                ValidationOutcome::Success(UserId::new(user))
            }
            Ok(ServiceResponse::Success { user: None }) => ValidationOutcome::MalformedResponse(
                "authenticationSuccess without user".to_string(),
            ),
            Ok(ServiceResponse::Failure { code, .. }) => ValidationOutcome::AuthFailure(code),
            Ok(ServiceResponse::Unrecognized) => ValidationOutcome::AuthFailure(None),
            Err(e) => ValidationOutcome::MalformedResponse(e.to_string()),
        }
    }
}

/// Validate `ticket` with a default client (10 s timeout) and `tracing` diagnostics.
///
/// Prefer keeping a `TicketValidator` around; this builds a fresh client per call.
pub async fn validate_ticket(ticket: &str, cas_server_url: &str, service_url: &str) -> Option<UserId> {
    match TicketValidator::new(&ClientConfig::default()) {
        Ok(validator) => {
            validator
                .validate_ticket(ticket, cas_server_url, service_url)
                .await
        }
        Err(e) => {
            tracing::warn!(error = %e, "ticket validation failed: could not build http client");
            None
        }
    }
}

// `fallback` is used for errors that are neither TLS, timeout nor connect errors.
fn classify_request_error(err: &reqwest::Error, fallback: TransportFailureKind) -> ValidationOutcome {
    if let Some(tls) = find_tls_error(err) {
        return ValidationOutcome::TlsFailure(tls);
    }

    let kind = if err.is_timeout() {
        TransportFailureKind::Timeout
    } else if err.is_connect() {
        TransportFailureKind::Connect
    } else {
        fallback
    };

    ValidationOutcome::TransportFailure(TransportFailure::new(kind, error_chain(err)))
}

/// Walk the source chain looking for a rustls error.
///
/// hyper-util and tokio-rustls report TLS failures as `io::Error`s wrapping
/// `io::Error`s wrapping `rustls::Error`. `io::Error::source` skips the
/// wrapped error, so step into each layer with `get_ref` instead.
fn find_tls_error(err: &(dyn StdError + 'static)) -> Option<TlsFailure> {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(tls) = e.downcast_ref::<rustls::Error>() {
            return Some(TlsFailure::from_rustls(tls));
        }
        current = match e.downcast_ref::<std::io::Error>() {
            Some(io) => match io.get_ref() {
                Some(inner) => Some(inner as &(dyn StdError + 'static)),
                None => e.source(),
            },
            None => e.source(),
        };
    }
    None
}

// reqwest's Display omits the underlying cause ("error sending request"), so join the chain.
fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut out = err.to_string();
    let mut current = err.source();
    while let Some(e) = current {
        out.push_str(": ");
        out.push_str(&e.to_string());
        current = e.source();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cas::outcome::TlsFailureKind;

    #[test]
    fn builds_validation_url() {
        let url = validation_url(
            "https://cas.example.org",
            "https://app.example.org/secure?foo=bar",
            "ST-123-abc",
        );
        assert_eq!(
            url,
            "https://cas.example.org/serviceValidate?service=https%3A%2F%2Fapp.example.org%2Fsecure%3Ffoo%3Dbar&ticket=ST-123-abc"
        );
    }

    #[test]
    fn validation_url_ignores_trailing_slash_on_server() {
        let url = validation_url("https://cas.example.org/cas/", "https://app.example.org/", "ST-1");
        assert_eq!(
            url,
            "https://cas.example.org/cas/serviceValidate?service=https%3A%2F%2Fapp.example.org%2F&ticket=ST-1"
        );
    }

    #[test]
    fn finds_certificate_error_inside_io_error() {
        let err = std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            rustls::Error::InvalidCertificate(rustls::CertificateError::UnknownIssuer),
        );
        let tls = find_tls_error(&err).expect("tls error expected");
        assert_eq!(tls.kind, TlsFailureKind::Certificate);
    }

    #[derive(Debug)]
    struct Wrapper(std::io::Error);

    impl fmt::Display for Wrapper {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("client error (Connect)")
        }
    }

    impl StdError for Wrapper {
        fn source(&self) -> Option<&(dyn StdError + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn finds_handshake_error_deeper_in_chain() {
        let err = Wrapper(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            rustls::Error::AlertReceived(rustls::AlertDescription::HandshakeFailure),
        ));
        let tls = find_tls_error(&err).expect("tls error expected");
        assert_eq!(tls.kind, TlsFailureKind::Handshake);
    }

    #[test]
    fn finds_certificate_error_under_nested_io_errors() {
        // hyper-util's connect error: Other(InvalidData(rustls::Error))
        let err = Wrapper(std::io::Error::other(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            rustls::Error::InvalidCertificate(rustls::CertificateError::UnknownIssuer),
        )));
        let tls = find_tls_error(&err).expect("tls error expected");
        assert_eq!(tls.kind, TlsFailureKind::Certificate);
        assert!(tls.reason.contains("UnknownIssuer"), "{}", tls.reason);
    }

    #[test]
    fn plain_io_errors_are_not_tls() {
        let err = Wrapper(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "connection refused",
        ));
        assert!(find_tls_error(&err).is_none());
        assert_eq!(
            error_chain(&err),
            "client error (Connect): connection refused"
        );
    }
}
