//! Result of a single ticket validation.
//!
//! Every path through the validator ends in exactly one `ValidationOutcome`.
//! Callers that only need "authenticated or not" use `user_id()` /
//! `is_authenticated()`; the other variants exist for diagnostics.

use std::fmt;

use tracing::Level;

/// Authenticated user identifier returned by the CAS server.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportFailureKind {
    // DNS resolution / TCP connect
    Connect,
    // request or body read exceeded the configured timeout
    Timeout,
    // non-2xx HTTP status
    Status,
    // failure while reading the response body
    Body,
    // anything else reqwest reports (invalid url, redirect loop, ...)
    Request,
}

impl fmt::Display for TransportFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Connect => "connect",
            Self::Timeout => "timeout",
            Self::Status => "status",
            Self::Body => "body",
            Self::Request => "request",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportFailure {
    pub kind: TransportFailureKind,
    /// HTTP status code, for `TransportFailureKind::Status`.
    pub status: Option<u16>,
    pub reason: String,
}

impl TransportFailure {
    pub fn new(kind: TransportFailureKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            status: None,
            reason: reason.into(),
        }
    }

    pub fn status(status: reqwest::StatusCode) -> Self {
        Self {
            kind: TransportFailureKind::Status,
            status: Some(status.as_u16()),
            reason: status.canonical_reason().unwrap_or("unknown").to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsFailureKind {
    Certificate,
    Handshake,
}

impl fmt::Display for TlsFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Certificate => f.write_str("certificate"),
            Self::Handshake => f.write_str("handshake"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsFailure {
    pub kind: TlsFailureKind,
    pub reason: String,
}

impl TlsFailure {
    pub fn from_rustls(err: &rustls::Error) -> Self {
        let kind = match err {
            rustls::Error::InvalidCertificate(_) => TlsFailureKind::Certificate,
            _ => TlsFailureKind::Handshake,
        };
        Self {
            kind,
            reason: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    Success(UserId),
    TransportFailure(TransportFailure),
    TlsFailure(TlsFailure),
    /// Body was not a well-formed CAS document, or a success element carried no user.
    MalformedResponse(String),
    /// CAS rejected the ticket; carries the `code` attribute when present.
    AuthFailure(Option<String>),
}

impl ValidationOutcome {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn user_id(&self) -> Option<&UserId> {
        match self {
            Self::Success(user) => Some(user),
            _ => None,
        }
    }

    pub fn into_user_id(self) -> Option<UserId> {
        match self {
            Self::Success(user) => Some(user),
            _ => None,
        }
    }

    /// Log level this outcome is reported at.
    ///
    /// Transport and TLS problems are warnings, rejected tickets are info.
    /// Malformed bodies never reach warning level.
    pub fn severity(&self) -> Level {
        match self {
            Self::TransportFailure(_) | Self::TlsFailure(_) => Level::WARN,
            Self::AuthFailure(_) => Level::INFO,
            Self::Success(_) | Self::MalformedResponse(_) => Level::DEBUG,
        }
    }
}

impl fmt::Display for ValidationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success(user) => write!(f, "service ticket validated for '{}'", user),
            Self::TransportFailure(e) => match e.status {
                Some(code) => write!(
                    f,
                    "ticket validation failed: status code: {}, reason: {}",
                    code, e.reason
                ),
                None => write!(f, "ticket validation failed: {} error: {}", e.kind, e.reason),
            },
            Self::TlsFailure(e) => {
                write!(f, "ticket validation failed: tls {} error: {}", e.kind, e.reason)
            }
            Self::MalformedResponse(reason) => {
                write!(f, "ticket validation failed: malformed response: {}", reason)
            }
            Self::AuthFailure(Some(code)) => write!(
                f,
                "authentication failed: service ticket validation returned '{}'",
                code
            ),
            Self::AuthFailure(None) => {
                write!(f, "authentication failed: could not validate service ticket")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_success_is_authenticated() {
        let ok = ValidationOutcome::Success(UserId::new("alice"));
        assert!(ok.is_authenticated());
        assert_eq!(ok.user_id().map(UserId::as_str), Some("alice"));

        let failures = [
            ValidationOutcome::TransportFailure(TransportFailure::new(
                TransportFailureKind::Connect,
                "connection refused",
            )),
            ValidationOutcome::TlsFailure(TlsFailure {
                kind: TlsFailureKind::Certificate,
                reason: "unknown issuer".to_string(),
            }),
            ValidationOutcome::MalformedResponse("no root".to_string()),
            ValidationOutcome::AuthFailure(None),
        ];
        for outcome in failures {
            assert!(!outcome.is_authenticated());
            assert!(outcome.into_user_id().is_none());
        }
    }

    #[test]
    fn severity_by_failure_class() {
        let status = ValidationOutcome::TransportFailure(TransportFailure::status(
            reqwest::StatusCode::BAD_GATEWAY,
        ));
        assert_eq!(status.severity(), Level::WARN);
        assert_eq!(
            status.to_string(),
            "ticket validation failed: status code: 502, reason: Bad Gateway"
        );

        let auth = ValidationOutcome::AuthFailure(Some("INVALID_TICKET".to_string()));
        assert_eq!(auth.severity(), Level::INFO);
        assert!(auth.to_string().contains("INVALID_TICKET"));

        let malformed = ValidationOutcome::MalformedResponse("truncated".to_string());
        assert_eq!(malformed.severity(), Level::DEBUG);
    }

    #[test]
    fn rustls_certificate_errors_are_certificate_failures() {
        let err = rustls::Error::InvalidCertificate(rustls::CertificateError::UnknownIssuer);
        assert_eq!(TlsFailure::from_rustls(&err).kind, TlsFailureKind::Certificate);

        let err = rustls::Error::AlertReceived(rustls::AlertDescription::HandshakeFailure);
        assert_eq!(TlsFailure::from_rustls(&err).kind, TlsFailureKind::Handshake);
    }
}
