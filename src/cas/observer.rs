//! Diagnostics sink for validation outcomes.
//!
//! The validator never logs directly; it hands every outcome to a
//! `ValidationObserver`. `TracingObserver` is the default and emits `tracing`
//! events at the level given by `ValidationOutcome::severity`.

use tracing::{debug, info, warn};

use crate::cas::outcome::ValidationOutcome;

/// Receives the outcome of every validation attempt.
///
/// `validation_url` is the full `serviceValidate` URL that was requested.
/// Implementations must not block: they run inline on the validating task.
pub trait ValidationObserver: Send + Sync {
    fn observe(&self, validation_url: &str, outcome: &ValidationOutcome);
}

/// Default observer: structured `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl ValidationObserver for TracingObserver {
    fn observe(&self, validation_url: &str, outcome: &ValidationOutcome) {
        match outcome {
            ValidationOutcome::Success(user) => {
                debug!(url = %validation_url, user = %user, "service ticket validated");
            }
            ValidationOutcome::TransportFailure(e) => match e.status {
                Some(status) => warn!(
                    url = %validation_url,
                    status,
                    reason = %e.reason,
                    "ticket validation failed: could not open url"
                ),
                None => warn!(
                    url = %validation_url,
                    kind = %e.kind,
                    reason = %e.reason,
                    "ticket validation failed: could not open url"
                ),
            },
            ValidationOutcome::TlsFailure(e) => warn!(
                url = %validation_url,
                kind = %e.kind,
                reason = %e.reason,
                "ticket validation failed: tls error"
            ),
            // must stay below warn
            ValidationOutcome::MalformedResponse(reason) => {
                debug!(url = %validation_url, reason = %reason, "ticket validation failed: malformed response");
            }
            ValidationOutcome::AuthFailure(Some(code)) => {
                info!(code = %code, "authentication failed: service ticket validation returned '{}'", code);
            }
            ValidationOutcome::AuthFailure(None) => {
                info!("authentication failed: could not validate service ticket");
            }
        }
    }
}
