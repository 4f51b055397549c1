//! CAS service-ticket validation.
//!
//! Two pieces:
//! - [`build_service_url`] / [`strip_ticket`] turn the current request into the
//!   service URL the ticket was issued for.
//! - [`TicketValidator`] exchanges a ticket for the authenticated user id via
//!   the CAS `serviceValidate` endpoint.
//!
//! ```no_run
//! # async fn demo() -> Result<(), casauth::CasError> {
//! use casauth::{ClientConfig, TicketValidator, build_service_url};
//!
//! let service = build_service_url("https://app.example.org/secure", Some("foo=bar&ticket=ST-1"));
//! let validator = TicketValidator::new(&ClientConfig::default())?;
//! match validator
//!     .validate_ticket("ST-1", "https://cas.example.org/cas", service.as_str())
//!     .await
//! {
//!     Some(user) => println!("logged in as {user}"),
//!     None => println!("not authenticated"),
//! }
//! # Ok(())
//! # }
//! ```
pub mod cas;
pub mod config;
pub mod error;

pub use cas::{
    ServiceUrl, TicketValidator, UserId, ValidationObserver, ValidationOutcome, build_service_url,
    strip_ticket, validate_ticket,
};
pub use config::{CasConfig, ClientConfig, ConfigError};
pub use error::CasError;
