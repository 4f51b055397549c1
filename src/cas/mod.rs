pub mod observer;
pub mod outcome;
pub mod response;
pub mod service_url;
pub mod validator;

pub use observer::{TracingObserver, ValidationObserver};
pub use outcome::{
    TlsFailure, TlsFailureKind, TransportFailure, TransportFailureKind, UserId, ValidationOutcome,
};
pub use response::{CAS_NS, ResponseError, ServiceResponse};
pub use service_url::{ServiceUrl, TICKET_PARAM, build_service_url, strip_ticket};
pub use validator::{TicketValidator, validate_ticket, validation_url};
