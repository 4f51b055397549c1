use serde::{Deserialize, Serialize};

/// Query parameters of `GET /cas/validate`.
///
/// Other parameters are allowed and become part of the service URL.
#[derive(Debug, Deserialize)]
pub struct ValidateQuery {
    #[serde(default)]
    pub ticket: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ValidateResponse {
    pub user: String,
    // Service URL the ticket was validated against
    pub service: String,
}
