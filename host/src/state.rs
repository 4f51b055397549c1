/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - validator: TicketValidator (reqwest::Client を内部で共有)
 *   - cas_server_url / public_base_url
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 */
use std::sync::Arc;

use casauth::TicketValidator;

#[derive(Clone, Debug)]
pub struct AppState {
    pub validator: TicketValidator,
    pub cas_server_url: Arc<str>,
    pub public_base_url: Option<Arc<str>>,
}

impl AppState {
    pub fn new(
        validator: TicketValidator,
        cas_server_url: &str,
        public_base_url: Option<&str>,
    ) -> Self {
        Self {
            validator,
            cas_server_url: Arc::from(cas_server_url),
            public_base_url: public_base_url.map(Arc::from),
        }
    }
}
