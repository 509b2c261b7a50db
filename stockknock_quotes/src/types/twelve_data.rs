use serde::{Deserialize, Serialize};

/// Response of the Twelve Data `/price` endpoint.
///
/// Success is `{"price": "189.84000"}`; failures come back as
/// `{"code": 400, "message": "...", "status": "error"}`, often with HTTP 200.
#[derive(Serialize, Deserialize, Debug)]
pub struct PriceResponse {
    pub price: Option<String>,
    pub code: Option<u16>,
    pub message: Option<String>,
    pub status: Option<String>,
}

impl PriceResponse {
    pub fn is_error(&self) -> bool {
        self.status.as_deref() == Some("error") || self.code.is_some()
    }
}
