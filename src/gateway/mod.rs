//! HTTP gateways to the backend — stateless request/response wrappers.
//!
//! Each gateway is a trait with a single production `reqwest` implementation
//! so controllers can be unit-tested against recording mocks.

pub mod account;
pub mod dialog;

pub use account::{AccountApi, AccountGateway};
pub use dialog::{DialogApi, DialogGateway, TurnReply};

use serde::Deserialize;

/// The `{success, message}` envelope the account service wraps every reply
/// in. The backend also uses non-2xx statuses for failures, but the body is
/// authoritative either way, so gateways parse it without checking status.
#[derive(Debug, Deserialize)]
pub(crate) struct ServerReply {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

impl ServerReply {
    /// The server's message, or `fallback` when it sent none.
    pub fn message_or(self, fallback: &str) -> String {
        self.message.unwrap_or_else(|| fallback.to_string())
    }
}
