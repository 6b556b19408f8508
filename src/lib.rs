//! chatgate — client core for an OTP-gated chat front-end.
//!
//! Two halves: the credential workflow ([`auth`]) that authenticates a user
//! against the account service, and the conversation session ([`dialog`])
//! that drives turns against the external dialog engine once an identity is
//! established. Both talk to the backend only through the [`gateway`]
//! traits.

pub mod auth;
pub mod config;
pub mod dialog;
pub mod error;
pub mod gateway;
