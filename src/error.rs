//! Error types for chatgate.

/// Top-level error type for the client core.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("Conversation error: {0}")]
    Conversation(#[from] ConversationError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Failures from the account service and the local checks in front of it.
///
/// The message-carrying variants hold the server's own `message` verbatim;
/// it is shown to the user unchanged.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// A local precondition failed; no request was made.
    #[error("{0}")]
    Validation(String),

    /// The server rejected the credentials or the field update.
    #[error("{0}")]
    Rejected(String),

    /// The server rejected an OTP verification.
    #[error("{0}")]
    Otp(String),

    /// Signup or resend refused, typically a duplicate account.
    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Failures from the dialog engine.
#[derive(Debug, thiserror::Error)]
pub enum ConversationError {
    /// The engine reported a failure; carries its message when present.
    #[error("{0}")]
    Engine(String),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Network or payload-decoding failures. Callers treat these exactly like a
/// server-reported failure.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Malformed response: {0}")]
    Decode(#[from] serde_json::Error),
}
