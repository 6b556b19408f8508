//! Conversation gateway — wrappers over the external dialog engine.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::ClientConfig;
use crate::error::{ConversationError, TransportError};

/// Fallback when the engine fails without a message of its own.
const ENGINE_FAILURE: &str = "Dialog engine request failed";

/// One turn's reply from the engine: the server's pre-extracted message
/// texts plus the raw trace array the normalizer consumes. `raw` stays an
/// untyped `Value` because the upstream trace schema drifts.
#[derive(Debug, Clone, Default)]
pub struct TurnReply {
    pub messages: Vec<String>,
    pub raw: serde_json::Value,
}

/// Operations against the external dialog engine.
#[async_trait]
pub trait DialogApi: Send + Sync {
    /// Post one user turn and collect the engine's reply traces.
    async fn send(&self, identity: &str, text: &str) -> Result<TurnReply, ConversationError>;

    /// Start a fresh flow for the identity, collecting the greeting traces.
    async fn launch(&self, identity: &str) -> Result<TurnReply, ConversationError>;

    /// Clear engine-side session state for the identity. Callers treat this
    /// as best-effort.
    async fn reset(&self, identity: &str) -> Result<(), ConversationError>;
}

#[derive(Debug, Serialize)]
struct InteractBody<'a> {
    user_email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    launch: Option<bool>,
}

#[derive(Debug, Serialize)]
struct ResetBody<'a> {
    user_email: &'a str,
}

#[derive(Debug, Deserialize)]
struct InteractReply {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    messages: Vec<String>,
    #[serde(default)]
    raw: serde_json::Value,
}

/// Production `DialogApi` over HTTP.
pub struct DialogGateway {
    http: reqwest::Client,
    base_url: String,
}

impl DialogGateway {
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.clone(),
        })
    }

    async fn interact(&self, body: &InteractBody<'_>) -> Result<TurnReply, ConversationError> {
        let text = self
            .http
            .post(format!("{}/voiceflow/interact", self.base_url))
            .json(body)
            .send()
            .await
            .map_err(TransportError::from)?
            .text()
            .await
            .map_err(TransportError::from)?;
        let reply: InteractReply =
            serde_json::from_str(&text).map_err(TransportError::from)?;
        if !reply.success {
            return Err(ConversationError::Engine(
                reply.message.unwrap_or_else(|| ENGINE_FAILURE.to_string()),
            ));
        }
        tracing::debug!("engine replied with {} message(s)", reply.messages.len());
        Ok(TurnReply {
            messages: reply.messages,
            raw: reply.raw,
        })
    }
}

#[async_trait]
impl DialogApi for DialogGateway {
    async fn send(&self, identity: &str, text: &str) -> Result<TurnReply, ConversationError> {
        self.interact(&InteractBody {
            user_email: identity,
            message: Some(text),
            launch: None,
        })
        .await
    }

    async fn launch(&self, identity: &str) -> Result<TurnReply, ConversationError> {
        self.interact(&InteractBody {
            user_email: identity,
            message: None,
            launch: Some(true),
        })
        .await
    }

    async fn reset(&self, identity: &str) -> Result<(), ConversationError> {
        let text = self
            .http
            .post(format!("{}/voiceflow/reset", self.base_url))
            .json(&ResetBody {
                user_email: identity,
            })
            .send()
            .await
            .map_err(TransportError::from)?
            .text()
            .await
            .map_err(TransportError::from)?;
        let reply: super::ServerReply =
            serde_json::from_str(&text).map_err(TransportError::from)?;
        if reply.success {
            Ok(())
        } else {
            Err(ConversationError::Engine(reply.message_or(ENGINE_FAILURE)))
        }
    }
}
