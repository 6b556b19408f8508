//! Credential gateway — wrappers over the external account service.
//!
//! Every operation is one network call translated into `Ok(())` or a typed
//! `AuthError` carrying the server's own message. No state is kept here.

use async_trait::async_trait;
use serde::Serialize;

use crate::config::ClientConfig;
use crate::error::{AuthError, TransportError};

use super::ServerReply;

/// Operations against the external account service.
#[async_trait]
pub trait AccountApi: Send + Sync {
    /// Check the credentials against the user store.
    async fn login(&self, email: &str, password: &str) -> Result<(), AuthError>;

    /// Create a pending, unverified account record and trigger OTP delivery.
    async fn signup_request_otp(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<(), AuthError>;

    /// Re-send an OTP for an existing account (password-reset entry point).
    async fn resend_otp(&self, email: &str) -> Result<(), AuthError>;

    /// Confirm an OTP code. When `password` and `name` are present this also
    /// finalizes a pending signup in the same call.
    async fn verify_otp(
        &self,
        email: &str,
        code: &str,
        password: Option<&str>,
        name: Option<&str>,
    ) -> Result<(), AuthError>;

    /// Store a new password on the user record. Idempotent.
    async fn update_password(&self, email: &str, password: &str) -> Result<(), AuthError>;

    /// Flip the user record's `verified` field. Idempotent.
    async fn mark_verified(&self, email: &str) -> Result<(), AuthError>;
}

#[derive(Debug, Serialize)]
struct AuthenticateBody<'a> {
    user_email: &'a str,
    user_password: &'a str,
}

#[derive(Debug, Serialize)]
struct SignupBody<'a> {
    user_email: &'a str,
    password: &'a str,
    name: &'a str,
}

#[derive(Debug, Serialize)]
struct EmailBody<'a> {
    user_email: &'a str,
}

#[derive(Debug, Serialize)]
struct VerifyBody<'a> {
    user_email: &'a str,
    input_otp: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_password: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_name: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct UpdatesBody<'a> {
    user_email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    password: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    verified: Option<bool>,
}

/// Production `AccountApi` over HTTP.
pub struct AccountGateway {
    http: reqwest::Client,
    base_url: String,
}

impl AccountGateway {
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.clone(),
        })
    }

    async fn post<B: Serialize>(&self, path: &str, body: &B) -> Result<ServerReply, TransportError> {
        self.request(reqwest::Method::POST, path, body).await
    }

    async fn patch<B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ServerReply, TransportError> {
        self.request(reqwest::Method::PATCH, path, body).await
    }

    async fn request<B: Serialize>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: &B,
    ) -> Result<ServerReply, TransportError> {
        tracing::debug!("account request: {method} {path}");
        let text = self
            .http
            .request(method, format!("{}{path}", self.base_url))
            .json(body)
            .send()
            .await?
            .text()
            .await?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl AccountApi for AccountGateway {
    async fn login(&self, email: &str, password: &str) -> Result<(), AuthError> {
        let body = AuthenticateBody {
            user_email: email,
            user_password: password,
        };
        let reply = self.post("/mongo_user/authentication", &body).await?;
        if reply.success {
            Ok(())
        } else {
            Err(AuthError::Rejected(reply.message_or("Login failed")))
        }
    }

    async fn signup_request_otp(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<(), AuthError> {
        let body = SignupBody {
            user_email: email,
            password,
            name,
        };
        let reply = self.post("/mongo_user/signup", &body).await?;
        if reply.success {
            Ok(())
        } else {
            Err(AuthError::Conflict(reply.message_or("Signup failed")))
        }
    }

    async fn resend_otp(&self, email: &str) -> Result<(), AuthError> {
        let body = EmailBody { user_email: email };
        let reply = self.patch("/mongo_user/resend_otp", &body).await?;
        if reply.success {
            Ok(())
        } else {
            Err(AuthError::Conflict(
                reply.message_or("Could not send OTP code"),
            ))
        }
    }

    async fn verify_otp(
        &self,
        email: &str,
        code: &str,
        password: Option<&str>,
        name: Option<&str>,
    ) -> Result<(), AuthError> {
        let body = VerifyBody {
            user_email: email,
            input_otp: code,
            user_password: password,
            user_name: name,
        };
        let reply = self.post("/mongo_user/verification", &body).await?;
        if reply.success {
            Ok(())
        } else {
            Err(AuthError::Otp(reply.message_or("Verification failed")))
        }
    }

    async fn update_password(&self, email: &str, password: &str) -> Result<(), AuthError> {
        let body = UpdatesBody {
            user_email: email,
            password: Some(password),
            verified: None,
        };
        let reply = self.post("/mongo_user/updates", &body).await?;
        if reply.success {
            Ok(())
        } else {
            Err(AuthError::Rejected(reply.message_or("Update failed")))
        }
    }

    async fn mark_verified(&self, email: &str) -> Result<(), AuthError> {
        let body = UpdatesBody {
            user_email: email,
            password: None,
            verified: Some(true),
        };
        let reply = self.post("/mongo_user/updates", &body).await?;
        if reply.success {
            Ok(())
        } else {
            Err(AuthError::Rejected(reply.message_or("Update failed")))
        }
    }
}
