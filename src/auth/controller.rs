//! Auth/OTP workflow controller.
//!
//! Owns the form fields and the [`Phase`] machine, sequences calls through
//! an [`AccountApi`], and never lets a gateway failure escape: every outcome
//! lands in the single notice slot the UI renders.

use crate::auth::phase::Phase;
use crate::gateway::AccountApi;

const PASSWORD_MISMATCH: &str = "Passwords do not match!";
const OTP_SENT: &str = "OTP code sent to email.";
const SIGNUP_COMPLETE: &str = "Account created, please log in now.";
const RESET_COMPLETE: &str = "Password changed, please log in now.";

/// The freshest user-visible event. Setting one kind displaces the other;
/// at most one message is ever on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Error(String),
}

/// The form fields the workflow owns. Cleared wholesale on flow entry,
/// cancel, and completion so nothing leaks between flows.
#[derive(Debug, Clone, Default)]
pub struct FormFields {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub name: String,
    pub otp: String,
}

impl FormFields {
    fn clear(&mut self) {
        *self = Self::default();
    }
}

/// The credential workflow: login, signup-with-OTP, and
/// forgot-password-with-OTP.
pub struct AuthFlow<A> {
    gateway: A,
    phase: Phase,
    fields: FormFields,
    busy: bool,
    notice: Option<Notice>,
}

impl<A: AccountApi> AuthFlow<A> {
    pub fn new(gateway: A) -> Self {
        Self {
            gateway,
            phase: Phase::default(),
            fields: FormFields::default(),
            busy: false,
            notice: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Drop the current notice (the user closed it).
    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    pub fn fields(&self) -> &FormFields {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut FormFields {
        &mut self.fields
    }

    /// Enter the signup flow from the login screen.
    pub fn start_signup(&mut self) {
        self.enter(Phase::SignupInitial);
    }

    /// Enter the forgot-password flow from the login screen.
    pub fn start_forgot(&mut self) {
        self.enter(Phase::ForgotInitial);
    }

    /// Abandon the current flow and return to the login screen. Local only,
    /// no network call; any outstanding OTP simply expires server-side.
    pub fn cancel(&mut self) {
        self.fields.clear();
        self.notice = None;
        self.phase = Phase::Login;
    }

    fn enter(&mut self, target: Phase) {
        if self.busy || !self.phase.can_transition_to(target) {
            return;
        }
        self.fields.clear();
        self.notice = None;
        self.phase = target;
    }

    /// Submit the current form. Dispatches on phase; a submit while a prior
    /// one is in flight is silently dropped. Returns the authenticated
    /// identity on the login success path, `None` otherwise — the
    /// authenticated state itself belongs to the caller.
    pub async fn submit(&mut self) -> Option<String> {
        if self.busy {
            return None;
        }
        self.busy = true;
        let identity = match self.phase {
            Phase::Login => self.submit_login().await,
            Phase::SignupInitial => {
                self.submit_initial(Phase::SignupAwaitingOtp).await;
                None
            }
            Phase::ForgotInitial => {
                self.submit_initial(Phase::ForgotAwaitingOtp).await;
                None
            }
            Phase::SignupAwaitingOtp => {
                self.submit_signup_otp().await;
                None
            }
            Phase::ForgotAwaitingOtp => {
                self.submit_forgot_otp().await;
                None
            }
        };
        self.busy = false;
        identity
    }

    async fn submit_login(&mut self) -> Option<String> {
        match self
            .gateway
            .login(&self.fields.email, &self.fields.password)
            .await
        {
            Ok(()) => {
                let identity = self.fields.email.clone();
                tracing::info!("authenticated {identity}");
                self.fields.clear();
                self.notice = None;
                Some(identity)
            }
            Err(e) => {
                self.notice = Some(Notice::Error(e.to_string()));
                None
            }
        }
    }

    /// First submit of either OTP flow: check the confirmation locally, then
    /// ask the server to issue an OTP.
    async fn submit_initial(&mut self, next: Phase) {
        if self.fields.password != self.fields.confirm_password {
            self.notice = Some(Notice::Error(PASSWORD_MISMATCH.to_string()));
            return;
        }
        let result = match next {
            Phase::SignupAwaitingOtp => {
                self.gateway
                    .signup_request_otp(&self.fields.email, &self.fields.password, &self.fields.name)
                    .await
            }
            _ => self.gateway.resend_otp(&self.fields.email).await,
        };
        match result {
            Ok(()) => {
                tracing::debug!("OTP requested, advancing to {next}");
                self.phase = next;
                self.notice = Some(Notice::Success(OTP_SENT.to_string()));
            }
            Err(e) => self.notice = Some(Notice::Error(e.to_string())),
        }
    }

    /// OTP submit for signup: one verify call both confirms the code and
    /// finalizes the pending account, then the record is marked verified.
    async fn submit_signup_otp(&mut self) {
        let result = match self
            .gateway
            .verify_otp(
                &self.fields.email,
                &self.fields.otp,
                Some(&self.fields.password),
                Some(&self.fields.name),
            )
            .await
        {
            Ok(()) => self.gateway.mark_verified(&self.fields.email).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(()) => self.complete(SIGNUP_COMPLETE),
            // OTP field kept so the user can retry in place
            Err(e) => self.notice = Some(Notice::Error(e.to_string())),
        }
    }

    /// OTP submit for password reset: verify, then push the new password.
    async fn submit_forgot_otp(&mut self) {
        let result = match self
            .gateway
            .verify_otp(&self.fields.email, &self.fields.otp, None, None)
            .await
        {
            Ok(()) => {
                self.gateway
                    .update_password(&self.fields.email, &self.fields.password)
                    .await
            }
            Err(e) => Err(e),
        };
        match result {
            Ok(()) => self.complete(RESET_COMPLETE),
            Err(e) => self.notice = Some(Notice::Error(e.to_string())),
        }
    }

    fn complete(&mut self, notice: &str) {
        tracing::info!("{} flow complete", self.phase);
        self.fields.clear();
        self.phase = Phase::Login;
        self.notice = Some(Notice::Success(notice.to_string()));
    }
}
