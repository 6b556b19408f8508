//! Workflow phase machine — tracks which credential flow the user is in.
//!
//! This replaces the historical pile of per-popup boolean toggles with one
//! tagged enum and an explicit transition table, so invalid flag
//! combinations are unrepresentable.

/// The phases of the credential workflow.
///
/// `Login` is both the start and the terminal phase: every flow either
/// cancels back to it or completes into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Login,
    SignupInitial,
    SignupAwaitingOtp,
    ForgotInitial,
    ForgotAwaitingOtp,
}

impl Phase {
    /// Check if a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: Phase) -> bool {
        use Phase::*;
        matches!(
            (self, target),
            // Flow entry from the login screen
            (Login, SignupInitial)
                | (Login, ForgotInitial)
                // Initial submit succeeded, OTP field revealed
                | (SignupInitial, SignupAwaitingOtp)
                | (ForgotInitial, ForgotAwaitingOtp)
                // Cancel or flow completion
                | (_, Login)
        )
    }

    /// Whether this phase has an OTP field on screen.
    pub fn awaiting_otp(&self) -> bool {
        matches!(self, Self::SignupAwaitingOtp | Self::ForgotAwaitingOtp)
    }
}

impl Default for Phase {
    fn default() -> Self {
        Self::Login
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Login => "login",
            Self::SignupInitial => "signup_initial",
            Self::SignupAwaitingOtp => "signup_awaiting_otp",
            Self::ForgotInitial => "forgot_initial",
            Self::ForgotAwaitingOtp => "forgot_awaiting_otp",
        };
        write!(f, "{s}")
    }
}
