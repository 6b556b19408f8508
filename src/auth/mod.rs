//! The credential workflow: login, signup-with-OTP, forgot-password-with-OTP.

pub mod controller;
pub mod phase;

pub use controller::{AuthFlow, FormFields, Notice};
pub use phase::Phase;
