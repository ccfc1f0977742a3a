//! Application Layer
//!
//! Use cases, the shared pipeline steps and application services.

pub mod config;
pub mod delete_account;
pub mod email_confirmation;
pub mod email_verification;
pub mod logout_other_devices;
pub mod observer;
pub mod password_forgot;
pub mod password_reset;
pub mod pipeline;
pub mod register;
pub mod remember_login;
pub mod rules;
pub mod service;
pub mod services;
pub mod update_me;

// Re-exports
pub use config::{AuthConfig, Environment, ThrottleLimits};
pub use delete_account::{DeleteAccountInput, DeleteAccountUseCase};
pub use email_confirmation::{
    ConfirmEmailInput, ConfirmEmailOutput, ConfirmEmailUseCase, SendEmailConfirmationInput,
    SendEmailConfirmationUseCase,
};
pub use email_verification::{
    SendEmailVerificationUseCase, VerificationStatus, VerifyEmailInput, VerifyEmailOutput,
    VerifyEmailUseCase,
};
pub use logout_other_devices::{
    LogoutOtherDevicesInput, LogoutOtherDevicesOutput, LogoutOtherDevicesUseCase,
};
pub use password_forgot::{PasswordForgotInput, PasswordForgotOutput, PasswordForgotUseCase};
pub use password_reset::{PasswordResetInput, PasswordResetOutput, PasswordResetUseCase};
pub use pipeline::AuthContext;
pub use register::{RegisterInput, RegisterOutput, RegisterUseCase};
pub use remember_login::{RememberLoginInput, RememberLoginOutput, RememberLoginUseCase};
pub use services::{AuthCache, AuthServices, LoginOutcome};
pub use update_me::{UpdateMeInput, UpdateMeOutput, UpdateMeUseCase};
