//! API DTOs (Data Transfer Objects)
//!
//! Request bodies keep the snake_case field names the validation rules
//! refer to (`password_confirmation`, `current_password`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::application::{
    ConfirmEmailInput, DeleteAccountInput, LogoutOtherDevicesInput, PasswordForgotInput,
    PasswordResetInput, RegisterInput, RememberLoginInput, SendEmailConfirmationInput,
    UpdateMeInput, VerifyEmailInput,
};
use crate::domain::entity::principal::Principal;

// ============================================================================
// Register
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password_confirmation: String,
    #[serde(default)]
    pub remember: bool,
    pub locale: Option<String>,
}

impl From<RegisterRequest> for RegisterInput {
    fn from(req: RegisterRequest) -> Self {
        Self {
            name: req.name,
            email: req.email,
            password: req.password,
            password_confirmation: req.password_confirmation,
            remember: req.remember,
            locale: req.locale,
        }
    }
}

// ============================================================================
// Me
// ============================================================================

/// Partial update; absent fields stay unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateMeRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub password_confirmation: Option<String>,
    pub current_password: Option<String>,
    pub locale: Option<String>,
}

impl From<UpdateMeRequest> for UpdateMeInput {
    fn from(req: UpdateMeRequest) -> Self {
        Self {
            name: req.name,
            email: req.email,
            password: req.password,
            password_confirmation: req.password_confirmation,
            current_password: req.current_password,
            locale: req.locale,
        }
    }
}

/// Password confirmation body shared by logout-other-devices and account
/// deletion
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PasswordCheckRequest {
    pub password: Option<String>,
}

impl From<PasswordCheckRequest> for LogoutOtherDevicesInput {
    fn from(req: PasswordCheckRequest) -> Self {
        Self {
            password: req.password,
        }
    }
}

impl From<PasswordCheckRequest> for DeleteAccountInput {
    fn from(req: PasswordCheckRequest) -> Self {
        Self {
            password: req.password,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MeAttributes {
    pub name: String,
    pub email: Option<String>,
    pub email_verified_at: Option<DateTime<Utc>>,
    pub locale: Option<String>,
}

/// Public representation of the authenticated principal
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MeResource {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub slug: String,
    pub attributes: MeAttributes,
}

impl From<&Principal> for MeResource {
    fn from(principal: &Principal) -> Self {
        let id = principal.id.to_string();
        Self {
            slug: id.clone(),
            id,
            kind: principal.guard.as_str().to_owned(),
            attributes: MeAttributes {
                name: principal.name.as_str().to_owned(),
                email: principal.email.as_ref().map(|e| e.as_str().to_owned()),
                email_verified_at: principal.email_verified_at,
                locale: principal.locale.clone(),
            },
        }
    }
}

// ============================================================================
// Password
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct PasswordForgotRequest {
    #[serde(default)]
    pub email: String,
}

impl From<PasswordForgotRequest> for PasswordForgotInput {
    fn from(req: PasswordForgotRequest) -> Self {
        Self { email: req.email }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PasswordResetRequest {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password_confirmation: String,
}

impl From<PasswordResetRequest> for PasswordResetInput {
    fn from(req: PasswordResetRequest) -> Self {
        Self {
            token: req.token,
            email: req.email,
            password: req.password,
            password_confirmation: req.password_confirmation,
        }
    }
}

/// Status message returned by forgot/reset
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub status: String,
}

// ============================================================================
// Email verification / confirmation
// ============================================================================

/// Query string of a signed verification link
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct VerifyEmailQuery {
    pub params: Vec<(String, String)>,
}

impl From<VerifyEmailQuery> for VerifyEmailInput {
    fn from(query: VerifyEmailQuery) -> Self {
        Self {
            params: query.params,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SendEmailConfirmationRequest {
    #[serde(default)]
    pub email: String,
}

impl From<SendEmailConfirmationRequest> for SendEmailConfirmationInput {
    fn from(req: SendEmailConfirmationRequest) -> Self {
        Self { email: req.email }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConfirmEmailRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub code: String,
}

impl From<ConfirmEmailRequest> for ConfirmEmailInput {
    fn from(req: ConfirmEmailRequest) -> Self {
        Self {
            email: req.email,
            code: req.code,
        }
    }
}

// ============================================================================
// Remember me
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct RememberLoginRequest {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub token: String,
}

impl From<RememberLoginRequest> for RememberLoginInput {
    fn from(req: RememberLoginRequest) -> Self {
        Self {
            id: req.id,
            token: req.token,
        }
    }
}
