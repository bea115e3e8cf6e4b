//! Registration and login forms.

use crate::error::AppError;
use crate::models::Identity;
use crate::presenters::Alert;
use crate::services::AuthSession;

/// Shortest password the registration form accepts.
pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub alert: Option<Alert>,
}

impl RegistrationForm {
    /// Client-side checks run before the provider is called.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.email.trim().is_empty() {
            return Err(AppError::validation_field("Email is required", "email"));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::validation_field(
                format!("Password must be at least {} characters", MIN_PASSWORD_LEN),
                "password",
            ));
        }
        if self.password != self.confirm_password {
            return Err(AppError::validation_field(
                "Passwords do not match",
                "confirmPassword",
            ));
        }
        Ok(())
    }

    pub async fn submit(&mut self, session: &AuthSession) -> Option<Identity> {
        let result = match self.validate() {
            Ok(()) => session.create_account(&self.email, &self.password).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(identity) => {
                self.password.clear();
                self.confirm_password.clear();
                self.alert = Some(Alert::success("Account created", identity.email.clone()));
                Some(identity)
            }
            Err(e) => {
                self.alert = Some(Alert::from_error(&e));
                None
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    pub alert: Option<Alert>,
}

impl LoginForm {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut missing = Vec::new();
        if self.email.trim().is_empty() {
            missing.push("email".to_string());
        }
        if self.password.is_empty() {
            missing.push("password".to_string());
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(AppError::validation(
                "Email and password are required",
                missing,
            ))
        }
    }

    pub async fn submit(&mut self, session: &AuthSession) -> Option<Identity> {
        let result = match self.validate() {
            Ok(()) => session.login(&self.email, &self.password).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(identity) => {
                self.password.clear();
                self.alert = Some(Alert::success(
                    "Welcome back",
                    identity.name_or_guest().to_string(),
                ));
                Some(identity)
            }
            Err(e) => {
                self.alert = Some(Alert::from_error(&e));
                None
            }
        }
    }
}
