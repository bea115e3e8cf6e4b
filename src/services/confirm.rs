//! Cancelable confirmation step before destructive calls.

use async_trait::async_trait;

/// The question put to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmPrompt {
    pub title: String,
    pub text: String,
    pub confirm_label: String,
}

impl ConfirmPrompt {
    pub fn delete_booking() -> Self {
        Self {
            title: "Are you sure?".to_string(),
            text: "You won't be able to revert this booking!".to_string(),
            confirm_label: "Yes, delete it!".to_string(),
        }
    }

    pub fn delete_listing() -> Self {
        Self {
            title: "Are you sure?".to_string(),
            text: "You won't be able to revert this service!".to_string(),
            confirm_label: "Yes, delete it!".to_string(),
        }
    }
}

/// Asks the user to confirm; `false` means declined.
#[async_trait]
pub trait Confirmation: Send + Sync {
    async fn confirm(&self, prompt: &ConfirmPrompt) -> bool;
}

/// Always gives the same answer. For non-interactive hosts.
#[derive(Debug, Clone, Copy)]
pub struct FixedAnswer(pub bool);

#[async_trait]
impl Confirmation for FixedAnswer {
    async fn confirm(&self, _prompt: &ConfirmPrompt) -> bool {
        self.0
    }
}

/// Result of a confirmed delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// The user declined; nothing was sent.
    Cancelled,
}
