//! View presenters.
//!
//! Each presenter owns its copy of fetched data plus local UI state, and
//! surfaces failures as an [`Alert`] while leaving prior data untouched.
//! A presenter is bound to a [`ViewScope`]; results arriving after the
//! scope is unmounted are discarded instead of applied.

pub mod auth;
pub mod bookings;
pub mod catalog;
pub mod dashboard;
pub mod listing_form;
pub mod manage;
pub mod search;

pub use auth::{LoginForm, RegistrationForm, MIN_PASSWORD_LEN};
pub use bookings::BookingsView;
pub use catalog::CatalogView;
pub use dashboard::{bucket_by_day, calc_trend, DashboardSummary, DashboardView, DayBucket, Trend};
pub use listing_form::{AddListingView, ListingForm};
pub use manage::{EditLoad, EditSession, ManageView};
pub use search::{filter_listings, listing_matches, SearchView, SEARCH_SUGGESTIONS};

use crate::error::AppError;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

/// Severity of an alert dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Success,
    Error,
    Warning,
    Info,
}

/// A blocking, dismissible message for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alert {
    pub kind: AlertKind,
    pub title: String,
    pub message: String,
}

impl Alert {
    pub fn new(kind: AlertKind, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(AlertKind::Success, title, message)
    }

    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(AlertKind::Info, title, message)
    }

    /// Alert for a failed operation. Validation problems are warnings.
    pub fn from_error(err: &AppError) -> Self {
        let kind = match err {
            AppError::Validation { .. } => AlertKind::Warning,
            _ => AlertKind::Error,
        };
        Self::new(kind, err.title(), user_message(err))
    }
}

/// The part of an error worth showing to a user.
fn user_message(err: &AppError) -> String {
    match err {
        AppError::Validation { message, .. }
        | AppError::Unauthorized { message }
        | AppError::DuplicateAccount { message }
        | AppError::InvalidCredentials { message }
        | AppError::Server { message, .. }
        | AppError::Transport { message } => message.clone(),
        AppError::NotFound { resource, .. } => format!("This {} no longer exists", resource),
        AppError::InvalidStatus { status } => {
            format!("'{}' is not a valid booking status", status)
        }
        other => other.to_string(),
    }
}

/// Lifetime of a mounted view.
///
/// Cheap to clone; the host keeps a clone and calls [`unmount`](Self::unmount)
/// on teardown. In-flight requests are not aborted.
#[derive(Debug, Clone, Default)]
pub struct ViewScope {
    token: CancellationToken,
}

impl ViewScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unmount(&self) {
        self.token.cancel();
    }

    pub fn is_mounted(&self) -> bool {
        !self.token.is_cancelled()
    }

    /// A scope that unmounts together with this one.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
        }
    }
}
