//! The viewer's bookings: status toggle and delete.

use crate::error::AppError;
use crate::models::Booking;
use crate::presenters::{Alert, ViewScope};
use crate::services::{BookingRepository, Confirmation, DeleteOutcome};

pub struct BookingsView {
    scope: ViewScope,
    repo: BookingRepository,
    pub items: Vec<Booking>,
    pub loading: bool,
    pub alert: Option<Alert>,
}

impl BookingsView {
    pub fn new(scope: ViewScope, repo: BookingRepository) -> Self {
        Self {
            scope,
            repo,
            items: Vec::new(),
            loading: false,
            alert: None,
        }
    }

    /// Load the bookings made by `email`.
    pub async fn load(&mut self, email: &str) {
        self.loading = true;
        let result = self.repo.list_for_user(email).await;
        if !self.scope.is_mounted() {
            return;
        }
        self.loading = false;

        match result {
            Ok(items) => self.items = items,
            Err(e) => self.alert = Some(Alert::from_error(&e)),
        }
    }

    /// Flip a booking between Pending and Completed.
    pub async fn toggle_status(&mut self, id: &str) -> bool {
        let Some(booking) = self.items.iter().find(|b| b.id == id) else {
            return false;
        };
        let next = booking.status.toggled();
        self.set_status(id, next.as_str()).await
    }

    /// Set a booking's status. The list is only touched on success.
    pub async fn set_status(&mut self, id: &str, status: &str) -> bool {
        let Some(booking) = self.items.iter().find(|b| b.id == id).cloned() else {
            self.alert = Some(Alert::from_error(&AppError::not_found_with_id("booking", id)));
            return false;
        };

        let result = self.repo.set_status(&booking, status).await;
        if !self.scope.is_mounted() {
            return false;
        }

        match result {
            Ok(updated) => {
                if let Some(slot) = self.items.iter_mut().find(|b| b.id == id) {
                    *slot = updated;
                }
                self.alert = Some(Alert::success(
                    "Updated!",
                    "Booking status has been updated.",
                ));
                true
            }
            Err(e) => {
                self.alert = Some(Alert::from_error(&e));
                false
            }
        }
    }

    /// Delete a booking after confirmation; true if it left the list.
    ///
    /// Declining changes nothing and sends nothing.
    pub async fn delete(&mut self, id: &str, confirmation: &dyn Confirmation) -> bool {
        let result = self.repo.delete(id, confirmation).await;
        if !self.scope.is_mounted() {
            return false;
        }

        match result {
            Ok(DeleteOutcome::Cancelled) => false,
            Ok(DeleteOutcome::Deleted) => {
                self.items.retain(|b| b.id != id);
                self.alert = Some(Alert::success("Deleted!", "Your booking has been deleted."));
                true
            }
            Err(e) if e.is_not_found() => {
                log::debug!("[bookings] Booking {} was already deleted", id);
                self.items.retain(|b| b.id != id);
                true
            }
            Err(e) => {
                self.alert = Some(Alert::from_error(&e));
                false
            }
        }
    }

    pub fn dismiss_alert(&mut self) {
        self.alert = None;
    }
}
