//! Booking repository over `/bookings`.

use crate::config::BookingFilter;
use crate::error::AppError;
use crate::models::fields::{count_field, inserted_id};
use crate::models::{Booker, Booking, BookingStatus, Listing, NewBooking};
use crate::services::api_client::ApiClient;
use crate::services::confirm::{ConfirmPrompt, Confirmation, DeleteOutcome};
use chrono::Utc;
use serde_json::json;

/// Fetches, creates, updates and deletes bookings.
#[derive(Clone)]
pub struct BookingRepository {
    api: ApiClient,
    filter: BookingFilter,
}

impl BookingRepository {
    pub fn new(api: ApiClient, filter: BookingFilter) -> Self {
        Self { api, filter }
    }

    /// Every booking, regardless of owner.
    pub async fn list_all(&self) -> Result<Vec<Booking>, AppError> {
        let body = self.api.get("/bookings").await?;
        Ok(Booking::decode_all(&body))
    }

    /// Bookings made by `email`, exact match, in server order.
    ///
    /// With the server filter the response is still filtered locally, so a
    /// backend that ignores `userEmail` yields the same result set.
    pub async fn list_for_user(&self, email: &str) -> Result<Vec<Booking>, AppError> {
        if email.trim().is_empty() {
            return Ok(Vec::new());
        }

        let all = match self.filter {
            BookingFilter::Server => {
                let path = format!("/bookings?userEmail={}", urlencoding::encode(email));
                Booking::decode_all(&self.api.get(&path).await?)
            }
            BookingFilter::Client => self.list_all().await?,
        };

        let fetched = all.len();
        let mine: Vec<Booking> = all.into_iter().filter(|b| b.belongs_to(email)).collect();
        if mine.len() != fetched {
            log::debug!(
                "[bookings] Dropped {} bookings not owned by the viewer",
                fetched - mine.len()
            );
        }
        Ok(mine)
    }

    /// Book `listing` on behalf of `booker`.
    ///
    /// The listing is snapshotted now; later listing edits do not reach the booking.
    pub async fn create(
        &self,
        listing: Option<&Listing>,
        booker: &Booker,
        message: &str,
    ) -> Result<Booking, AppError> {
        let listing = match listing {
            Some(listing) if !listing.id.trim().is_empty() => listing,
            _ => {
                return Err(AppError::validation_field(
                    "Select a service before booking",
                    "serviceId",
                ))
            }
        };

        let request = NewBooking::new(listing, booker, message, Utc::now());
        let body = self.api.post("/bookings", &request).await?;

        let id = inserted_id(&body).ok_or_else(|| {
            AppError::decode_entity("create response has no insertedId", "booking")
        })?;
        log::info!("[bookings] Booked listing {} as {}", listing.id, id);
        Ok(request.into_booking(id))
    }

    /// Change a booking's status; only `Pending` and `Completed` are accepted.
    ///
    /// An unknown status fails before anything is sent.
    pub async fn set_status(&self, booking: &Booking, status: &str) -> Result<Booking, AppError> {
        let status: BookingStatus = status.parse()?;
        let body = self
            .api
            .put(&booking_path(&booking.id), &json!({ "status": status }))
            .await
            .map_err(|e| not_found_as_booking(e, &booking.id))?;

        if count_field(&body, "matchedCount") == Some(0) {
            return Err(AppError::not_found_with_id("booking", &booking.id));
        }
        log::info!("[bookings] Booking {} is now {}", booking.id, status);
        Ok(booking.clone().with_status(status))
    }

    /// Delete a booking after the user confirms.
    ///
    /// Declining is not an error: it returns `Cancelled` and sends nothing.
    pub async fn delete(
        &self,
        id: &str,
        confirmation: &dyn Confirmation,
    ) -> Result<DeleteOutcome, AppError> {
        if !confirmation.confirm(&ConfirmPrompt::delete_booking()).await {
            log::debug!("[bookings] Delete of {} cancelled", id);
            return Ok(DeleteOutcome::Cancelled);
        }

        let body = self
            .api
            .delete(&booking_path(id))
            .await
            .map_err(|e| not_found_as_booking(e, id))?;

        if count_field(&body, "deletedCount") == Some(0) {
            return Err(AppError::not_found_with_id("booking", id));
        }
        log::info!("[bookings] Deleted booking {}", id);
        Ok(DeleteOutcome::Deleted)
    }
}

fn booking_path(id: &str) -> String {
    format!("/bookings/{}", urlencoding::encode(id))
}

fn not_found_as_booking(err: AppError, id: &str) -> AppError {
    if err.is_not_found() {
        AppError::not_found_with_id("booking", id)
    } else {
        err
    }
}
