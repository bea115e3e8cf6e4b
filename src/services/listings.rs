//! Listing repository over `/services`.

use crate::error::AppError;
use crate::models::fields::{count_field, inserted_id, record_id, unwrap_envelope};
use crate::models::{Listing, ListingDraft};
use crate::services::api_client::ApiClient;

/// Fetches, creates, patches and deletes service listings.
#[derive(Clone)]
pub struct ListingRepository {
    api: ApiClient,
}

impl ListingRepository {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Every listing, decoded into canonical records in server order.
    pub async fn list_all(&self) -> Result<Vec<Listing>, AppError> {
        let body = self.api.get("/services").await?;
        let listings = Listing::decode_all(&body);
        log::debug!("[listings] Fetched {} listings", listings.len());
        Ok(listings)
    }

    /// A single listing. Fails with `NotFound` when the server has no record.
    pub async fn get(&self, id: &str) -> Result<Listing, AppError> {
        let id = require_id(id)?;
        let body = self
            .api
            .get(&listing_path(id))
            .await
            .map_err(|e| not_found_as_listing(e, id))?;

        if body.is_null() || record_id(unwrap_envelope(&body)).is_none() {
            return Err(AppError::not_found_with_id("listing", id));
        }
        Listing::decode(&body)
    }

    /// Validate the draft and post it.
    ///
    /// Nothing is sent when a required field is blank.
    pub async fn create(&self, draft: &ListingDraft) -> Result<Listing, AppError> {
        let payload = draft.validate()?;
        let body = self.api.post("/services", &payload).await?;

        let id = inserted_id(&body).ok_or_else(|| {
            AppError::decode_entity("create response has no insertedId", "listing")
        })?;
        log::info!("[listings] Created listing {}", id);
        Ok(payload.into_listing(id))
    }

    /// Validate the draft and patch the listing with it.
    pub async fn update(&self, id: &str, draft: &ListingDraft) -> Result<Listing, AppError> {
        let id = require_id(id)?;
        let payload = draft.validate()?;
        let body = self
            .api
            .patch(&listing_path(id), &payload)
            .await
            .map_err(|e| not_found_as_listing(e, id))?;

        if count_field(&body, "matchedCount") == Some(0) {
            return Err(AppError::not_found_with_id("listing", id));
        }
        log::info!("[listings] Updated listing {}", id);

        // Some backends echo the stored document, others only counts
        if record_id(unwrap_envelope(&body)).is_some() {
            return Listing::decode(&body);
        }
        Ok(payload.into_listing(id))
    }

    /// Delete a listing. Fails with `NotFound` if nothing was deleted.
    pub async fn delete(&self, id: &str) -> Result<(), AppError> {
        let id = require_id(id)?;
        let body = self
            .api
            .delete(&listing_path(id))
            .await
            .map_err(|e| not_found_as_listing(e, id))?;

        if count_field(&body, "deletedCount") == Some(0) {
            return Err(AppError::not_found_with_id("listing", id));
        }
        log::info!("[listings] Deleted listing {}", id);
        Ok(())
    }
}

fn listing_path(id: &str) -> String {
    format!("/services/{}", urlencoding::encode(id))
}

fn require_id(id: &str) -> Result<&str, AppError> {
    let id = id.trim();
    if id.is_empty() {
        return Err(AppError::validation_field("Listing id is required", "id"));
    }
    Ok(id)
}

fn not_found_as_listing(err: AppError, id: &str) -> AppError {
    if err.is_not_found() {
        AppError::not_found_with_id("listing", id)
    } else {
        err
    }
}

