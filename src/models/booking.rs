//! Booking model.
//!
//! A booking carries a snapshot of the listing taken at booking time; it
//! is never joined back to the live listing afterwards.

use crate::error::AppError;
use crate::models::fields::{first_text, list_field, record_id, text_or_empty, unwrap_envelope};
use crate::models::identity::Identity;
use crate::models::listing::Listing;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Lifecycle status of a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BookingStatus {
    #[default]
    Pending,
    Completed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Completed => "Completed",
        }
    }

    /// Pending becomes Completed and vice versa.
    pub fn toggled(&self) -> Self {
        match self {
            Self::Pending => Self::Completed,
            Self::Completed => Self::Pending,
        }
    }

    /// Parse a status read from the server; absent or unknown means Pending.
    pub fn lenient(s: Option<&str>) -> Self {
        s.and_then(|s| s.parse().ok()).unwrap_or_default()
    }
}

impl std::str::FromStr for BookingStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            _ => Err(AppError::invalid_status(s)),
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who requested the booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Booker {
    pub name: String,
    pub email: String,
}

impl Booker {
    pub fn from_identity(identity: &Identity) -> Self {
        Self {
            name: identity.name_or_guest().to_string(),
            email: identity.email.clone(),
        }
    }
}

/// Listing fields copied into the booking at booking time.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingSnapshot {
    pub service_id: String,
    pub title: String,
    pub price: String,
    pub description: String,
    pub category: String,
    pub duration: String,
    pub project_type: String,
    pub posted_by: String,
    pub badges: Vec<String>,
    pub tags: Vec<String>,
}

impl ListingSnapshot {
    pub fn of(listing: &Listing) -> Self {
        Self {
            service_id: listing.id.clone(),
            title: listing.title.clone(),
            price: listing.display_price().to_string(),
            description: listing.description.clone(),
            category: listing.category.clone(),
            duration: listing.duration.clone(),
            project_type: listing
                .project_type
                .map(|p| p.label().to_string())
                .unwrap_or_default(),
            posted_by: listing.posted_by(),
            badges: listing.badges.clone(),
            tags: listing.tags.clone(),
        }
    }
}

/// A booking request in canonical form.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: String,
    pub listing: ListingSnapshot,
    pub booker: Booker,
    pub message: String,
    pub status: BookingStatus,
    pub created_at: Option<DateTime<Utc>>,
}

impl Booking {
    /// Decode one server record into a booking.
    pub fn decode(value: &Value) -> Result<Self, AppError> {
        let value = unwrap_envelope(value);
        if !value.is_object() {
            return Err(AppError::decode_entity(
                format!("expected an object, got {}", value),
                "booking",
            ));
        }

        let id = record_id(value)
            .ok_or_else(|| AppError::decode_entity("record has no id", "booking"))?;

        let created_at = first_text(value, &["createdAt", "created_at"])
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|ts| ts.with_timezone(&Utc));

        Ok(Self {
            id,
            listing: ListingSnapshot {
                service_id: text_or_empty(value, "serviceId"),
                title: first_text(value, &["serviceTitle", "title"]).unwrap_or_default(),
                price: text_or_empty(value, "price"),
                description: text_or_empty(value, "description"),
                category: text_or_empty(value, "category"),
                duration: text_or_empty(value, "duration"),
                project_type: text_or_empty(value, "projectType"),
                posted_by: text_or_empty(value, "postedBy"),
                badges: list_field(value, "badges"),
                tags: list_field(value, "tags"),
            },
            booker: Booker {
                name: text_or_empty(value, "userName"),
                email: text_or_empty(value, "userEmail"),
            },
            message: text_or_empty(value, "message"),
            status: BookingStatus::lenient(first_text(value, &["status"]).as_deref()),
            created_at,
        })
    }

    /// Decode a server array; a non-array body decodes as empty.
    ///
    /// Records that fail to decode are logged and skipped.
    pub fn decode_all(value: &Value) -> Vec<Self> {
        match value {
            Value::Array(items) => items
                .iter()
                .filter_map(|item| match Self::decode(item) {
                    Ok(booking) => Some(booking),
                    Err(e) => {
                        log::warn!("[bookings] Skipping undecodable record: {}", e);
                        None
                    }
                })
                .collect(),
            Value::Null => Vec::new(),
            other => match other.get("data") {
                Some(inner @ Value::Array(_)) => Self::decode_all(inner),
                _ => Vec::new(),
            },
        }
    }

    /// Exact match on the booker's email.
    pub fn belongs_to(&self, email: &str) -> bool {
        self.booker.email == email
    }

    pub fn with_status(mut self, status: BookingStatus) -> Self {
        self.status = status;
        self
    }
}

/// Body of `POST /bookings`.
///
/// Carries no `status`; the server defaults it to Pending.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBooking {
    pub service_id: String,
    pub service_title: String,
    pub price: String,
    pub description: String,
    pub category: String,
    pub duration: String,
    pub badges: Vec<String>,
    pub tags: Vec<String>,
    pub project_type: String,
    pub posted_by: String,
    pub user_name: String,
    pub user_email: String,
    pub message: String,
    pub created_at: String,
}

impl NewBooking {
    pub fn new(listing: &Listing, booker: &Booker, message: &str, now: DateTime<Utc>) -> Self {
        let snapshot = ListingSnapshot::of(listing);
        Self {
            service_id: snapshot.service_id,
            service_title: snapshot.title,
            price: snapshot.price,
            description: snapshot.description,
            category: snapshot.category,
            duration: snapshot.duration,
            badges: snapshot.badges,
            tags: snapshot.tags,
            project_type: snapshot.project_type,
            posted_by: snapshot.posted_by,
            user_name: booker.name.clone(),
            user_email: booker.email.clone(),
            message: message.trim().to_string(),
            created_at: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    /// The booking this request describes once the server has assigned `id`.
    pub fn into_booking(self, id: impl Into<String>) -> Booking {
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .ok()
            .map(|ts| ts.with_timezone(&Utc));
        Booking {
            id: id.into(),
            listing: ListingSnapshot {
                service_id: self.service_id,
                title: self.service_title,
                price: self.price,
                description: self.description,
                category: self.category,
                duration: self.duration,
                project_type: self.project_type,
                posted_by: self.posted_by,
                badges: self.badges,
                tags: self.tags,
            },
            booker: Booker {
                name: self.user_name,
                email: self.user_email,
            },
            message: self.message,
            status: BookingStatus::Pending,
            created_at,
        }
    }
}
