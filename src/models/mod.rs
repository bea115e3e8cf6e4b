//! Data models for the application.
//!
//! These models represent the canonical records the repositories hand to
//! presenters. Server responses are turned into them by explicit decoders
//! (`Listing::decode`, `Booking::decode`) rather than by derived `Deserialize`,
//! because the backend accepts several field names per concept.

pub mod booking;
pub mod fields;
pub mod identity;
pub mod listing;

// Re-exports for convenient access
pub use booking::{Booker, Booking, BookingStatus, ListingSnapshot, NewBooking};
pub use identity::{BearerToken, Identity};
pub use listing::{
    derive_posted_by, derive_price, ExperienceLevel, Listing, ListingDraft, ListingPayload,
    ProjectType,
};
