//! Gigmarket - data layer for a freelance services marketplace.
//!
//! Listings and bookings are fetched from the marketplace backend, decoded
//! into canonical records and handed to view presenters. Identity comes
//! from an external email/password provider; the backend is authorized with
//! a bearer credential issued per signed-in identity.
//!
//! Rendering is left to the host: presenters expose plain state plus async
//! operations, and `Marketplace` wires everything together.

pub mod app;
pub mod config;
pub mod error;
pub mod models;
pub mod presenters;
pub mod services;

pub use app::Marketplace;
pub use config::{BookingFilter, ClientConfig};
pub use error::AppError;
