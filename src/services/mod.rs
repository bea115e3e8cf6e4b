//! Data-sync services.
//!
//! The HTTP client adapter, credential storage, the identity provider seam,
//! the auth session store and the listing/booking repositories. Nothing here
//! depends on a UI; presenters sit on top.

pub mod api_client;
pub mod bookings;
pub mod confirm;
pub mod credentials;
pub mod identity_provider;
pub mod listings;
pub mod session;

pub use api_client::{ApiClient, ApiRequest, ApiResponse, HttpMethod, ReqwestTransport, Transport};
pub use bookings::BookingRepository;
pub use confirm::{ConfirmPrompt, Confirmation, DeleteOutcome, FixedAnswer};
pub use credentials::{CredentialCell, CredentialService, MemorySecretStore, SecretStore};
pub use identity_provider::{IdentityProvider, RestIdentityProvider};
pub use listings::ListingRepository;
pub use session::{AuthSession, SessionObserver, SessionState};
