//! Browse listings and book one.

use crate::error::AppError;
use crate::models::{Booker, Booking, Listing};
use crate::presenters::search::SearchView;
use crate::presenters::{Alert, ViewScope};
use crate::services::{AuthSession, BookingRepository, ListingRepository};

/// The public catalog: listing grid, search box, featured card and the
/// booking dialog.
pub struct CatalogView {
    scope: ViewScope,
    listings: ListingRepository,
    bookings: BookingRepository,
    session: AuthSession,

    pub items: Vec<Listing>,
    pub loading: bool,
    pub search: SearchView,
    pub featured_index: usize,

    /// Listing whose booking dialog is open.
    pub open_service: Option<Listing>,
    pub booking_message: String,
    pub booking_in_flight: bool,
    pub alert: Option<Alert>,
}

impl CatalogView {
    pub fn new(
        scope: ViewScope,
        listings: ListingRepository,
        bookings: BookingRepository,
        session: AuthSession,
    ) -> Self {
        Self {
            scope,
            listings,
            bookings,
            session,
            items: Vec::new(),
            loading: false,
            search: SearchView::default(),
            featured_index: 0,
            open_service: None,
            booking_message: String::new(),
            booking_in_flight: false,
            alert: None,
        }
    }

    pub async fn load(&mut self) {
        self.loading = true;
        let result = self.listings.list_all().await;
        if !self.scope.is_mounted() {
            return;
        }
        self.loading = false;

        match result {
            Ok(items) => {
                if self.featured_index >= items.len() {
                    self.featured_index = 0;
                }
                self.items = items;
            }
            Err(e) => {
                log::warn!("[catalog] Could not load listings: {}", e);
                self.alert = Some(Alert::from_error(&e));
            }
        }
    }

    /// Listings matching the current search.
    pub fn visible(&self) -> Vec<&Listing> {
        self.search.apply(&self.items)
    }

    pub fn featured(&self) -> Option<&Listing> {
        self.items.get(self.featured_index)
    }

    pub fn feature(&mut self, index: usize) {
        if index < self.items.len() {
            self.featured_index = index;
        }
    }

    /// Open the booking dialog for a listing.
    pub fn open(&mut self, id: &str) -> bool {
        match self.items.iter().find(|l| l.id == id) {
            Some(listing) => {
                self.open_service = Some(listing.clone());
                self.booking_message.clear();
                true
            }
            None => false,
        }
    }

    pub fn close(&mut self) {
        self.open_service = None;
        self.booking_message.clear();
    }

    /// Book the open listing as the signed-in user.
    ///
    /// Success closes the dialog; failure keeps it open with an alert.
    pub async fn submit_booking(&mut self) -> Option<Booking> {
        let Some(identity) = self.session.current_identity() else {
            self.alert = Some(Alert::from_error(&AppError::unauthorized(
                "Sign in to book a service",
            )));
            return None;
        };
        let booker = Booker::from_identity(&identity);

        self.booking_in_flight = true;
        let result = self
            .bookings
            .create(self.open_service.as_ref(), &booker, &self.booking_message)
            .await;
        if !self.scope.is_mounted() {
            return None;
        }
        self.booking_in_flight = false;

        match result {
            Ok(booking) => {
                self.alert = Some(Alert::success(
                    "Booked!",
                    format!("Your request for {} was sent", booking.listing.title),
                ));
                self.close();
                Some(booking)
            }
            Err(e) => {
                self.alert = Some(Alert::from_error(&e));
                None
            }
        }
    }

    pub fn dismiss_alert(&mut self) {
        self.alert = None;
    }
}
