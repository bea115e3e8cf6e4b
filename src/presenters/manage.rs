//! Seller's manage page: edit and delete listings.

use crate::models::Listing;
use crate::presenters::listing_form::ListingForm;
use crate::presenters::{Alert, ViewScope};
use crate::services::{ConfirmPrompt, Confirmation, ListingRepository};

/// Outcome of loading a listing into the edit form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditLoad {
    /// The form is prefilled.
    Ready,
    /// The listing no longer exists; the host should navigate away.
    Redirect,
    /// Some other failure; an alert is set.
    Failed,
    /// The view was unmounted before the response arrived.
    Discarded,
}

/// Listing being edited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSession {
    pub id: String,
    pub form: ListingForm,
}

pub struct ManageView {
    scope: ViewScope,
    repo: ListingRepository,
    pub items: Vec<Listing>,
    pub loading: bool,
    pub editing: Option<EditSession>,
    pub alert: Option<Alert>,
}

impl ManageView {
    pub fn new(scope: ViewScope, repo: ListingRepository) -> Self {
        Self {
            scope,
            repo,
            items: Vec::new(),
            loading: false,
            editing: None,
            alert: None,
        }
    }

    pub async fn load(&mut self) {
        self.loading = true;
        let result = self.repo.list_all().await;
        if !self.scope.is_mounted() {
            return;
        }
        self.loading = false;

        match result {
            Ok(items) => self.items = items,
            Err(e) => self.alert = Some(Alert::from_error(&e)),
        }
    }

    /// Fetch a listing and prefill the edit form.
    pub async fn open_edit(&mut self, id: &str) -> EditLoad {
        let result = self.repo.get(id).await;
        if !self.scope.is_mounted() {
            return EditLoad::Discarded;
        }

        match result {
            Ok(listing) => {
                self.editing = Some(EditSession {
                    id: listing.id.clone(),
                    form: ListingForm::from_listing(&listing),
                });
                EditLoad::Ready
            }
            Err(e) => {
                self.alert = Some(Alert::from_error(&e));
                if e.is_not_found() {
                    log::info!("[manage] Listing {} is gone, leaving edit", id);
                    self.items.retain(|l| l.id != id);
                    EditLoad::Redirect
                } else {
                    EditLoad::Failed
                }
            }
        }
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    /// Save the edit form. The updated listing replaces the old one in place.
    pub async fn submit_edit(&mut self) -> Option<Listing> {
        let (id, draft) = match &self.editing {
            Some(edit) => (edit.id.clone(), edit.form.to_draft()),
            None => return None,
        };

        let result = self.repo.update(&id, &draft).await;
        if !self.scope.is_mounted() {
            return None;
        }

        match result {
            Ok(listing) => {
                if let Some(slot) = self.items.iter_mut().find(|l| l.id == listing.id) {
                    *slot = listing.clone();
                }
                self.editing = None;
                self.alert = Some(Alert::success("Updated", listing.title.clone()));
                Some(listing)
            }
            Err(e) => {
                self.alert = Some(Alert::from_error(&e));
                None
            }
        }
    }

    /// Delete a listing after confirmation; true if it left the list.
    ///
    /// A listing that is already gone counts as deleted.
    pub async fn delete(&mut self, id: &str, confirmation: &dyn Confirmation) -> bool {
        if !confirmation.confirm(&ConfirmPrompt::delete_listing()).await {
            return false;
        }

        let result = self.repo.delete(id).await;
        if !self.scope.is_mounted() {
            return false;
        }

        match result {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                log::debug!("[manage] Listing {} was already deleted", id);
            }
            Err(e) => {
                self.alert = Some(Alert::from_error(&e));
                return false;
            }
        }

        self.items.retain(|l| l.id != id);
        self.alert = Some(Alert::success("Deleted!", "Your service has been deleted."));
        true
    }

    pub fn dismiss_alert(&mut self) {
        self.alert = None;
    }
}
