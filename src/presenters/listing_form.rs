//! The listing form, shared by the add and edit flows.

use crate::models::fields::split_list;
use crate::models::{Listing, ListingDraft};
use crate::presenters::{Alert, ViewScope};
use crate::services::ListingRepository;

/// Form state for adding or editing a listing.
///
/// Badges and tags are typed as delimited text; freelancers are collected
/// one at a time through `freelancer_input`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingForm {
    pub title: String,
    pub category: String,
    pub project_type: String,
    pub description: String,
    pub duration: String,
    pub budget: String,
    pub price: String,
    pub level: String,
    pub client: String,
    pub skills: String,
    /// `YYYY-MM-DD`.
    pub date: String,
    pub badges: String,
    pub tags: String,
    pub freelancers: Vec<String>,
    pub freelancer_input: String,
}

impl ListingForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefill for editing.
    pub fn from_listing(listing: &Listing) -> Self {
        Self {
            title: listing.title.clone(),
            category: listing.category.clone(),
            project_type: listing
                .project_type
                .map(|p| p.label().to_string())
                .unwrap_or_default(),
            description: listing.description.clone(),
            duration: listing.duration.clone(),
            budget: listing.budget.clone(),
            price: listing.price.clone(),
            level: listing.level.map(|l| l.label().to_string()).unwrap_or_default(),
            client: listing.client.clone(),
            skills: listing.skills.clone(),
            date: listing
                .posted_on
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            badges: listing.badges.join(", "),
            tags: listing.tags.join(", "),
            freelancers: listing.freelancers.clone(),
            freelancer_input: String::new(),
        }
    }

    /// Move the typed freelancer name into the list.
    ///
    /// Blank input is ignored. A duplicate is rejected with an info alert and
    /// the input is kept for correction.
    pub fn add_freelancer(&mut self) -> Option<Alert> {
        let name = self.freelancer_input.trim().to_string();
        if name.is_empty() {
            return None;
        }
        if self.freelancers.iter().any(|f| f == &name) {
            return Some(Alert::info(
                "Already added",
                format!("{} is already on this listing", name),
            ));
        }
        self.freelancers.push(name);
        self.freelancer_input.clear();
        None
    }

    pub fn remove_freelancer(&mut self, index: usize) -> bool {
        if index < self.freelancers.len() {
            self.freelancers.remove(index);
            true
        } else {
            false
        }
    }

    pub fn to_draft(&self) -> ListingDraft {
        ListingDraft {
            title: self.title.clone(),
            category: self.category.clone(),
            project_type: self.project_type.clone(),
            description: self.description.clone(),
            duration: self.duration.clone(),
            budget: self.budget.clone(),
            price: self.price.clone(),
            level: self.level.clone(),
            client: self.client.clone(),
            skills: self.skills.clone(),
            date: self.date.clone(),
            badges: split_list(&self.badges),
            tags: split_list(&self.tags),
            freelancers: self.freelancers.clone(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// The add-listing page.
pub struct AddListingView {
    scope: ViewScope,
    repo: ListingRepository,
    pub form: ListingForm,
    pub submitting: bool,
    pub alert: Option<Alert>,
}

impl AddListingView {
    pub fn new(scope: ViewScope, repo: ListingRepository) -> Self {
        Self {
            scope,
            repo,
            form: ListingForm::new(),
            submitting: false,
            alert: None,
        }
    }

    pub fn add_freelancer(&mut self) {
        if let Some(alert) = self.form.add_freelancer() {
            self.alert = Some(alert);
        }
    }

    /// Submit the form; the form is reset after a successful create.
    pub async fn submit(&mut self) -> Option<Listing> {
        self.submitting = true;
        let result = self.repo.create(&self.form.to_draft()).await;
        if !self.scope.is_mounted() {
            return None;
        }
        self.submitting = false;

        match result {
            Ok(listing) => {
                self.form.reset();
                self.alert = Some(Alert::success("Service added", listing.title.clone()));
                Some(listing)
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
