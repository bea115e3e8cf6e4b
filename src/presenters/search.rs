//! Free-text search over listings.

use crate::models::Listing;

/// Suggestions offered in the search dropdown.
pub const SEARCH_SUGGESTIONS: [&str; 5] = [
    "Web Developer",
    "Digital Marketing",
    "Graphic Designer",
    "Content Writer",
    "SEO Specialist",
];

/// Case-insensitive substring match on title, category, tags or badges.
///
/// A blank query matches everything.
pub fn listing_matches(listing: &Listing, query: &str) -> bool {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return true;
    }
    let hit = |text: &str| text.to_lowercase().contains(&query);

    hit(&listing.title)
        || hit(&listing.category)
        || listing.tags.iter().any(|t| hit(t))
        || listing.badges.iter().any(|b| hit(b))
}

pub fn filter_listings<'a>(listings: &'a [Listing], query: &str) -> Vec<&'a Listing> {
    listings
        .iter()
        .filter(|listing| listing_matches(listing, query))
        .collect()
}

/// Search box state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchView {
    pub query: String,
    pub dropdown_open: bool,
    /// When off, the query is captured but results are not narrowed.
    pub filtering: bool,
}

impl Default for SearchView {
    fn default() -> Self {
        Self::new(true)
    }
}

impl SearchView {
    pub fn new(filtering: bool) -> Self {
        Self {
            query: String::new(),
            dropdown_open: false,
            filtering,
        }
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    pub fn toggle_dropdown(&mut self) {
        self.dropdown_open = !self.dropdown_open;
    }

    /// Use a dropdown suggestion as the query and close the dropdown.
    pub fn select_suggestion(&mut self, index: usize) -> bool {
        match SEARCH_SUGGESTIONS.get(index) {
            Some(suggestion) => {
                self.query = suggestion.to_string();
                self.dropdown_open = false;
                true
            }
            None => false,
        }
    }

    pub fn apply<'a>(&self, listings: &'a [Listing]) -> Vec<&'a Listing> {
        if self.filtering {
            filter_listings(listings, &self.query)
        } else {
            listings.iter().collect()
        }
    }
}
