//! Service listing model.
//!
//! [`Listing::decode`] is the one place that knows which server field names
//! map onto each canonical field and in which fallback order.

use crate::error::AppError;
use crate::models::fields::{
    first_text, format_currency, list_field, parse_date, pretty_date, record_id, text_or_empty,
    unwrap_envelope,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Title used when the server sends neither `title` nor `name`.
pub const UNTITLED: &str = "Untitled";

/// Category used when the server sends none.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Date label used when the server sends no date at all.
pub const UNDATED: &str = "Undated";

/// Poster name used when nothing else is available.
pub const UNKNOWN_POSTER: &str = "Unknown";

/// Fields a draft must carry before it is sent, in form order.
pub const REQUIRED_FIELDS: [&str; 8] = [
    "title",
    "category",
    "projectType",
    "description",
    "duration",
    "budget",
    "level",
    "date",
];

/// Pricing model of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectType {
    #[serde(rename = "Fixed Price Project")]
    FixedPrice,
    #[serde(rename = "Hourly Project")]
    Hourly,
}

impl ProjectType {
    /// Parse the labels used by the listing form and by older records.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "fixed price project" | "fixed price" | "fixed-price" | "fixed" => {
                Some(Self::FixedPrice)
            }
            "hourly project" | "hourly" => Some(Self::Hourly),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::FixedPrice => "Fixed Price Project",
            Self::Hourly => "Hourly Project",
        }
    }
}

impl std::fmt::Display for ProjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Experience level a listing asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExperienceLevel {
    Entry,
    Intermediate,
    Senior,
}

impl ExperienceLevel {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "entry" | "entry level" => Some(Self::Entry),
            "intermediate" => Some(Self::Intermediate),
            "senior" => Some(Self::Senior),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Entry => "Entry",
            Self::Intermediate => "Intermediate",
            Self::Senior => "Senior",
        }
    }
}

impl std::fmt::Display for ExperienceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A service listing in canonical form.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    /// Server-assigned id.
    pub id: String,

    pub title: String,

    pub category: String,

    pub project_type: Option<ProjectType>,

    pub description: String,

    /// Free-text duration, e.g. "2 weeks".
    pub duration: String,

    /// Free-text budget range, e.g. "$500-$700".
    pub budget: String,

    /// Price as a display string (currency-formatted when the server sent a number).
    pub price: String,

    pub level: Option<ExperienceLevel>,

    /// Optional client/poster name.
    pub client: String,

    /// Comma-separated skills.
    pub skills: String,

    /// Machine-sortable creation date.
    pub posted_on: Option<NaiveDate>,

    /// Human-formatted creation date.
    pub date: String,

    pub badges: Vec<String>,

    pub tags: Vec<String>,

    pub freelancers: Vec<String>,
}

impl Listing {
    /// Decode one server record into a listing.
    ///
    /// Fallbacks: title ← `title` | `name` | "Untitled"; category ← `category`
    /// | "Uncategorized"; project type ← `projectType` | `type`; price ←
    /// `price` (numbers are currency-formatted); date ← `rawDate` | `date`;
    /// badges, tags and freelancers accept arrays or `,`/`|` delimited strings.
    pub fn decode(value: &Value) -> Result<Self, AppError> {
        let value = unwrap_envelope(value);
        if !value.is_object() {
            return Err(AppError::decode_entity(
                format!("expected an object, got {}", value),
                "listing",
            ));
        }

        let id = record_id(value)
            .ok_or_else(|| AppError::decode_entity("record has no id", "listing"))?;

        let price = match value.get("price") {
            Some(Value::Number(n)) => n.as_f64().map(format_currency).unwrap_or_default(),
            Some(Value::String(s)) => s.trim().to_string(),
            _ => String::new(),
        };

        let raw_date = first_text(value, &["rawDate", "date"]);
        let posted_on = raw_date.as_deref().and_then(parse_date);
        let date = match (posted_on, raw_date) {
            (Some(d), _) => pretty_date(d),
            (None, Some(raw)) => raw,
            (None, None) => UNDATED.to_string(),
        };

        Ok(Self {
            id,
            title: first_text(value, &["title", "name"]).unwrap_or_else(|| UNTITLED.to_string()),
            category: first_text(value, &["category"])
                .unwrap_or_else(|| UNCATEGORIZED.to_string()),
            project_type: first_text(value, &["projectType", "type"])
                .as_deref()
                .and_then(ProjectType::parse),
            description: text_or_empty(value, "description"),
            duration: text_or_empty(value, "duration"),
            budget: text_or_empty(value, "budget"),
            price,
            level: first_text(value, &["level"])
                .as_deref()
                .and_then(ExperienceLevel::parse),
            client: text_or_empty(value, "client"),
            skills: text_or_empty(value, "skills"),
            posted_on,
            date,
            badges: list_field(value, "badges"),
            tags: list_field(value, "tags"),
            freelancers: list_field(value, "freelancers"),
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
                    Ok(listing) => Some(listing),
                    Err(e) => {
                        log::warn!("[listings] Skipping undecodable record: {}", e);
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

    /// Who posted the listing; computed at read time, never stored.
    pub fn posted_by(&self) -> String {
        derive_posted_by(&self.client, &self.freelancers, &self.title)
    }

    /// Price when present, else the budget range.
    pub fn display_price(&self) -> &str {
        if self.price.trim().is_empty() {
            &self.budget
        } else {
            &self.price
        }
    }

}

/// Price string for a listing: the budget verbatim if non-blank, else the
/// price formatted as currency, else empty.
pub fn derive_price(budget: &str, price: &str) -> String {
    let budget = budget.trim();
    if !budget.is_empty() {
        return budget.to_string();
    }
    let price = price.trim();
    if price.is_empty() {
        return String::new();
    }
    match price.parse::<f64>() {
        Ok(amount) if amount.is_finite() => format_currency(amount),
        _ => price.to_string(),
    }
}

/// Poster name: client if non-blank, else the first freelancer, else the
/// title, else "Unknown".
pub fn derive_posted_by(client: &str, freelancers: &[String], title: &str) -> String {
    fn non_blank(s: &str) -> Option<String> {
        let s = s.trim();
        (!s.is_empty()).then(|| s.to_string())
    }
    non_blank(client)
        .or_else(|| freelancers.first().and_then(|f| non_blank(f.as_str())))
        .or_else(|| non_blank(title))
        .unwrap_or_else(|| UNKNOWN_POSTER.to_string())
}

/// Listing fields as entered by a seller, before validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingDraft {
    pub title: String,
    pub category: String,
    pub project_type: String,
    pub description: String,
    pub duration: String,
    pub budget: String,
    /// Exact price as typed; formatted as currency when numeric.
    pub price: String,
    pub level: String,
    pub client: String,
    pub skills: String,
    /// `YYYY-MM-DD` as produced by a date input.
    pub date: String,
    pub badges: Vec<String>,
    pub tags: Vec<String>,
    pub freelancers: Vec<String>,
}

impl ListingDraft {
    fn required_values(&self) -> [(&'static str, &str); 8] {
        [
            ("title", &self.title),
            ("category", &self.category),
            ("projectType", &self.project_type),
            ("description", &self.description),
            ("duration", &self.duration),
            ("budget", &self.budget),
            ("level", &self.level),
            ("date", &self.date),
        ]
    }

    /// Required fields that are blank, in form order.
    ///
    /// An exact price stands in for a blank budget range.
    pub fn missing_fields(&self) -> Vec<String> {
        let priced = !self.price.trim().is_empty();
        self.required_values()
            .iter()
            .filter(|(name, v)| v.trim().is_empty() && !(*name == "budget" && priced))
            .map(|(name, _)| name.to_string())
            .collect()
    }

    /// Validate the draft and build the request payload.
    ///
    /// Fails with `Validation` naming every missing or unparseable field.
    pub fn validate(&self) -> Result<ListingPayload, AppError> {
        let missing = self.missing_fields();
        if !missing.is_empty() {
            let verb = if missing.len() == 1 { "is" } else { "are" };
            return Err(AppError::validation(
                format!("{} {} required", missing.join(", "), verb),
                missing,
            ));
        }

        let project_type = ProjectType::parse(&self.project_type);
        let level = ExperienceLevel::parse(&self.level);
        let posted_on = parse_date(&self.date);

        let mut invalid = Vec::new();
        if project_type.is_none() {
            invalid.push("projectType".to_string());
        }
        if level.is_none() {
            invalid.push("level".to_string());
        }
        if posted_on.is_none() {
            invalid.push("date".to_string());
        }

        let (Some(project_type), Some(level), Some(posted_on)) = (project_type, level, posted_on)
        else {
            return Err(AppError::validation(
                format!("{} has an invalid value", invalid.join(", ")),
                invalid,
            ));
        };

        let title = self.title.trim().to_string();
        Ok(ListingPayload {
            name: title.clone(),
            title,
            category: self.category.trim().to_string(),
            project_type,
            description: self.description.trim().to_string(),
            duration: self.duration.trim().to_string(),
            budget: self.budget.trim().to_string(),
            price: derive_price(&self.budget, &self.price),
            level,
            client: self.client.trim().to_string(),
            skills: self.skills.trim().to_string(),
            date: pretty_date(posted_on),
            raw_date: posted_on.format("%Y-%m-%d").to_string(),
            badges: self.badges.clone(),
            tags: self.tags.clone(),
            freelancers: self.freelancers.clone(),
        })
    }
}

/// Body of `POST /services` and `PATCH /services/:id`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingPayload {
    /// Mirrors `title` for older readers that look for `name`.
    pub name: String,
    pub title: String,
    pub category: String,
    pub project_type: ProjectType,
    pub description: String,
    pub duration: String,
    pub budget: String,
    pub price: String,
    pub level: ExperienceLevel,
    pub client: String,
    pub skills: String,
    pub date: String,
    pub raw_date: String,
    pub badges: Vec<String>,
    pub tags: Vec<String>,
    pub freelancers: Vec<String>,
}

impl ListingPayload {
    /// The listing this payload describes once the server has assigned `id`.
    pub fn into_listing(self, id: impl Into<String>) -> Listing {
        Listing {
            id: id.into(),
            posted_on: parse_date(&self.raw_date),
            title: self.title,
            category: self.category,
            project_type: Some(self.project_type),
            description: self.description,
            duration: self.duration,
            budget: self.budget,
            price: self.price,
            level: Some(self.level),
            client: self.client,
            skills: self.skills,
            date: self.date,
            badges: self.badges,
            tags: self.tags,
            freelancers: self.freelancers,
        }
    }
}
