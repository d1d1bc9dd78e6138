//!
//! vertocraft domain model
//! ------------------------
//! Canonical definitions of the two persisted entities (contact submissions and
//! portfolio items), the validated "new" shapes handed to the store, and the
//! request forms they are built from. Storage backends map these types onto
//! their own row layout; nothing else defines the entities.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

pub const ROW_SPAN_MIN: i32 = 20;
pub const ROW_SPAN_MAX: i32 = 50;

/// Category value the public gallery uses to mean "no filter". Never stored.
pub const ALL_CATEGORIES: &str = "all";

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("static email regex"));
static SLUG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("static slug regex"));

/// Masonry layout hint for a portfolio item. Always within
/// [`ROW_SPAN_MIN`, `ROW_SPAN_MAX`]; there is no way to construct one outside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct RowSpan(i32);

impl RowSpan {
    pub fn get(self) -> i32 { self.0 }
}

impl TryFrom<i32> for RowSpan {
    type Error = String;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        if (ROW_SPAN_MIN..=ROW_SPAN_MAX).contains(&value) {
            Ok(RowSpan(value))
        } else {
            Err(format!("rowSpan must be between {} and {}, got {}", ROW_SPAN_MIN, ROW_SPAN_MAX, value))
        }
    }
}

impl From<RowSpan> for i32 {
    fn from(r: RowSpan) -> i32 { r.0 }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub services: Vec<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioItem {
    pub id: i64,
    pub title: String,
    pub category: String,
    pub categories: String,
    pub image: String,
    pub row_span: RowSpan,
    pub created_at: String,
}

/// A contact submission that passed validation and is ready to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewContact {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub services: Vec<String>,
}

impl NewContact {
    pub fn into_contact(self, id: i64, created_at: String) -> Contact {
        Contact {
            id,
            name: self.name,
            email: self.email,
            subject: self.subject,
            message: self.message,
            services: self.services,
            created_at,
        }
    }
}

/// A portfolio item that passed validation and whose image is already stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPortfolioItem {
    pub title: String,
    pub category: String,
    pub categories: String,
    pub image: String,
    pub row_span: RowSpan,
}

impl NewPortfolioItem {
    pub fn into_item(self, id: i64, created_at: String) -> PortfolioItem {
        PortfolioItem {
            id,
            title: self.title,
            category: self.category,
            categories: self.categories,
            image: self.image,
            row_span: self.row_span,
            created_at,
        }
    }
}

/// Body of `POST /api/contact`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    #[serde(default)]
    pub services: Vec<String>,
}

impl ContactForm {
    /// Length rules apply to the trimmed text; the stored record keeps the
    /// submitted values unchanged.
    pub fn validate(self) -> AppResult<NewContact> {
        min_chars("name", self.name.trim(), 2, "Name must be at least 2 characters")?;
        if !EMAIL_RE.is_match(&self.email) {
            return Err(AppError::validation("validation_error", "Please enter a valid email address"));
        }
        min_chars("subject", self.subject.trim(), 2, "Subject is required")?;
        min_chars("message", self.message.trim(), 10, "Message must be at least 10 characters")?;
        Ok(NewContact {
            name: self.name,
            email: self.email,
            subject: self.subject,
            message: self.message,
            services: self.services,
        })
    }
}

/// Text fields of the multipart `POST /api/portfolio` body. `row_span` is kept raw
/// because multipart values arrive as text.
#[derive(Debug, Clone, Default)]
pub struct PortfolioForm {
    pub title: Option<String>,
    pub category: Option<String>,
    pub categories: Option<String>,
    pub row_span: Option<String>,
}

impl PortfolioForm {
    /// Record a named text field; unknown fields are ignored.
    pub fn set_field(&mut self, name: &str, value: String) {
        match name {
            "title" => self.title = Some(value),
            "category" => self.category = Some(value),
            "categories" => self.categories = Some(value),
            "rowSpan" | "row_span" => self.row_span = Some(value),
            _ => {}
        }
    }

    /// Validate the text fields and pair them with the stored image path.
    pub fn validate(&self, image: String) -> AppResult<NewPortfolioItem> {
        let title = self.title.as_deref().unwrap_or("").trim().to_string();
        min_chars("title", &title, 2, "Title must be at least 2 characters")?;

        let category = self.category.as_deref().unwrap_or("").trim().to_ascii_lowercase();
        validate_category(&category)?;

        let categories = self.categories.as_deref().unwrap_or("").trim().to_string();

        let raw_span = self
            .row_span
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AppError::validation("validation_error", "rowSpan is required"))?;
        let span: i32 = raw_span
            .parse()
            .map_err(|_| AppError::validation("validation_error", format!("rowSpan must be an integer, got '{}'", raw_span)))?;
        let row_span = RowSpan::try_from(span).map_err(|m| AppError::validation("validation_error", m))?;

        Ok(NewPortfolioItem { title, category, categories, image, row_span })
    }
}

/// A category is a lowercase slug such as `branding` or `logo-design`.
pub fn validate_category(category: &str) -> AppResult<()> {
    if category == ALL_CATEGORIES {
        return Err(AppError::validation("validation_error", "category 'all' is reserved"));
    }
    if !SLUG_RE.is_match(category) {
        return Err(AppError::validation(
            "validation_error",
            "category must be a lowercase tag like 'branding' or 'logo-design'",
        ));
    }
    Ok(())
}

fn min_chars(field: &str, value: &str, min: usize, msg: &str) -> AppResult<()> {
    if value.chars().count() < min {
        tracing::debug!(target: "vertocraft::model", field, len = value.chars().count(), "field too short");
        return Err(AppError::validation("validation_error", msg));
    }
    Ok(())
}
