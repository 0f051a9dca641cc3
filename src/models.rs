use serde::Deserialize;

use crate::error::{AppError, AppResult};

/// Fields for a freshly added movie. Rating and review come later.
#[derive(Clone, Debug, PartialEq)]
pub struct NewMovie {
    pub title: String,
    pub year: i32,
    pub description: String,
    pub img_url: String,
}

/// One hit from a title search against the movie database.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct SearchCandidate {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
}

impl SearchCandidate {
    pub fn year_label(&self) -> Option<&str> {
        self.release_date.as_deref().and_then(|d| d.split('-').next()).filter(|y| !y.is_empty())
    }
}

#[derive(Debug, Deserialize)]
pub struct AddForm {
    #[serde(default)]
    pub title: String,
}

impl AddForm {
    pub fn validate(&self) -> AppResult<String> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(AppError::validation("movie title is required"));
        }
        Ok(title.to_string())
    }
}

#[derive(Debug, Deserialize)]
pub struct RateForm {
    #[serde(default)]
    pub rating: String,
    #[serde(default)]
    pub review: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Rating {
    pub rating: f64,
    pub review: String,
}

impl RateForm {
    pub fn validate(&self) -> AppResult<Rating> {
        let raw = self.rating.trim();
        if raw.is_empty() {
            return Err(AppError::validation("rating is required"));
        }
        let rating: f64 =
            raw.parse().map_err(|_| AppError::validation(format!("'{raw}' is not a number")))?;
        if !rating.is_finite() {
            return Err(AppError::validation("rating must be a finite number"));
        }
        Ok(Rating { rating, review: self.review.trim().to_string() })
    }
}
