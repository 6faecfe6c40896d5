use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub type BookId = i32;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub rating: f64,
    pub comments: String,
    pub has_notes: bool,
    #[serde(default)]
    pub cover_image_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookRequest {
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub rating: f64,
    pub comments: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image_url: Option<String>,
}

/// Partial update restricted to the two user-editable review fields.
/// Title, author and isbn cannot be patched through this path.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBookRequest {
    pub rating: f64,
    pub comments: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total_count: u64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

/// Sort keys accepted by the list endpoint, query-encoded in lowercase.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, Eq, PartialEq)]
pub enum SortBy {
    #[default]
    #[serde(rename = "title")]
    Title,
    #[serde(rename = "author")]
    Author,
    #[serde(rename = "rating")]
    Rating,
    #[serde(rename = "createdat")]
    CreatedAt,
}

impl SortBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortBy::Title => "title",
            SortBy::Author => "author",
            SortBy::Rating => "rating",
            SortBy::CreatedAt => "createdat",
        }
    }
}

impl fmt::Display for SortBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown sort key {0}")]
pub struct ParseSortByError(String);

impl FromStr for SortBy {
    type Err = ParseSortByError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "title" => Ok(SortBy::Title),
            "author" => Ok(SortBy::Author),
            "rating" => Ok(SortBy::Rating),
            "createdat" => Ok(SortBy::CreatedAt),
            other => Err(ParseSortByError(other.to_string())),
        }
    }
}

/// Parameters for the list endpoint. Absent fields are left out of the
/// query string entirely, letting the server apply its defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookSearchParams {
    pub search_term: Option<String>,
    pub sort_by: Option<SortBy>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

/// Problem-details style error payload returned by the backend on any
/// non-success response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    pub title: String,
    pub status: u16,
    pub detail: String,
    pub instance: String,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<HashMap<String, Vec<String>>>,
}

impl ApiError {
    /// Synthesizes an error payload for responses whose body was not a
    /// parseable `ApiError`, and for transport failures (status 0).
    pub fn server_error(status: u16, detail: impl Into<String>, instance: impl Into<String>) -> Self {
        Self {
            title: "Server Error".to_string(),
            status,
            detail: detail.into(),
            instance: instance.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            errors: None,
        }
    }
}

/// The single error kind raised by [`crate::client::BookCatalogClient`].
/// Transport failures and unparseable bodies are coerced into the same
/// shape rather than surfaced as distinct kinds.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{}", self.message())]
pub struct ApiValidationError {
    pub api_error: ApiError,
}

impl ApiValidationError {
    pub fn new(api_error: ApiError) -> Self {
        Self { api_error }
    }

    /// Human-readable message: detail when present, title otherwise.
    pub fn message(&self) -> &str {
        if self.api_error.detail.is_empty() {
            &self.api_error.title
        } else {
            &self.api_error.detail
        }
    }

    pub fn status(&self) -> u16 {
        self.api_error.status
    }
}
