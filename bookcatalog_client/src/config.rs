use std::env;

/// Fallback backend endpoint for local development.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5120/api";

/// Client configuration, injected at construction time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookCatalogConfig {
    /// Base URL of the backend, including the `/api` prefix.
    pub base_url: String,
}

impl Default for BookCatalogConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl BookCatalogConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    /// Reads `BOOKCATALOG_API_URL`, falling back to [`DEFAULT_BASE_URL`].
    pub fn from_env() -> Self {
        let base_url = env::var("BOOKCATALOG_API_URL").unwrap_or(DEFAULT_BASE_URL.to_string());
        Self { base_url }
    }
}
