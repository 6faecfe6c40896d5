use anyhow::Context;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_tracing::TracingMiddleware;
use serde::de::DeserializeOwned;

use crate::api::{
    ApiError, ApiValidationError, Book, BookId, BookSearchParams, CreateBookRequest,
    PaginatedResponse, UpdateBookRequest,
};
use crate::config::BookCatalogConfig;

pub struct BookCatalogClient {
    base_url: String,
    client: ClientWithMiddleware,
}

/// Query pairs for the list endpoint, in stable order. Fields that are
/// absent (or an empty search term) are left out entirely.
fn search_query_pairs(params: &BookSearchParams) -> Vec<(&'static str, String)> {
    let mut pairs = Vec::new();
    if let Some(term) = params.search_term.as_deref().filter(|term| !term.is_empty()) {
        pairs.push(("searchTerm", term.to_string()));
    }
    if let Some(sort_by) = params.sort_by {
        pairs.push(("sortBy", sort_by.as_str().to_string()));
    }
    if let Some(page) = params.page {
        pairs.push(("page", page.to_string()));
    }
    if let Some(page_size) = params.page_size {
        pairs.push(("pageSize", page_size.to_string()));
    }
    pairs
}

impl BookCatalogClient {
    pub fn new(config: BookCatalogConfig) -> anyhow::Result<Self> {
        let reqwest_client = reqwest::Client::builder()
            .build()
            .context("Failed to build reqwest client")?;
        let client = ClientBuilder::new(reqwest_client)
            // Insert the tracing middleware
            .with(TracingMiddleware::default())
            .build();

        Ok(Self {
            base_url: config.base_url,
            client,
        })
    }

    /// Calls GET /books endpoint
    /// Builds a query string from the present params only; a bare URL is
    /// requested when every param is absent.
    pub async fn get_books(
        &self,
        params: &BookSearchParams,
    ) -> Result<PaginatedResponse<Book>, ApiValidationError> {
        let url = format!("{}/books", self.base_url);
        let pairs = search_query_pairs(params);
        let mut request = self.client.get(&url);
        if !pairs.is_empty() {
            request = request.query(&pairs);
        }
        let response = request
            .send()
            .await
            .map_err(|err| transport_error(&url, err))?;
        handle_response(response).await
    }

    /// Calls GET /books/{id} endpoint
    pub async fn get_book(&self, book_id: BookId) -> Result<Book, ApiValidationError> {
        let url = format!("{}/books/{}", self.base_url, book_id);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|err| transport_error(&url, err))?;
        handle_response(response).await
    }

    /// Calls POST /books endpoint
    /// Returns the created book, including the server-assigned fields.
    pub async fn create_book(
        &self,
        request: &CreateBookRequest,
    ) -> Result<Book, ApiValidationError> {
        let url = format!("{}/books", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|err| transport_error(&url, err))?;
        handle_response(response).await
    }

    /// Calls PUT /books/{id} endpoint
    /// The body carries exactly the rating and comments fields.
    pub async fn update_book(
        &self,
        book_id: BookId,
        request: &UpdateBookRequest,
    ) -> Result<Book, ApiValidationError> {
        let url = format!("{}/books/{}", self.base_url, book_id);
        let response = self
            .client
            .put(&url)
            .json(request)
            .send()
            .await
            .map_err(|err| transport_error(&url, err))?;
        handle_response(response).await
    }

    /// Calls DELETE /books/{id} endpoint
    /// Success is decided by the status alone; no body is parsed. On
    /// failure the body is parsed as a JSON [`ApiError`] directly.
    pub async fn delete_book(&self, book_id: BookId) -> Result<(), ApiValidationError> {
        let url = format!("{}/books/{}", self.base_url, book_id);
        let response = self
            .client
            .delete(&url)
            .send()
            .await
            .map_err(|err| transport_error(&url, err))?;

        if response.status().is_success() {
            return Ok(());
        }

        let status = response.status().as_u16();
        let api_error: ApiError = response.json().await.map_err(|err| {
            ApiValidationError::new(ApiError::server_error(status, err.to_string(), &url))
        })?;
        Err(ApiValidationError::new(api_error))
    }

    /// Calls GET /books/exists/{isbn} endpoint
    pub async fn check_book_exists(&self, isbn: &str) -> Result<bool, ApiValidationError> {
        let url = format!("{}/books/exists/{}", self.base_url, isbn);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|err| transport_error(&url, err))?;
        handle_response(response).await
    }
}

fn transport_error(url: &str, err: reqwest_middleware::Error) -> ApiValidationError {
    ApiValidationError::new(ApiError::server_error(0, err.to_string(), url))
}

/// Normalizes a response: 2xx bodies deserialize into the declared type,
/// anything else becomes an [`ApiValidationError`]. A non-JSON error body
/// falls back to a synthesized "Server Error" payload carrying the raw
/// text as detail.
async fn handle_response<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ApiValidationError> {
    let url = response.url().to_string();
    let status = response.status();

    if !status.is_success() {
        tracing::debug!("Request to {} failed with status {}", url, status);
        let body = response.text().await.map_err(|err| {
            ApiValidationError::new(ApiError::server_error(status.as_u16(), err.to_string(), &url))
        })?;
        let api_error = serde_json::from_str::<ApiError>(&body).unwrap_or_else(|_| {
            ApiError::server_error(status.as_u16(), body, &url)
        });
        return Err(ApiValidationError::new(api_error));
    }

    response
        .json()
        .await
        .map_err(|err| ApiValidationError::new(ApiError::server_error(0, err.to_string(), &url)))
}
