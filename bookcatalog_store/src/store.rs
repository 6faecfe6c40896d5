use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;

use bookcatalog_client::api::{
    ApiValidationError, Book, BookId, BookSearchParams, CreateBookRequest, SortBy,
    UpdateBookRequest,
};
use bookcatalog_client::client::BookCatalogClient;

/// The currently displayed page of books plus the parameters that
/// produced it. Holds the current page only, never an accumulation
/// across pages.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogState {
    pub books: Vec<Book>,
    pub total_count: u64,
    pub current_page: u32,
    pub page_size: u32,
    pub total_pages: u32,
    pub has_next_page: bool,
    pub has_previous_page: bool,
    pub loading: bool,
    pub error: Option<String>,
    pub search_term: String,
    pub sort_by: SortBy,
}

impl Default for CatalogState {
    fn default() -> Self {
        Self {
            books: Vec::new(),
            total_count: 0,
            current_page: 1,
            page_size: 10,
            total_pages: 0,
            has_next_page: false,
            has_previous_page: false,
            loading: false,
            error: None,
            search_term: String::new(),
            sort_by: SortBy::Title,
        }
    }
}

impl CatalogState {
    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    pub fn can_load_more(&self) -> bool {
        self.has_next_page
    }
}

/// Single source of truth for the catalog list view. Constructed from a
/// client at application start; collaborators read state through
/// [`CatalogStore::snapshot`] or [`CatalogStore::subscribe`] and mutate
/// only through the actions below.
///
/// Every action that touches state records failures in
/// [`CatalogState::error`] and also returns them to the caller.
pub struct CatalogStore {
    client: BookCatalogClient,
    state: watch::Sender<CatalogState>,
    fetch_generation: AtomicU64,
}

impl CatalogStore {
    pub fn new(client: BookCatalogClient) -> Self {
        let (state, _) = watch::channel(CatalogState::default());
        Self {
            client,
            state,
            fetch_generation: AtomicU64::new(0),
        }
    }

    /// Returns a copy of the current state.
    pub fn snapshot(&self) -> CatalogState {
        self.state.borrow().clone()
    }

    /// Returns a receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<CatalogState> {
        self.state.subscribe()
    }

    /// Loads a page of books. Explicit params win over the stored ones;
    /// an explicitly passed search term or sort key is persisted into the
    /// store, while page and page size always come back from the
    /// response. When fetches overlap, only the newest one commits its
    /// outcome; a superseded call still returns its own result, which is
    /// never reflected in state.
    pub async fn fetch_books(
        &self,
        params: BookSearchParams,
    ) -> Result<(), ApiValidationError> {
        let generation = self.fetch_generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.send_modify(|state| {
            state.loading = true;
            state.error = None;
        });

        let effective = {
            let state = self.state.borrow();
            BookSearchParams {
                search_term: params
                    .search_term
                    .clone()
                    .or_else(|| (!state.search_term.is_empty()).then(|| state.search_term.clone())),
                sort_by: params.sort_by.or(Some(state.sort_by)),
                page: params.page.or(Some(state.current_page)),
                page_size: params.page_size.or(Some(state.page_size)),
            }
        };

        match self.client.get_books(&effective).await {
            Ok(response) => {
                if self.fetch_generation.load(Ordering::SeqCst) == generation {
                    self.state.send_modify(|state| {
                        state.total_count = response.total_count;
                        state.current_page = response.page;
                        state.page_size = response.page_size;
                        state.total_pages = response.total_pages;
                        state.has_next_page = response.has_next_page;
                        state.has_previous_page = response.has_previous_page;
                        state.books = response.items;
                        if let Some(term) = &params.search_term {
                            state.search_term = term.clone();
                        }
                        if let Some(sort_by) = params.sort_by {
                            state.sort_by = sort_by;
                        }
                        state.loading = false;
                    });
                }
                Ok(())
            }
            Err(err) => {
                tracing::error!("Failed to fetch books: {}", err);
                if self.fetch_generation.load(Ordering::SeqCst) == generation {
                    self.state.send_modify(|state| {
                        state.error = Some(err.to_string());
                        state.loading = false;
                    });
                }
                Err(err)
            }
        }
    }

    /// Creates a book, then reloads page 1 from the server instead of
    /// inserting locally. The refresh reports its own failures through
    /// the stored error; a successful creation is returned either way.
    pub async fn create_book(
        &self,
        request: CreateBookRequest,
    ) -> Result<Book, ApiValidationError> {
        let created = match self.client.create_book(&request).await {
            Ok(book) => book,
            Err(err) => {
                self.record_failure(&err);
                return Err(err);
            }
        };

        if let Err(err) = self
            .fetch_books(BookSearchParams {
                page: Some(1),
                ..Default::default()
            })
            .await
        {
            tracing::error!("Failed to refresh list after create: {}", err);
        }

        Ok(created)
    }

    /// Updates a book and patches the matching entry of the current page
    /// in place. An id that is not on the current page leaves the list
    /// untouched; visibility-wise that is a no-op, not an error.
    pub async fn update_book(
        &self,
        book_id: BookId,
        request: UpdateBookRequest,
    ) -> Result<Book, ApiValidationError> {
        match self.client.update_book(book_id, &request).await {
            Ok(updated) => {
                self.state.send_modify(|state| {
                    if let Some(slot) = state.books.iter_mut().find(|book| book.id == book_id) {
                        *slot = updated.clone();
                    }
                });
                Ok(updated)
            }
            Err(err) => {
                self.record_failure(&err);
                Err(err)
            }
        }
    }

    /// Deletes a book, then re-fetches the current page under the stored
    /// search and sort to pick up the shifted contents.
    pub async fn delete_book(&self, book_id: BookId) -> Result<(), ApiValidationError> {
        if let Err(err) = self.client.delete_book(book_id).await {
            self.record_failure(&err);
            return Err(err);
        }

        if let Err(err) = self.fetch_books(BookSearchParams::default()).await {
            tracing::error!("Failed to refresh list after delete: {}", err);
        }

        Ok(())
    }

    /// Pass-through to the client; never touches store state.
    pub async fn get_book(&self, book_id: BookId) -> Result<Book, ApiValidationError> {
        self.client.get_book(book_id).await
    }

    pub fn set_search_term(&self, term: impl Into<String>) {
        let term = term.into();
        self.state.send_modify(|state| state.search_term = term);
    }

    pub fn set_sort_by(&self, sort_by: SortBy) {
        self.state.send_modify(|state| state.sort_by = sort_by);
    }

    pub fn set_page(&self, page: u32) {
        self.state.send_modify(|state| state.current_page = page);
    }

    pub fn clear_error(&self) {
        self.state.send_modify(|state| state.error = None);
    }

    fn record_failure(&self, err: &ApiValidationError) {
        self.state.send_modify(|state| state.error = Some(err.to_string()));
    }
}
