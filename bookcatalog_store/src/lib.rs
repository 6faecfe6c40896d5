pub mod store;

pub use store::{CatalogState, CatalogStore};
