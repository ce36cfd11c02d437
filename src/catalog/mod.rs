// ============================================================================
// Catalog Lookup Port
// ============================================================================
//
// "Not found" is a valid answer (Ok(None)), not an error. Transport failures,
// timeouts and unexpected responses are errors and reach the caller as-is.
//
// ============================================================================

mod http_client;

use async_trait::async_trait;

use crate::domain::order::Book;

pub use http_client::HttpBookClient;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Catalog request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Catalog returned unexpected status {status} for isbn {isbn}")]
    UnexpectedStatus { isbn: String, status: u16 },

    #[error("Invalid catalog url {url}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

#[async_trait]
pub trait BookCatalog: Send + Sync {
    /// Single best-effort lookup of a book by isbn
    async fn find_by_isbn(&self, isbn: &str) -> Result<Option<Book>, CatalogError>;
}
