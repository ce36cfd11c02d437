use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use std::time::Duration;

use super::{BookCatalog, CatalogError};
use crate::domain::order::Book;

/// Catalog client talking to the catalog service over HTTP.
///
/// The request timeout is the only bound on a lookup; there is no retry.
pub struct HttpBookClient {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpBookClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, CatalogError> {
        let parsed = Url::parse(base_url).map_err(|e| CatalogError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        if parsed.cannot_be_a_base() {
            return Err(CatalogError::InvalidBaseUrl {
                url: base_url.to_string(),
                reason: "not a hierarchical url".to_string(),
            });
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()?;

        Ok(Self { client, base_url: parsed })
    }

    /// `{base}/books/{isbn}` with the isbn percent-encoded as one path segment.
    ///
    /// `None` when the isbn cannot name a single segment (empty, `.`, `..`).
    fn book_url(&self, isbn: &str) -> Option<Url> {
        if matches!(isbn, "" | "." | "..") {
            return None;
        }

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .ok()?
            .pop_if_empty()
            .extend(["books", isbn]);
        Some(url)
    }
}

#[async_trait]
impl BookCatalog for HttpBookClient {
    async fn find_by_isbn(&self, isbn: &str) -> Result<Option<Book>, CatalogError> {
        let Some(url) = self.book_url(isbn) else {
            tracing::info!(isbn = %isbn, "Isbn cannot be looked up, treating as not found");
            return Ok(None);
        };
        tracing::debug!(url = %url, "Looking up book in catalog");

        let response = self.client.get(url).send().await?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                tracing::info!(isbn = %isbn, "Book not found in catalog");
                Ok(None)
            }
            status if status.is_success() => {
                let book = response.json::<Book>().await?;
                Ok(Some(book))
            }
            status => Err(CatalogError::UnexpectedStatus {
                isbn: isbn.to_string(),
                status: status.as_u16(),
            }),
        }
    }
}
