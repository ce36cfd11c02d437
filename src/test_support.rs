// ============================================================================
// Test doubles for the catalog, store and publisher ports
// ============================================================================

use async_trait::async_trait;
use futures_util::stream::{self, BoxStream, StreamExt};
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::catalog::{BookCatalog, CatalogError};
use crate::domain::order::{Book, Order, OrderAcceptedEvent};
use crate::messaging::{EventPublisher, MessagingError};
use crate::store::{InMemoryOrderRepository, OrderRepository, StoreError};

pub fn lotr() -> Book {
    Book {
        isbn: "1234567890".to_string(),
        title: "Lord of the Rings".to_string(),
        author: "J.R.R. Tolkien".to_string(),
        price: 9.90,
    }
}

pub struct FakeCatalog {
    books: HashMap<String, Book>,
}

impl FakeCatalog {
    pub fn with_books(books: Vec<Book>) -> Self {
        Self {
            books: books.into_iter().map(|b| (b.isbn.clone(), b)).collect(),
        }
    }
}

#[async_trait]
impl BookCatalog for FakeCatalog {
    async fn find_by_isbn(&self, isbn: &str) -> Result<Option<Book>, CatalogError> {
        Ok(self.books.get(isbn).cloned())
    }
}

/// Catalog whose every lookup fails as if the service were down
pub struct FailingCatalog;

#[async_trait]
impl BookCatalog for FailingCatalog {
    async fn find_by_isbn(&self, isbn: &str) -> Result<Option<Book>, CatalogError> {
        Err(CatalogError::UnexpectedStatus {
            isbn: isbn.to_string(),
            status: 503,
        })
    }
}

/// Store that is reachable for reads but refuses every write
pub struct FailingRepository;

#[async_trait]
impl OrderRepository for FailingRepository {
    async fn save(&self, _order: Order) -> Result<Order, StoreError> {
        Err(StoreError::Backend("write timed out".to_string()))
    }

    async fn find_by_id(&self, _id: Uuid) -> Result<Option<Order>, StoreError> {
        Ok(None)
    }

    fn find_all(&self) -> BoxStream<'_, Result<Order, StoreError>> {
        stream::empty().boxed()
    }
}

/// In-memory store where another writer touches the order right after every
/// lookup, so the copy handed out is always one version behind.
#[derive(Default)]
pub struct ContendedRepository {
    pub inner: InMemoryOrderRepository,
}

#[async_trait]
impl OrderRepository for ContendedRepository {
    async fn save(&self, order: Order) -> Result<Order, StoreError> {
        self.inner.save(order).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, StoreError> {
        let found = self.inner.find_by_id(id).await?;
        if let Some(order) = &found {
            self.inner.save(order.clone()).await?;
        }
        Ok(found)
    }

    fn find_all(&self) -> BoxStream<'_, Result<Order, StoreError>> {
        self.inner.find_all()
    }
}

#[derive(Clone, Copy)]
enum PublishBehaviour {
    Accept,
    Refuse,
    Fail,
}

pub struct RecordingPublisher {
    behaviour: PublishBehaviour,
    attempts: Mutex<Vec<(String, OrderAcceptedEvent)>>,
}

impl RecordingPublisher {
    fn new(behaviour: PublishBehaviour) -> Self {
        Self {
            behaviour,
            attempts: Mutex::new(Vec::new()),
        }
    }

    pub fn accepting() -> Self {
        Self::new(PublishBehaviour::Accept)
    }

    pub fn refusing() -> Self {
        Self::new(PublishBehaviour::Refuse)
    }

    pub fn failing() -> Self {
        Self::new(PublishBehaviour::Fail)
    }

    /// Every publish call, whatever its outcome
    pub async fn sent(&self) -> Vec<(String, OrderAcceptedEvent)> {
        self.attempts.lock().await.clone()
    }

    pub async fn attempts(&self) -> usize {
        self.attempts.lock().await.len()
    }
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish(&self, channel: &str, event: &OrderAcceptedEvent) -> Result<bool, MessagingError> {
        self.attempts.lock().await.push((channel.to_string(), event.clone()));

        match self.behaviour {
            PublishBehaviour::Accept => Ok(true),
            PublishBehaviour::Refuse => Ok(false),
            PublishBehaviour::Fail => Err(MessagingError::Transport("broker unreachable".to_string())),
        }
    }
}
