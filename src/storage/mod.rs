//!
//! vertocraft storage module
//! --------------------------
//! The `ResourceStore` trait is the single persistence contract for contact
//! submissions and portfolio items. Two backends implement it:
//!
//! - `MemoryStore`: process-local maps, used when no database is configured.
//! - `PostgresStore`: `contacts` and `portfolio_items` tables via tokio-postgres.
//!
//! The backend is chosen once at startup (`open_store`) and handed to the HTTP
//! layer as a `SharedStore`. Every operation reports persistence failures as a
//! `StoreError`; reads never degrade to an empty result when the backend is down.

use std::sync::Arc;

use async_trait::async_trait;

use crate::model::{Contact, NewContact, NewPortfolioItem, PortfolioItem};

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backend cannot be reached (closed connection, I/O failure).
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    /// The backend was reached but rejected the operation.
    #[error("storage error: {0}")]
    Backend(String),
    /// A persisted row no longer satisfies the domain model.
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// Short backend label for logs.
    fn backend_name(&self) -> &'static str;

    /// All contacts in insertion order.
    async fn list_contacts(&self) -> StoreResult<Vec<Contact>>;
    async fn get_contact(&self, id: i64) -> StoreResult<Option<Contact>>;
    /// Assigns `id` and `createdAt` and returns the stored record.
    async fn create_contact(&self, contact: NewContact) -> StoreResult<Contact>;

    /// All portfolio items in insertion order.
    async fn list_portfolio_items(&self) -> StoreResult<Vec<PortfolioItem>>;
    async fn get_portfolio_item(&self, id: i64) -> StoreResult<Option<PortfolioItem>>;
    /// Assigns `id` and `createdAt` and returns the stored record.
    async fn create_portfolio_item(&self, item: NewPortfolioItem) -> StoreResult<PortfolioItem>;
    /// Returns true if a record existed and was removed.
    async fn delete_portfolio_item(&self, id: i64) -> StoreResult<bool>;
}

pub type SharedStore = Arc<dyn ResourceStore>;

/// Open the configured backend: PostgreSQL when a connection string is given,
/// otherwise the in-memory store.
pub async fn open_store(database_url: Option<&str>) -> StoreResult<SharedStore> {
    match database_url {
        Some(url) => {
            let store = PostgresStore::connect(url).await?;
            Ok(Arc::new(store))
        }
        None => Ok(Arc::new(MemoryStore::new())),
    }
}

/// Creation timestamp in the RFC 3339 form every backend stores.
pub(crate) fn now_timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
