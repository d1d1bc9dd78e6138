use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::debug;

use super::{now_timestamp, ResourceStore, StoreResult};
use crate::model::{Contact, NewContact, NewPortfolioItem, PortfolioItem};

#[derive(Debug)]
struct Collections {
    contacts: BTreeMap<i64, Contact>,
    portfolio: BTreeMap<i64, PortfolioItem>,
    // Counters only move forward so a deleted id is never handed out again.
    next_contact_id: i64,
    next_portfolio_id: i64,
}

/// Process-local store. Ids are assigned under the write lock, so concurrent
/// creates never collide, and the ordered maps keep insertion order for listings.
#[derive(Debug)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Collections {
                contacts: BTreeMap::new(),
                portfolio: BTreeMap::new(),
                next_contact_id: 1,
                next_portfolio_id: 1,
            }),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self { Self::new() }
}

#[async_trait]
impl ResourceStore for MemoryStore {
    fn backend_name(&self) -> &'static str { "memory" }

    async fn list_contacts(&self) -> StoreResult<Vec<Contact>> {
        Ok(self.inner.read().contacts.values().cloned().collect())
    }

    async fn get_contact(&self, id: i64) -> StoreResult<Option<Contact>> {
        Ok(self.inner.read().contacts.get(&id).cloned())
    }

    async fn create_contact(&self, contact: NewContact) -> StoreResult<Contact> {
        let mut g = self.inner.write();
        let id = g.next_contact_id;
        g.next_contact_id += 1;
        let stored = contact.into_contact(id, now_timestamp());
        g.contacts.insert(id, stored.clone());
        debug!(target: "vertocraft::storage", "memory: created contact id={}", id);
        Ok(stored)
    }

    async fn list_portfolio_items(&self) -> StoreResult<Vec<PortfolioItem>> {
        Ok(self.inner.read().portfolio.values().cloned().collect())
    }

    async fn get_portfolio_item(&self, id: i64) -> StoreResult<Option<PortfolioItem>> {
        Ok(self.inner.read().portfolio.get(&id).cloned())
    }

    async fn create_portfolio_item(&self, item: NewPortfolioItem) -> StoreResult<PortfolioItem> {
        let mut g = self.inner.write();
        let id = g.next_portfolio_id;
        g.next_portfolio_id += 1;
        let stored = item.into_item(id, now_timestamp());
        g.portfolio.insert(id, stored.clone());
        debug!(target: "vertocraft::storage", "memory: created portfolio item id={}", id);
        Ok(stored)
    }

    async fn delete_portfolio_item(&self, id: i64) -> StoreResult<bool> {
        let removed = self.inner.write().portfolio.remove(&id).is_some();
        debug!(target: "vertocraft::storage", "memory: delete portfolio item id={} removed={}", id, removed);
        Ok(removed)
    }
}
