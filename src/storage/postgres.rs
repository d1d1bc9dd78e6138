use async_trait::async_trait;
use tokio_postgres::types::FromSql;
use tokio_postgres::{Client, NoTls, Row};
use tracing::{debug, error, info};

use super::{now_timestamp, ResourceStore, StoreError, StoreResult};
use crate::model::{Contact, NewContact, NewPortfolioItem, PortfolioItem, RowSpan};

const SCHEMA_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS contacts (
    id BIGSERIAL PRIMARY KEY,
    name TEXT NOT NULL,
    email TEXT NOT NULL,
    subject TEXT NOT NULL,
    message TEXT NOT NULL,
    services TEXT[] NOT NULL,
    created_at TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS portfolio_items (
    id BIGSERIAL PRIMARY KEY,
    title TEXT NOT NULL,
    category TEXT NOT NULL,
    categories TEXT NOT NULL,
    image TEXT NOT NULL,
    row_span INTEGER NOT NULL CHECK (row_span BETWEEN 20 AND 50),
    created_at TEXT NOT NULL
);
"#;

const CONTACT_COLUMNS: &str = "id, name, email, subject, message, services, created_at";
const PORTFOLIO_COLUMNS: &str = "id, title, category, categories, image, row_span, created_at";

impl From<tokio_postgres::Error> for StoreError {
    fn from(err: tokio_postgres::Error) -> Self {
        if err.is_closed() {
            return StoreError::Unavailable(err.to_string());
        }
        match err.as_db_error() {
            Some(db) => StoreError::Backend(format!("{} ({})", db.message(), db.code().code())),
            // No server-side error attached: connect/io/protocol failure.
            None => StoreError::Unavailable(err.to_string()),
        }
    }
}

/// PostgreSQL-backed store. A single client is shared by all requests; the
/// driver pipelines concurrent queries over its connection.
pub struct PostgresStore {
    client: Client,
}

impl PostgresStore {
    /// Connect, spawn the connection driver, and make sure both tables exist.
    pub async fn connect(url: &str) -> StoreResult<Self> {
        let (client, connection) = tokio_postgres::connect(url, NoTls).await?;
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!(target: "vertocraft::storage", "postgres connection error: {}", e);
            }
        });
        let store = Self { client };
        store.ensure_schema().await?;
        info!(target: "vertocraft::storage", "postgres store ready");
        Ok(store)
    }

    async fn ensure_schema(&self) -> StoreResult<()> {
        self.client.batch_execute(SCHEMA_DDL).await?;
        debug!(target: "vertocraft::storage", "postgres: schema ensured");
        Ok(())
    }
}

fn col<'a, T: FromSql<'a>>(row: &'a Row, name: &str) -> StoreResult<T> {
    row.try_get(name).map_err(|e| StoreError::Corrupt(format!("column {}: {}", name, e)))
}

fn contact_from_row(row: &Row) -> StoreResult<Contact> {
    Ok(Contact {
        id: col(row, "id")?,
        name: col(row, "name")?,
        email: col(row, "email")?,
        subject: col(row, "subject")?,
        message: col(row, "message")?,
        services: col(row, "services")?,
        created_at: col(row, "created_at")?,
    })
}

fn portfolio_from_row(row: &Row) -> StoreResult<PortfolioItem> {
    let id: i64 = col(row, "id")?;
    let raw_span: i32 = col(row, "row_span")?;
    let row_span = RowSpan::try_from(raw_span).map_err(|m| StoreError::Corrupt(format!("portfolio item {}: {}", id, m)))?;
    Ok(PortfolioItem {
        id,
        title: col(row, "title")?,
        category: col(row, "category")?,
        categories: col(row, "categories")?,
        image: col(row, "image")?,
        row_span,
        created_at: col(row, "created_at")?,
    })
}

#[async_trait]
impl ResourceStore for PostgresStore {
    fn backend_name(&self) -> &'static str { "postgres" }

    async fn list_contacts(&self) -> StoreResult<Vec<Contact>> {
        let q = format!("SELECT {} FROM contacts ORDER BY id", CONTACT_COLUMNS);
        let rows = self.client.query(q.as_str(), &[]).await?;
        rows.iter().map(contact_from_row).collect()
    }

    async fn get_contact(&self, id: i64) -> StoreResult<Option<Contact>> {
        let q = format!("SELECT {} FROM contacts WHERE id = $1", CONTACT_COLUMNS);
        let row = self.client.query_opt(q.as_str(), &[&id]).await?;
        row.as_ref().map(contact_from_row).transpose()
    }

    async fn create_contact(&self, contact: NewContact) -> StoreResult<Contact> {
        let q = format!(
            "INSERT INTO contacts (name, email, subject, message, services, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
            CONTACT_COLUMNS
        );
        let created_at = now_timestamp();
        let row = self
            .client
            .query_one(
                q.as_str(),
                &[&contact.name, &contact.email, &contact.subject, &contact.message, &contact.services, &created_at],
            )
            .await?;
        let stored = contact_from_row(&row)?;
        debug!(target: "vertocraft::storage", "postgres: created contact id={}", stored.id);
        Ok(stored)
    }

    async fn list_portfolio_items(&self) -> StoreResult<Vec<PortfolioItem>> {
        let q = format!("SELECT {} FROM portfolio_items ORDER BY id", PORTFOLIO_COLUMNS);
        let rows = self.client.query(q.as_str(), &[]).await?;
        rows.iter().map(portfolio_from_row).collect()
    }

    async fn get_portfolio_item(&self, id: i64) -> StoreResult<Option<PortfolioItem>> {
        let q = format!("SELECT {} FROM portfolio_items WHERE id = $1", PORTFOLIO_COLUMNS);
        let row = self.client.query_opt(q.as_str(), &[&id]).await?;
        row.as_ref().map(portfolio_from_row).transpose()
    }

    async fn create_portfolio_item(&self, item: NewPortfolioItem) -> StoreResult<PortfolioItem> {
        let q = format!(
            "INSERT INTO portfolio_items (title, category, categories, image, row_span, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
            PORTFOLIO_COLUMNS
        );
        let created_at = now_timestamp();
        let row_span = item.row_span.get();
        let row = self
            .client
            .query_one(
                q.as_str(),
                &[&item.title, &item.category, &item.categories, &item.image, &row_span, &created_at],
            )
            .await?;
        let stored = portfolio_from_row(&row)?;
        debug!(target: "vertocraft::storage", "postgres: created portfolio item id={}", stored.id);
        Ok(stored)
    }

    async fn delete_portfolio_item(&self, id: i64) -> StoreResult<bool> {
        let n = self.client.execute("DELETE FROM portfolio_items WHERE id = $1", &[&id]).await?;
        debug!(target: "vertocraft::storage", "postgres: delete portfolio item id={} rows={}", id, n);
        Ok(n > 0)
    }
}
