use std::collections::HashMap;

use parking_lot::Mutex;
use reqwest::header::AUTHORIZATION;
use reqwest::{Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use super::session::AdminSession;
use crate::model::{Contact, ContactForm, PortfolioItem};
use crate::server::auth::LoginResponse;
use crate::server::contacts::ContactCreated;
use crate::server::portfolio::{PortfolioDeleted, IMAGE_FIELD};

const PORTFOLIO_PATH: &str = "/api/portfolio";
const CONTACTS_PATH: &str = "/api/contacts";
const CONTACT_PATH: &str = "/api/contact";

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("invalid base URL '{0}'")]
    InvalidUrl(String),
    #[error("not logged in")]
    NotLoggedIn,
    #[error("HTTP {status}: {message}")]
    Api { status: u16, message: String },
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

/// Text fields of a new portfolio item.
#[derive(Debug, Clone)]
pub struct PortfolioUpload {
    pub title: String,
    pub category: String,
    pub categories: String,
    pub row_span: i32,
}

#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    /// Read an image from disk, guessing its content type from the extension.
    pub fn from_path(path: &std::path::Path) -> ClientResult<Self> {
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "image".to_string());
        let content_type = crate::uploads::content_type_for(&file_name).to_string();
        Ok(Self { file_name, content_type, bytes })
    }
}

/// Cached read results keyed by request path (including query string).
#[derive(Debug, Default)]
struct QueryCache {
    entries: Mutex<HashMap<String, serde_json::Value>>,
}

impl QueryCache {
    fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let v = self.entries.lock().get(key).cloned()?;
        serde_json::from_value(v).ok()
    }

    fn put<T: Serialize>(&self, key: &str, value: &T) {
        if let Ok(v) = serde_json::to_value(value) {
            self.entries.lock().insert(key.to_string(), v);
        }
    }

    /// Drop every entry whose key starts with `prefix`.
    fn invalidate(&self, prefix: &str) {
        let mut m = self.entries.lock();
        let before = m.len();
        m.retain(|k, _| !k.starts_with(prefix));
        debug!(target: "vertocraft::admin", "cache invalidate '{}' dropped {}", prefix, before - m.len());
    }

    fn clear(&self) { self.entries.lock().clear(); }
}

pub struct AdminClient {
    base: Url,
    http: reqwest::Client,
    session: Mutex<Option<AdminSession>>,
    cache: QueryCache,
}

impl AdminClient {
    /// An unauthenticated client; only public endpoints work until `login`.
    pub fn new(base_url: &str) -> ClientResult<Self> {
        let base = Url::parse(base_url).map_err(|_| ClientError::InvalidUrl(base_url.to_string()))?;
        Ok(Self { base, http: reqwest::Client::new(), session: Mutex::new(None), cache: QueryCache::default() })
    }

    /// Resume a previously saved session.
    pub fn from_session(session: AdminSession) -> ClientResult<Self> {
        let client = Self::new(&session.base_url)?;
        *client.session.lock() = Some(session);
        Ok(client)
    }

    pub fn base_url(&self) -> &Url { &self.base }

    pub fn session(&self) -> Option<AdminSession> { self.session.lock().clone() }

    /// Exchange credentials for a token. The returned session is what callers persist.
    pub async fn login(&self, username: &str, password: &str) -> ClientResult<AdminSession> {
        let resp = self
            .request(Method::POST, "/api/auth/login")?
            .json(&serde_json::json!({ "username": username, "password": password }))
            .send()
            .await?;
        let LoginResponse { token } = decode(resp).await?;
        let session = AdminSession { base_url: self.base.to_string(), username: username.to_string(), token };
        *self.session.lock() = Some(session.clone());
        self.cache.clear();
        Ok(session)
    }

    /// Forget the session and all cached results.
    pub fn logout(&self) {
        *self.session.lock() = None;
        self.cache.clear();
    }

    pub async fn list_portfolio(&self, category: Option<&str>) -> ClientResult<Vec<PortfolioItem>> {
        let key = match category {
            Some(c) => format!("{}?category={}", PORTFOLIO_PATH, c),
            None => PORTFOLIO_PATH.to_string(),
        };
        if let Some(hit) = self.cache.get(&key) {
            return Ok(hit);
        }
        let mut req = self.request(Method::GET, PORTFOLIO_PATH)?;
        if let Some(c) = category {
            req = req.query(&[("category", c)]);
        }
        let items: Vec<PortfolioItem> = decode(req.send().await?).await?;
        self.cache.put(&key, &items);
        Ok(items)
    }

    pub async fn get_portfolio(&self, id: i64) -> ClientResult<PortfolioItem> {
        let resp = self.request(Method::GET, &format!("{}/{}", PORTFOLIO_PATH, id))?.send().await?;
        decode(resp).await
    }

    pub async fn create_portfolio(&self, fields: &PortfolioUpload, image: ImageUpload) -> ClientResult<PortfolioItem> {
        let part = reqwest::multipart::Part::bytes(image.bytes)
            .file_name(image.file_name)
            .mime_str(&image.content_type)?;
        let form = reqwest::multipart::Form::new()
            .text("title", fields.title.clone())
            .text("category", fields.category.clone())
            .text("categories", fields.categories.clone())
            .text("rowSpan", fields.row_span.to_string())
            .part(IMAGE_FIELD, part);
        let resp = self.admin_request(Method::POST, PORTFOLIO_PATH)?.multipart(form).send().await?;
        let item: PortfolioItem = decode(resp).await?;
        self.cache.invalidate(PORTFOLIO_PATH);
        Ok(item)
    }

    pub async fn delete_portfolio(&self, id: i64) -> ClientResult<()> {
        let resp = self.admin_request(Method::DELETE, &format!("{}/{}", PORTFOLIO_PATH, id))?.send().await?;
        let _: PortfolioDeleted = decode(resp).await?;
        self.cache.invalidate(PORTFOLIO_PATH);
        Ok(())
    }

    pub async fn list_contacts(&self) -> ClientResult<Vec<Contact>> {
        if let Some(hit) = self.cache.get(CONTACTS_PATH) {
            return Ok(hit);
        }
        let resp = self.admin_request(Method::GET, CONTACTS_PATH)?.send().await?;
        let contacts: Vec<Contact> = decode(resp).await?;
        self.cache.put(CONTACTS_PATH, &contacts);
        Ok(contacts)
    }

    /// Public contact form submission.
    pub async fn submit_contact(&self, form: &ContactForm) -> ClientResult<Contact> {
        let resp = self.request(Method::POST, CONTACT_PATH)?.json(form).send().await?;
        let created: ContactCreated = decode(resp).await?;
        // "/api/contact" is a prefix of "/api/contacts"
        self.cache.invalidate(CONTACT_PATH);
        Ok(created.contact)
    }

    fn request(&self, method: Method, path: &str) -> ClientResult<RequestBuilder> {
        let url = self.base.join(path).map_err(|_| ClientError::InvalidUrl(format!("{}{}", self.base, path)))?;
        Ok(self.http.request(method, url))
    }

    fn admin_request(&self, method: Method, path: &str) -> ClientResult<RequestBuilder> {
        let token = self.session.lock().as_ref().map(|s| s.token.clone()).ok_or(ClientError::NotLoggedIn)?;
        Ok(self.request(method, path)?.header(AUTHORIZATION, format!("Basic {}", token)))
    }
}

/// Decode a success body, or turn an error body into `ClientError::Api`.
async fn decode<T: DeserializeOwned>(resp: Response) -> ClientResult<T> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp.json::<T>().await?);
    }
    let text = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&text)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or(text);
    Err(ClientError::Api { status: status.as_u16(), message })
}
