//! Shared harness: a real server on an ephemeral port, in-memory store, temp uploads dir.

#![allow(dead_code)]

use std::path::PathBuf;

use reqwest::multipart::{Form, Part};
use tempfile::TempDir;

use vertocraft::config::ServerConfig;
use vertocraft::security::issue_token;

pub const ADMIN_USER: &str = "admin";
pub const ADMIN_PASS: &str = "secret";

pub struct TestServer {
    pub base: String,
    pub http: reqwest::Client,
    pub uploads: PathBuf,
    _tmp: TempDir,
}

impl TestServer {
    pub async fn start() -> Self {
        Self::start_with(|_| {}).await
    }

    /// Start with test defaults adjusted by `tweak`.
    pub async fn start_with(tweak: impl FnOnce(&mut ServerConfig)) -> Self {
        let tmp = tempfile::tempdir().expect("tempdir");
        let uploads = tmp.path().join("uploads");
        let mut config = ServerConfig::for_tests(&uploads, ADMIN_USER, ADMIN_PASS);
        tweak(&mut config);
        let bound = vertocraft::server::bind(&config).await.expect("bind");
        let base = format!("http://{}", bound.local_addr());
        tokio::spawn(bound.serve());
        Self { base, http: reqwest::Client::new(), uploads, _tmp: tmp }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub fn admin_header(&self) -> String {
        format!("Basic {}", issue_token(ADMIN_USER, ADMIN_PASS))
    }

    /// Number of files currently in the uploads directory.
    pub fn upload_count(&self) -> usize {
        std::fs::read_dir(&self.uploads).map(|d| d.count()).unwrap_or(0)
    }
}

pub fn png_bytes() -> Vec<u8> {
    let mut v = vec![0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];
    v.extend_from_slice(&[0u8; 64]);
    v
}

/// A portfolio multipart form; `image` of `None` leaves the part out.
pub fn portfolio_form(title: &str, category: &str, categories: &str, row_span: &str, image: Option<Vec<u8>>) -> Form {
    let mut form = Form::new()
        .text("title", title.to_string())
        .text("category", category.to_string())
        .text("categories", categories.to_string())
        .text("rowSpan", row_span.to_string());
    if let Some(bytes) = image {
        let part = Part::bytes(bytes).file_name("photo.png").mime_str("image/png").expect("mime");
        form = form.part("image", part);
    }
    form
}
