//!
//! Upload storage for portfolio images.
//!
//! Files land directly under the uploads root with a timestamp name and the
//! original (sanitised) extension, and are exposed to clients as
//! `/uploads/<file>`. An upload is only kept once the record that references it
//! is persisted; every failure path before that calls `discard`.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

pub const PUBLIC_PREFIX: &str = "/uploads";

const MAX_NAME_ATTEMPTS: u32 = 1000;

#[derive(Debug, Clone)]
pub struct UploadDir {
    root: PathBuf,
}

impl UploadDir {
    /// Use `root` as the uploads directory, creating it if needed.
    pub async fn open<P: AsRef<Path>>(root: P) -> std::io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path { &self.root }

    /// Start writing a new upload. The file is created exclusively, so two
    /// uploads in the same millisecond get distinct names.
    pub async fn begin(&self, original_name: Option<&str>) -> std::io::Result<PendingUpload> {
        let ext = sanitized_extension(original_name);
        let millis = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis()).unwrap_or(0);
        let mut attempt = 0u32;
        loop {
            let name = if attempt == 0 {
                format!("{}{}", millis, ext)
            } else {
                format!("{}-{}{}", millis, attempt, ext)
            };
            let disk_path = self.root.join(&name);
            match OpenOptions::new().write(true).create_new(true).open(&disk_path).await {
                Ok(file) => {
                    debug!(target: "vertocraft::uploads", "begin upload '{}'", disk_path.display());
                    return Ok(PendingUpload {
                        file,
                        disk_path,
                        public_path: format!("{}/{}", PUBLIC_PREFIX, name),
                        bytes: 0,
                    });
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists && attempt < MAX_NAME_ATTEMPTS => {
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Map a stored public path (`/uploads/<file>`) or bare file name to its
    /// location on disk. Only the final path component is used.
    pub fn resolve_public(&self, public_path: &str) -> Option<PathBuf> {
        let name = public_path.rsplit('/').next()?;
        if name.is_empty() || name == "." || name == ".." || name.contains('\\') {
            return None;
        }
        Some(self.root.join(name))
    }

    /// Best-effort removal of a stored asset. Failures are logged, never returned.
    pub async fn remove_public(&self, public_path: &str) {
        let Some(path) = self.resolve_public(public_path) else {
            warn!(target: "vertocraft::uploads", "refusing to remove unrecognised asset path '{}'", public_path);
            return;
        };
        remove_best_effort(&path).await;
    }
}

/// An upload whose bytes are still being written.
#[derive(Debug)]
pub struct PendingUpload {
    file: File,
    disk_path: PathBuf,
    public_path: String,
    bytes: u64,
}

impl PendingUpload {
    pub async fn write(&mut self, chunk: &[u8]) -> std::io::Result<()> {
        self.file.write_all(chunk).await?;
        self.bytes += chunk.len() as u64;
        Ok(())
    }

    /// Flush and hand over the file. On failure the partial file is removed.
    pub async fn finish(mut self) -> std::io::Result<StoredUpload> {
        if let Err(e) = self.file.flush().await {
            self.abort().await;
            return Err(e);
        }
        debug!(target: "vertocraft::uploads", "stored '{}' ({} bytes)", self.disk_path.display(), self.bytes);
        Ok(StoredUpload { disk_path: self.disk_path, public_path: self.public_path, bytes: self.bytes })
    }

    /// Abandon a partially written upload.
    pub async fn abort(self) {
        let PendingUpload { file, disk_path, .. } = self;
        drop(file);
        remove_best_effort(&disk_path).await;
    }
}

/// A fully written upload that no record references yet.
#[derive(Debug, Clone)]
pub struct StoredUpload {
    disk_path: PathBuf,
    public_path: String,
    bytes: u64,
}

impl StoredUpload {
    pub fn public_path(&self) -> &str { &self.public_path }
    pub fn disk_path(&self) -> &Path { &self.disk_path }
    pub fn len(&self) -> u64 { self.bytes }
    pub fn is_empty(&self) -> bool { self.bytes == 0 }

    /// Roll back: delete the file. A failed delete is logged and swallowed so the
    /// caller can still report the error that triggered the rollback.
    pub async fn discard(self) {
        remove_best_effort(&self.disk_path).await;
    }
}

async fn remove_best_effort(path: &Path) {
    match fs::remove_file(path).await {
        Ok(()) => debug!(target: "vertocraft::uploads", "removed '{}'", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(target: "vertocraft::uploads", "already gone '{}'", path.display())
        }
        Err(e) => warn!(target: "vertocraft::uploads", "failed to remove '{}': {}", path.display(), e),
    }
}

/// `.ext` from the client-supplied file name, lowercased; empty if the name has
/// no extension or the extension is not 1-10 ASCII alphanumerics.
pub fn sanitized_extension(original_name: Option<&str>) -> String {
    let Some(name) = original_name else { return String::new(); };
    let name = name.rsplit(['/', '\\']).next().unwrap_or(name);
    match name.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty() && (1..=10).contains(&ext.len()) && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            format!(".{}", ext.to_ascii_lowercase())
        }
        _ => String::new(),
    }
}

/// Content type for serving a stored file, by extension.
pub fn content_type_for(name: &str) -> &'static str {
    let ext = name.rsplit_once('.').map(|(_, e)| e.to_ascii_lowercase()).unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "avif" => "image/avif",
        _ => "application/octet-stream",
    }
}
