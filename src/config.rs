//!
//! Server configuration
//! --------------------
//! Resolved from built-in defaults, then environment variables, then command-line
//! flags (flags win). Parsing follows the same small hand-rolled helpers as the
//! rest of our binaries; no config file is read.

use std::path::PathBuf;

use anyhow::{anyhow, Result};

use crate::security::{CredentialValidator, DEV_ADMIN_PASSWORD, DEV_ADMIN_USERNAME};

pub const DEFAULT_HTTP_PORT: u16 = 5000;
pub const DEFAULT_BIND: &str = "0.0.0.0";
pub const DEFAULT_UPLOADS_DIR: &str = "uploads";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub const USAGE: &str = "vertocraft server\n\nUSAGE:\n  vertocraft_server [--http-port N] [--bind ADDR] [--database-url URL] [--uploads-dir PATH] [--max-upload-bytes N]\n\nOPTIONS:\n  --http-port N          HTTP port (env: VERTOCRAFT_HTTP_PORT or PORT, default 5000)\n  --bind ADDR            Listen address (env: VERTOCRAFT_BIND, default 0.0.0.0)\n  --database-url URL     PostgreSQL connection string (env: VERTOCRAFT_DATABASE_URL or DATABASE_URL).\n                         Without one, records are kept in memory.\n  --uploads-dir PATH     Directory for uploaded images (env: VERTOCRAFT_UPLOADS_DIR, default uploads)\n  --max-upload-bytes N   Request body limit (env: VERTOCRAFT_MAX_UPLOAD_BYTES, default 10485760)\n\nADMIN CREDENTIALS (environment only):\n  VERTOCRAFT_ADMIN_USERNAME plus VERTOCRAFT_ADMIN_PASSWORD or VERTOCRAFT_ADMIN_PASSWORD_HASH (argon2 PHC).\n  A partial set is an error. When all are unset, the development pair admin/admin is used.\n";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminSecret {
    Plain(String),
    Hash(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminCredentials {
    pub username: String,
    pub secret: AdminSecret,
    /// True when the built-in development pair is in effect.
    pub is_dev_default: bool,
}

impl AdminCredentials {
    pub fn validator(&self) -> Result<CredentialValidator> {
        match &self.secret {
            AdminSecret::Plain(p) => CredentialValidator::new(&self.username, p),
            AdminSecret::Hash(h) => CredentialValidator::with_hash(&self.username, h),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: String,
    pub http_port: u16,
    pub database_url: Option<String>,
    pub uploads_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub admin: AdminCredentials,
}

impl ServerConfig {
    /// Defaults suitable for tests: in-memory store, given uploads dir, ephemeral port.
    pub fn for_tests(uploads_dir: impl Into<PathBuf>, username: &str, password: &str) -> Self {
        Self {
            bind: "127.0.0.1".into(),
            http_port: 0,
            database_url: None,
            uploads_dir: uploads_dir.into(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            admin: AdminCredentials {
                username: username.into(),
                secret: AdminSecret::Plain(password.into()),
                is_dev_default: false,
            },
        }
    }

    /// Resolve from the process environment and the given CLI arguments.
    pub fn from_env_and_args(args: &[String]) -> Result<Self> {
        Self::resolve(args, |k| std::env::var(k).ok())
    }

    /// Resolve using an arbitrary variable lookup.
    pub fn resolve<F>(args: &[String], env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env_nonempty = |k: &str| env(k).filter(|v| !v.trim().is_empty());

        let env_port = match env_nonempty("VERTOCRAFT_HTTP_PORT").or_else(|| env_nonempty("PORT")) {
            Some(v) => Some(parse_u16("VERTOCRAFT_HTTP_PORT", &v)?),
            None => None,
        };
        let arg_port = match arg_value(args, "--http-port") {
            Some(v) => Some(parse_u16("--http-port", &v)?),
            None => None,
        };
        let http_port = arg_port.or(env_port).unwrap_or(DEFAULT_HTTP_PORT);

        let bind = arg_value(args, "--bind")
            .or_else(|| env_nonempty("VERTOCRAFT_BIND"))
            .unwrap_or_else(|| DEFAULT_BIND.to_string());

        let database_url = arg_value(args, "--database-url")
            .or_else(|| env_nonempty("VERTOCRAFT_DATABASE_URL"))
            .or_else(|| env_nonempty("DATABASE_URL"));

        let uploads_dir = arg_value(args, "--uploads-dir")
            .or_else(|| env_nonempty("VERTOCRAFT_UPLOADS_DIR"))
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_UPLOADS_DIR));

        let max_upload_bytes = match arg_value(args, "--max-upload-bytes").or_else(|| env_nonempty("VERTOCRAFT_MAX_UPLOAD_BYTES")) {
            Some(v) => v.trim().parse::<usize>().map_err(|_| anyhow!("invalid max upload bytes '{}'", v))?,
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };

        let user_env = env_nonempty("VERTOCRAFT_ADMIN_USERNAME");
        let hash_env = env_nonempty("VERTOCRAFT_ADMIN_PASSWORD_HASH");
        let pass_env = env_nonempty("VERTOCRAFT_ADMIN_PASSWORD");
        let admin = match (user_env, hash_env, pass_env) {
            (None, None, None) => AdminCredentials {
                username: DEV_ADMIN_USERNAME.to_string(),
                secret: AdminSecret::Plain(DEV_ADMIN_PASSWORD.to_string()),
                is_dev_default: true,
            },
            (Some(username), Some(h), _) => AdminCredentials { username, secret: AdminSecret::Hash(h), is_dev_default: false },
            (Some(username), None, Some(p)) => AdminCredentials { username, secret: AdminSecret::Plain(p), is_dev_default: false },
            (Some(_), None, None) => {
                return Err(anyhow!("VERTOCRAFT_ADMIN_USERNAME is set but neither VERTOCRAFT_ADMIN_PASSWORD nor VERTOCRAFT_ADMIN_PASSWORD_HASH is"));
            }
            (None, _, _) => {
                return Err(anyhow!("an admin password is configured but VERTOCRAFT_ADMIN_USERNAME is not"));
            }
        };

        Ok(Self { bind, http_port, database_url, uploads_dir, max_upload_bytes, admin })
    }
}

pub fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

/// Value following `flag`, if present and not itself another flag.
pub fn arg_value(args: &[String], flag: &str) -> Option<String> {
    let mut i = 0;
    while i < args.len() {
        if args[i] == flag && i + 1 < args.len() && !args[i + 1].starts_with("--") {
            return Some(args[i + 1].clone());
        }
        i += 1;
    }
    None
}

fn parse_u16(name: &str, v: &str) -> Result<u16> {
    v.trim().parse::<u16>().map_err(|_| anyhow!("invalid port for {}: '{}'", name, v))
}
