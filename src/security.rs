use anyhow::{anyhow, Result};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use base64::Engine;
use password_hash::{PasswordHash, SaltString};

/// Development fallback credentials used only when nothing is configured.
pub const DEV_ADMIN_USERNAME: &str = "admin";
pub const DEV_ADMIN_PASSWORD: &str = "admin";

pub fn hash_password(password: &str) -> Result<String> {
    let mut salt_bytes = [0u8; 16];
    getrandom::getrandom(&mut salt_bytes).map_err(|e| anyhow!(e.to_string()))?;
    let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| anyhow!(e.to_string()))?;
    let argon2 = Argon2::default();
    let phc = argon2.hash_password(password.as_bytes(), &salt).map_err(|e| anyhow!(e.to_string()))?.to_string();
    Ok(phc)
}

pub fn verify_password(hash: &str, password: &str) -> bool {
    if let Ok(parsed) = PasswordHash::new(hash) {
        let argon2 = Argon2::default();
        argon2.verify_password(password.as_bytes(), &parsed).is_ok()
    } else { false }
}

/// Checks a username/password pair against the single configured admin account.
/// The password is only ever held as an Argon2 PHC string.
#[derive(Debug, Clone)]
pub struct CredentialValidator {
    username: String,
    password_hash: String,
}

impl CredentialValidator {
    /// Build from a plaintext password, hashing it once up front.
    pub fn new(username: &str, password: &str) -> Result<Self> {
        Ok(Self { username: username.to_string(), password_hash: hash_password(password)? })
    }

    /// Build from an existing PHC string (e.g. produced by `hash_password`).
    pub fn with_hash(username: &str, phc: &str) -> Result<Self> {
        PasswordHash::new(phc).map_err(|e| anyhow!("invalid admin password hash: {}", e))?;
        Ok(Self { username: username.to_string(), password_hash: phc.to_string() })
    }

    pub fn username(&self) -> &str { &self.username }

    pub fn validate(&self, username: &str, password: &str) -> bool {
        // Hash check runs regardless of username.
        let password_ok = verify_password(&self.password_hash, password);
        password_ok && username == self.username
    }
}

/// The login token handed back to clients: base64 of `username:password`.
/// It carries no expiry and cannot be revoked.
pub fn issue_token(username: &str, password: &str) -> String {
    base64::engine::general_purpose::STANDARD.encode(format!("{}:{}", username, password))
}

/// Parse an `Authorization` header value of the form `Basic <token>` into
/// `(username, password)`. Any malformed input yields `None`.
pub fn decode_basic(header_value: &str) -> Option<(String, String)> {
    let (scheme, token) = header_value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") { return None; }
    let bytes = base64::engine::general_purpose::STANDARD.decode(token.trim()).ok()?;
    let text = String::from_utf8(bytes).ok()?;
    let (user, pass) = text.split_once(':')?;
    if user.is_empty() { return None; }
    Some((user.to_string(), pass.to_string()))
}
