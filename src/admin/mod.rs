//! Admin client for the vertocraft API.
//!
//! `AdminSession` is the only client-side state that outlives a process: it is
//! created by a successful login, saved through `SessionFile`, loaded again on
//! startup and cleared on logout. `AdminClient` attaches the session token to
//! admin requests and caches list results per resource path until a mutation
//! on that resource invalidates them.

mod client;
mod session;

pub use client::{AdminClient, ClientError, ClientResult, ImageUpload, PortfolioUpload};
pub use session::{AdminSession, SessionFile, SESSION_FILE_ENV};
