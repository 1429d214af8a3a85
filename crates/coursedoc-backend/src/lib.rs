//! coursedoc backend seams
//!
//! Everything "hard" in this system — persistence, auth token validation,
//! query execution, file storage — happens inside a hosted platform. This
//! crate is the typed boundary to it:
//!
//! - [`DataStore`]: nested hierarchy collections, the flat view-event store,
//!   and the read-only users/legacy-classes collections
//! - [`AuthProvider`]: email/password sign-in and sign-out
//! - [`BlobStore`]: document upload, deletion, and the storage path scheme
//! - [`RestBackend`]: the reqwest client implementing all three
//! - [`BackendConfig`]: TOML + environment configuration
//!
//! In-memory doubles of the three traits live in `coursedoc-test-utils`.

#![warn(unreachable_pub)]

mod auth;
mod blob;
mod config;
mod error;
mod rest;
mod store;

pub use auth::{AuthProvider, AuthUser};
pub use blob::{document_storage_path, BlobStore};
pub use config::{
    BackendConfig, ConfigError, ENV_API_BASE, ENV_API_KEY, ENV_PROJECT_ID, ENV_STORAGE_BUCKET,
};
pub use error::BackendError;
pub use rest::RestBackend;
pub use store::DataStore;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
