//! coursedoc console services
//!
//! The services an operator drives, one logical action at a time:
//!
//! - [`SessionService`]: sign-in plus the directory role check
//! - [`HierarchyService`]: tree reads through a per-course cache, CRUD, and
//!   child-first cascade deletes
//! - [`DocumentService`]: sequential uploads and document deletion
//! - [`AccessService`]: access-list editing, view recording, view history
//! - [`DirectoryService`]: the assignable-student scan and filters
//! - [`ImportService`]: the one-time legacy class import
//!
//! [`Console`] wires them all to one backend.

#![warn(unreachable_pub)]

pub mod access;
pub mod directory;
pub mod documents;
pub mod error;
pub mod hierarchy;
pub mod import;
pub mod session;

pub use access::{AccessService, DocumentLocator, Viewer};
pub use directory::DirectoryService;
pub use documents::{DocumentService, FileUpload};
pub use error::{ConsoleError, ImportError};
pub use hierarchy::{CourseCache, HierarchyService, DEFAULT_CACHE_CAPACITY};
pub use import::{ImportReport, ImportService};
pub use session::{AuthorizedUser, SessionService};

use coursedoc_backend::{AuthProvider, BlobStore, DataStore};
use std::sync::Arc;

/// The administration console: every service wired to one backend
#[derive(Clone)]
pub struct Console {
    session: SessionService,
    hierarchy: HierarchyService,
    documents: DocumentService,
    access: AccessService,
    directory: DirectoryService,
    import: ImportService,
}

impl Console {
    /// Wire the console to a backend
    #[must_use]
    pub fn new(
        store: Arc<dyn DataStore>,
        auth: Arc<dyn AuthProvider>,
        blobs: Arc<dyn BlobStore>,
    ) -> Self {
        let cache = CourseCache::default();
        Self {
            session: SessionService::new(auth, store.clone()),
            hierarchy: HierarchyService::new(store.clone(), blobs.clone(), cache.clone()),
            documents: DocumentService::new(store.clone(), blobs, cache.clone()),
            access: AccessService::new(store.clone(), cache),
            directory: DirectoryService::new(store.clone()),
            import: ImportService::new(store),
        }
    }

    /// Session authorization
    #[inline]
    #[must_use]
    pub fn session(&self) -> &SessionService {
        &self.session
    }

    /// Hierarchy consistency manager
    #[inline]
    #[must_use]
    pub fn hierarchy(&self) -> &HierarchyService {
        &self.hierarchy
    }

    /// Document upload/deletion
    #[inline]
    #[must_use]
    pub fn documents(&self) -> &DocumentService {
        &self.documents
    }

    /// Access control and view logging
    #[inline]
    #[must_use]
    pub fn access(&self) -> &AccessService {
        &self.access
    }

    /// Student directory
    #[inline]
    #[must_use]
    pub fn directory(&self) -> &DirectoryService {
        &self.directory
    }

    /// Legacy import
    #[inline]
    #[must_use]
    pub fn import(&self) -> &ImportService {
        &self.import
    }
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
