//! Student directory
//!
//! The assignable-student set is derived client-side from a full directory
//! scan: the platform has no server-side role filter worth depending on (it
//! would require an index on a collection owned by another system).

use crate::error::ConsoleError;
use coursedoc_backend::DataStore;
use coursedoc_model::{DirectoryUser, LegacyClassRecord, StudentFilter};
use std::sync::Arc;

/// Directory scan and filtering
#[derive(Clone)]
pub struct DirectoryService {
    store: Arc<dyn DataStore>,
}

impl DirectoryService {
    /// Create the service
    #[inline]
    #[must_use]
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self { store }
    }

    /// Scan the directory and keep assignable students
    ///
    /// A record qualifies with a role of "student" (case-insensitive, any
    /// legacy field name) and a usable identifier.
    pub async fn load_students(&self) -> Result<Vec<DirectoryUser>, ConsoleError> {
        let records = self.store.list_users().await?;
        let total = records.len();
        let students: Vec<DirectoryUser> = records
            .into_iter()
            .map(coursedoc_model::RawUserRecord::normalize)
            .filter(DirectoryUser::is_assignable_student)
            .collect();
        tracing::debug!(total, students = students.len(), "directory scanned");
        Ok(students)
    }

    /// Scan the directory and apply a search/class filter
    pub async fn search_students(
        &self,
        filter: &StudentFilter,
    ) -> Result<Vec<DirectoryUser>, ConsoleError> {
        let mut students = self.load_students().await?;
        students.retain(|s| filter.matches(s));
        Ok(students)
    }

    /// The legacy classes, for the class-filter choices
    pub async fn list_classes(&self) -> Result<Vec<LegacyClassRecord>, ConsoleError> {
        Ok(self.store.list_legacy_classes().await?)
    }
}
