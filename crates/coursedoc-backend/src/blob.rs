//! Object-storage seam and the document path scheme

use crate::error::BackendError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use coursedoc_model::{CourseId, LessonId, LevelId};

/// The platform object store
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Upload bytes under `path`, returning a long-lived download URL
    async fn upload(
        &self,
        path: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<String, BackendError>;

    /// Delete the object at `path`
    ///
    /// Deleting an absent object succeeds, so cascade retries converge.
    async fn delete(&self, path: &str) -> Result<(), BackendError>;
}

/// Build the storage path for a document upload
///
/// Namespaced by course/level/lesson, with the upload timestamp (unix millis)
/// prefixed to the file name so repeated uploads of the same file name do not
/// overwrite each other.
#[must_use]
pub fn document_storage_path(
    course: &CourseId,
    level: &LevelId,
    lesson: &LessonId,
    uploaded_at: DateTime<Utc>,
    file_name: &str,
) -> String {
    format!(
        "courses/{}/{}/{}/{}_{}",
        course,
        level,
        lesson,
        uploaded_at.timestamp_millis(),
        file_name
    )
}
