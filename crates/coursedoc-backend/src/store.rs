//! Document-store seam
//!
//! The hosted platform stores the hierarchy as nested collections keyed by
//! server-assigned identifiers, a flat collection of view events, and two
//! read-only collections owned by another system (users, legacy classes).
//! There is no referential integrity and no cross-record transaction; callers
//! own both.

use crate::error::BackendError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use coursedoc_model::{
    Course, CourseDraft, CourseId, DocumentId, DocumentRecord, LegacyClassRecord, Lesson,
    LessonDraft, LessonId, Level, LevelDraft, LevelId, RawUserRecord, ViewLogEntry,
};

/// The platform document store
///
/// Create operations return the server-assigned identifier; creation
/// timestamps are supplied by the caller (the console clock), as the platform
/// stores them as plain fields. Delete operations on absent records succeed,
/// which is what makes cascade retries converge.
#[async_trait]
pub trait DataStore: Send + Sync {
    /// List all courses, in collection order, children not populated
    async fn list_courses(&self) -> Result<Vec<Course>, BackendError>;

    /// Create a course, returning the server-assigned id
    async fn create_course(
        &self,
        draft: &CourseDraft,
        created_at: DateTime<Utc>,
    ) -> Result<CourseId, BackendError>;

    /// Update a course's draft fields
    async fn update_course(&self, id: &CourseId, draft: &CourseDraft)
        -> Result<(), BackendError>;

    /// Delete a course record (children are the caller's responsibility)
    async fn delete_course(&self, id: &CourseId) -> Result<(), BackendError>;

    /// List the levels of a course, in collection order
    async fn list_levels(&self, course: &CourseId) -> Result<Vec<Level>, BackendError>;

    /// Create a level under a course
    async fn create_level(
        &self,
        course: &CourseId,
        draft: &LevelDraft,
        created_at: DateTime<Utc>,
    ) -> Result<LevelId, BackendError>;

    /// Update a level's draft fields
    async fn update_level(
        &self,
        course: &CourseId,
        id: &LevelId,
        draft: &LevelDraft,
    ) -> Result<(), BackendError>;

    /// Delete a level record
    async fn delete_level(&self, course: &CourseId, id: &LevelId) -> Result<(), BackendError>;

    /// List the lessons of a level, unsorted
    async fn list_lessons(
        &self,
        course: &CourseId,
        level: &LevelId,
    ) -> Result<Vec<Lesson>, BackendError>;

    /// Fetch one lesson with its embedded documents
    async fn get_lesson(
        &self,
        course: &CourseId,
        level: &LevelId,
        id: &LessonId,
    ) -> Result<Lesson, BackendError>;

    /// Create a lesson under a level, with an empty documents array
    async fn create_lesson(
        &self,
        course: &CourseId,
        level: &LevelId,
        draft: &LessonDraft,
        created_at: DateTime<Utc>,
    ) -> Result<LessonId, BackendError>;

    /// Update a lesson's draft fields
    async fn update_lesson(
        &self,
        course: &CourseId,
        level: &LevelId,
        id: &LessonId,
        draft: &LessonDraft,
    ) -> Result<(), BackendError>;

    /// Delete a lesson record
    async fn delete_lesson(
        &self,
        course: &CourseId,
        level: &LevelId,
        id: &LessonId,
    ) -> Result<(), BackendError>;

    /// Replace a lesson's embedded documents array (last writer wins)
    async fn replace_documents(
        &self,
        course: &CourseId,
        level: &LevelId,
        lesson: &LessonId,
        documents: &[DocumentRecord],
    ) -> Result<(), BackendError>;

    /// Append a view entry to the flat event store
    async fn append_view_entry(&self, entry: &ViewLogEntry) -> Result<(), BackendError>;

    /// Query the flat event store for one document's views, newest first
    ///
    /// # Errors
    /// May fail with [`BackendError::QueryUnavailable`] (e.g. a missing
    /// index); callers fall back to the embedded log.
    async fn query_view_entries(
        &self,
        document: &DocumentId,
        lesson: &LessonId,
    ) -> Result<Vec<ViewLogEntry>, BackendError>;

    /// Scan the whole users directory (no server-side role filter)
    async fn list_users(&self) -> Result<Vec<RawUserRecord>, BackendError>;

    /// Scan the legacy classes collection (read-only input)
    async fn list_legacy_classes(&self) -> Result<Vec<LegacyClassRecord>, BackendError>;
}
