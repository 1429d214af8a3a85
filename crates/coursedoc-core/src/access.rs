//! Access-control evaluation and view logging
//!
//! The access list is advisory metadata: this console edits it, the student
//! application enforces it. View logging writes to two places — the flat
//! event store for durable queryable history and the embedded per-document
//! log for quick display — and neither write may block the viewer.

use crate::error::ConsoleError;
use crate::hierarchy::CourseCache;
use crate::session::AuthorizedUser;
use chrono::Utc;
use coursedoc_backend::DataStore;
use coursedoc_model::{
    merge_view_logs, Course, CourseId, DocumentId, DocumentRecord, Lesson, LessonId, Level,
    LevelId, StudentId, ViewEvent, ViewLogEntry,
};
use std::sync::Arc;

/// Who viewed a document
#[derive(Debug, Clone)]
pub struct Viewer {
    /// Platform identifier
    pub user_id: String,
    /// Email
    pub user_email: String,
    /// Display name
    pub user_name: String,
}

impl From<&AuthorizedUser> for Viewer {
    fn from(user: &AuthorizedUser) -> Self {
        Self {
            user_id: user.uid.clone(),
            user_email: user.email.clone(),
            user_name: user.display_name.clone(),
        }
    }
}

/// Where a document lives in the hierarchy, with display names for the
/// flat event store
#[derive(Debug, Clone)]
pub struct DocumentLocator {
    /// Owning course
    pub course_id: CourseId,
    /// Course display name
    pub course_name: String,
    /// Owning level
    pub level_id: LevelId,
    /// Level display name
    pub level_name: String,
    /// Owning lesson
    pub lesson_id: LessonId,
    /// Lesson display name
    pub lesson_name: String,
}

impl DocumentLocator {
    /// Build a locator from materialized hierarchy records
    #[must_use]
    pub fn new(course: &Course, level: &Level, lesson: &Lesson) -> Self {
        Self {
            course_id: course.id.clone(),
            course_name: course.name.clone(),
            level_id: level.id.clone(),
            level_name: level.name.clone(),
            lesson_id: lesson.id.clone(),
            lesson_name: lesson.name.clone(),
        }
    }
}

/// Access-list editing and view logging
#[derive(Clone)]
pub struct AccessService {
    store: Arc<dyn DataStore>,
    cache: CourseCache,
}

impl AccessService {
    /// Create the service
    #[inline]
    #[must_use]
    pub fn new(store: Arc<dyn DataStore>, cache: CourseCache) -> Self {
        Self { store, cache }
    }

    /// Replace a document's access list with exactly `students`
    ///
    /// Last writer wins; there is no merging. Returns the updated record.
    pub async fn set_access(
        &self,
        course: &CourseId,
        level: &LevelId,
        lesson: &LessonId,
        document: &DocumentId,
        students: Vec<StudentId>,
    ) -> Result<DocumentRecord, ConsoleError> {
        let mut documents = self.store.get_lesson(course, level, lesson).await?.documents;
        let record = documents
            .iter_mut()
            .find(|d| &d.id == document)
            .ok_or_else(|| ConsoleError::DocumentNotFound(document.clone()))?;
        record.access.grant_exactly(students);
        let updated = record.clone();

        self.store
            .replace_documents(course, level, lesson, &documents)
            .await?;
        self.cache.invalidate(course).await;
        tracing::info!(
            document = %document,
            granted = updated.access.granted().len(),
            "access list replaced"
        );
        Ok(updated)
    }

    /// Record that `viewer` viewed `document`
    ///
    /// Appends to the flat event store and to the embedded per-document log.
    /// Both writes are best-effort: failures are logged and never surfaced,
    /// so a logging outage cannot block the viewer.
    pub async fn record_view(
        &self,
        locator: &DocumentLocator,
        document: &DocumentRecord,
        viewer: &Viewer,
    ) -> ViewEvent {
        let event = ViewEvent {
            user_id: viewer.user_id.clone(),
            user_email: viewer.user_email.clone(),
            user_name: viewer.user_name.clone(),
            viewed_at: Utc::now(),
        };

        let entry = ViewLogEntry {
            event: event.clone(),
            document_id: document.id.clone(),
            document_name: document.name.clone(),
            course_id: locator.course_id.clone(),
            course_name: locator.course_name.clone(),
            level_id: locator.level_id.clone(),
            level_name: locator.level_name.clone(),
            lesson_id: locator.lesson_id.clone(),
            lesson_name: locator.lesson_name.clone(),
        };
        if let Err(e) = self.store.append_view_entry(&entry).await {
            tracing::warn!(document = %document.id, "flat view-log write failed: {e}");
        }

        if let Err(e) = self.append_embedded(locator, &document.id, &event).await {
            tracing::warn!(document = %document.id, "embedded view-log write failed: {e}");
        }

        event
    }

    async fn append_embedded(
        &self,
        locator: &DocumentLocator,
        document: &DocumentId,
        event: &ViewEvent,
    ) -> Result<(), ConsoleError> {
        let mut documents = self
            .store
            .get_lesson(&locator.course_id, &locator.level_id, &locator.lesson_id)
            .await?
            .documents;
        let record = documents
            .iter_mut()
            .find(|d| &d.id == document)
            .ok_or_else(|| ConsoleError::DocumentNotFound(document.clone()))?;
        record.view_log.push(event.clone());

        self.store
            .replace_documents(
                &locator.course_id,
                &locator.level_id,
                &locator.lesson_id,
                &documents,
            )
            .await?;
        self.cache.invalidate(&locator.course_id).await;
        Ok(())
    }

    /// Fetch a document's view history, newest first
    ///
    /// Prefers the flat event store; if its query is unavailable (e.g. a
    /// missing index) the embedded log alone is returned. When both sources
    /// are readable they are merged and de-duplicated on the
    /// (viewer, timestamp) key, since every view is written to both.
    pub async fn get_view_log(
        &self,
        course: &CourseId,
        level: &LevelId,
        lesson: &LessonId,
        document: &DocumentId,
    ) -> Result<Vec<ViewEvent>, ConsoleError> {
        let embedded = match self.store.get_lesson(course, level, lesson).await {
            Ok(record) => record
                .documents
                .iter()
                .find(|d| &d.id == document)
                .map(|d| d.view_log.clone())
                .unwrap_or_default(),
            Err(e) => {
                tracing::warn!(document = %document, "embedded view-log read failed: {e}");
                Vec::new()
            }
        };

        let flat = match self.store.query_view_entries(document, lesson).await {
            Ok(entries) => entries.into_iter().map(|e| e.event).collect(),
            Err(e) => {
                tracing::warn!(document = %document, "flat view-log query failed, falling back: {e}");
                Vec::new()
            }
        };

        Ok(merge_view_logs(flat, embedded))
    }
}
