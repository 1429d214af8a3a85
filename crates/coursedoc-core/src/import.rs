//! One-time import from the legacy class system
//!
//! Reads the legacy classes collection (never written back), groups records
//! by their shared group name, and creates a course with a default level and
//! one lesson per session. Courses that already exist by name are skipped,
//! so rerunning the import is a no-op for previously imported groups.

use crate::error::{ConsoleError, ImportError};
use chrono::Utc;
use coursedoc_backend::DataStore;
use coursedoc_model::{CourseDraft, LegacyClassRecord, LessonDraft, LevelDraft};
use indexmap::IndexMap;
use std::collections::HashSet;
use std::sync::Arc;

/// Outcome of one import run
#[derive(Debug, Clone, Default)]
pub struct ImportReport {
    /// Group names imported as new courses
    pub imported: Vec<String>,
    /// Group names skipped because a course with that name exists
    pub skipped_existing: Vec<String>,
    /// Group names skipped for lack of a positive session count
    pub skipped_no_sessions: Vec<String>,
}

impl ImportReport {
    /// Number of courses created by this run
    #[inline]
    #[must_use]
    pub fn imported_count(&self) -> usize {
        self.imported.len()
    }
}

/// The legacy import routine
#[derive(Clone)]
pub struct ImportService {
    store: Arc<dyn DataStore>,
}

impl ImportService {
    /// Create the service
    #[inline]
    #[must_use]
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self { store }
    }

    /// Import legacy classes as courses
    ///
    /// Grouping preserves first-seen order. Each imported course gets one
    /// default level and lessons numbered "1".."N", where N is the highest
    /// session count across the group's timeslots.
    ///
    /// # Errors
    /// [`ImportError::NoClasses`] when the legacy collection is empty;
    /// backend failures abort the run partway (already-created courses stay).
    pub async fn import_legacy_classes(&self) -> Result<ImportReport, ConsoleError> {
        let classes = self.store.list_legacy_classes().await?;
        if classes.is_empty() {
            return Err(ImportError::NoClasses.into());
        }

        let mut groups: IndexMap<String, Vec<&LegacyClassRecord>> = IndexMap::new();
        for record in &classes {
            groups
                .entry(record.group_name().to_string())
                .or_default()
                .push(record);
        }

        let existing: HashSet<String> = self
            .store
            .list_courses()
            .await?
            .into_iter()
            .map(|c| c.name)
            .collect();

        let mut report = ImportReport::default();
        for (group_name, members) in groups {
            if existing.contains(&group_name) {
                tracing::info!(group = %group_name, "course exists, skipping");
                report.skipped_existing.push(group_name);
                continue;
            }

            let Some(sessions) = members.iter().filter_map(|m| m.sessions()).max() else {
                tracing::warn!(group = %group_name, "no usable session count, skipping");
                report.skipped_no_sessions.push(group_name);
                continue;
            };

            let now = Utc::now();
            let description = format!(
                "Imported from the legacy class system. {} timeslot(s), {} sessions per class.",
                members.len(),
                sessions
            );
            let course_id = self
                .store
                .create_course(&CourseDraft::new(&group_name, description), now)
                .await?;
            let level_id = self
                .store
                .create_level(
                    &course_id,
                    &LevelDraft::new("Default Level", "Default level for imported course"),
                    now,
                )
                .await?;
            for number in 1..=sessions {
                self.store
                    .create_lesson(
                        &course_id,
                        &level_id,
                        &LessonDraft::new(
                            format!("Lesson {number}"),
                            format!("Lesson {number} for {group_name}"),
                            number.to_string(),
                        ),
                        now,
                    )
                    .await?;
            }

            tracing::info!(group = %group_name, sessions, "course imported");
            report.imported.push(group_name);
        }

        Ok(report)
    }
}
