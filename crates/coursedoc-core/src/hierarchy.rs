//! Hierarchy consistency manager
//!
//! Maintains the Course → Level → Lesson tree against a backend with no
//! native referential integrity and no cascade delete. Reads go through a
//! per-course cache; every write under a course invalidates its entry.
//!
//! Deletion compiles an explicit child-first plan of idempotent steps.
//! There is no transaction spanning the steps: a mid-plan failure leaves the
//! already-deleted prefix gone, and the operator reruns the delete to
//! converge.

use crate::error::ConsoleError;
use chrono::Utc;
use coursedoc_backend::{BlobStore, DataStore};
use coursedoc_model::{
    sort_lessons, Course, CourseDraft, CourseId, Lesson, LessonDraft, LessonId, LevelDraft,
    LevelId,
};
use moka::future::Cache;
use std::sync::Arc;

/// Default number of cached course subtrees
pub const DEFAULT_CACHE_CAPACITY: u64 = 256;

/// Read-through cache of materialized course subtrees, keyed by course id
///
/// Shared by every service that mutates records under a course, so each
/// write site can invalidate the one affected entry instead of the console
/// refetching the whole tree.
#[derive(Clone)]
pub struct CourseCache {
    inner: Cache<CourseId, Arc<Course>>,
}

impl CourseCache {
    /// Create a cache with the given capacity
    #[inline]
    #[must_use]
    pub fn new(capacity: u64) -> Self {
        Self {
            inner: Cache::new(capacity),
        }
    }

    /// Get a cached subtree
    pub async fn get(&self, id: &CourseId) -> Option<Arc<Course>> {
        self.inner.get(id).await
    }

    /// Cache a materialized subtree
    pub async fn insert(&self, course: Arc<Course>) {
        self.inner.insert(course.id.clone(), course).await;
    }

    /// Drop the entry for one course
    pub async fn invalidate(&self, id: &CourseId) {
        self.inner.invalidate(id).await;
    }

    /// Approximate number of cached subtrees
    #[inline]
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }
}

impl Default for CourseCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

/// One idempotent step of a cascade delete
#[derive(Debug, Clone)]
enum CascadeStep {
    DeleteBlob {
        path: String,
    },
    DeleteLesson {
        course: CourseId,
        level: LevelId,
        lesson: LessonId,
    },
    DeleteLevel {
        course: CourseId,
        level: LevelId,
    },
    DeleteCourse {
        course: CourseId,
    },
}

impl CascadeStep {
    fn describe(&self) -> String {
        match self {
            CascadeStep::DeleteBlob { path } => format!("storage object {path}"),
            CascadeStep::DeleteLesson {
                course,
                level,
                lesson,
            } => format!("lesson courses/{course}/levels/{level}/lessons/{lesson}"),
            CascadeStep::DeleteLevel { course, level } => {
                format!("level courses/{course}/levels/{level}")
            }
            CascadeStep::DeleteCourse { course } => format!("course courses/{course}"),
        }
    }
}

/// The hierarchy consistency manager
#[derive(Clone)]
pub struct HierarchyService {
    store: Arc<dyn DataStore>,
    blobs: Arc<dyn BlobStore>,
    cache: CourseCache,
}

impl HierarchyService {
    /// Create the service
    #[inline]
    #[must_use]
    pub fn new(store: Arc<dyn DataStore>, blobs: Arc<dyn BlobStore>, cache: CourseCache) -> Self {
        Self {
            store,
            blobs,
            cache,
        }
    }

    /// Materialize the complete tree: all courses, their levels, their lessons
    ///
    /// Lessons come back sorted by lesson number. Courses whose subtree is
    /// cached are served from the cache; the rest are fetched and cached.
    pub async fn load_hierarchy(&self) -> Result<Vec<Course>, ConsoleError> {
        let records = self.store.list_courses().await?;
        let mut tree = Vec::with_capacity(records.len());
        for record in records {
            if let Some(cached) = self.cache.get(&record.id).await {
                tree.push((*cached).clone());
                continue;
            }
            let course = self.materialize(record).await?;
            self.cache.insert(Arc::new(course.clone())).await;
            tree.push(course);
        }
        tracing::debug!(courses = tree.len(), "hierarchy loaded");
        Ok(tree)
    }

    /// Fetch one course's subtree, bypassing the cache
    pub async fn load_course(&self, id: &CourseId) -> Result<Course, ConsoleError> {
        let records = self.store.list_courses().await?;
        let record = records
            .into_iter()
            .find(|c| &c.id == id)
            .ok_or_else(|| {
                ConsoleError::Backend(coursedoc_backend::BackendError::NotFound(format!(
                    "courses/{id}"
                )))
            })?;
        let course = self.materialize(record).await?;
        self.cache.insert(Arc::new(course.clone())).await;
        Ok(course)
    }

    async fn materialize(&self, mut course: Course) -> Result<Course, ConsoleError> {
        let mut levels = self.store.list_levels(&course.id).await?;
        for level in &mut levels {
            let mut lessons = self.store.list_lessons(&course.id, &level.id).await?;
            sort_lessons(&mut lessons);
            level.lessons = lessons;
        }
        course.levels = levels;
        Ok(course)
    }

    /// Create a course
    ///
    /// # Errors
    /// Rejects drafts with an empty name before touching the backend.
    pub async fn create_course(&self, draft: &CourseDraft) -> Result<CourseId, ConsoleError> {
        draft.validate()?;
        let id = self.store.create_course(draft, Utc::now()).await?;
        tracing::info!(course = %id, name = %draft.name, "course created");
        Ok(id)
    }

    /// Update a course's name and description
    pub async fn update_course(
        &self,
        id: &CourseId,
        draft: &CourseDraft,
    ) -> Result<(), ConsoleError> {
        draft.validate()?;
        self.store.update_course(id, draft).await?;
        self.cache.invalidate(id).await;
        Ok(())
    }

    /// Delete a course and everything under it
    ///
    /// Child-first: storage objects, then lessons, then levels, then the
    /// course record.
    pub async fn delete_course(&self, id: &CourseId) -> Result<(), ConsoleError> {
        let mut plan = Vec::new();
        for level in self.store.list_levels(id).await? {
            self.plan_level_cascade(id, &level.id, &mut plan).await?;
        }
        plan.push(CascadeStep::DeleteCourse { course: id.clone() });
        self.run_cascade(id, plan).await
    }

    /// Create a level under a course
    pub async fn create_level(
        &self,
        course: &CourseId,
        draft: &LevelDraft,
    ) -> Result<LevelId, ConsoleError> {
        draft.validate()?;
        let id = self.store.create_level(course, draft, Utc::now()).await?;
        self.cache.invalidate(course).await;
        tracing::info!(course = %course, level = %id, name = %draft.name, "level created");
        Ok(id)
    }

    /// Update a level's name and description
    pub async fn update_level(
        &self,
        course: &CourseId,
        id: &LevelId,
        draft: &LevelDraft,
    ) -> Result<(), ConsoleError> {
        draft.validate()?;
        self.store.update_level(course, id, draft).await?;
        self.cache.invalidate(course).await;
        Ok(())
    }

    /// Delete a level and everything under it
    pub async fn delete_level(
        &self,
        course: &CourseId,
        id: &LevelId,
    ) -> Result<(), ConsoleError> {
        let mut plan = Vec::new();
        self.plan_level_cascade(course, id, &mut plan).await?;
        self.run_cascade(course, plan).await
    }

    /// Create a lesson under a level
    pub async fn create_lesson(
        &self,
        course: &CourseId,
        level: &LevelId,
        draft: &LessonDraft,
    ) -> Result<LessonId, ConsoleError> {
        draft.validate()?;
        let id = self
            .store
            .create_lesson(course, level, draft, Utc::now())
            .await?;
        self.cache.invalidate(course).await;
        tracing::info!(course = %course, level = %level, lesson = %id, "lesson created");
        Ok(id)
    }

    /// Update a lesson's name, description, and lesson number
    pub async fn update_lesson(
        &self,
        course: &CourseId,
        level: &LevelId,
        id: &LessonId,
        draft: &LessonDraft,
    ) -> Result<(), ConsoleError> {
        draft.validate()?;
        self.store.update_lesson(course, level, id, draft).await?;
        self.cache.invalidate(course).await;
        Ok(())
    }

    /// Delete a lesson and its documents' storage objects
    ///
    /// A lesson that is already gone counts as deleted.
    pub async fn delete_lesson(
        &self,
        course: &CourseId,
        level: &LevelId,
        id: &LessonId,
    ) -> Result<(), ConsoleError> {
        let mut plan = Vec::new();
        match self.store.get_lesson(course, level, id).await {
            Ok(lesson) => self.plan_lesson_cascade(course, level, &lesson, &mut plan),
            Err(e) if e.is_not_found() => return Ok(()),
            Err(e) => return Err(e.into()),
        }
        self.run_cascade(course, plan).await
    }

    async fn plan_level_cascade(
        &self,
        course: &CourseId,
        level: &LevelId,
        plan: &mut Vec<CascadeStep>,
    ) -> Result<(), ConsoleError> {
        for lesson in self.store.list_lessons(course, level).await? {
            self.plan_lesson_cascade(course, level, &lesson, plan);
        }
        plan.push(CascadeStep::DeleteLevel {
            course: course.clone(),
            level: level.clone(),
        });
        Ok(())
    }

    fn plan_lesson_cascade(
        &self,
        course: &CourseId,
        level: &LevelId,
        lesson: &Lesson,
        plan: &mut Vec<CascadeStep>,
    ) {
        for document in &lesson.documents {
            plan.push(CascadeStep::DeleteBlob {
                path: document.storage_path.clone(),
            });
        }
        plan.push(CascadeStep::DeleteLesson {
            course: course.clone(),
            level: level.clone(),
            lesson: lesson.id.clone(),
        });
    }

    async fn run_cascade(
        &self,
        course: &CourseId,
        plan: Vec<CascadeStep>,
    ) -> Result<(), ConsoleError> {
        let total = plan.len();
        for (completed, step) in plan.into_iter().enumerate() {
            let result = match &step {
                CascadeStep::DeleteBlob { path } => self.blobs.delete(path).await,
                CascadeStep::DeleteLesson {
                    course,
                    level,
                    lesson,
                } => self.store.delete_lesson(course, level, lesson).await,
                CascadeStep::DeleteLevel { course, level } => {
                    self.store.delete_level(course, level).await
                }
                CascadeStep::DeleteCourse { course } => self.store.delete_course(course).await,
            };
            match result {
                Ok(()) => {}
                // Already gone: a rerun of a partially-applied plan.
                Err(e) if e.is_not_found() => {}
                Err(e) => {
                    self.cache.invalidate(course).await;
                    tracing::error!(
                        step = %step.describe(),
                        completed,
                        total,
                        "cascade delete aborted: {e}"
                    );
                    return Err(ConsoleError::Cascade {
                        step: step.describe(),
                        completed,
                        source: e,
                    });
                }
            }
        }
        self.cache.invalidate(course).await;
        tracing::info!(course = %course, steps = total, "cascade delete completed");
        Ok(())
    }
}
