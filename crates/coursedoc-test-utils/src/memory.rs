//! In-memory implementation of the three backend seams
//!
//! Mirrors the hosted platform's observable behavior closely enough for
//! service tests: collection order is insertion order, deletes of absent
//! records succeed, the flat-query path can be switched off to simulate a
//! missing index, and single deletes can be poisoned to exercise partial
//! cascade failure.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use coursedoc_backend::{AuthProvider, AuthUser, BackendError, BlobStore, DataStore};
use coursedoc_model::{
    Course, CourseDraft, CourseId, DocumentId, DocumentRecord, LegacyClassRecord, Lesson,
    LessonDraft, LessonId, Level, LevelDraft, LevelId, RawUserRecord, ViewLogEntry,
};
use dashmap::DashMap;
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

#[derive(Debug, Clone)]
struct CourseNode {
    name: String,
    description: String,
    created_at: DateTime<Utc>,
    levels: IndexMap<String, LevelNode>,
}

#[derive(Debug, Clone)]
struct LevelNode {
    name: String,
    description: String,
    created_at: DateTime<Utc>,
    lessons: IndexMap<String, Lesson>,
}

#[derive(Debug, Clone)]
struct Account {
    password: String,
    user: AuthUser,
}

/// In-memory stand-in for the hosted platform
#[derive(Debug, Default)]
pub struct MemoryBackend {
    tree: RwLock<IndexMap<String, CourseNode>>,
    view_entries: RwLock<Vec<ViewLogEntry>>,
    users: RwLock<Vec<RawUserRecord>>,
    legacy_classes: RwLock<Vec<LegacyClassRecord>>,
    accounts: DashMap<String, Account>,
    blobs: DashMap<String, (String, Vec<u8>)>,
    signed_out: RwLock<Vec<String>>,
    view_query_unavailable: AtomicBool,
    fail_next_lesson_delete: AtomicBool,
}

impl MemoryBackend {
    /// Create an empty backend
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn mint_id() -> String {
        Uuid::new_v4().simple().to_string()
    }

    /// Register an auth account
    pub fn add_account(
        &self,
        email: impl Into<String>,
        password: impl Into<String>,
        uid: impl Into<String>,
        display_name: Option<&str>,
    ) {
        let email = email.into();
        self.accounts.insert(
            email.clone(),
            Account {
                password: password.into(),
                user: AuthUser {
                    uid: uid.into(),
                    email,
                    display_name: display_name.map(String::from),
                },
            },
        );
    }

    /// Seed a directory record
    pub fn add_user(&self, record: RawUserRecord) {
        self.users.write().push(record);
    }

    /// Seed a legacy class record
    pub fn add_legacy_class(&self, record: LegacyClassRecord) {
        self.legacy_classes.write().push(record);
    }

    /// Simulate a missing index on the flat view-event query
    pub fn set_view_query_unavailable(&self, unavailable: bool) {
        self.view_query_unavailable
            .store(unavailable, Ordering::SeqCst);
    }

    /// Make the next lesson delete fail once
    pub fn fail_next_lesson_delete(&self) {
        self.fail_next_lesson_delete.store(true, Ordering::SeqCst);
    }

    /// Uids that have been signed out (voluntarily or forced)
    #[must_use]
    pub fn signed_out_uids(&self) -> Vec<String> {
        self.signed_out.read().clone()
    }

    /// Whether an object exists at `path`
    #[must_use]
    pub fn has_blob(&self, path: &str) -> bool {
        self.blobs.contains_key(path)
    }

    /// Number of stored objects
    #[must_use]
    pub fn blob_count(&self) -> usize {
        self.blobs.len()
    }

    /// Number of course records
    #[must_use]
    pub fn course_count(&self) -> usize {
        self.tree.read().len()
    }

    /// Number of level records across all courses
    #[must_use]
    pub fn level_count(&self) -> usize {
        self.tree.read().values().map(|c| c.levels.len()).sum()
    }

    /// Number of lesson records across all levels
    #[must_use]
    pub fn lesson_count(&self) -> usize {
        self.tree
            .read()
            .values()
            .flat_map(|c| c.levels.values())
            .map(|l| l.lessons.len())
            .sum()
    }

    /// Raw view entries in the flat store
    #[must_use]
    pub fn view_entry_count(&self) -> usize {
        self.view_entries.read().len()
    }
}

#[async_trait]
impl DataStore for MemoryBackend {
    async fn list_courses(&self) -> Result<Vec<Course>, BackendError> {
        Ok(self
            .tree
            .read()
            .iter()
            .map(|(id, node)| Course {
                id: CourseId::new(id.clone()),
                name: node.name.clone(),
                description: node.description.clone(),
                created_at: node.created_at,
                levels: Vec::new(),
            })
            .collect())
    }

    async fn create_course(
        &self,
        draft: &CourseDraft,
        created_at: DateTime<Utc>,
    ) -> Result<CourseId, BackendError> {
        let id = Self::mint_id();
        self.tree.write().insert(
            id.clone(),
            CourseNode {
                name: draft.name.clone(),
                description: draft.description.clone(),
                created_at,
                levels: IndexMap::new(),
            },
        );
        Ok(CourseId::new(id))
    }

    async fn update_course(
        &self,
        id: &CourseId,
        draft: &CourseDraft,
    ) -> Result<(), BackendError> {
        let mut tree = self.tree.write();
        let node = tree
            .get_mut(id.as_str())
            .ok_or_else(|| BackendError::NotFound(format!("courses/{id}")))?;
        node.name = draft.name.clone();
        node.description = draft.description.clone();
        Ok(())
    }

    async fn delete_course(&self, id: &CourseId) -> Result<(), BackendError> {
        self.tree.write().shift_remove(id.as_str());
        Ok(())
    }

    async fn list_levels(&self, course: &CourseId) -> Result<Vec<Level>, BackendError> {
        let tree = self.tree.read();
        let node = tree
            .get(course.as_str())
            .ok_or_else(|| BackendError::NotFound(format!("courses/{course}")))?;
        Ok(node
            .levels
            .iter()
            .map(|(id, level)| Level {
                id: LevelId::new(id.clone()),
                name: level.name.clone(),
                description: level.description.clone(),
                created_at: level.created_at,
                lessons: Vec::new(),
            })
            .collect())
    }

    async fn create_level(
        &self,
        course: &CourseId,
        draft: &LevelDraft,
        created_at: DateTime<Utc>,
    ) -> Result<LevelId, BackendError> {
        let mut tree = self.tree.write();
        let node = tree
            .get_mut(course.as_str())
            .ok_or_else(|| BackendError::NotFound(format!("courses/{course}")))?;
        let id = Self::mint_id();
        node.levels.insert(
            id.clone(),
            LevelNode {
                name: draft.name.clone(),
                description: draft.description.clone(),
                created_at,
                lessons: IndexMap::new(),
            },
        );
        Ok(LevelId::new(id))
    }

    async fn update_level(
        &self,
        course: &CourseId,
        id: &LevelId,
        draft: &LevelDraft,
    ) -> Result<(), BackendError> {
        let mut tree = self.tree.write();
        let level = tree
            .get_mut(course.as_str())
            .and_then(|c| c.levels.get_mut(id.as_str()))
            .ok_or_else(|| BackendError::NotFound(format!("courses/{course}/levels/{id}")))?;
        level.name = draft.name.clone();
        level.description = draft.description.clone();
        Ok(())
    }

    async fn delete_level(&self, course: &CourseId, id: &LevelId) -> Result<(), BackendError> {
        if let Some(node) = self.tree.write().get_mut(course.as_str()) {
            node.levels.shift_remove(id.as_str());
        }
        Ok(())
    }

    async fn list_lessons(
        &self,
        course: &CourseId,
        level: &LevelId,
    ) -> Result<Vec<Lesson>, BackendError> {
        let tree = self.tree.read();
        let node = tree
            .get(course.as_str())
            .and_then(|c| c.levels.get(level.as_str()))
            .ok_or_else(|| {
                BackendError::NotFound(format!("courses/{course}/levels/{level}"))
            })?;
        Ok(node.lessons.values().cloned().collect())
    }

    async fn get_lesson(
        &self,
        course: &CourseId,
        level: &LevelId,
        id: &LessonId,
    ) -> Result<Lesson, BackendError> {
        self.tree
            .read()
            .get(course.as_str())
            .and_then(|c| c.levels.get(level.as_str()))
            .and_then(|l| l.lessons.get(id.as_str()))
            .cloned()
            .ok_or_else(|| {
                BackendError::NotFound(format!(
                    "courses/{course}/levels/{level}/lessons/{id}"
                ))
            })
    }

    async fn create_lesson(
        &self,
        course: &CourseId,
        level: &LevelId,
        draft: &LessonDraft,
        created_at: DateTime<Utc>,
    ) -> Result<LessonId, BackendError> {
        let mut tree = self.tree.write();
        let node = tree
            .get_mut(course.as_str())
            .and_then(|c| c.levels.get_mut(level.as_str()))
            .ok_or_else(|| {
                BackendError::NotFound(format!("courses/{course}/levels/{level}"))
            })?;
        let id = Self::mint_id();
        node.lessons.insert(
            id.clone(),
            Lesson {
                id: LessonId::new(id.clone()),
                name: draft.name.clone(),
                description: draft.description.clone(),
                lesson_number: draft.lesson_number.clone(),
                created_at,
                documents: Vec::new(),
            },
        );
        Ok(LessonId::new(id))
    }

    async fn update_lesson(
        &self,
        course: &CourseId,
        level: &LevelId,
        id: &LessonId,
        draft: &LessonDraft,
    ) -> Result<(), BackendError> {
        let mut tree = self.tree.write();
        let lesson = tree
            .get_mut(course.as_str())
            .and_then(|c| c.levels.get_mut(level.as_str()))
            .and_then(|l| l.lessons.get_mut(id.as_str()))
            .ok_or_else(|| {
                BackendError::NotFound(format!(
                    "courses/{course}/levels/{level}/lessons/{id}"
                ))
            })?;
        lesson.name = draft.name.clone();
        lesson.description = draft.description.clone();
        lesson.lesson_number = draft.lesson_number.clone();
        Ok(())
    }

    async fn delete_lesson(
        &self,
        course: &CourseId,
        level: &LevelId,
        id: &LessonId,
    ) -> Result<(), BackendError> {
        if self.fail_next_lesson_delete.swap(false, Ordering::SeqCst) {
            return Err(BackendError::Status {
                status: 503,
                message: "injected failure".to_string(),
            });
        }
        if let Some(node) = self
            .tree
            .write()
            .get_mut(course.as_str())
            .and_then(|c| c.levels.get_mut(level.as_str()))
        {
            node.lessons.shift_remove(id.as_str());
        }
        Ok(())
    }

    async fn replace_documents(
        &self,
        course: &CourseId,
        level: &LevelId,
        lesson: &LessonId,
        documents: &[DocumentRecord],
    ) -> Result<(), BackendError> {
        let mut tree = self.tree.write();
        let record = tree
            .get_mut(course.as_str())
            .and_then(|c| c.levels.get_mut(level.as_str()))
            .and_then(|l| l.lessons.get_mut(lesson.as_str()))
            .ok_or_else(|| {
                BackendError::NotFound(format!(
                    "courses/{course}/levels/{level}/lessons/{lesson}"
                ))
            })?;
        record.documents = documents.to_vec();
        Ok(())
    }

    async fn append_view_entry(&self, entry: &ViewLogEntry) -> Result<(), BackendError> {
        self.view_entries.write().push(entry.clone());
        Ok(())
    }

    async fn query_view_entries(
        &self,
        document: &DocumentId,
        lesson: &LessonId,
    ) -> Result<Vec<ViewLogEntry>, BackendError> {
        if self.view_query_unavailable.load(Ordering::SeqCst) {
            return Err(BackendError::QueryUnavailable(
                "no index for documentViewLogs".to_string(),
            ));
        }
        let mut entries: Vec<ViewLogEntry> = self
            .view_entries
            .read()
            .iter()
            .filter(|e| &e.document_id == document && &e.lesson_id == lesson)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.event.viewed_at.cmp(&a.event.viewed_at));
        Ok(entries)
    }

    async fn list_users(&self) -> Result<Vec<RawUserRecord>, BackendError> {
        Ok(self.users.read().clone())
    }

    async fn list_legacy_classes(&self) -> Result<Vec<LegacyClassRecord>, BackendError> {
        Ok(self.legacy_classes.read().clone())
    }
}

#[async_trait]
impl AuthProvider for MemoryBackend {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, BackendError> {
        let account = self
            .accounts
            .get(email)
            .ok_or(BackendError::InvalidCredentials)?;
        if account.password != password {
            return Err(BackendError::InvalidCredentials);
        }
        Ok(account.user.clone())
    }

    async fn sign_out(&self, user: &AuthUser) -> Result<(), BackendError> {
        self.signed_out.write().push(user.uid.clone());
        Ok(())
    }
}

#[async_trait]
impl BlobStore for MemoryBackend {
    async fn upload(
        &self,
        path: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<String, BackendError> {
        self.blobs
            .insert(path.to_string(), (content_type.to_string(), bytes.to_vec()));
        Ok(format!("memory://{path}"))
    }

    async fn delete(&self, path: &str) -> Result<(), BackendError> {
        self.blobs.remove(path);
        Ok(())
    }
}
