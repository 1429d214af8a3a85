//! Document upload and deletion
//!
//! Uploads proceed one file at a time; each file goes to object storage
//! first, then the lesson's embedded array is rewritten once with all new
//! records appended. A failure partway leaves already-uploaded objects in
//! storage with no record pointing at them; the operator retries the upload.

use crate::error::ConsoleError;
use crate::hierarchy::CourseCache;
use chrono::Utc;
use coursedoc_backend::{document_storage_path, BlobStore, DataStore};
use coursedoc_model::{
    AccessPolicy, CourseId, DocumentId, DocumentRecord, LessonId, LevelId,
};
use std::sync::Arc;

/// One file handed to the console for upload
#[derive(Debug, Clone)]
pub struct FileUpload {
    /// Original file name
    pub file_name: String,
    /// MIME type
    pub content_type: String,
    /// File bytes
    pub bytes: Vec<u8>,
}

impl FileUpload {
    /// Create an upload
    #[inline]
    #[must_use]
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }
}

/// Upload and deletion of lesson documents
#[derive(Clone)]
pub struct DocumentService {
    store: Arc<dyn DataStore>,
    blobs: Arc<dyn BlobStore>,
    cache: CourseCache,
}

impl DocumentService {
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

    /// Upload files to a lesson, in sequence, and append their records
    ///
    /// Every new document starts locked (empty access list) with an empty
    /// view log. Returns the appended records.
    pub async fn upload_documents(
        &self,
        course: &CourseId,
        level: &LevelId,
        lesson: &LessonId,
        files: Vec<FileUpload>,
    ) -> Result<Vec<DocumentRecord>, ConsoleError> {
        if files.is_empty() {
            return Ok(Vec::new());
        }
        let mut documents = self.store.get_lesson(course, level, lesson).await?.documents;

        let mut uploaded = Vec::with_capacity(files.len());
        for file in files {
            let uploaded_at = Utc::now();
            let path = document_storage_path(course, level, lesson, uploaded_at, &file.file_name);
            let url = self
                .blobs
                .upload(&path, &file.content_type, &file.bytes)
                .await?;
            let record = DocumentRecord {
                id: DocumentId::derive(&path, &file.bytes),
                name: file.file_name,
                content_type: file.content_type,
                size: file.bytes.len() as u64,
                url,
                storage_path: path,
                uploaded_at,
                access: AccessPolicy::locked(),
                view_log: Vec::new(),
            };
            tracing::info!(document = %record.id, name = %record.name, "document uploaded");
            uploaded.push(record);
        }

        documents.extend(uploaded.iter().cloned());
        self.store
            .replace_documents(course, level, lesson, &documents)
            .await?;
        self.cache.invalidate(course).await;
        Ok(uploaded)
    }

    /// Delete one document: its storage object first, then its record
    pub async fn delete_document(
        &self,
        course: &CourseId,
        level: &LevelId,
        lesson: &LessonId,
        document: &DocumentId,
    ) -> Result<(), ConsoleError> {
        let mut documents = self.store.get_lesson(course, level, lesson).await?.documents;
        let Some(record) = documents.iter().find(|d| &d.id == document).cloned() else {
            return Err(ConsoleError::DocumentNotFound(document.clone()));
        };

        self.blobs.delete(&record.storage_path).await?;

        documents.retain(|d| &d.id != document);
        self.store
            .replace_documents(course, level, lesson, &documents)
            .await?;
        self.cache.invalidate(course).await;
        tracing::info!(document = %document, name = %record.name, "document deleted");
        Ok(())
    }
}
