//! REST client for the hosted platform
//!
//! One client implements all three seams. The platform exposes collections
//! under `/v1/projects/{project}/collections/...`, auth under `/v1/auth`, and
//! object storage under `/v1/storage/{bucket}`. Documents come back with
//! their identifier inline, so typed records deserialize directly.

use crate::auth::{AuthProvider, AuthUser};
use crate::blob::BlobStore;
use crate::config::BackendConfig;
use crate::error::BackendError;
use crate::store::DataStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use coursedoc_model::{
    Course, CourseDraft, CourseId, DocumentId, DocumentRecord, LegacyClassRecord, Lesson,
    LessonDraft, LessonId, Level, LevelDraft, LevelId, RawUserRecord, ViewLogEntry,
};
use reqwest::StatusCode;
use serde::Deserialize;

const API_KEY_HEADER: &str = "x-api-key";

#[derive(Debug, Deserialize)]
struct CreatedResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadResponse {
    download_url: String,
}

/// REST implementation of the platform seams
#[derive(Debug, Clone)]
pub struct RestBackend {
    http: reqwest::Client,
    config: BackendConfig,
}

impl RestBackend {
    /// Create a client for the given configuration
    #[inline]
    #[must_use]
    pub fn new(config: BackendConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Get the configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    fn docs_url(&self, segments: &[&str]) -> String {
        let mut url = format!(
            "{}/v1/projects/{}/collections",
            self.config.api_base.trim_end_matches('/'),
            self.config.project_id
        );
        for segment in segments {
            url.push('/');
            url.push_str(segment);
        }
        url
    }

    fn auth_url(&self, action: &str) -> String {
        format!(
            "{}/v1/auth/{}",
            self.config.api_base.trim_end_matches('/'),
            action
        )
    }

    fn storage_url(&self) -> String {
        format!(
            "{}/v1/storage/{}/objects",
            self.config.api_base.trim_end_matches('/'),
            self.config.storage_bucket
        )
    }

    async fn list<T: serde::de::DeserializeOwned>(
        &self,
        segments: &[&str],
    ) -> Result<Vec<T>, BackendError> {
        let url = self.docs_url(segments);
        let resp = self
            .http
            .get(&url)
            .header(API_KEY_HEADER, &self.config.api_key)
            .send()
            .await?;
        let resp = expect_success(resp, &url).await?;
        Ok(resp.json().await?)
    }

    async fn create(
        &self,
        segments: &[&str],
        draft: &impl serde::Serialize,
        created_at: DateTime<Utc>,
    ) -> Result<String, BackendError> {
        let mut body = serde_json::to_value(draft)?;
        if let Some(map) = body.as_object_mut() {
            map.insert("createdAt".to_string(), serde_json::to_value(created_at)?);
        }
        let url = self.docs_url(segments);
        let resp = self
            .http
            .post(&url)
            .header(API_KEY_HEADER, &self.config.api_key)
            .json(&body)
            .send()
            .await?;
        let resp = expect_success(resp, &url).await?;
        let created: CreatedResponse = resp.json().await?;
        Ok(created.id)
    }

    async fn patch(
        &self,
        segments: &[&str],
        draft: &impl serde::Serialize,
    ) -> Result<(), BackendError> {
        let url = self.docs_url(segments);
        let resp = self
            .http
            .patch(&url)
            .header(API_KEY_HEADER, &self.config.api_key)
            .json(draft)
            .send()
            .await?;
        expect_success(resp, &url).await?;
        Ok(())
    }

    async fn delete_record(&self, segments: &[&str]) -> Result<(), BackendError> {
        let url = self.docs_url(segments);
        let resp = self
            .http
            .delete(&url)
            .header(API_KEY_HEADER, &self.config.api_key)
            .send()
            .await?;
        // An already-deleted record is success; cascade retries rely on this.
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        expect_success(resp, &url).await?;
        Ok(())
    }
}

async fn expect_success(
    resp: reqwest::Response,
    context: &str,
) -> Result<reqwest::Response, BackendError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    if status == StatusCode::NOT_FOUND {
        return Err(BackendError::NotFound(context.to_string()));
    }
    let message = resp.text().await.unwrap_or_default();
    Err(BackendError::Status {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl DataStore for RestBackend {
    async fn list_courses(&self) -> Result<Vec<Course>, BackendError> {
        self.list(&["courses"]).await
    }

    async fn create_course(
        &self,
        draft: &CourseDraft,
        created_at: DateTime<Utc>,
    ) -> Result<CourseId, BackendError> {
        self.create(&["courses"], draft, created_at)
            .await
            .map(CourseId::from)
    }

    async fn update_course(
        &self,
        id: &CourseId,
        draft: &CourseDraft,
    ) -> Result<(), BackendError> {
        self.patch(&["courses", id.as_str()], draft).await
    }

    async fn delete_course(&self, id: &CourseId) -> Result<(), BackendError> {
        self.delete_record(&["courses", id.as_str()]).await
    }

    async fn list_levels(&self, course: &CourseId) -> Result<Vec<Level>, BackendError> {
        self.list(&["courses", course.as_str(), "levels"]).await
    }

    async fn create_level(
        &self,
        course: &CourseId,
        draft: &LevelDraft,
        created_at: DateTime<Utc>,
    ) -> Result<LevelId, BackendError> {
        self.create(&["courses", course.as_str(), "levels"], draft, created_at)
            .await
            .map(LevelId::from)
    }

    async fn update_level(
        &self,
        course: &CourseId,
        id: &LevelId,
        draft: &LevelDraft,
    ) -> Result<(), BackendError> {
        self.patch(&["courses", course.as_str(), "levels", id.as_str()], draft)
            .await
    }

    async fn delete_level(&self, course: &CourseId, id: &LevelId) -> Result<(), BackendError> {
        self.delete_record(&["courses", course.as_str(), "levels", id.as_str()])
            .await
    }

    async fn list_lessons(
        &self,
        course: &CourseId,
        level: &LevelId,
    ) -> Result<Vec<Lesson>, BackendError> {
        self.list(&[
            "courses",
            course.as_str(),
            "levels",
            level.as_str(),
            "lessons",
        ])
        .await
    }

    async fn get_lesson(
        &self,
        course: &CourseId,
        level: &LevelId,
        id: &LessonId,
    ) -> Result<Lesson, BackendError> {
        let url = self.docs_url(&[
            "courses",
            course.as_str(),
            "levels",
            level.as_str(),
            "lessons",
            id.as_str(),
        ]);
        let resp = self
            .http
            .get(&url)
            .header(API_KEY_HEADER, &self.config.api_key)
            .send()
            .await?;
        let resp = expect_success(resp, &url).await?;
        Ok(resp.json().await?)
    }

    async fn create_lesson(
        &self,
        course: &CourseId,
        level: &LevelId,
        draft: &LessonDraft,
        created_at: DateTime<Utc>,
    ) -> Result<LessonId, BackendError> {
        let mut body = serde_json::to_value(draft)?;
        if let Some(map) = body.as_object_mut() {
            // Lessons are born with an empty documents array.
            map.insert("documents".to_string(), serde_json::Value::Array(Vec::new()));
        }
        self.create(
            &[
                "courses",
                course.as_str(),
                "levels",
                level.as_str(),
                "lessons",
            ],
            &body,
            created_at,
        )
        .await
        .map(LessonId::from)
    }

    async fn update_lesson(
        &self,
        course: &CourseId,
        level: &LevelId,
        id: &LessonId,
        draft: &LessonDraft,
    ) -> Result<(), BackendError> {
        self.patch(
            &[
                "courses",
                course.as_str(),
                "levels",
                level.as_str(),
                "lessons",
                id.as_str(),
            ],
            draft,
        )
        .await
    }

    async fn delete_lesson(
        &self,
        course: &CourseId,
        level: &LevelId,
        id: &LessonId,
    ) -> Result<(), BackendError> {
        self.delete_record(&[
            "courses",
            course.as_str(),
            "levels",
            level.as_str(),
            "lessons",
            id.as_str(),
        ])
        .await
    }

    async fn replace_documents(
        &self,
        course: &CourseId,
        level: &LevelId,
        lesson: &LessonId,
        documents: &[DocumentRecord],
    ) -> Result<(), BackendError> {
        self.patch(
            &[
                "courses",
                course.as_str(),
                "levels",
                level.as_str(),
                "lessons",
                lesson.as_str(),
            ],
            &serde_json::json!({ "documents": documents }),
        )
        .await
    }

    async fn append_view_entry(&self, entry: &ViewLogEntry) -> Result<(), BackendError> {
        let url = self.docs_url(&["documentViewLogs"]);
        let resp = self
            .http
            .post(&url)
            .header(API_KEY_HEADER, &self.config.api_key)
            .json(entry)
            .send()
            .await?;
        expect_success(resp, &url).await?;
        Ok(())
    }

    async fn query_view_entries(
        &self,
        document: &DocumentId,
        lesson: &LessonId,
    ) -> Result<Vec<ViewLogEntry>, BackendError> {
        let url = self.docs_url(&["documentViewLogs"]);
        let resp = self
            .http
            .get(&url)
            .header(API_KEY_HEADER, &self.config.api_key)
            .query(&[
                ("documentId", document.as_str()),
                ("lessonId", lesson.as_str()),
                ("orderBy", "viewedAt"),
                ("direction", "desc"),
            ])
            .send()
            .await?;
        let status = resp.status();
        if status == StatusCode::BAD_REQUEST {
            // The platform rejects ordered queries without a matching index.
            let message = resp.text().await.unwrap_or_default();
            return Err(BackendError::QueryUnavailable(message));
        }
        let resp = expect_success(resp, &url).await?;
        Ok(resp.json().await?)
    }

    async fn list_users(&self) -> Result<Vec<RawUserRecord>, BackendError> {
        self.list(&["users"]).await
    }

    async fn list_legacy_classes(&self) -> Result<Vec<LegacyClassRecord>, BackendError> {
        self.list(&["classes"]).await
    }
}

#[async_trait]
impl AuthProvider for RestBackend {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, BackendError> {
        let url = self.auth_url("sign-in");
        let resp = self
            .http
            .post(&url)
            .header(API_KEY_HEADER, &self.config.api_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;
        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::BAD_REQUEST {
            return Err(BackendError::InvalidCredentials);
        }
        let resp = expect_success(resp, &url).await?;
        Ok(resp.json().await?)
    }

    async fn sign_out(&self, user: &AuthUser) -> Result<(), BackendError> {
        let url = self.auth_url("sign-out");
        let resp = self
            .http
            .post(&url)
            .header(API_KEY_HEADER, &self.config.api_key)
            .json(&serde_json::json!({ "uid": user.uid }))
            .send()
            .await?;
        expect_success(resp, &url).await?;
        Ok(())
    }
}

#[async_trait]
impl BlobStore for RestBackend {
    async fn upload(
        &self,
        path: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<String, BackendError> {
        let url = self.storage_url();
        let resp = self
            .http
            .post(&url)
            .header(API_KEY_HEADER, &self.config.api_key)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .query(&[("name", path)])
            .body(bytes.to_vec())
            .send()
            .await?;
        let resp = expect_success(resp, &url).await?;
        let uploaded: UploadResponse = resp.json().await?;
        Ok(uploaded.download_url)
    }

    async fn delete(&self, path: &str) -> Result<(), BackendError> {
        let url = self.storage_url();
        let resp = self
            .http
            .delete(&url)
            .header(API_KEY_HEADER, &self.config.api_key)
            .query(&[("name", path)])
            .send()
            .await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        expect_success(resp, &url).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn backend() -> RestBackend {
        RestBackend::new(BackendConfig::new(
            "https://api.example.test/",
            "demo",
            "k",
            "demo-files",
        ))
    }

    #[test]
    fn docs_url_nests_collections() {
        let url = backend().docs_url(&["courses", "c1", "levels"]);
        assert_eq!(
            url,
            "https://api.example.test/v1/projects/demo/collections/courses/c1/levels"
        );
    }

    #[test]
    fn auth_and_storage_urls() {
        assert_eq!(
            backend().auth_url("sign-in"),
            "https://api.example.test/v1/auth/sign-in"
        );
        assert_eq!(
            backend().storage_url(),
            "https://api.example.test/v1/storage/demo-files/objects"
        );
    }
}
