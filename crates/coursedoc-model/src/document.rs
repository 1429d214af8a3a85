//! Document records, access policy, and view events
//!
//! A document is a single uploaded file attached to a lesson, carrying its
//! own access list and view log.

use crate::ids::{CourseId, DocumentId, LessonId, LevelId, StudentId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A single uploaded file attached to a lesson
///
/// Stored as an element of the lesson's embedded `documents` array.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRecord {
    /// Content-derived identifier
    pub id: DocumentId,
    /// Original file name
    pub name: String,
    /// MIME type reported at upload
    #[serde(rename = "type", default)]
    pub content_type: String,
    /// Size in bytes
    pub size: u64,
    /// Long-lived download URL issued by the object store
    pub url: String,
    /// Object-store path, used for deletion
    #[serde(rename = "path")]
    pub storage_path: String,
    /// Upload timestamp
    pub uploaded_at: DateTime<Utc>,
    /// Per-student access list
    #[serde(rename = "unlockedFor", default)]
    pub access: AccessPolicy,
    /// Embedded per-document view log, for quick display
    #[serde(rename = "viewLogs", default)]
    pub view_log: Vec<ViewEvent>,
}

impl DocumentRecord {
    /// Whether `student` may see this document, per the access policy
    #[inline]
    #[must_use]
    pub fn is_visible_to(&self, student: &StudentId) -> bool {
        self.access.is_visible(student)
    }
}

/// Per-document access list
///
/// # Contract
///
/// This policy is advisory metadata published for the consuming student
/// application, which performs the actual gating:
///
/// - Empty list ⇒ locked: visible to no student.
/// - Non-empty list ⇒ visible exactly to the listed identifiers, which may be
///   platform uids or directory-record ids.
/// - There is no "visible to all" state.
/// - [`AccessPolicy::grant_exactly`] replaces the whole list; last writer
///   wins, there are no merge semantics.
/// - The console itself does not gate its own download URLs on this policy;
///   an operator always sees live links (admin preview). Consumers must not
///   treat possession of a URL as authorization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessPolicy {
    unlocked_for: Vec<StudentId>,
}

impl AccessPolicy {
    /// The locked policy: visible to nobody
    #[inline]
    #[must_use]
    pub fn locked() -> Self {
        Self::default()
    }

    /// Whether `student` is on the access list
    #[inline]
    #[must_use]
    pub fn is_visible(&self, student: &StudentId) -> bool {
        self.unlocked_for.contains(student)
    }

    /// Replace the access list with exactly `students`
    ///
    /// Duplicates are dropped, first occurrence kept. Applying the same set
    /// twice yields the same list.
    pub fn grant_exactly(&mut self, students: impl IntoIterator<Item = StudentId>) {
        let mut seen = HashSet::new();
        self.unlocked_for = students
            .into_iter()
            .filter(|s| seen.insert(s.clone()))
            .collect();
    }

    /// The students currently granted access
    #[inline]
    #[must_use]
    pub fn granted(&self) -> &[StudentId] {
        &self.unlocked_for
    }

    /// Whether the document is locked for every student
    #[inline]
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.unlocked_for.is_empty()
    }
}

/// A record of one user viewing one document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewEvent {
    /// Platform identifier of the viewer
    pub user_id: String,
    /// Viewer email
    pub user_email: String,
    /// Viewer display name
    pub user_name: String,
    /// When the view occurred
    pub viewed_at: DateTime<Utc>,
}

impl ViewEvent {
    /// De-duplication key: viewer identifier plus timestamp
    #[inline]
    #[must_use]
    pub fn dedup_key(&self) -> (&str, DateTime<Utc>) {
        (&self.user_id, self.viewed_at)
    }
}

/// Flat event-store record of a view
///
/// Carries enough denormalized context that the store is queryable without
/// walking the hierarchy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewLogEntry {
    /// The view itself
    #[serde(flatten)]
    pub event: ViewEvent,
    /// Document viewed
    pub document_id: DocumentId,
    /// Document display name
    pub document_name: String,
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

/// Merge view events from the flat store and the embedded log
///
/// The two sources may overlap: every view is written to both. Events with
/// the same (viewer identifier, timestamp) key collapse to one entry, first
/// occurrence kept, and the result is ordered by timestamp descending.
#[must_use]
pub fn merge_view_logs(flat: Vec<ViewEvent>, embedded: Vec<ViewEvent>) -> Vec<ViewEvent> {
    let mut seen = HashSet::new();
    let mut merged: Vec<ViewEvent> = flat
        .into_iter()
        .chain(embedded)
        .filter(|e| seen.insert((e.user_id.clone(), e.viewed_at)))
        .collect();
    merged.sort_by(|a, b| b.viewed_at.cmp(&a.viewed_at));
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn event(user: &str, at: &str) -> ViewEvent {
        ViewEvent {
            user_id: user.to_string(),
            user_email: format!("{user}@example.com"),
            user_name: user.to_string(),
            viewed_at: at.parse().unwrap(),
        }
    }

    #[test]
    fn locked_policy_is_visible_to_nobody() {
        let policy = AccessPolicy::locked();
        assert!(policy.is_locked());
        assert!(!policy.is_visible(&StudentId::new("any")));
    }

    #[test]
    fn grant_exactly_replaces_whole_list() {
        let mut policy = AccessPolicy::locked();
        policy.grant_exactly([StudentId::new("a"), StudentId::new("b")]);
        assert!(policy.is_visible(&StudentId::new("a")));

        policy.grant_exactly([StudentId::new("c")]);
        assert!(!policy.is_visible(&StudentId::new("a")));
        assert!(policy.is_visible(&StudentId::new("c")));
    }

    #[test]
    fn grant_exactly_is_idempotent() {
        let ids = [StudentId::new("a"), StudentId::new("b")];
        let mut policy = AccessPolicy::locked();
        policy.grant_exactly(ids.clone());
        let first = policy.granted().to_vec();
        policy.grant_exactly(ids);
        assert_eq!(policy.granted(), first.as_slice());
    }

    #[test]
    fn grant_exactly_drops_duplicates() {
        let mut policy = AccessPolicy::locked();
        policy.grant_exactly([StudentId::new("a"), StudentId::new("a"), StudentId::new("b")]);
        assert_eq!(policy.granted().len(), 2);
    }

    #[test]
    fn policy_wire_shape_is_a_plain_array() {
        let mut policy = AccessPolicy::locked();
        policy.grant_exactly([StudentId::new("a")]);
        assert_eq!(serde_json::to_string(&policy).unwrap(), "[\"a\"]");
    }

    #[test]
    fn merge_collapses_cross_source_duplicates() {
        let flat = vec![event("u1", "2024-03-01T10:00:00Z")];
        let embedded = vec![
            event("u1", "2024-03-01T10:00:00Z"),
            event("u2", "2024-03-01T09:00:00Z"),
        ];
        let merged = merge_view_logs(flat, embedded);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].user_id, "u1");
        assert_eq!(merged[1].user_id, "u2");
    }

    #[test]
    fn merge_keeps_same_user_at_different_times() {
        let flat = vec![event("u1", "2024-03-01T10:00:00Z")];
        let embedded = vec![event("u1", "2024-03-01T11:00:00Z")];
        let merged = merge_view_logs(flat, embedded);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].viewed_at, "2024-03-01T11:00:00Z".parse::<DateTime<Utc>>().unwrap());
    }

    #[test]
    fn document_record_wire_shape() {
        let doc = DocumentRecord {
            id: DocumentId::new("deadbeef"),
            name: "notes.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            size: 1024,
            url: "https://example.test/notes.pdf".to_string(),
            storage_path: "courses/c/l/s/1_notes.pdf".to_string(),
            uploaded_at: "2024-03-01T00:00:00Z".parse().unwrap(),
            access: AccessPolicy::locked(),
            view_log: Vec::new(),
        };
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["type"], "application/pdf");
        assert_eq!(json["path"], "courses/c/l/s/1_notes.pdf");
        assert_eq!(json["unlockedFor"], serde_json::json!([]));
        assert_eq!(json["viewLogs"], serde_json::json!([]));
    }

    #[test]
    fn view_log_entry_flattens_event_fields() {
        let entry = ViewLogEntry {
            event: event("u1", "2024-03-01T10:00:00Z"),
            document_id: DocumentId::new("d"),
            document_name: "notes.pdf".to_string(),
            course_id: CourseId::new("c"),
            course_name: "Math".to_string(),
            level_id: LevelId::new("l"),
            level_name: "Beginner".to_string(),
            lesson_id: LessonId::new("s"),
            lesson_name: "Intro".to_string(),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["userId"], "u1");
        assert_eq!(json["documentId"], "d");
        assert_eq!(json["lessonName"], "Intro");
    }

    proptest! {
        #[test]
        fn empty_policy_never_visible(id in "[a-zA-Z0-9]{1,12}") {
            let policy = AccessPolicy::locked();
            prop_assert!(!policy.is_visible(&StudentId::new(id)));
        }

        #[test]
        fn merge_never_emits_duplicate_keys(
            users in proptest::collection::vec("[a-c]", 0..8),
        ) {
            let base: DateTime<Utc> = "2024-03-01T00:00:00Z".parse().unwrap();
            let events: Vec<ViewEvent> = users
                .iter()
                .enumerate()
                .map(|(i, u)| ViewEvent {
                    user_id: u.clone(),
                    user_email: format!("{u}@example.com"),
                    user_name: u.clone(),
                    viewed_at: base + chrono::Duration::seconds((i % 3) as i64),
                })
                .collect();
            let merged = merge_view_logs(events.clone(), events);
            let mut keys: Vec<_> = merged
                .iter()
                .map(|e| (e.user_id.clone(), e.viewed_at))
                .collect();
            let before = keys.len();
            keys.sort();
            keys.dedup();
            prop_assert_eq!(before, keys.len());
        }
    }
}
