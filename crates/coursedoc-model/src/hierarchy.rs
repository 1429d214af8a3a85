//! Content hierarchy records
//!
//! Three-tier containment: a Course owns Levels, a Level owns Lessons, a
//! Lesson owns embedded documents. The backend has no referential integrity,
//! so containment is a contract maintained by the hierarchy service, not by
//! the store.

use crate::document::DocumentRecord;
use crate::ids::{CourseId, LessonId, LevelId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Validation errors for hierarchy drafts
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// Display name is empty or whitespace
    #[error("{entity} name must not be empty")]
    EmptyName {
        /// Entity kind being validated
        entity: &'static str,
    },
}

/// A course, the top of the hierarchy
///
/// `levels` is populated when the full tree is materialized; records read
/// straight from the store carry an empty list. Levels keep collection order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    /// Backend-assigned identifier
    pub id: CourseId,
    /// Display name
    pub name: String,
    /// Free-text description
    #[serde(default)]
    pub description: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Levels under this course, in collection order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub levels: Vec<Level>,
}

/// A level, scoped to exactly one course
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Level {
    /// Backend-assigned identifier
    pub id: LevelId,
    /// Display name
    pub name: String,
    /// Free-text description
    #[serde(default)]
    pub description: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Lessons under this level, sorted by lesson number on materialization
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lessons: Vec<Lesson>,
}

/// A lesson, scoped to exactly one level
///
/// Documents are embedded in the lesson record, not independently addressable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    /// Backend-assigned identifier
    pub id: LessonId,
    /// Display name
    pub name: String,
    /// Free-text description
    #[serde(default)]
    pub description: String,
    /// Ordering label, conventionally numeric but not constrained to be
    #[serde(default)]
    pub lesson_number: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Embedded document records
    #[serde(default)]
    pub documents: Vec<DocumentRecord>,
}

/// Draft for creating or updating a course
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseDraft {
    /// Display name
    pub name: String,
    /// Free-text description
    #[serde(default)]
    pub description: String,
}

impl CourseDraft {
    /// Create a new draft
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }

    /// Validate the draft
    ///
    /// # Errors
    /// Returns [`ModelError::EmptyName`] if the name is empty or whitespace.
    pub fn validate(&self) -> Result<(), ModelError> {
        validate_name(&self.name, "course")
    }
}

/// Draft for creating or updating a level
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelDraft {
    /// Display name
    pub name: String,
    /// Free-text description
    #[serde(default)]
    pub description: String,
}

impl LevelDraft {
    /// Create a new draft
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }

    /// Validate the draft
    ///
    /// # Errors
    /// Returns [`ModelError::EmptyName`] if the name is empty or whitespace.
    pub fn validate(&self) -> Result<(), ModelError> {
        validate_name(&self.name, "level")
    }
}

/// Draft for creating or updating a lesson
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonDraft {
    /// Display name
    pub name: String,
    /// Free-text description
    #[serde(default)]
    pub description: String,
    /// Ordering label
    #[serde(default)]
    pub lesson_number: String,
}

impl LessonDraft {
    /// Create a new draft
    #[inline]
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        lesson_number: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            lesson_number: lesson_number.into(),
        }
    }

    /// Validate the draft
    ///
    /// # Errors
    /// Returns [`ModelError::EmptyName`] if the name is empty or whitespace.
    pub fn validate(&self) -> Result<(), ModelError> {
        validate_name(&self.name, "lesson")
    }
}

fn validate_name(name: &str, entity: &'static str) -> Result<(), ModelError> {
    if name.trim().is_empty() {
        return Err(ModelError::EmptyName { entity });
    }
    Ok(())
}

/// Sort key for a lesson-number label
///
/// Labels that parse fully as integers order numerically and before any
/// non-numeric label; non-numeric labels order lexicographically. A missing
/// or empty label counts as numeric zero.
#[derive(Debug, Clone, PartialEq, Eq)]
enum NumberKey {
    Numeric(i64),
    Text(String),
}

fn number_key(label: &str) -> NumberKey {
    if label.is_empty() {
        return NumberKey::Numeric(0);
    }
    match label.parse::<i64>() {
        Ok(n) => NumberKey::Numeric(n),
        Err(_) => NumberKey::Text(label.to_string()),
    }
}

/// Compare two lesson-number labels
///
/// This is the single ordering used at every site that lists lessons; it is a
/// display-time derived order, never stored.
#[must_use]
pub fn compare_lesson_numbers(a: &str, b: &str) -> Ordering {
    match (number_key(a), number_key(b)) {
        (NumberKey::Numeric(x), NumberKey::Numeric(y)) => x.cmp(&y),
        (NumberKey::Numeric(_), NumberKey::Text(_)) => Ordering::Less,
        (NumberKey::Text(_), NumberKey::Numeric(_)) => Ordering::Greater,
        (NumberKey::Text(x), NumberKey::Text(y)) => x.cmp(&y),
    }
}

/// Sort lessons in place by their lesson-number label
pub fn sort_lessons(lessons: &mut [Lesson]) {
    lessons.sort_by(|a, b| compare_lesson_numbers(&a.lesson_number, &b.lesson_number));
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn lesson(number: &str) -> Lesson {
        Lesson {
            id: LessonId::new(format!("lesson-{number}")),
            name: format!("Lesson {number}"),
            description: String::new(),
            lesson_number: number.to_string(),
            created_at: Utc::now(),
            documents: Vec::new(),
        }
    }

    #[test]
    fn draft_rejects_empty_name() {
        assert!(CourseDraft::new("", "d").validate().is_err());
        assert!(LevelDraft::new("   ", "d").validate().is_err());
        assert!(LessonDraft::new("\t", "d", "1").validate().is_err());
    }

    #[test]
    fn draft_accepts_nonempty_name() {
        assert!(CourseDraft::new("Math 101", "").validate().is_ok());
        assert!(LessonDraft::new("Intro", "", "").validate().is_ok());
    }

    #[test]
    fn numeric_labels_sort_numerically() {
        let mut lessons = vec![lesson("2"), lesson("1"), lesson("10"), lesson("a")];
        sort_lessons(&mut lessons);
        let order: Vec<&str> = lessons.iter().map(|l| l.lesson_number.as_str()).collect();
        assert_eq!(order, vec!["1", "2", "10", "a"]);
    }

    #[test]
    fn empty_label_counts_as_zero() {
        assert_eq!(compare_lesson_numbers("", "1"), Ordering::Less);
        assert_eq!(compare_lesson_numbers("", "-1"), Ordering::Greater);
        assert_eq!(compare_lesson_numbers("", "a"), Ordering::Less);
    }

    #[test]
    fn partial_numeric_labels_are_text() {
        // "10a" does not fully parse, so it orders after any numeric label
        assert_eq!(compare_lesson_numbers("10a", "99"), Ordering::Greater);
        assert_eq!(compare_lesson_numbers("10a", "10b"), Ordering::Less);
    }

    #[test]
    fn course_wire_shape_is_camel_case() {
        let course = Course {
            id: CourseId::new("c1"),
            name: "Math".to_string(),
            description: "desc".to_string(),
            created_at: "2024-03-01T00:00:00Z".parse().unwrap(),
            levels: Vec::new(),
        };
        let json = serde_json::to_value(&course).unwrap();
        assert_eq!(json["createdAt"], "2024-03-01T00:00:00Z");
        assert!(json.get("levels").is_none());
    }

    #[test]
    fn lesson_deserializes_with_missing_optional_fields() {
        let json = serde_json::json!({
            "id": "s1",
            "name": "Intro",
            "createdAt": "2024-03-01T00:00:00Z"
        });
        let lesson: Lesson = serde_json::from_value(json).unwrap();
        assert_eq!(lesson.lesson_number, "");
        assert!(lesson.documents.is_empty());
    }

    proptest! {
        #[test]
        fn sorting_is_idempotent(labels in proptest::collection::vec("[a-z0-9]{0,4}", 0..16)) {
            let mut lessons: Vec<Lesson> = labels.iter().map(|l| lesson(l)).collect();
            sort_lessons(&mut lessons);
            let first: Vec<String> = lessons.iter().map(|l| l.lesson_number.clone()).collect();
            sort_lessons(&mut lessons);
            let second: Vec<String> = lessons.iter().map(|l| l.lesson_number.clone()).collect();
            prop_assert_eq!(first, second);
        }

        #[test]
        fn numeric_labels_always_precede_text(n in 0i64..10_000, t in "[a-z][a-z0-9]{0,3}") {
            prop_assert_eq!(compare_lesson_numbers(&n.to_string(), &t), Ordering::Less);
        }
    }
}
