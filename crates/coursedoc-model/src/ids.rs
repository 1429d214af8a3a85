//! Identifier newtypes
//!
//! Hierarchy records carry backend-assigned string identifiers; documents use
//! content-derived identifiers so concurrent uploads cannot collide.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

macro_rules! string_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap a backend-assigned identifier
            #[inline]
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the identifier as a string slice
            #[inline]
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }
    };
}

string_id! {
    /// Identifier of a course record
    CourseId
}

string_id! {
    /// Identifier of a level record, scoped to a course
    LevelId
}

string_id! {
    /// Identifier of a lesson record, scoped to a level
    LessonId
}

string_id! {
    /// Identifier of a student as used in access lists
    ///
    /// The directory may expose either a platform `uid` or a directory-record
    /// id for the same person; both are acceptable members of an access list.
    StudentId
}

/// Content-derived document identifier
///
/// Derived from the storage path and the file bytes (Blake3, first 16 bytes
/// hex-rendered), so the identifier is deterministic and collision-resistant
/// under concurrent uploads. Documents are embedded in their lesson record and
/// are not independently addressable in the backend.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    /// Derive the identifier for a document at `storage_path` with `content`
    #[must_use]
    pub fn derive(storage_path: &str, content: &[u8]) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(storage_path.as_bytes());
        hasher.update(&[0]);
        hasher.update(content);
        let hash = hasher.finalize();
        Self(hex::encode(&hash.as_bytes()[..16]))
    }

    /// Wrap an identifier read back from the backend
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the identifier as a string slice
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for DocumentId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn course_id_roundtrip() {
        let id = CourseId::new("abc123");
        assert_eq!(id.as_str(), "abc123");
        assert_eq!(id.to_string(), "abc123");
    }

    #[test]
    fn document_id_is_deterministic() {
        let a = DocumentId::derive("courses/c/l/s/1_notes.pdf", b"content");
        let b = DocumentId::derive("courses/c/l/s/1_notes.pdf", b"content");
        assert_eq!(a, b);
    }

    #[test]
    fn document_id_differs_by_path_and_content() {
        let base = DocumentId::derive("courses/c/l/s/1_notes.pdf", b"content");
        assert_ne!(base, DocumentId::derive("courses/c/l/s/2_notes.pdf", b"content"));
        assert_ne!(base, DocumentId::derive("courses/c/l/s/1_notes.pdf", b"other"));
    }

    #[test]
    fn document_id_is_hex_of_fixed_width() {
        let id = DocumentId::derive("p", b"c");
        assert_eq!(id.as_str().len(), 32);
        assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn student_id_serde_is_transparent() {
        let id = StudentId::new("stu-1");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"stu-1\"");
        let back: StudentId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
