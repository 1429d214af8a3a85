//! coursedoc domain model
//!
//! Types shared across the console:
//!
//! - [`Course`], [`Level`], [`Lesson`]: the three-tier content hierarchy
//! - [`DocumentRecord`]: an uploaded file embedded in its lesson
//! - [`AccessPolicy`]: the advisory per-student access list
//! - [`ViewEvent`] / [`ViewLogEntry`]: per-document view history
//! - [`RawUserRecord`] / [`DirectoryUser`]: the user directory and its
//!   legacy-shape normalization
//!
//! This crate performs no I/O; every backend interaction lives behind the
//! traits in `coursedoc-backend`.

#![warn(unreachable_pub)]

mod directory;
mod document;
mod hierarchy;
mod ids;
mod legacy;

pub use directory::{DirectoryUser, MembershipEntry, RawUserRecord, Role, StudentFilter};
pub use legacy::{LegacyClassRecord, SessionCount, UNNAMED_GROUP};
pub use document::{merge_view_logs, AccessPolicy, DocumentRecord, ViewEvent, ViewLogEntry};
pub use hierarchy::{
    compare_lesson_numbers, sort_lessons, Course, CourseDraft, Lesson, LessonDraft, Level,
    LevelDraft, ModelError,
};
pub use ids::{CourseId, DocumentId, LessonId, LevelId, StudentId};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
