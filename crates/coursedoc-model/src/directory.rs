//! User-directory records and their normalization
//!
//! The directory is written by another system and has accumulated several
//! legacy field shapes: the role lives under `role`, `userRole`, or
//! `user_type`; class membership is a single identifier, a list of
//! identifiers, or a list of objects carrying an identifier. Normalization
//! runs once at ingestion; nothing downstream branches on field shapes.

use crate::ids::StudentId;
use serde::Deserialize;

/// Normalized user role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// A student, assignable to document access lists
    Student,
    /// A teacher, authorized to operate the console
    Teacher,
    /// An administrator, authorized to operate the console
    Admin,
    /// Missing or unrecognized role
    Unknown,
}

impl Role {
    /// Normalize a raw role string (case-insensitive)
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim).map(str::to_lowercase).as_deref() {
            Some("student") => Role::Student,
            Some("teacher") => Role::Teacher,
            Some("admin") => Role::Admin,
            _ => Role::Unknown,
        }
    }

    /// Whether this role may operate the console
    #[inline]
    #[must_use]
    pub fn is_staff(self) -> bool {
        matches!(self, Role::Teacher | Role::Admin)
    }
}

/// One entry of a legacy class-membership list
///
/// Lists hold either plain identifiers or objects carrying the identifier
/// under `id` or `classId`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MembershipEntry {
    /// Plain class identifier
    Id(String),
    /// Object-shaped entry
    Object {
        /// Identifier under `id`
        #[serde(default)]
        id: Option<String>,
        /// Identifier under `classId`
        #[serde(default, rename = "classId")]
        class_id: Option<String>,
    },
}

impl MembershipEntry {
    fn class_id(&self) -> Option<&str> {
        match self {
            MembershipEntry::Id(id) => Some(id),
            MembershipEntry::Object { id, class_id } => {
                id.as_deref().or(class_id.as_deref())
            }
        }
    }
}

/// A user record as stored in the directory, legacy shapes included
///
/// The record id is not part of the stored fields; the store fills it from
/// the document key after deserialization.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawUserRecord {
    /// Directory-record identifier, filled by the store
    #[serde(default)]
    pub id: String,
    /// Platform auth identifier, if the record carries one
    #[serde(default)]
    pub uid: Option<String>,
    /// Email address
    #[serde(default)]
    pub email: Option<String>,
    /// Display name
    #[serde(default)]
    pub name: Option<String>,
    /// Legacy display-name field
    #[serde(default, rename = "displayName")]
    pub display_name: Option<String>,
    /// Legacy display-name field
    #[serde(default)]
    pub username: Option<String>,
    /// Role field
    #[serde(default)]
    pub role: Option<String>,
    /// Legacy role field
    #[serde(default, rename = "userRole")]
    pub user_role: Option<String>,
    /// Legacy role field
    #[serde(default)]
    pub user_type: Option<String>,
    /// Single class membership
    #[serde(default, rename = "classId")]
    pub class_id: Option<String>,
    /// Legacy single class membership
    #[serde(default, rename = "class")]
    pub class: Option<String>,
    /// Legacy single class membership
    #[serde(default, rename = "currentClassId")]
    pub current_class_id: Option<String>,
    /// Class-membership list
    #[serde(default, rename = "enrolledClasses")]
    pub enrolled_classes: Option<Vec<MembershipEntry>>,
    /// Legacy class-membership list
    #[serde(default)]
    pub classes: Option<Vec<MembershipEntry>>,
    /// Legacy class-membership list
    #[serde(default, rename = "classIds")]
    pub class_ids: Option<Vec<MembershipEntry>>,
    /// Legacy class-membership list
    #[serde(default, rename = "enrolledClassIds")]
    pub enrolled_class_ids: Option<Vec<MembershipEntry>>,
}

impl RawUserRecord {
    /// Normalize this record, resolving every legacy field shape once
    #[must_use]
    pub fn normalize(self) -> DirectoryUser {
        let email = self.email.unwrap_or_default();
        let name = self
            .name
            .or(self.display_name)
            .or(self.username)
            .filter(|n| !n.trim().is_empty())
            .or_else(|| email.split('@').next().filter(|p| !p.is_empty()).map(String::from))
            .unwrap_or_else(|| "Student".to_string());

        let role = Role::parse(
            self.role
                .as_deref()
                .or(self.user_role.as_deref())
                .or(self.user_type.as_deref()),
        );

        // First present list shape wins, then the first present scalar shape
        // is appended; the class filter matches if any membership matches.
        let list = self
            .enrolled_classes
            .or(self.classes)
            .or(self.class_ids)
            .or(self.enrolled_class_ids)
            .unwrap_or_default();
        let mut memberships: Vec<String> = list
            .iter()
            .filter_map(MembershipEntry::class_id)
            .map(String::from)
            .collect();
        if let Some(single) = self.class_id.or(self.class).or(self.current_class_id) {
            if !memberships.contains(&single) {
                memberships.push(single);
            }
        }

        DirectoryUser {
            record_id: self.id,
            uid: self.uid,
            email,
            name,
            role,
            memberships,
        }
    }
}

/// A normalized directory user
#[derive(Debug, Clone)]
pub struct DirectoryUser {
    /// Directory-record identifier
    pub record_id: String,
    /// Platform auth identifier, if present
    pub uid: Option<String>,
    /// Email address (empty if the record has none)
    pub email: String,
    /// Display name after fallback resolution
    pub name: String,
    /// Normalized role
    pub role: Role,
    /// Normalized class memberships, any shape resolved to identifiers
    pub memberships: Vec<String>,
}

impl DirectoryUser {
    /// Usable identifier: the platform uid, else the record id
    #[must_use]
    pub fn identifier(&self) -> Option<&str> {
        self.uid
            .as_deref()
            .filter(|u| !u.is_empty())
            .or_else(|| (!self.record_id.is_empty()).then_some(self.record_id.as_str()))
    }

    /// Whether this user belongs in the assignable-student set
    ///
    /// Requires the student role and a usable identifier.
    #[must_use]
    pub fn is_assignable_student(&self) -> bool {
        self.role == Role::Student && self.identifier().is_some()
    }

    /// The identifier to place on access lists
    #[must_use]
    pub fn student_id(&self) -> Option<StudentId> {
        self.identifier().map(StudentId::from)
    }
}

/// Client-side directory filter: free-text search plus class membership
#[derive(Debug, Clone, Default)]
pub struct StudentFilter {
    search: Option<String>,
    class_id: Option<String>,
}

impl StudentFilter {
    /// Match everything
    #[inline]
    #[must_use]
    pub fn any() -> Self {
        Self::default()
    }

    /// Restrict to users whose name or email contains `term` (case-insensitive)
    #[inline]
    #[must_use]
    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        let term = term.into();
        self.search = (!term.trim().is_empty()).then(|| term.to_lowercase());
        self
    }

    /// Restrict to users with a membership in `class_id`
    #[inline]
    #[must_use]
    pub fn with_class(mut self, class_id: impl Into<String>) -> Self {
        self.class_id = Some(class_id.into());
        self
    }

    /// Whether `user` passes the filter
    #[must_use]
    pub fn matches(&self, user: &DirectoryUser) -> bool {
        if let Some(term) = &self.search {
            let hit = user.name.to_lowercase().contains(term)
                || user.email.to_lowercase().contains(term);
            if !hit {
                return false;
            }
        }
        if let Some(class_id) = &self.class_id {
            if !user.memberships.iter().any(|m| m == class_id) {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn raw(json: serde_json::Value) -> RawUserRecord {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn role_parse_is_case_insensitive() {
        assert_eq!(Role::parse(Some("student")), Role::Student);
        assert_eq!(Role::parse(Some("Student")), Role::Student);
        assert_eq!(Role::parse(Some("STUDENT")), Role::Student);
        assert_eq!(Role::parse(Some("Teacher")), Role::Teacher);
        assert_eq!(Role::parse(Some("admin")), Role::Admin);
        assert_eq!(Role::parse(Some("parent")), Role::Unknown);
        assert_eq!(Role::parse(None), Role::Unknown);
    }

    #[test]
    fn role_falls_back_across_legacy_fields() {
        let user = raw(serde_json::json!({ "userRole": "teacher" })).normalize();
        assert_eq!(user.role, Role::Teacher);
        let user = raw(serde_json::json!({ "user_type": "student" })).normalize();
        assert_eq!(user.role, Role::Student);
        let user = raw(serde_json::json!({ "role": "admin", "user_type": "student" })).normalize();
        assert_eq!(user.role, Role::Admin);
    }

    #[test]
    fn name_falls_back_to_email_local_part() {
        let user = raw(serde_json::json!({ "email": "jo@example.com" })).normalize();
        assert_eq!(user.name, "jo");
        let user = raw(serde_json::json!({ "displayName": "Jo Smith" })).normalize();
        assert_eq!(user.name, "Jo Smith");
        let user = raw(serde_json::json!({})).normalize();
        assert_eq!(user.name, "Student");
    }

    #[test]
    fn identifier_prefers_uid_over_record_id() {
        let mut record = raw(serde_json::json!({ "uid": "u-1" }));
        record.id = "rec-1".to_string();
        assert_eq!(record.normalize().identifier(), Some("u-1"));

        let mut record = raw(serde_json::json!({}));
        record.id = "rec-1".to_string();
        assert_eq!(record.normalize().identifier(), Some("rec-1"));

        let record = raw(serde_json::json!({}));
        assert_eq!(record.normalize().identifier(), None);
    }

    #[test]
    fn assignable_requires_role_and_identifier() {
        let mut record = raw(serde_json::json!({ "role": "student" }));
        record.id = "rec-1".to_string();
        assert!(record.normalize().is_assignable_student());

        // Student role but no identifier at all
        let record = raw(serde_json::json!({ "role": "student" }));
        assert!(!record.normalize().is_assignable_student());

        let mut record = raw(serde_json::json!({ "role": "teacher" }));
        record.id = "rec-1".to_string();
        assert!(!record.normalize().is_assignable_student());
    }

    #[test]
    fn memberships_from_list_of_ids() {
        let user = raw(serde_json::json!({ "enrolledClasses": ["c1", "c2"] })).normalize();
        assert_eq!(user.memberships, vec!["c1", "c2"]);
    }

    #[test]
    fn memberships_from_list_of_objects() {
        let user = raw(serde_json::json!({
            "classes": [{ "id": "c1" }, { "classId": "c2" }, { "name": "no id" }]
        }))
        .normalize();
        assert_eq!(user.memberships, vec!["c1", "c2"]);
    }

    #[test]
    fn memberships_from_single_scalar_fields() {
        let user = raw(serde_json::json!({ "classId": "c9" })).normalize();
        assert_eq!(user.memberships, vec!["c9"]);
        let user = raw(serde_json::json!({ "class": "c9" })).normalize();
        assert_eq!(user.memberships, vec!["c9"]);
        let user = raw(serde_json::json!({ "currentClassId": "c9" })).normalize();
        assert_eq!(user.memberships, vec!["c9"]);
    }

    #[test]
    fn scalar_membership_appends_to_list_without_duplicating() {
        let user = raw(serde_json::json!({
            "classIds": ["c1"],
            "classId": "c1"
        }))
        .normalize();
        assert_eq!(user.memberships, vec!["c1"]);

        let user = raw(serde_json::json!({
            "classIds": ["c1"],
            "classId": "c2"
        }))
        .normalize();
        assert_eq!(user.memberships, vec!["c1", "c2"]);
    }

    #[test]
    fn filter_matches_name_and_email_case_insensitively() {
        let user = raw(serde_json::json!({
            "name": "Alice Jones",
            "email": "alice@example.com",
            "role": "student"
        }))
        .normalize();

        assert!(StudentFilter::any().matches(&user));
        assert!(StudentFilter::any().with_search("ALICE").matches(&user));
        assert!(StudentFilter::any().with_search("example.com").matches(&user));
        assert!(!StudentFilter::any().with_search("bob").matches(&user));
    }

    #[test]
    fn filter_by_class_checks_every_shape() {
        let by_list = raw(serde_json::json!({ "enrolledClasses": [{ "id": "c1" }] })).normalize();
        let by_scalar = raw(serde_json::json!({ "class": "c1" })).normalize();
        let other = raw(serde_json::json!({ "classId": "c2" })).normalize();

        let filter = StudentFilter::any().with_class("c1");
        assert!(filter.matches(&by_list));
        assert!(filter.matches(&by_scalar));
        assert!(!filter.matches(&other));
    }

    #[test]
    fn blank_search_matches_everything() {
        let user = raw(serde_json::json!({ "name": "Alice" })).normalize();
        assert!(StudentFilter::any().with_search("   ").matches(&user));
    }
}
