//! Canned directory and legacy-class records for tests

use coursedoc_model::{LegacyClassRecord, RawUserRecord, SessionCount};

/// A directory record with the given role and identifiers
#[must_use]
pub fn user(id: &str, uid: Option<&str>, email: &str, name: &str, role: &str) -> RawUserRecord {
    RawUserRecord {
        id: id.to_string(),
        uid: uid.map(String::from),
        email: Some(email.to_string()),
        name: Some(name.to_string()),
        role: Some(role.to_string()),
        ..RawUserRecord::default()
    }
}

/// A student record carrying a single legacy class membership
#[must_use]
pub fn student_in_class(id: &str, name: &str, class_id: &str) -> RawUserRecord {
    let uid = format!("uid-{id}");
    let email = format!("{id}@example.com");
    RawUserRecord {
        class_id: Some(class_id.to_string()),
        ..user(id, Some(&uid), &email, name, "student")
    }
}

/// The five-role directory from the visibility acceptance checks:
/// roles student, Student, teacher, STUDENT, admin
#[must_use]
pub fn five_role_directory() -> Vec<RawUserRecord> {
    vec![
        user("u1", Some("uid-1"), "s1@example.com", "Sam", "student"),
        user("u2", Some("uid-2"), "s2@example.com", "Sasha", "Student"),
        user("u3", Some("uid-3"), "t1@example.com", "Toni", "teacher"),
        user("u4", Some("uid-4"), "s3@example.com", "Sol", "STUDENT"),
        user("u5", Some("uid-5"), "a1@example.com", "Avery", "admin"),
    ]
}

/// A legacy class record for import tests
#[must_use]
pub fn legacy_class(id: &str, group: &str, name: &str, sessions: i64) -> LegacyClassRecord {
    LegacyClassRecord {
        id: id.to_string(),
        name: Some(name.to_string()),
        class_group_name: Some(group.to_string()),
        number_of_sessions: Some(SessionCount::Int(sessions)),
    }
}
