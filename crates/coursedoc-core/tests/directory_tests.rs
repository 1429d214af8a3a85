use coursedoc_core::Console;
use coursedoc_model::{RawUserRecord, StudentFilter};
use coursedoc_test_utils::{fixtures, MemoryBackend};
use std::sync::Arc;

fn console(backend: &Arc<MemoryBackend>) -> Console {
    Console::new(backend.clone(), backend.clone(), backend.clone())
}

#[tokio::test]
async fn role_filter_is_case_insensitive() {
    let backend = Arc::new(MemoryBackend::new());
    for user in fixtures::five_role_directory() {
        backend.add_user(user);
    }

    let students = console(&backend).directory().load_students().await.unwrap();
    // Roles student, Student, STUDENT match; teacher and admin do not.
    assert_eq!(students.len(), 3);
    let names: Vec<&str> = students.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Sam", "Sasha", "Sol"]);
}

#[tokio::test]
async fn students_without_identifier_are_excluded() {
    let backend = Arc::new(MemoryBackend::new());
    backend.add_user(fixtures::user("u1", Some("uid-1"), "a@example.com", "A", "student"));
    backend.add_user(RawUserRecord {
        email: Some("b@example.com".to_string()),
        name: Some("B".to_string()),
        role: Some("student".to_string()),
        ..RawUserRecord::default()
    });

    let students = console(&backend).directory().load_students().await.unwrap();
    assert_eq!(students.len(), 1);
    assert_eq!(students[0].name, "A");
}

#[tokio::test]
async fn search_matches_name_or_email() {
    let backend = Arc::new(MemoryBackend::new());
    backend.add_user(fixtures::user("u1", Some("uid-1"), "alice@example.com", "Alice", "student"));
    backend.add_user(fixtures::user("u2", Some("uid-2"), "bob@school.test", "Bob", "student"));

    let console = console(&backend);
    let directory = console.directory();

    let hits = directory
        .search_students(&StudentFilter::any().with_search("ALICE"))
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].name, "Alice");

    let hits = directory
        .search_students(&StudentFilter::any().with_search("school.test"))
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].name, "Bob");
}

#[tokio::test]
async fn class_filter_matches_across_membership_shapes() {
    let backend = Arc::new(MemoryBackend::new());
    // Scalar shape
    backend.add_user(fixtures::student_in_class("u1", "Ana", "c-math"));
    // List-of-ids shape
    backend.add_user(RawUserRecord {
        enrolled_classes: Some(vec![coursedoc_model::MembershipEntry::Id(
            "c-math".to_string(),
        )]),
        ..fixtures::user("u2", Some("uid-u2"), "li@example.com", "Li", "student")
    });
    // Different class
    backend.add_user(fixtures::student_in_class("u3", "Noor", "c-physics"));

    let hits = console(&backend)
        .directory()
        .search_students(&StudentFilter::any().with_class("c-math"))
        .await
        .unwrap();
    assert_eq!(hits.len(), 2);
}

#[tokio::test]
async fn combined_search_and_class_filter() {
    let backend = Arc::new(MemoryBackend::new());
    backend.add_user(fixtures::student_in_class("u1", "Ana", "c-math"));
    backend.add_user(fixtures::student_in_class("u2", "Anais", "c-physics"));

    let hits = console(&backend)
        .directory()
        .search_students(&StudentFilter::any().with_search("ana").with_class("c-math"))
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].name, "Ana");
}
