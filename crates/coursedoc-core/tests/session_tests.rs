use coursedoc_core::{Console, ConsoleError};
use coursedoc_model::Role;
use coursedoc_test_utils::{fixtures, MemoryBackend};
use std::sync::Arc;

fn console(backend: &Arc<MemoryBackend>) -> Console {
    Console::new(backend.clone(), backend.clone(), backend.clone())
}

#[tokio::test]
async fn teacher_signs_in_and_is_authorized() {
    let backend = Arc::new(MemoryBackend::new());
    backend.add_account("t@example.com", "pw", "uid-t", Some("Toni"));
    backend.add_user(fixtures::user("t@example.com", Some("uid-t"), "t@example.com", "Toni", "Teacher"));

    let user = console(&backend)
        .session()
        .sign_in("t@example.com", "pw")
        .await
        .unwrap();
    assert_eq!(user.uid, "uid-t");
    assert_eq!(user.role, Role::Teacher);
    assert_eq!(user.display_name, "Toni");
    assert!(backend.signed_out_uids().is_empty());
}

#[tokio::test]
async fn admin_role_is_authorized_too() {
    let backend = Arc::new(MemoryBackend::new());
    backend.add_account("a@example.com", "pw", "uid-a", None);
    backend.add_user(fixtures::user("a@example.com", Some("uid-a"), "a@example.com", "Avery", "admin"));

    let user = console(&backend)
        .session()
        .sign_in("a@example.com", "pw")
        .await
        .unwrap();
    assert_eq!(user.role, Role::Admin);
}

#[tokio::test]
async fn wrong_password_is_invalid_credentials() {
    let backend = Arc::new(MemoryBackend::new());
    backend.add_account("t@example.com", "pw", "uid-t", None);

    let result = console(&backend).session().sign_in("t@example.com", "nope").await;
    assert!(matches!(result, Err(ConsoleError::InvalidCredentials)));
}

#[tokio::test]
async fn student_role_is_denied_and_signed_out() {
    let backend = Arc::new(MemoryBackend::new());
    backend.add_account("s@example.com", "pw", "uid-s", None);
    backend.add_user(fixtures::user("s@example.com", Some("uid-s"), "s@example.com", "Sam", "student"));

    let result = console(&backend).session().sign_in("s@example.com", "pw").await;
    assert!(matches!(result, Err(ConsoleError::NotAuthorized)));
    assert_eq!(backend.signed_out_uids(), vec!["uid-s"]);
}

#[tokio::test]
async fn missing_directory_record_is_denied_and_signed_out() {
    let backend = Arc::new(MemoryBackend::new());
    backend.add_account("ghost@example.com", "pw", "uid-g", None);

    let result = console(&backend)
        .session()
        .sign_in("ghost@example.com", "pw")
        .await;
    assert!(matches!(result, Err(ConsoleError::UnknownUser(_))));
    assert_eq!(backend.signed_out_uids(), vec!["uid-g"]);
}

#[tokio::test]
async fn directory_record_found_by_uid_when_email_differs() {
    let backend = Arc::new(MemoryBackend::new());
    backend.add_account("alias@example.com", "pw", "uid-t", None);
    // Directory keeps an older email, but the uid matches.
    backend.add_user(fixtures::user("rec-t", Some("uid-t"), "old@example.com", "Toni", "teacher"));

    let user = console(&backend)
        .session()
        .sign_in("alias@example.com", "pw")
        .await
        .unwrap();
    assert_eq!(user.role, Role::Teacher);
}

#[tokio::test]
async fn legacy_role_fields_authorize() {
    let backend = Arc::new(MemoryBackend::new());
    backend.add_account("t@example.com", "pw", "uid-t", None);
    let mut record = fixtures::user("t@example.com", Some("uid-t"), "t@example.com", "Toni", "x");
    record.role = None;
    record.user_role = Some("teacher".to_string());
    backend.add_user(record);

    let user = console(&backend)
        .session()
        .sign_in("t@example.com", "pw")
        .await
        .unwrap();
    assert_eq!(user.role, Role::Teacher);
}

#[tokio::test]
async fn sign_out_reaches_the_provider() {
    let backend = Arc::new(MemoryBackend::new());
    backend.add_account("t@example.com", "pw", "uid-t", None);
    backend.add_user(fixtures::user("t@example.com", Some("uid-t"), "t@example.com", "Toni", "teacher"));

    let console = console(&backend);
    let user = console.session().sign_in("t@example.com", "pw").await.unwrap();
    console.session().sign_out(&user).await.unwrap();
    assert_eq!(backend.signed_out_uids(), vec!["uid-t"]);
}
