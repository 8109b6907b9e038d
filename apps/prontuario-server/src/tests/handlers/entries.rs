//! Entry handler tests: create, list, get, soft delete.

use chrono::Duration;
use prontuario_storage::{EntryId, Role, Specialty, Store, StudentId};
use uuid::Uuid;

use crate::handlers::entries::{self, CreateEntryRequest};
use crate::lifecycle::MAX_DELETE_REASON_LEN;
use crate::tests::common::*;

fn request(student_id: Option<String>, description: &str, notes: Option<&str>) -> CreateEntryRequest {
    CreateEntryRequest {
        student_id,
        description: description.to_string(),
        notes: notes.map(str::to_string),
    }
}

#[tokio::test]
async fn test_create_entry_records_author_and_clock() {
    let ts = create_test_server().await;
    let student = create_student(&ts, "Maria Clara").await;
    let (author_id, key) =
        login_as(&ts, "p@example.com", Role::HealthProf, Some(Specialty::Psychologist)).await;

    ts.clock.advance(Duration::seconds(3));
    let entry = entries::create_entry(
        &ts.server,
        &key,
        request(Some(student.to_string()), "  first session  ", Some("calm")),
    )
    .await
    .unwrap();

    assert_eq!(entry.description, "first session");
    assert_eq!(entry.notes.as_deref(), Some("calm"));
    assert_eq!(entry.author_id, author_id.to_string());
    assert_eq!(entry.author_specialty, Some("psychologist"));
    assert_eq!(entry.student_id, student.to_string());
    assert_eq!(entry.created_at, t0() + Duration::seconds(3));
    assert!(!entry.deleted);
}

#[tokio::test]
async fn test_create_entry_validation() {
    let ts = create_test_server().await;
    let student = Some(create_student(&ts, "Maria Clara").await.to_string());
    let (_, key) =
        login_as(&ts, "p@example.com", Role::HealthProf, Some(Specialty::Psychologist)).await;

    let cases = [
        request(None, "no student", None),
        request(Some("   ".to_string()), "blank student", None),
        request(Some("not-a-uuid".to_string()), "bad student id", None),
        request(student.clone(), "   ", None),
        request(student.clone(), &"a".repeat(501), None),
        request(student.clone(), "ok", Some(&"n".repeat(501))),
    ];
    for case in cases {
        assert_bad_request(entries::create_entry(&ts.server, &key, case).await);
    }

    assert!(entries::list_entries(&ts.server, &key, None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_create_entry_unknown_student() {
    let ts = create_test_server().await;
    let (_, key) =
        login_as(&ts, "p@example.com", Role::HealthProf, Some(Specialty::Psychologist)).await;

    let ghost = StudentId(Uuid::now_v7());
    assert_not_found(
        entries::create_entry(&ts.server, &key, request(Some(ghost.to_string()), "x", None)).await,
    );
}

#[tokio::test]
async fn test_specialty_fencing_scenario() {
    let ts = create_test_server().await;
    let student = create_student(&ts, "Maria Clara").await;
    let (_, physio) =
        login_as(&ts, "f@example.com", Role::HealthProf, Some(Specialty::Physiotherapist)).await;
    let (_, psych) =
        login_as(&ts, "p@example.com", Role::HealthProf, Some(Specialty::Psychologist)).await;
    let (_, admin) = login_as(&ts, "admin@example.com", Role::Admin, None).await;

    let entry = write_entry(&ts, &physio, &student, "knee rehab").await;

    assert_forbidden(entries::get_entry(&ts.server, &psych, entry.id).await);
    let seen = entries::get_entry(&ts.server, &admin, entry.id).await.unwrap();
    assert_eq!(seen.description, "knee rehab");
}

#[tokio::test]
async fn test_soft_delete_is_one_way() {
    let ts = create_test_server().await;
    let student = create_student(&ts, "Maria Clara").await;
    let (author_id, key) =
        login_as(&ts, "p@example.com", Role::HealthProf, Some(Specialty::Psychologist)).await;
    let (_, colleague) =
        login_as(&ts, "p2@example.com", Role::HealthProf, Some(Specialty::Psychologist)).await;
    let entry = write_entry(&ts, &key, &student, "session one").await;

    ts.clock.advance(Duration::seconds(2));
    let deleted = entries::delete_entry(&ts.server, &key, entry.id, Some(" correction "))
        .await
        .unwrap();
    assert!(deleted.deleted);
    assert_eq!(deleted.delete_reason.as_deref(), Some("correction"));
    assert_eq!(deleted.deleted_by, Some(author_id.to_string()));
    assert_eq!(deleted.deleted_at, Some(t0() + Duration::seconds(2)));

    assert_not_found(entries::get_entry(&ts.server, &key, entry.id).await);
    assert_conflict(entries::delete_entry(&ts.server, &key, entry.id, Some("correction")).await);
    // The state check comes before reason validation.
    assert_conflict(entries::delete_entry(&ts.server, &colleague, entry.id, None).await);

    // The record is kept with its deletion metadata intact.
    let stored = ts.store.get_entry(EntryId(entry.id)).await.unwrap();
    let deletion = stored.deletion.unwrap();
    assert_eq!(deletion.reason, "correction");
    assert_eq!(deletion.deleted_by, author_id);
}

#[tokio::test]
async fn test_delete_requires_reason() {
    let ts = create_test_server().await;
    let student = create_student(&ts, "Maria Clara").await;
    let (_, key) =
        login_as(&ts, "p@example.com", Role::HealthProf, Some(Specialty::Psychologist)).await;
    let entry = write_entry(&ts, &key, &student, "session one").await;

    let too_long = "r".repeat(MAX_DELETE_REASON_LEN + 1);
    for reason in [None, Some(""), Some("   "), Some(too_long.as_str())] {
        assert_bad_request(entries::delete_entry(&ts.server, &key, entry.id, reason).await);
    }

    let unchanged = entries::get_entry(&ts.server, &key, entry.id).await.unwrap();
    assert!(!unchanged.deleted);

    let exactly = "r".repeat(MAX_DELETE_REASON_LEN);
    assert!(entries::delete_entry(&ts.server, &key, entry.id, Some(&exactly))
        .await
        .is_ok());
}

#[tokio::test]
async fn test_delete_outside_policy() {
    let ts = create_test_server().await;
    let student = create_student(&ts, "Maria Clara").await;
    let (_, key) =
        login_as(&ts, "p@example.com", Role::HealthProf, Some(Specialty::Psychologist)).await;
    let (_, admin) = login_as(&ts, "admin@example.com", Role::Admin, None).await;
    let (_, manager) = login_as(&ts, "manager@example.com", Role::Manager, None).await;
    let (_, social) =
        login_as(&ts, "s@example.com", Role::HealthProf, Some(Specialty::SocialWorker)).await;
    let entry = write_entry(&ts, &key, &student, "session one").await;

    assert_forbidden(entries::delete_entry(&ts.server, &admin, entry.id, Some("cleanup")).await);
    assert_forbidden(entries::delete_entry(&ts.server, &manager, entry.id, Some("cleanup")).await);

    entries::delete_entry(&ts.server, &key, entry.id, Some("duplicate"))
        .await
        .unwrap();

    // Callers outside the fence don't learn that the entry was retired.
    assert_not_found(entries::delete_entry(&ts.server, &social, entry.id, Some("x")).await);
    assert_not_found(entries::delete_entry(&ts.server, &admin, entry.id, Some("x")).await);
}

#[tokio::test]
async fn test_get_and_delete_missing_entry() {
    let ts = create_test_server().await;
    let (_, key) =
        login_as(&ts, "p@example.com", Role::HealthProf, Some(Specialty::Psychologist)).await;

    assert_not_found(entries::get_entry(&ts.server, &key, 9999).await);
    assert_not_found(entries::delete_entry(&ts.server, &key, 9999, Some("x")).await);
}

#[tokio::test]
async fn test_manager_has_no_detail_view() {
    let ts = create_test_server().await;
    let student = create_student(&ts, "Maria Clara").await;
    let (_, key) =
        login_as(&ts, "p@example.com", Role::HealthProf, Some(Specialty::Psychologist)).await;
    let (_, manager) = login_as(&ts, "manager@example.com", Role::Manager, None).await;
    let entry = write_entry(&ts, &key, &student, "session one").await;

    assert_forbidden(entries::get_entry(&ts.server, &manager, entry.id).await);
}

#[tokio::test]
async fn test_list_newest_first_without_deleted() {
    let ts = create_test_server().await;
    let student = create_student(&ts, "Maria Clara").await;
    let (_, key) =
        login_as(&ts, "p@example.com", Role::HealthProf, Some(Specialty::Psychologist)).await;

    let first = write_entry(&ts, &key, &student, "first").await;
    ts.clock.advance(Duration::seconds(1));
    let second = write_entry(&ts, &key, &student, "second").await;
    ts.clock.advance(Duration::seconds(1));
    let third = write_entry(&ts, &key, &student, "third").await;
    assert!(first.id < second.id && second.id < third.id);

    entries::delete_entry(&ts.server, &key, second.id, Some("mistake"))
        .await
        .unwrap();

    let listed = entries::list_entries(&ts.server, &key, None).await.unwrap();
    let ids: Vec<i64> = listed.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![third.id, first.id]);
}

#[tokio::test]
async fn test_list_student_entries() {
    let ts = create_test_server().await;
    let maria = create_student(&ts, "Maria Clara").await;
    let joao = create_student(&ts, "João Pedro").await;
    let (_, key) =
        login_as(&ts, "p@example.com", Role::HealthProf, Some(Specialty::Psychologist)).await;

    write_entry(&ts, &key, &maria, "maria one").await;
    write_entry(&ts, &key, &joao, "joao one").await;

    let view = entries::list_student_entries(&ts.server, &key, &maria.to_string())
        .await
        .unwrap();
    assert_eq!(view.student_name, "Maria Clara");
    assert_eq!(view.entries.len(), 1);
    assert_eq!(view.entries[0].description, "maria one");

    let ghost = StudentId(Uuid::now_v7()).to_string();
    assert_not_found(entries::list_student_entries(&ts.server, &key, &ghost).await);
    assert_bad_request(entries::list_student_entries(&ts.server, &key, "nope").await);
}

#[tokio::test]
async fn test_concurrent_deletes_single_winner() {
    let ts = create_test_server().await;
    let student = create_student(&ts, "Maria Clara").await;
    let (_, key) =
        login_as(&ts, "p@example.com", Role::HealthProf, Some(Specialty::Psychologist)).await;
    let (_, colleague) =
        login_as(&ts, "p2@example.com", Role::HealthProf, Some(Specialty::Psychologist)).await;
    let entry = write_entry(&ts, &key, &student, "session one").await;

    let (a, b) = tokio::join!(
        entries::delete_entry(&ts.server, &key, entry.id, Some("first")),
        entries::delete_entry(&ts.server, &colleague, entry.id, Some("second")),
    );

    let results = [a, b];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    for result in results {
        if result.is_err() {
            assert_conflict(result);
        }
    }
}

#[tokio::test]
async fn test_entry_handlers_require_credential() {
    let ts = create_test_server().await;
    let failure = crate::error::AuthFailure::Missing;

    assert_unauthenticated(entries::list_entries(&ts.server, "", None).await, failure);
    assert_unauthenticated(entries::get_entry(&ts.server, " ", 1).await, failure);
    assert_unauthenticated(
        entries::create_entry(&ts.server, "", request(None, "x", None)).await,
        failure,
    );
}
