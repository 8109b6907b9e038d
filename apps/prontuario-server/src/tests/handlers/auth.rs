//! Auth handler tests: login, logout, check_auth.

use chrono::Duration;
use prontuario_storage::{Role, Specialty, Store};

use crate::error::AuthFailure;
use crate::handlers::auth::{self, LoginRequest};
use crate::tests::common::*;

fn credentials(email: &str, password: &str) -> LoginRequest {
    LoginRequest {
        email: email.to_string(),
        password: password.to_string(),
    }
}

#[tokio::test]
async fn test_login_issues_credential() {
    let ts = create_test_server().await;
    let principal_id = create_principal_with_password(
        &ts,
        "ana@example.com",
        Role::HealthProf,
        Some(Specialty::Psychologist),
    )
    .await;

    let response = auth::login(&ts.server, credentials("ana@example.com", TEST_PASSWORD))
        .await
        .map_err(|e| e.to_string())
        .unwrap();

    assert_eq!(response.key.len(), 40);
    assert!(response.key.chars().all(|c| c.is_ascii_hexdigit()));
    assert_eq!(response.expires_at, t0() + Duration::seconds(10));
    assert_eq!(response.principal.id, principal_id.to_string());
    assert_eq!(response.principal.role, "health_prof");
    assert_eq!(response.principal.specialty, Some("psychologist"));

    let me = auth::check_auth(&ts.server, &response.key).await.unwrap();
    assert_eq!(me.email, "ana@example.com");
}

#[tokio::test]
async fn test_login_email_is_case_insensitive() {
    let ts = create_test_server().await;
    create_principal_with_password(&ts, "ana@example.com", Role::Manager, None).await;

    let result = auth::login(&ts.server, credentials("  Ana@Example.COM ", TEST_PASSWORD)).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_login_rejections_are_indistinguishable() {
    let ts = create_test_server().await;
    create_principal_with_password(&ts, "ana@example.com", Role::Admin, None).await;

    let wrong_password = auth::login(&ts.server, credentials("ana@example.com", "nope"))
        .await
        .map(|_| ());
    assert_unauthenticated(wrong_password, AuthFailure::InvalidLogin);

    let unknown = auth::login(&ts.server, credentials("ghost@example.com", TEST_PASSWORD))
        .await
        .map(|_| ());
    assert_unauthenticated(unknown, AuthFailure::InvalidLogin);
}

#[tokio::test]
async fn test_login_inactive_principal() {
    let ts = create_test_server().await;
    let principal_id =
        create_principal_with_password(&ts, "ana@example.com", Role::Admin, None).await;
    ts.store.set_principal_active(&principal_id, false).await.unwrap();

    let result = auth::login(&ts.server, credentials("ana@example.com", TEST_PASSWORD))
        .await
        .map(|_| ());
    assert_unauthenticated(result, AuthFailure::InactivePrincipal);

    // A wrong password still reads as a bad login, not as inactive.
    let result = auth::login(&ts.server, credentials("ana@example.com", "nope"))
        .await
        .map(|_| ());
    assert_unauthenticated(result, AuthFailure::InvalidLogin);
}

#[tokio::test]
async fn test_logout_revokes_key() {
    let ts = create_test_server().await;
    let (_, key) = login_as(&ts, "ana@example.com", Role::Admin, None).await;

    auth::logout(&ts.server, &key).await.unwrap();

    assert_unauthenticated(
        auth::check_auth(&ts.server, &key).await,
        AuthFailure::NotFound,
    );
    assert_unauthenticated(auth::logout(&ts.server, &key).await, AuthFailure::NotFound);
}

#[tokio::test]
async fn test_logout_with_expired_key() {
    let ts = create_test_server().await;
    let (_, key) = login_as(&ts, "ana@example.com", Role::Admin, None).await;

    ts.clock.advance(Duration::seconds(11));
    assert_unauthenticated(auth::logout(&ts.server, &key).await, AuthFailure::Expired);
}

#[tokio::test]
async fn test_check_auth_shows_profile() {
    let ts = create_test_server().await;
    let (principal_id, key) = login_as(
        &ts,
        "fisio@example.com",
        Role::HealthProf,
        Some(Specialty::Physiotherapist),
    )
    .await;

    let me = auth::check_auth(&ts.server, &key).await.unwrap();
    assert_eq!(me.id, principal_id.to_string());
    assert_eq!(me.full_name, "fisio Tester");
    assert_eq!(me.specialty, Some("physiotherapist"));
    assert_eq!(me.council_number.as_deref(), Some("REG-physiotherapist"));
    assert!(me.active);
}

#[tokio::test]
async fn test_check_auth_without_key() {
    let ts = create_test_server().await;
    assert_unauthenticated(auth::check_auth(&ts.server, "").await, AuthFailure::Missing);
}
