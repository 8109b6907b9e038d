//! Common test helpers and utilities for server tests.
//!
//! This module provides shared test infrastructure including:
//! - Test server creation over in-memory SQLite and a manual clock
//! - Principal, student and credential helpers
//! - Assertions on the error taxonomy

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use prontuario_reports::{JsonReportRenderer, ReportLog, ReportRenderer};
use prontuario_storage::{
    CreatePrincipalParams, CreateStudentParams, HealthProfile, PrincipalId, Role, Specialty, Store,
    StudentId,
};
use prontuario_store_sqlite::SqliteStore;

use crate::clock::ManualClock;
use crate::config::ServerConfig;
use crate::error::{AuthFailure, ServiceError};
use crate::handlers::entries::{self, CreateEntryRequest};
use crate::server::ProntuarioServer;
use crate::views::EntryView;

pub const TEST_PASSWORD: &str = "correct horse battery";

/// 2024-05-10 12:00:00 UTC
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap()
}

pub struct TestServer {
    pub server: ProntuarioServer,
    pub store: Arc<SqliteStore>,
    pub clock: Arc<ManualClock>,
}

/// Test helper: in-memory SQLite for records and report log, JSON renderer,
/// clock frozen at `t0()`, default 10 s credential lifetime.
pub async fn create_test_server() -> TestServer {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    create_test_server_with(store.clone(), store, Arc::new(JsonReportRenderer)).await
}

/// Test helper: same as `create_test_server` with a substitute report log and renderer.
pub async fn create_test_server_with_reports(
    report_log: Arc<dyn ReportLog>,
    renderer: Arc<dyn ReportRenderer>,
) -> TestServer {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    create_test_server_with(store, report_log, renderer).await
}

async fn create_test_server_with(
    store: Arc<SqliteStore>,
    report_log: Arc<dyn ReportLog>,
    renderer: Arc<dyn ReportRenderer>,
) -> TestServer {
    let clock = Arc::new(ManualClock::new(t0()));
    let server = ProntuarioServer::new(
        store.clone(),
        report_log,
        renderer,
        clock.clone(),
        ServerConfig::default(),
    );
    TestServer {
        server,
        store,
        clock,
    }
}

/// Test helper: create a principal that cannot log in by password.
pub async fn create_principal(
    ts: &TestServer,
    email: &str,
    role: Role,
    specialty: Option<Specialty>,
) -> PrincipalId {
    insert_principal(ts, email, role, specialty, String::new(), vec![0; 16]).await
}

/// Test helper: create a principal whose password is `TEST_PASSWORD`.
pub async fn create_principal_with_password(
    ts: &TestServer,
    email: &str,
    role: Role,
    specialty: Option<Specialty>,
) -> PrincipalId {
    let salt = prontuario_crypto::generate_salt();
    let password_hash = prontuario_crypto::hash_password(TEST_PASSWORD, &salt).unwrap();
    insert_principal(ts, email, role, specialty, password_hash, salt.to_vec()).await
}

async fn insert_principal(
    ts: &TestServer,
    email: &str,
    role: Role,
    specialty: Option<Specialty>,
    password_hash: String,
    password_salt: Vec<u8>,
) -> PrincipalId {
    ts.store
        .create_principal(&CreatePrincipalParams {
            email: email.to_string(),
            first_name: email.split('@').next().unwrap_or(email).to_string(),
            last_name: "Tester".to_string(),
            role,
            password_hash,
            password_salt,
            health_profile: specialty.map(|specialty| HealthProfile {
                specialty,
                council_number: format!("REG-{}", specialty.as_str()),
            }),
        })
        .await
        .unwrap()
}

/// Test helper: create a principal and hand back a live credential key.
pub async fn login_as(
    ts: &TestServer,
    email: &str,
    role: Role,
    specialty: Option<Specialty>,
) -> (PrincipalId, String) {
    let principal_id = create_principal(ts, email, role, specialty).await;
    let key = issue_key(ts, &principal_id).await;
    (principal_id, key)
}

pub async fn issue_key(ts: &TestServer, principal_id: &PrincipalId) -> String {
    ts.server
        .credentials()
        .issue(principal_id)
        .await
        .unwrap()
        .key
        .as_str()
        .to_string()
}

pub async fn create_student(ts: &TestServer, name: &str) -> StudentId {
    ts.store
        .create_student(&CreateStudentParams {
            name: name.to_string(),
        })
        .await
        .unwrap()
}

/// Test helper: write an entry through the handler as the owner of `key`.
pub async fn write_entry(
    ts: &TestServer,
    key: &str,
    student_id: &StudentId,
    description: &str,
) -> EntryView {
    entries::create_entry(
        &ts.server,
        key,
        CreateEntryRequest {
            student_id: Some(student_id.to_string()),
            description: description.to_string(),
            notes: None,
        },
    )
    .await
    .unwrap()
}

pub fn assert_unauthenticated<T: std::fmt::Debug>(
    result: Result<T, ServiceError>,
    expected: AuthFailure,
) {
    match result {
        Err(ServiceError::Unauthenticated(f)) => assert_eq!(f, expected),
        other => panic!("expected Unauthenticated({expected:?}), got {other:?}"),
    }
}

pub fn assert_forbidden<T: std::fmt::Debug>(result: Result<T, ServiceError>) {
    assert!(
        matches!(result, Err(ServiceError::Forbidden(_))),
        "expected Forbidden, got {result:?}"
    );
}

pub fn assert_not_found<T: std::fmt::Debug>(result: Result<T, ServiceError>) {
    assert!(
        matches!(result, Err(ServiceError::NotFound(_))),
        "expected NotFound, got {result:?}"
    );
}

pub fn assert_bad_request<T: std::fmt::Debug>(result: Result<T, ServiceError>) {
    assert!(
        matches!(result, Err(ServiceError::BadRequest(_))),
        "expected BadRequest, got {result:?}"
    );
}

pub fn assert_conflict<T: std::fmt::Debug>(result: Result<T, ServiceError>) {
    assert!(
        matches!(result, Err(ServiceError::Conflict(_))),
        "expected Conflict, got {result:?}"
    );
}
