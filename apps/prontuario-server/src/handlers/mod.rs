//! Request handlers, organized by domain:
//! - auth: login, logout, check_auth
//! - entries: list, list per student, create, get, delete
//! - reports: monthly and per-student reports
//!
//! Apart from `login`, every handler takes the caller's bearer key right
//! after the server and authenticates before looking at anything else.

pub mod auth;
pub mod entries;
pub mod reports;

use prontuario_storage::{Student, StudentId};

use crate::error::ServiceError;
use crate::server::ProntuarioServer;

fn parse_student_id(raw: &str) -> Result<StudentId, ServiceError> {
    raw.trim()
        .parse()
        .map_err(|_| ServiceError::bad_request(format!("invalid student id: {raw}")))
}

async fn load_student(server: &ProntuarioServer, raw: &str) -> Result<Student, ServiceError> {
    let student_id = parse_student_id(raw)?;
    server
        .store
        .get_student(&student_id)
        .await
        .map_err(|e| ServiceError::from_store(e, "student"))
}
