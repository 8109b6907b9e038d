//! Student types (the record entries are written against).

use chrono::{DateTime, Utc};

use super::StudentId;

/// Student record
#[derive(Clone, Debug)]
pub struct Student {
    pub id: StudentId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Parameters for creating a student
#[derive(Clone, Debug)]
pub struct CreateStudentParams {
    pub name: String,
}
