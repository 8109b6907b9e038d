//! Response shapes returned by the handlers.

use chrono::{DateTime, Utc};
use prontuario_storage::{MedicalEntry, Principal, Student};
use serde::Serialize;

#[derive(Clone, Debug, Serialize)]
pub struct PrincipalView {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub role: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialty: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub council_number: Option<String>,
    pub active: bool,
}

impl From<&Principal> for PrincipalView {
    fn from(p: &Principal) -> Self {
        let profile = p.specialty().and(p.health_profile.as_ref());
        Self {
            id: p.id.to_string(),
            email: p.email.clone(),
            full_name: p.full_name(),
            role: p.role.as_str(),
            specialty: profile.map(|hp| hp.specialty.as_str()),
            council_number: profile.map(|hp| hp.council_number.clone()),
            active: p.active,
        }
    }
}

/// Not `Debug`: carries the bearer key.
#[derive(Clone, Serialize)]
pub struct LoginResponse {
    pub key: String,
    pub principal: PrincipalView,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize)]
pub struct EntryView {
    pub id: i64,
    pub student_id: String,
    pub author_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_specialty: Option<&'static str>,
    pub created_at: DateTime<Utc>,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub deleted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete_reason: Option<String>,
}

impl From<MedicalEntry> for EntryView {
    fn from(e: MedicalEntry) -> Self {
        let deleted = e.is_deleted();
        let (deleted_by, deleted_at, delete_reason) = match e.deletion {
            Some(d) => (Some(d.deleted_by.to_string()), Some(d.deleted_at), Some(d.reason)),
            None => (None, None, None),
        };
        Self {
            id: e.id.0,
            student_id: e.student_id.to_string(),
            author_id: e.author_id.to_string(),
            author_specialty: e.author_specialty.map(|s| s.as_str()),
            created_at: e.created_at,
            description: e.description,
            notes: e.notes,
            deleted,
            deleted_by,
            deleted_at,
            delete_reason,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct StudentEntriesView {
    pub student_id: String,
    pub student_name: String,
    pub entries: Vec<EntryView>,
}

impl StudentEntriesView {
    pub fn new(student: &Student, entries: Vec<MedicalEntry>) -> Self {
        Self {
            student_id: student.id.to_string(),
            student_name: student.name.clone(),
            entries: entries.into_iter().map(EntryView::from).collect(),
        }
    }
}
