//! Medical entry lifecycle: `Active -> Deleted`, nothing else.
//!
//! Callers run the access policy first; these functions only enforce the
//! state machine and field rules.

use prontuario_storage::{
    CreateEntryParams, MedicalEntry, Principal, SoftDelete, Store, StoreError, StudentId,
};
use tracing::info;

use crate::clock::Clock;
use crate::error::ServiceError;

pub const MAX_DESCRIPTION_LEN: usize = 500;
pub const MAX_NOTES_LEN: usize = 500;
pub const MAX_DELETE_REASON_LEN: usize = 200;

/// Client-supplied content of a new entry.
#[derive(Clone, Debug)]
pub struct EntryDraft {
    pub description: String,
    pub notes: Option<String>,
}

impl EntryDraft {
    fn validate(self) -> Result<Self, ServiceError> {
        let description = self.description.trim().to_string();
        if description.is_empty() {
            return Err(ServiceError::bad_request("description is required"));
        }
        if description.chars().count() > MAX_DESCRIPTION_LEN {
            return Err(ServiceError::bad_request(format!(
                "description exceeds {MAX_DESCRIPTION_LEN} characters"
            )));
        }
        let notes = self
            .notes
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        if notes
            .as_deref()
            .is_some_and(|n| n.chars().count() > MAX_NOTES_LEN)
        {
            return Err(ServiceError::bad_request(format!(
                "notes exceed {MAX_NOTES_LEN} characters"
            )));
        }
        Ok(Self { description, notes })
    }
}

/// Write a new entry authored by `author` against `student_id`.
///
/// `created_at` comes from the clock; the author is always the caller.
pub async fn create(
    store: &dyn Store,
    clock: &dyn Clock,
    author: &Principal,
    student_id: &StudentId,
    draft: EntryDraft,
) -> Result<MedicalEntry, ServiceError> {
    let draft = draft.validate()?;
    store
        .get_student(student_id)
        .await
        .map_err(|e| ServiceError::from_store(e, "student"))?;

    let entry = store
        .create_entry(&CreateEntryParams {
            student_id: student_id.clone(),
            author_id: author.id.clone(),
            created_at: clock.now(),
            description: draft.description,
            notes: draft.notes,
        })
        .await
        .map_err(|e| ServiceError::from_store(e, "student"))?;

    info!(
        "Entry {} created by {} for student {}",
        entry.id, author.id, student_id
    );
    Ok(entry)
}

/// Retire an entry. One-shot: a second call on the same entry is a conflict
/// whatever the actor or reason.
pub async fn soft_delete(
    store: &dyn Store,
    clock: &dyn Clock,
    entry: &MedicalEntry,
    actor: &Principal,
    reason: Option<&str>,
) -> Result<MedicalEntry, ServiceError> {
    if entry.is_deleted() {
        return Err(ServiceError::Conflict("already deleted".to_string()));
    }

    let reason = reason.map(str::trim).unwrap_or_default();
    if reason.is_empty() {
        return Err(ServiceError::bad_request("reason required"));
    }
    if reason.chars().count() > MAX_DELETE_REASON_LEN {
        return Err(ServiceError::bad_request(format!(
            "reason exceeds {MAX_DELETE_REASON_LEN} characters"
        )));
    }

    let deleted = store
        .soft_delete_entry(
            entry.id,
            &SoftDelete {
                deleted_by: actor.id.clone(),
                deleted_at: clock.now(),
                reason: reason.to_string(),
            },
        )
        .await
        .map_err(|e| match e {
            StoreError::Conflict => ServiceError::Conflict("already deleted".to_string()),
            other => ServiceError::from_store(other, "entry"),
        })?;

    info!("Entry {} deleted by {}", entry.id, actor.id);
    Ok(deleted)
}
