//! Medical entry handlers: list, list per student, create, get, delete

use prontuario_storage::{EntryFilter, EntryId, MedicalEntry, Principal, StoreError, StudentId};
use tracing::debug;

use crate::error::ServiceError;
use crate::lifecycle::{self, EntryDraft};
use crate::policy::{self, Action, ResourceScope};
use crate::server::ProntuarioServer;
use crate::views::{EntryView, StudentEntriesView};

pub struct CreateEntryRequest {
    pub student_id: Option<String>,
    pub description: String,
    pub notes: Option<String>,
}

/// Active entries the caller may see, newest first.
async fn visible_entries(
    server: &ProntuarioServer,
    principal: &Principal,
    student_id: Option<&StudentId>,
) -> Result<Vec<MedicalEntry>, ServiceError> {
    if !policy::allowed(
        principal,
        Action::Read,
        &ResourceScope::EntryCollection { student_id },
    ) {
        return Err(ServiceError::forbidden("not allowed to list entries"));
    }

    let mut filter = EntryFilter::new();
    if let Some(id) = student_id {
        filter = filter.student(id.clone());
    }
    match policy::visibility(principal).scope(filter) {
        Some(filter) => Ok(server.store.list_entries(&filter).await?),
        None => {
            debug!("Principal {} has no specialty; empty listing", principal.id);
            Ok(Vec::new())
        }
    }
}

pub async fn list_entries(
    server: &ProntuarioServer,
    key: &str,
    student_id: Option<&str>,
) -> Result<Vec<EntryView>, ServiceError> {
    let principal = server.authenticate(key).await?;
    let student = match student_id {
        Some(raw) => Some(super::load_student(server, raw).await?),
        None => None,
    };

    let entries = visible_entries(server, &principal, student.as_ref().map(|s| &s.id)).await?;
    Ok(entries.into_iter().map(EntryView::from).collect())
}

/// One student's entries, with the same visibility as `list_entries`.
pub async fn list_student_entries(
    server: &ProntuarioServer,
    key: &str,
    student_id: &str,
) -> Result<StudentEntriesView, ServiceError> {
    let principal = server.authenticate(key).await?;
    let student = super::load_student(server, student_id).await?;
    let entries = visible_entries(server, &principal, Some(&student.id)).await?;
    Ok(StudentEntriesView::new(&student, entries))
}

pub async fn create_entry(
    server: &ProntuarioServer,
    key: &str,
    request: CreateEntryRequest,
) -> Result<EntryView, ServiceError> {
    let principal = server.authenticate(key).await?;
    if !policy::allowed(
        &principal,
        Action::Create,
        &ResourceScope::EntryCollection { student_id: None },
    ) {
        return Err(ServiceError::forbidden(
            "only health professionals with a specialty may create entries",
        ));
    }

    let raw_student = request
        .student_id
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ServiceError::bad_request("no student specified"))?;
    let student_id = super::parse_student_id(raw_student)?;

    let entry = lifecycle::create(
        server.store.as_ref(),
        server.clock.as_ref(),
        &principal,
        &student_id,
        EntryDraft {
            description: request.description,
            notes: request.notes,
        },
    )
    .await?;
    Ok(EntryView::from(entry))
}

async fn load_entry(server: &ProntuarioServer, entry_id: i64) -> Result<MedicalEntry, ServiceError> {
    match server.store.get_entry(EntryId(entry_id)).await {
        Ok(entry) => Ok(entry),
        Err(StoreError::NotFound) => Err(ServiceError::not_found("entry not found")),
        Err(e) => Err(e.into()),
    }
}

/// A single active entry. Deleted entries are reported as not found.
pub async fn get_entry(
    server: &ProntuarioServer,
    key: &str,
    entry_id: i64,
) -> Result<EntryView, ServiceError> {
    let principal = server.authenticate(key).await?;
    let entry = load_entry(server, entry_id).await?;
    if entry.is_deleted() {
        return Err(ServiceError::not_found("entry not found"));
    }
    if !policy::allowed(&principal, Action::Read, &ResourceScope::Entry(&entry)) {
        return Err(ServiceError::forbidden("not allowed to read this entry"));
    }
    Ok(EntryView::from(entry))
}

/// Soft-delete an entry. Returns the retired record.
pub async fn delete_entry(
    server: &ProntuarioServer,
    key: &str,
    entry_id: i64,
    reason: Option<&str>,
) -> Result<EntryView, ServiceError> {
    let principal = server.authenticate(key).await?;
    let entry = load_entry(server, entry_id).await?;

    if !policy::allowed(&principal, Action::Delete, &ResourceScope::Entry(&entry)) {
        // Only callers past the specialty check learn that an entry was deleted.
        return Err(if entry.is_deleted() {
            ServiceError::not_found("entry not found")
        } else {
            ServiceError::forbidden("not allowed to delete this entry")
        });
    }

    let deleted = lifecycle::soft_delete(
        server.store.as_ref(),
        server.clock.as_ref(),
        &entry,
        &principal,
        reason,
    )
    .await?;
    Ok(EntryView::from(deleted))
}
