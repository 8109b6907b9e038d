//! Medical entry types.

use chrono::{DateTime, Utc};

use super::{EntryId, PrincipalId, Specialty, StudentId};

/// Soft-delete marker. All four fields are set together or not at all.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Deletion {
    pub deleted_by: PrincipalId,
    pub deleted_at: DateTime<Utc>,
    pub reason: String,
}

/// Medical entry record
#[derive(Clone, Debug)]
pub struct MedicalEntry {
    pub id: EntryId,
    pub student_id: StudentId,
    pub author_id: PrincipalId,
    /// Resolved at read time from the author's current health profile.
    pub author_specialty: Option<Specialty>,
    pub created_at: DateTime<Utc>,
    pub description: String,
    pub notes: Option<String>,
    /// `None` while the entry is active.
    pub deletion: Option<Deletion>,
}

impl MedicalEntry {
    pub fn is_deleted(&self) -> bool {
        self.deletion.is_some()
    }
}

/// Parameters for creating a medical entry
#[derive(Clone, Debug)]
pub struct CreateEntryParams {
    pub student_id: StudentId,
    pub author_id: PrincipalId,
    pub created_at: DateTime<Utc>,
    pub description: String,
    pub notes: Option<String>,
}

/// Parameters for the soft-delete transition
#[derive(Clone, Debug)]
pub struct SoftDelete {
    pub deleted_by: PrincipalId,
    pub deleted_at: DateTime<Utc>,
    pub reason: String,
}

/// Result ordering for entry listings
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EntryOrder {
    #[default]
    NewestFirst,
    OldestFirst,
}

/// Filter for listing entries. Soft-deleted entries are never listed.
#[derive(Clone, Debug, Default)]
pub struct EntryFilter {
    pub student_id: Option<StudentId>,
    /// Keep only entries whose author currently holds this specialty.
    pub author_specialty: Option<Specialty>,
    /// Inclusive lower bound on `created_at`.
    pub created_from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `created_at`.
    pub created_to: Option<DateTime<Utc>>,
    pub order: EntryOrder,
}

impl EntryFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn student(mut self, student_id: StudentId) -> Self {
        self.student_id = Some(student_id);
        self
    }

    pub fn author_specialty(mut self, specialty: Specialty) -> Self {
        self.author_specialty = Some(specialty);
        self
    }

    pub fn created_between(mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        self.created_from = Some(from);
        self.created_to = Some(to);
        self
    }

    pub fn order(mut self, order: EntryOrder) -> Self {
        self.order = order;
        self
    }
}
