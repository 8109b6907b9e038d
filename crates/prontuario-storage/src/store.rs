//! The Store trait that backends implement.

use chrono::{DateTime, Utc};

use crate::types::*;
use crate::StoreError;

/// The storage trait the access core depends on.
///
/// Conditional mutations (`soft_delete_entry`, `delete_credential_if_issued_before`)
/// must be a single atomic check-and-set against the backing store: of two
/// racing callers at most one observes success.
#[cfg_attr(feature = "test-support", mockall::automock)]
#[async_trait::async_trait]
pub trait Store: Send + Sync {
    // ───────────────────────────────────── Principals ─────────────────────────────────────

    /// Create a principal (and its health profile, atomically, if provided).
    async fn create_principal(
        &self,
        params: &CreatePrincipalParams,
    ) -> Result<PrincipalId, StoreError>;

    /// Get principal by ID. The health profile is not loaded.
    async fn get_principal(&self, principal_id: &PrincipalId) -> Result<Principal, StoreError>;

    /// Get the health profile bound to a principal.
    async fn get_health_profile(
        &self,
        principal_id: &PrincipalId,
    ) -> Result<HealthProfile, StoreError>;

    /// Get the password material for a login attempt.
    async fn get_login(&self, email: &str) -> Result<LoginRecord, StoreError>;

    /// Activate or deactivate a principal.
    async fn set_principal_active(
        &self,
        principal_id: &PrincipalId,
        active: bool,
    ) -> Result<(), StoreError>;

    // ───────────────────────────────────── Students ───────────────────────────────────────

    /// Create a student (returns generated ID).
    async fn create_student(&self, params: &CreateStudentParams) -> Result<StudentId, StoreError>;

    /// Get student by ID.
    async fn get_student(&self, student_id: &StudentId) -> Result<Student, StoreError>;

    // ──────────────────────────────────── Credentials ─────────────────────────────────────

    /// Persist a freshly issued credential.
    async fn create_credential(&self, credential: &NewCredential) -> Result<(), StoreError>;

    /// Get credential by key fingerprint.
    async fn get_credential(
        &self,
        fingerprint: &CredentialFingerprint,
    ) -> Result<Credential, StoreError>;

    /// Delete a credential. Returns whether a row was removed.
    async fn delete_credential(
        &self,
        fingerprint: &CredentialFingerprint,
    ) -> Result<bool, StoreError>;

    /// Delete a credential only if it was issued at or before `cutoff`.
    /// Returns whether this call removed it.
    async fn delete_credential_if_issued_before(
        &self,
        fingerprint: &CredentialFingerprint,
        cutoff: DateTime<Utc>,
    ) -> Result<bool, StoreError>;

    /// Delete every credential issued at or before `cutoff`. Returns the count removed.
    async fn delete_credentials_issued_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, StoreError>;

    // ────────────────────────────────── Medical entries ───────────────────────────────────

    /// Create a medical entry; the store assigns the ID.
    async fn create_entry(&self, params: &CreateEntryParams) -> Result<MedicalEntry, StoreError>;

    /// Get an entry by ID, soft-deleted or not.
    async fn get_entry(&self, entry_id: EntryId) -> Result<MedicalEntry, StoreError>;

    /// List active (non-deleted) entries matching the filter.
    async fn list_entries(&self, filter: &EntryFilter) -> Result<Vec<MedicalEntry>, StoreError>;

    /// Mark an entry deleted.
    ///
    /// Fails with `Conflict` if the entry is already deleted and `NotFound` if
    /// it does not exist.
    async fn soft_delete_entry(
        &self,
        entry_id: EntryId,
        params: &SoftDelete,
    ) -> Result<MedicalEntry, StoreError>;
}
