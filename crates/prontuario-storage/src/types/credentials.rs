//! Bearer credential types.

use chrono::{DateTime, Utc};

use super::{CredentialFingerprint, PrincipalId};

/// Credential record as persisted.
#[derive(Clone, Debug)]
pub struct Credential {
    pub fingerprint: CredentialFingerprint,
    pub principal_id: PrincipalId,
    pub issued_at: DateTime<Utc>,
}

/// Parameters for persisting a freshly issued credential
#[derive(Clone, Debug)]
pub struct NewCredential {
    pub fingerprint: CredentialFingerprint,
    pub principal_id: PrincipalId,
    pub issued_at: DateTime<Utc>,
}
