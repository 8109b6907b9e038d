//! Expiring bearer credentials.
//!
//! Expiry is lazy: a credential is checked, and purged if stale, when someone
//! presents it. `sweep` exists for operators who want to bound table growth
//! by hand; nothing schedules it.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use prontuario_crypto::{generate_credential_key, CredentialKey};
use prontuario_storage::{CredentialFingerprint, NewCredential, Principal, PrincipalId, Store, StoreError};
use tracing::{debug, info};

use crate::clock::Clock;
use crate::error::{AuthFailure, ServiceError};
use crate::principals;

/// A freshly issued credential. The key is only ever available here.
pub struct IssuedCredential {
    pub key: CredentialKey,
    pub principal_id: PrincipalId,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct CredentialStore {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    lifetime: Duration,
}

fn fingerprint_of(key: &str) -> CredentialFingerprint {
    CredentialFingerprint(prontuario_crypto::fingerprint(key))
}

impl CredentialStore {
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>, lifetime: Duration) -> Self {
        Self {
            store,
            clock,
            lifetime,
        }
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Create a new credential for `principal_id`, issued now. Earlier
    /// credentials of the same principal stay valid.
    pub async fn issue(&self, principal_id: &PrincipalId) -> Result<IssuedCredential, ServiceError> {
        let key = generate_credential_key();
        let issued_at = self.clock.now();
        self.store
            .create_credential(&NewCredential {
                fingerprint: CredentialFingerprint(key.fingerprint()),
                principal_id: principal_id.clone(),
                issued_at,
            })
            .await?;

        info!("Issued credential for principal {}", principal_id);
        Ok(IssuedCredential {
            key,
            principal_id: principal_id.clone(),
            issued_at,
            expires_at: issued_at + self.lifetime,
        })
    }

    /// Resolve the principal behind `key`.
    ///
    /// Checks run in order: unknown key, inactive owner, expiry. An expired
    /// credential is deleted in the same step that reports it, so the next
    /// attempt with that key sees `NotFound`.
    pub async fn validate(&self, key: &str) -> Result<Principal, ServiceError> {
        let fingerprint = fingerprint_of(key);
        let credential = match self.store.get_credential(&fingerprint).await {
            Ok(c) => c,
            Err(StoreError::NotFound) => return Err(AuthFailure::NotFound.into()),
            Err(e) => return Err(e.into()),
        };

        let principal = match principals::resolve(self.store.as_ref(), &credential.principal_id).await {
            Ok(p) => p,
            Err(StoreError::NotFound) => return Err(AuthFailure::NotFound.into()),
            Err(e) => return Err(e.into()),
        };

        if !principal.active {
            debug!("Rejected credential of inactive principal {}", principal.id);
            return Err(AuthFailure::InactivePrincipal.into());
        }

        let now = self.clock.now();
        if now - credential.issued_at >= self.lifetime {
            // Conditional delete: only one of several racing validators removes the row.
            let purged = self
                .store
                .delete_credential_if_issued_before(&fingerprint, now - self.lifetime)
                .await?;
            if !purged {
                return Err(AuthFailure::NotFound.into());
            }
            info!("Expired credential purged for principal {}", principal.id);
            return Err(AuthFailure::Expired.into());
        }

        Ok(principal)
    }

    /// Remove the credential behind `key`.
    pub async fn revoke(&self, key: &str) -> Result<(), ServiceError> {
        if !self.store.delete_credential(&fingerprint_of(key)).await? {
            return Err(AuthFailure::NotFound.into());
        }
        Ok(())
    }

    /// Delete every credential that is already past its lifetime.
    pub async fn sweep(&self) -> Result<u64, ServiceError> {
        let removed = self
            .store
            .delete_credentials_issued_before(self.clock.now() - self.lifetime)
            .await?;
        info!("Swept {} expired credentials", removed);
        Ok(removed)
    }
}
