//! Principal/specialty resolution.

use prontuario_storage::{Principal, PrincipalId, Role, Store, StoreError};

/// Load a principal and, for health professionals, the bound health profile.
///
/// A missing principal is `NotFound`. A health professional whose profile is
/// missing resolves with `health_profile: None`, which the access policy reads
/// as "no visibility".
pub async fn resolve(store: &dyn Store, principal_id: &PrincipalId) -> Result<Principal, StoreError> {
    let mut principal = store.get_principal(principal_id).await?;
    if principal.role == Role::HealthProf {
        principal.health_profile = match store.get_health_profile(principal_id).await {
            Ok(profile) => Some(profile),
            Err(StoreError::NotFound) => None,
            Err(e) => return Err(e),
        };
    }
    Ok(principal)
}
