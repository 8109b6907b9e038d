//! Auth handlers: login, logout, check_auth

use prontuario_crypto::verify_password;
use prontuario_storage::StoreError;
use tracing::{info, warn};

use crate::error::{AuthFailure, ServiceError};
use crate::principals;
use crate::server::ProntuarioServer;
use crate::views::{LoginResponse, PrincipalView};

pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Exchange email and password for a fresh credential.
///
/// Unknown email and wrong password are indistinguishable to the caller.
pub async fn login(
    server: &ProntuarioServer,
    request: LoginRequest,
) -> Result<LoginResponse, ServiceError> {
    let email = request.email.trim().to_lowercase();
    let record = match server.store.get_login(&email).await {
        Ok(r) => r,
        Err(StoreError::NotFound) => return Err(AuthFailure::InvalidLogin.into()),
        Err(e) => return Err(e.into()),
    };

    if !verify_password(&request.password, &record.password_salt, &record.password_hash)? {
        warn!("Failed login for principal {}", record.principal_id);
        return Err(AuthFailure::InvalidLogin.into());
    }
    if !record.active {
        return Err(AuthFailure::InactivePrincipal.into());
    }

    let principal = principals::resolve(server.store.as_ref(), &record.principal_id).await?;
    let issued = server.credentials().issue(&principal.id).await?;
    info!("Principal {} logged in", principal.id);

    Ok(LoginResponse {
        key: issued.key.as_str().to_string(),
        principal: PrincipalView::from(&principal),
        expires_at: issued.expires_at,
    })
}

/// Discard the caller's credential. The key must still be valid.
pub async fn logout(server: &ProntuarioServer, key: &str) -> Result<(), ServiceError> {
    let principal = server.authenticate(key).await?;
    server.credentials().revoke(key.trim()).await?;
    info!("Principal {} logged out", principal.id);
    Ok(())
}

/// Who the key belongs to.
pub async fn check_auth(server: &ProntuarioServer, key: &str) -> Result<PrincipalView, ServiceError> {
    let principal = server.authenticate(key).await?;
    Ok(PrincipalView::from(&principal))
}
