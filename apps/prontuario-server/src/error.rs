//! Request outcome taxonomy.
//!
//! Every failure aborts the request with exactly one of these. Nothing here is
//! retried; storage-level retries, if any, belong to the backend.

use prontuario_crypto::KdfError;
use prontuario_reports::{RenderError, ReportLogError};
use prontuario_storage::StoreError;
use thiserror::Error;
use tonic::Status;

/// Why a request could not be tied to a principal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum AuthFailure {
    #[error("no credential supplied")]
    Missing,
    #[error("invalid credential")]
    NotFound,
    #[error("credential expired")]
    Expired,
    #[error("principal is inactive")]
    InactivePrincipal,
    #[error("invalid email or password")]
    InvalidLogin,
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("unauthenticated: {0}")]
    Unauthenticated(AuthFailure),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    /// Map a storage error, naming the record for the not-found case.
    pub fn from_store(e: StoreError, what: &str) -> Self {
        match e {
            StoreError::NotFound => Self::NotFound(format!("{what} not found")),
            StoreError::AlreadyExists => Self::Conflict(format!("{what} already exists")),
            StoreError::Conflict => Self::Conflict(format!("{what} was modified concurrently")),
            StoreError::Backend(msg) => Self::Internal(msg),
        }
    }
}

impl From<AuthFailure> for ServiceError {
    fn from(f: AuthFailure) -> Self {
        Self::Unauthenticated(f)
    }
}

impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> Self {
        Self::from_store(e, "record")
    }
}

impl From<ReportLogError> for ServiceError {
    fn from(e: ReportLogError) -> Self {
        Self::Internal(format!("failed to record report: {e}"))
    }
}

impl From<RenderError> for ServiceError {
    fn from(e: RenderError) -> Self {
        Self::Internal(e.to_string())
    }
}

impl From<KdfError> for ServiceError {
    fn from(e: KdfError) -> Self {
        Self::Internal(e.to_string())
    }
}

impl From<ServiceError> for Status {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::Unauthenticated(f) => Status::unauthenticated(f.to_string()),
            ServiceError::Forbidden(msg) => Status::permission_denied(msg),
            ServiceError::NotFound(msg) => Status::not_found(msg),
            ServiceError::BadRequest(msg) => Status::invalid_argument(msg),
            ServiceError::Conflict(msg) => Status::already_exists(msg),
            ServiceError::Internal(msg) => Status::internal(msg),
        }
    }
}
