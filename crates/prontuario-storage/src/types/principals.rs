//! Principal (user account) and health profile types.

use chrono::{DateTime, Utc};

use super::{PrincipalId, Role, Specialty};

/// Principal record.
///
/// Role and profile are inputs to the access core; nothing in the core
/// mutates them.
#[derive(Clone, Debug)]
pub struct Principal {
    pub id: PrincipalId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub active: bool,
    /// Only ever populated for `Role::HealthProf`. A health professional whose
    /// profile is missing has no visibility into specialty-scoped entries.
    pub health_profile: Option<HealthProfile>,
    pub created_at: DateTime<Utc>,
}

impl Principal {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// Specialty of a health professional, if a profile is bound.
    pub fn specialty(&self) -> Option<Specialty> {
        match self.role {
            Role::HealthProf => self.health_profile.as_ref().map(|p| p.specialty),
            Role::Admin | Role::Manager => None,
        }
    }
}

/// Professional profile bound to a `health_prof` principal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HealthProfile {
    pub specialty: Specialty,
    /// Council/registration number; opaque to the core.
    pub council_number: String,
}

/// Parameters for creating a principal
#[derive(Clone, Debug)]
pub struct CreatePrincipalParams {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub password_hash: String,
    pub password_salt: Vec<u8>,
    /// Created in the same transaction as the principal.
    pub health_profile: Option<HealthProfile>,
}

/// What login needs to check a password.
#[derive(Clone, Debug)]
pub struct LoginRecord {
    pub principal_id: PrincipalId,
    pub password_hash: String,
    pub password_salt: Vec<u8>,
    pub active: bool,
}
