//! Role and specialty enumerations.
//!
//! Both sets are closed: values outside them are rejected when parsed, so a
//! stray string can never silently fail to match in a visibility filter.

use std::str::FromStr;

/// Role of a principal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    Admin,
    Manager,
    HealthProf,
}

/// Error type for parsing Role from string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRoleError(pub String);

impl std::fmt::Display for ParseRoleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid role: {}", self.0)
    }
}

impl std::error::Error for ParseRoleError {}

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "manager" => Ok(Role::Manager),
            "health_prof" => Ok(Role::HealthProf),
            _ => Err(ParseRoleError(s.to_string())),
        }
    }
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::HealthProf => "health_prof",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Clinical discipline of a health professional.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Specialty {
    Psychologist,
    Physiotherapist,
    SocialWorker,
    SpeechTherapist,
}

/// Error type for parsing Specialty from string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseSpecialtyError(pub String);

impl std::fmt::Display for ParseSpecialtyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid specialty: {}", self.0)
    }
}

impl std::error::Error for ParseSpecialtyError {}

impl FromStr for Specialty {
    type Err = ParseSpecialtyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "psychologist" => Ok(Specialty::Psychologist),
            "physiotherapist" => Ok(Specialty::Physiotherapist),
            "social_worker" => Ok(Specialty::SocialWorker),
            "speech_therapist" => Ok(Specialty::SpeechTherapist),
            _ => Err(ParseSpecialtyError(s.to_string())),
        }
    }
}

impl Specialty {
    pub const ALL: [Specialty; 4] = [
        Specialty::Psychologist,
        Specialty::Physiotherapist,
        Specialty::SocialWorker,
        Specialty::SpeechTherapist,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Specialty::Psychologist => "psychologist",
            Specialty::Physiotherapist => "physiotherapist",
            Specialty::SocialWorker => "social_worker",
            Specialty::SpeechTherapist => "speech_therapist",
        }
    }
}

impl std::fmt::Display for Specialty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
