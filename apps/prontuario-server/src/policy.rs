//! Access policy: who may read, create or delete which medical entries.
//!
//! The whole role × action matrix lives in [`allowed`] as one match so it can
//! be audited in a single place. It is evaluated fresh on every request from
//! the principal as resolved for that request; nothing here is cached.
//!
//! | Role        | read collection          | create                   | read entry       | delete           |
//! |-------------|--------------------------|--------------------------|------------------|------------------|
//! | admin       | all entries              | denied                   | any entry        | denied           |
//! | manager     | all entries              | denied                   | denied           | denied           |
//! | health_prof | same-specialty authors   | needs a specialty        | same specialty   | same specialty   |

use prontuario_storage::{EntryFilter, MedicalEntry, Principal, Role, Specialty, StudentId};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Read,
    Create,
    Delete,
}

#[derive(Clone, Copy, Debug)]
pub enum ResourceScope<'a> {
    /// Entries in general, optionally narrowed to one student.
    EntryCollection { student_id: Option<&'a StudentId> },
    /// One specific entry.
    Entry(&'a MedicalEntry),
}

/// Which entries a principal sees when reading a collection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Visibility {
    All,
    /// Only entries whose author currently holds this specialty.
    Specialty(Specialty),
    /// Valid request, empty result.
    Nothing,
}

impl Visibility {
    /// Narrow a listing filter to what this visibility permits. `None` means
    /// the result is empty without asking the store.
    pub fn scope(self, filter: EntryFilter) -> Option<EntryFilter> {
        match self {
            Visibility::All => Some(filter),
            Visibility::Specialty(specialty) => Some(filter.author_specialty(specialty)),
            Visibility::Nothing => None,
        }
    }
}

pub fn visibility(principal: &Principal) -> Visibility {
    match principal.role {
        Role::Admin | Role::Manager => Visibility::All,
        Role::HealthProf => match principal.specialty() {
            Some(specialty) => Visibility::Specialty(specialty),
            None => Visibility::Nothing,
        },
    }
}

pub fn allowed(principal: &Principal, action: Action, scope: &ResourceScope<'_>) -> bool {
    use Action::*;
    use ResourceScope::*;

    match (principal.role, action, scope) {
        // Collection reads are filtered by `visibility`, never refused.
        (_, Read, EntryCollection { .. }) => true,

        (Role::Admin, Read, Entry(_)) => true,
        (Role::Manager, Read, Entry(_)) => false,
        (Role::HealthProf, Read | Delete, Entry(entry)) => same_specialty(principal, entry),

        (Role::HealthProf, Create, EntryCollection { .. }) => principal.specialty().is_some(),

        (Role::Admin | Role::Manager, Create | Delete, _) => false,
        (Role::HealthProf, Create, Entry(_)) | (Role::HealthProf, Delete, EntryCollection { .. }) => {
            false
        }
    }
}

/// Compares the entry author's specialty with the caller's. Either side
/// missing denies.
fn same_specialty(principal: &Principal, entry: &MedicalEntry) -> bool {
    matches!(
        (principal.specialty(), entry.author_specialty),
        (Some(mine), Some(theirs)) if mine == theirs
    )
}
