//! Type definitions for prontuario storage.

mod credentials;
mod entries;
mod ids;
mod principals;
mod roles;
mod students;

// Re-export all types from submodules
pub use credentials::*;
pub use entries::*;
pub use ids::*;
pub use principals::*;
pub use roles::*;
pub use students::*;
