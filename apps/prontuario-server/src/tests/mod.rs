//! Server unit and integration tests.
//!
//! Tests are organized into modules by feature area:
//! - `common` - Shared test helpers and utilities
//! - `auth` - Credential issue, expiry and revocation
//! - `permissions` - Specialty fencing and role visibility against a real store
//! - `handlers` - Handler integration tests

pub mod common;
