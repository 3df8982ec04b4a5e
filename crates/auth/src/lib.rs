//! `forgeerp-auth` — access checks for domain services.
//!
//! This crate is intentionally decoupled from HTTP and storage: services receive
//! an [`AccessContext`] explicitly and ask it before reading or writing records.

pub mod access;
pub mod permissions;

pub use access::{AccessContext, AuthzError, Elevation};
pub use permissions::Permission;
