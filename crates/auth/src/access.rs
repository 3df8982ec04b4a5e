//! Per-request access context with scoped elevation.
//!
//! Some cross-entity work (an invoice reading the sales it came from, or asking
//! them to reconcile) must run regardless of what the acting user may see.
//! [`AccessContext::elevate`] returns a guard; while it is alive every
//! [`AccessContext::check`] passes, and dropping it restores normal checks on
//! every exit path, `?` and panics included.

use std::cell::Cell;
use std::collections::HashSet;
use std::ops::Deref;

use thiserror::Error;

use forgeerp_core::{DomainError, UserId};

use crate::Permission;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: missing permission '{0}'")]
    Forbidden(String),
}

impl From<AuthzError> for DomainError {
    fn from(value: AuthzError) -> Self {
        match value {
            AuthzError::Forbidden(permission) => DomainError::unauthorized(permission),
        }
    }
}

/// The acting principal for one unit of work.
///
/// Not `Sync`: a context belongs to a single request and is passed by reference.
#[derive(Debug)]
pub struct AccessContext {
    user: Option<UserId>,
    granted: HashSet<Permission>,
    elevation: Cell<u32>,
}

impl AccessContext {
    pub fn new(user: UserId, granted: impl IntoIterator<Item = Permission>) -> Self {
        Self {
            user: Some(user),
            granted: granted.into_iter().collect(),
            elevation: Cell::new(0),
        }
    }

    /// Context for system tasks (migrations, schedulers): everything is granted.
    pub fn system() -> Self {
        Self {
            user: None,
            granted: HashSet::from([Permission::WILDCARD]),
            elevation: Cell::new(0),
        }
    }

    pub fn user(&self) -> Option<UserId> {
        self.user
    }

    pub fn is_elevated(&self) -> bool {
        self.elevation.get() > 0
    }

    /// Suspend access checks until the returned guard is dropped. Nests.
    pub fn elevate(&self) -> Elevation<'_> {
        self.elevation.set(self.elevation.get() + 1);
        Elevation { ctx: self }
    }

    pub fn check(&self, required: &Permission) -> Result<(), AuthzError> {
        if self.is_elevated() {
            tracing::trace!(permission = %required, "access check skipped (elevated)");
            return Ok(());
        }

        if self.granted.contains(&Permission::WILDCARD) || self.granted.contains(required) {
            Ok(())
        } else {
            Err(AuthzError::Forbidden(required.as_str().to_string()))
        }
    }
}

/// Guard returned by [`AccessContext::elevate`].
///
/// Derefs to the context so it can be handed to services directly.
#[derive(Debug)]
pub struct Elevation<'a> {
    ctx: &'a AccessContext,
}

impl Deref for Elevation<'_> {
    type Target = AccessContext;

    fn deref(&self) -> &Self::Target {
        self.ctx
    }
}

impl Drop for Elevation<'_> {
    fn drop(&mut self) {
        let depth = self.ctx.elevation.get();
        self.ctx.elevation.set(depth.saturating_sub(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const READ: Permission = Permission::from_static("sales.sale.read");
    const WRITE: Permission = Permission::from_static("sales.sale.write");

    fn reader() -> AccessContext {
        AccessContext::new(UserId::new(), [READ])
    }

    #[test]
    fn granted_permission_passes_and_missing_is_forbidden() {
        let ctx = reader();
        assert!(ctx.check(&READ).is_ok());
        assert_eq!(
            ctx.check(&WRITE),
            Err(AuthzError::Forbidden("sales.sale.write".to_string()))
        );
    }

    #[test]
    fn wildcard_grants_everything() {
        let ctx = AccessContext::system();
        assert!(ctx.check(&WRITE).is_ok());
        assert!(ctx.user().is_none());
    }

    #[test]
    fn elevation_is_scoped_to_the_guard() {
        let ctx = reader();
        {
            let elevated = ctx.elevate();
            assert!(elevated.check(&WRITE).is_ok());
            assert!(ctx.is_elevated());
        }
        assert!(!ctx.is_elevated());
        assert!(ctx.check(&WRITE).is_err());
    }

    #[test]
    fn nested_elevation_restores_only_after_outermost_guard() {
        let ctx = reader();
        let outer = ctx.elevate();
        {
            let _inner = ctx.elevate();
        }
        assert!(ctx.is_elevated());
        drop(outer);
        assert!(!ctx.is_elevated());
    }

    #[test]
    fn elevation_is_released_on_early_return() {
        fn fails(ctx: &AccessContext) -> Result<(), AuthzError> {
            let elevated = ctx.elevate();
            elevated.check(&WRITE)?;
            Err(AuthzError::Forbidden("boom".to_string()))
        }

        let ctx = reader();
        assert!(fails(&ctx).is_err());
        assert!(!ctx.is_elevated());
    }

    #[test]
    fn authz_error_converts_to_domain_error() {
        let err: DomainError = AuthzError::Forbidden("x".to_string()).into();
        assert_eq!(err, DomainError::unauthorized("x"));
    }
}
