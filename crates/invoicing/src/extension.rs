//! Extension point of the invoice entity.
//!
//! Other modules add behavior to invoices by implementing [`InvoiceExtension`]
//! and registering it on the [`crate::InvoiceService`]. Every hook has a
//! neutral default, so an extension only overrides what it needs.

use forgeerp_auth::AccessContext;
use forgeerp_core::{DomainResult, InvoiceId};

use crate::{
    Clause, CopyDefaults, Domain, FieldValue, Invoice, InvoiceOperation, Origin, SearchValue,
};

pub trait InvoiceExtension: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Extra models invoice line origins may reference.
    fn origin_models(&self) -> &'static [&'static str] {
        &[]
    }

    /// Wrap a state-changing operation on a batch.
    ///
    /// `proceed` runs the remaining extensions and then the base operation; it
    /// must be called exactly once for the operation to happen.
    fn around(
        &self,
        ctx: &AccessContext,
        operation: InvoiceOperation,
        invoices: &[Invoice],
        proceed: &mut dyn FnMut() -> DomainResult<()>,
    ) -> DomainResult<()> {
        let _ = (ctx, operation, invoices);
        proceed()
    }

    /// Veto an operation before the base applies it.
    ///
    /// `invoices` are the ones eligible for the operation.
    fn check_operation(
        &self,
        ctx: &AccessContext,
        operation: InvoiceOperation,
        invoices: &[Invoice],
    ) -> DomainResult<()> {
        let _ = (ctx, operation, invoices);
        Ok(())
    }

    fn copy_defaults(&self, defaults: &mut CopyDefaults) {
        let _ = defaults;
    }

    /// Adjust a fresh copy according to the final defaults.
    fn finish_copy(&self, defaults: &CopyDefaults, copy: &mut Invoice) {
        let _ = (defaults, copy);
    }

    /// Label of a line origin; `None` defers to the next extension or the base label.
    fn origin_name(&self, ctx: &AccessContext, origin: &Origin) -> DomainResult<Option<String>> {
        let _ = (ctx, origin);
        Ok(None)
    }

    /// Rewrite a clause on a field this extension computes.
    fn rewrite_clause(&self, clause: &Clause) -> Option<Domain> {
        let _ = clause;
        None
    }

    /// Value of `field` on the record `origin` points at, for `lines.origin.<field>` paths.
    fn resolve_origin_field(
        &self,
        ctx: &AccessContext,
        origin: &Origin,
        field: &str,
    ) -> DomainResult<Option<SearchValue>> {
        let _ = (ctx, origin, field);
        Ok(None)
    }

    /// Compute `field` for `invoices`; `None` if this extension does not provide it.
    fn read_field(
        &self,
        ctx: &AccessContext,
        field: &str,
        invoices: &[Invoice],
    ) -> Option<DomainResult<Vec<(InvoiceId, FieldValue)>>> {
        let _ = (ctx, field, invoices);
        None
    }
}
