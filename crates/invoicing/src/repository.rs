//! Storage boundary for invoices.

use std::sync::Arc;

use forgeerp_core::{DomainResult, InvoiceId, InvoiceLineId};

use crate::{Domain, Invoice, Origin, OriginResolver};

/// Invoice storage.
///
/// Raw data access: permission checks happen in [`crate::InvoiceService`].
pub trait InvoiceRepository: Send + Sync {
    /// Load invoices in the order of `ids`. Fails with `NotFound` if any is unknown.
    fn get(&self, ids: &[InvoiceId]) -> DomainResult<Vec<Invoice>>;

    /// Like [`InvoiceRepository::get`], skipping unknown ids.
    fn find(&self, ids: &[InvoiceId]) -> DomainResult<Vec<Invoice>>;

    /// Insert or replace invoices in a single write.
    fn save(&self, invoices: Vec<Invoice>) -> DomainResult<()>;

    fn remove(&self, ids: &[InvoiceId]) -> DomainResult<()>;

    /// Update the origin of a single line wherever it lives.
    /// Returns `false` when no invoice has that line.
    fn set_line_origin(&self, line: InvoiceLineId, origin: Option<Origin>) -> DomainResult<bool>;

    fn search(&self, domain: &Domain, resolver: &dyn OriginResolver)
        -> DomainResult<Vec<InvoiceId>>;
}

impl<S> InvoiceRepository for Arc<S>
where
    S: InvoiceRepository + ?Sized,
{
    fn get(&self, ids: &[InvoiceId]) -> DomainResult<Vec<Invoice>> {
        (**self).get(ids)
    }

    fn find(&self, ids: &[InvoiceId]) -> DomainResult<Vec<Invoice>> {
        (**self).find(ids)
    }

    fn save(&self, invoices: Vec<Invoice>) -> DomainResult<()> {
        (**self).save(invoices)
    }

    fn remove(&self, ids: &[InvoiceId]) -> DomainResult<()> {
        (**self).remove(ids)
    }

    fn set_line_origin(&self, line: InvoiceLineId, origin: Option<Origin>) -> DomainResult<bool> {
        (**self).set_line_origin(line, origin)
    }

    fn search(
        &self,
        domain: &Domain,
        resolver: &dyn OriginResolver,
    ) -> DomainResult<Vec<InvoiceId>> {
        (**self).search(domain, resolver)
    }
}
