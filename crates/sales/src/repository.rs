//! Storage boundary for sales orders.

use std::sync::Arc;

use forgeerp_core::{DomainResult, InvoiceId, SaleId, SaleLineId};

use crate::{SaleLine, SaleOrder};

/// Sales order storage.
///
/// Raw data access: permission checks happen in [`crate::SaleService`].
pub trait SaleRepository: Send + Sync {
    /// Load sales by id. Fails with `NotFound` if any id is unknown.
    fn get(&self, ids: &[SaleId]) -> DomainResult<Vec<SaleOrder>>;

    /// Sales whose `invoices` contain any of the given invoices.
    fn find_by_invoices(&self, invoices: &[InvoiceId]) -> DomainResult<Vec<SaleOrder>>;

    /// Sale lines by id. Unknown ids are skipped.
    fn lines(&self, ids: &[SaleLineId]) -> DomainResult<Vec<SaleLine>>;

    /// Insert or replace sales in a single write.
    fn save(&self, sales: Vec<SaleOrder>) -> DomainResult<()>;
}

impl<S> SaleRepository for Arc<S>
where
    S: SaleRepository + ?Sized,
{
    fn get(&self, ids: &[SaleId]) -> DomainResult<Vec<SaleOrder>> {
        (**self).get(ids)
    }

    fn find_by_invoices(&self, invoices: &[InvoiceId]) -> DomainResult<Vec<SaleOrder>> {
        (**self).find_by_invoices(invoices)
    }

    fn lines(&self, ids: &[SaleLineId]) -> DomainResult<Vec<SaleLine>> {
        (**self).lines(ids)
    }

    fn save(&self, sales: Vec<SaleOrder>) -> DomainResult<()> {
        (**self).save(sales)
    }
}
