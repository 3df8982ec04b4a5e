//! Access-checked operations on sales orders.

use std::collections::HashSet;

use tracing::instrument;

use forgeerp_auth::AccessContext;
use forgeerp_core::{DomainResult, InvoiceId, SaleId, SaleLineId};

use crate::permissions::{SALE_READ, SALE_WRITE};
use crate::{InvoiceStateLookup, SaleLine, SaleOrder, SaleRepository};

pub struct SaleService<R> {
    repo: R,
}

impl<R: SaleRepository> SaleService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn get(&self, ctx: &AccessContext, ids: &[SaleId]) -> DomainResult<Vec<SaleOrder>> {
        ctx.check(&SALE_READ)?;
        self.repo.get(ids)
    }

    /// Sales that generated any of `invoices`.
    pub fn search_by_invoices(
        &self,
        ctx: &AccessContext,
        invoices: &[InvoiceId],
    ) -> DomainResult<Vec<SaleOrder>> {
        ctx.check(&SALE_READ)?;
        if invoices.is_empty() {
            return Ok(Vec::new());
        }
        self.repo.find_by_invoices(invoices)
    }

    pub fn lines(&self, ctx: &AccessContext, ids: &[SaleLineId]) -> DomainResult<Vec<SaleLine>> {
        ctx.check(&SALE_READ)?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.repo.lines(ids)
    }

    /// Reconcile each sale with the current state of its invoices.
    ///
    /// Duplicated ids are processed once; the whole batch is written at once.
    #[instrument(skip_all, fields(sales = ids.len()))]
    pub fn process(
        &self,
        ctx: &AccessContext,
        ids: &[SaleId],
        lookup: &dyn InvoiceStateLookup,
    ) -> DomainResult<()> {
        ctx.check(&SALE_WRITE)?;

        let mut seen = HashSet::new();
        let unique: Vec<SaleId> = ids.iter().copied().filter(|id| seen.insert(*id)).collect();
        if unique.is_empty() {
            return Ok(());
        }

        let mut sales = self.repo.get(&unique)?;
        for sale in &mut sales {
            if sale.reconcile(lookup) {
                tracing::info!(
                    sale = %sale.number(),
                    state = ?sale.state(),
                    invoice_state = ?sale.invoice_state(),
                    "sale reconciled"
                );
            }
        }
        self.repo.save(sales)
    }
}
