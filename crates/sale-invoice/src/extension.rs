//! The sale side of the invoice entity.

use std::collections::{BTreeSet, HashMap};
use std::slice;

use tracing::instrument;

use forgeerp_auth::AccessContext;
use forgeerp_core::{DomainError, DomainResult, Entity, InvoiceId, SaleId, SaleLineId};
use forgeerp_invoicing::{
    Clause, CopyDefaults, CopyValue, Domain, FieldValue, Invoice, InvoiceExtension,
    InvoiceOperation, InvoiceRepository, InvoiceState, Origin, SearchValue,
};
use forgeerp_sales::{LinkedInvoiceState, SaleOrder, SaleRepository, SaleService};

use crate::exception::{self, SaleExceptionState};
use crate::{lookup, search, EXCEPTION_STATE_FIELD, SALES_FIELD};

pub const RESET_TO_DRAFT_ERROR: &str = "You cannot reset to draft an invoice generated by a sale.";

/// Invoice extension backed by the sales module.
///
/// `invoices` is the same store the invoice service writes to; it is read after
/// an operation to tell the sales what became of their invoices.
pub struct SaleInvoiceExtension<S, I> {
    sales: SaleService<S>,
    invoices: I,
}

impl<S: SaleRepository, I: InvoiceRepository> SaleInvoiceExtension<S, I> {
    pub fn new(sales: S, invoices: I) -> Self {
        Self {
            sales: SaleService::new(sales),
            invoices,
        }
    }

    /// Sales the invoice was generated from, distinct and sorted.
    pub fn sales(&self, ctx: &AccessContext, invoice: &Invoice) -> DomainResult<Vec<SaleId>> {
        let mut by_invoice = self.sales_by_invoice(ctx, slice::from_ref(invoice))?;
        Ok(by_invoice.remove(&invoice.id_typed()).unwrap_or_default())
    }

    pub fn sales_by_invoice(
        &self,
        ctx: &AccessContext,
        invoices: &[Invoice],
    ) -> DomainResult<HashMap<InvoiceId, Vec<SaleId>>> {
        let sale_lines = self.sales.lines(ctx, &lookup::sale_line_ids(invoices))?;
        let parents: HashMap<SaleLineId, SaleId> =
            sale_lines.into_iter().map(|l| (l.id, l.sale)).collect();

        Ok(invoices
            .iter()
            .map(|i| (i.id_typed(), lookup::sales_of(i, &parents)))
            .collect())
    }

    /// Exception state of each invoice. Reads sales whatever the caller may see.
    pub fn sale_exception_states(
        &self,
        ctx: &AccessContext,
        invoices: &[InvoiceId],
    ) -> DomainResult<HashMap<InvoiceId, SaleExceptionState>> {
        let sales = {
            let elevated = ctx.elevate();
            self.sales.search_by_invoices(&elevated, invoices)?
        };
        Ok(exception::exception_states(invoices, &sales))
    }

    /// Union of the sales of every invoice in the batch.
    fn linked_sales(&self, ctx: &AccessContext, invoices: &[Invoice]) -> DomainResult<Vec<SaleId>> {
        let linked: BTreeSet<SaleId> = self
            .sales_by_invoice(ctx, invoices)?
            .into_values()
            .flatten()
            .collect();
        Ok(linked.into_iter().collect())
    }

    /// Current state of every invoice the sales reference; deleted ones are absent.
    fn invoice_states(
        &self,
        sales: &[SaleOrder],
    ) -> DomainResult<HashMap<InvoiceId, LinkedInvoiceState>> {
        let ids: Vec<InvoiceId> = sales
            .iter()
            .flat_map(|s| s.invoices().iter().copied())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        Ok(self
            .invoices
            .find(&ids)?
            .iter()
            .map(|i| (i.id_typed(), linked_state(i.state())))
            .collect())
    }

    #[instrument(skip_all, fields(sales = sale_ids.len()))]
    fn process_sales(&self, ctx: &AccessContext, sale_ids: &[SaleId]) -> DomainResult<()> {
        let elevated = ctx.elevate();
        let sales = self.sales.get(&elevated, sale_ids)?;
        let states = self.invoice_states(&sales)?;
        self.sales.process(&elevated, sale_ids, &states)
    }

    fn sale_of_line(&self, ctx: &AccessContext, line: SaleLineId) -> DomainResult<Option<SaleId>> {
        Ok(self.sales.lines(ctx, &[line])?.first().map(|l| l.sale))
    }
}

fn linked_state(state: InvoiceState) -> LinkedInvoiceState {
    match state {
        InvoiceState::Draft => LinkedInvoiceState::Draft,
        InvoiceState::Validated => LinkedInvoiceState::Validated,
        InvoiceState::Posted => LinkedInvoiceState::Posted,
        InvoiceState::Paid => LinkedInvoiceState::Paid,
        InvoiceState::Cancel => LinkedInvoiceState::Cancelled,
    }
}

/// Operations after which the originating sales are reconciled.
fn reprocesses_sales(operation: InvoiceOperation) -> bool {
    matches!(
        operation,
        InvoiceOperation::Delete
            | InvoiceOperation::Post
            | InvoiceOperation::Paid
            | InvoiceOperation::Cancel
    )
}

impl<S, I> InvoiceExtension for SaleInvoiceExtension<S, I>
where
    S: SaleRepository,
    I: InvoiceRepository,
{
    fn name(&self) -> &'static str {
        "sale-invoice"
    }

    fn origin_models(&self) -> &'static [&'static str] {
        &[Origin::SALE_LINE_MODEL]
    }

    fn around(
        &self,
        ctx: &AccessContext,
        operation: InvoiceOperation,
        invoices: &[Invoice],
        proceed: &mut dyn FnMut() -> DomainResult<()>,
    ) -> DomainResult<()> {
        if !reprocesses_sales(operation) {
            return proceed();
        }

        let sale_ids = {
            let elevated = ctx.elevate();
            self.linked_sales(&elevated, invoices)?
        };
        proceed()?;
        self.process_sales(ctx, &sale_ids)
    }

    fn check_operation(
        &self,
        ctx: &AccessContext,
        operation: InvoiceOperation,
        invoices: &[Invoice],
    ) -> DomainResult<()> {
        if operation != InvoiceOperation::Draft
            || !invoices.iter().any(|i| i.state() == InvoiceState::Cancel)
        {
            return Ok(());
        }

        let ids: Vec<InvoiceId> = invoices.iter().map(Invoice::id_typed).collect();
        let linked = {
            let elevated = ctx.elevate();
            !self.sales.search_by_invoices(&elevated, &ids)?.is_empty()
        };
        if linked {
            return Err(DomainError::validation(RESET_TO_DRAFT_ERROR));
        }
        Ok(())
    }

    fn copy_defaults(&self, defaults: &mut CopyDefaults) {
        defaults.set_default(SALES_FIELD, CopyValue::Clear);
    }

    fn finish_copy(&self, defaults: &CopyDefaults, copy: &mut Invoice) {
        if defaults.clears(SALES_FIELD) {
            copy.retain_origins(|o| !matches!(o, Origin::SaleLine(_)));
        }
    }

    fn origin_name(&self, ctx: &AccessContext, origin: &Origin) -> DomainResult<Option<String>> {
        let Origin::SaleLine(line) = origin else {
            return Ok(None);
        };
        let Some(sale) = self.sale_of_line(ctx, *line)? else {
            return Ok(None);
        };
        Ok(self
            .sales
            .get(ctx, &[sale])?
            .first()
            .map(SaleOrder::rec_name))
    }

    fn rewrite_clause(&self, clause: &Clause) -> Option<Domain> {
        search::translate_sales_clause(clause)
    }

    fn resolve_origin_field(
        &self,
        ctx: &AccessContext,
        origin: &Origin,
        field: &str,
    ) -> DomainResult<Option<SearchValue>> {
        match (origin, field) {
            (Origin::SaleLine(line), "sale") => Ok(self
                .sale_of_line(ctx, *line)?
                .map(|sale| SearchValue::Id(*sale.as_uuid()))),
            _ => Ok(None),
        }
    }

    fn read_field(
        &self,
        ctx: &AccessContext,
        field: &str,
        invoices: &[Invoice],
    ) -> Option<DomainResult<Vec<(InvoiceId, FieldValue)>>> {
        match field {
            SALES_FIELD => Some(self.sales_by_invoice(ctx, invoices).map(|by_invoice| {
                invoices
                    .iter()
                    .map(|i| {
                        let ids = by_invoice
                            .get(&i.id_typed())
                            .map(|sales| sales.iter().map(|s| *s.as_uuid()).collect())
                            .unwrap_or_default();
                        (i.id_typed(), FieldValue::Many(ids))
                    })
                    .collect()
            })),
            EXCEPTION_STATE_FIELD => {
                let ids: Vec<InvoiceId> = invoices.iter().map(Invoice::id_typed).collect();
                Some(self.sale_exception_states(ctx, &ids).map(|states| {
                    ids.iter()
                        .map(|id| {
                            let state = states.get(id).copied().unwrap_or_default();
                            (*id, FieldValue::Selection(state.as_str().to_string()))
                        })
                        .collect()
                }))
            }
            _ => None,
        }
    }
}
