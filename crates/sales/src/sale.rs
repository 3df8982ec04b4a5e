use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use forgeerp_core::{DomainError, DomainResult, Entity, InvoiceId, SaleId, SaleLineId};

/// Sales order status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaleState {
    Draft,
    Quotation,
    Confirmed,
    Processing,
    Done,
    Cancel,
}

/// Aggregated state of the invoices a sale generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaleInvoiceState {
    None,
    Waiting,
    Paid,
    Exception,
}

/// What a sale needs to know about one of its invoices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkedInvoiceState {
    Draft,
    Validated,
    Posted,
    Paid,
    Cancelled,
}

/// Read access to the current state of invoices, provided by the invoicing side.
pub trait InvoiceStateLookup {
    /// `None` when the invoice no longer exists.
    fn invoice_state(&self, invoice: InvoiceId) -> Option<LinkedInvoiceState>;
}

impl InvoiceStateLookup for HashMap<InvoiceId, LinkedInvoiceState> {
    fn invoice_state(&self, invoice: InvoiceId) -> Option<LinkedInvoiceState> {
        self.get(&invoice).copied()
    }
}

/// Order line: what was sold, and to which sale it belongs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleLine {
    pub id: SaleLineId,
    pub sale: SaleId,
    pub description: String,
    pub quantity: i64,
    /// Price in smallest currency unit (e.g., cents).
    pub unit_price: u64,
}

/// A customer order and the invoices it produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleOrder {
    id: SaleId,
    number: String,
    state: SaleState,
    invoice_state: SaleInvoiceState,
    lines: Vec<SaleLine>,
    invoices: Vec<InvoiceId>,
    invoices_ignored: Vec<InvoiceId>,
    invoices_recreated: Vec<InvoiceId>,
}

impl SaleOrder {
    pub fn new(id: SaleId, number: impl Into<String>) -> Self {
        Self {
            id,
            number: number.into(),
            state: SaleState::Draft,
            invoice_state: SaleInvoiceState::None,
            lines: Vec::new(),
            invoices: Vec::new(),
            invoices_ignored: Vec::new(),
            invoices_recreated: Vec::new(),
        }
    }

    pub fn id_typed(&self) -> SaleId {
        self.id
    }

    pub fn number(&self) -> &str {
        &self.number
    }

    pub fn state(&self) -> SaleState {
        self.state
    }

    pub fn invoice_state(&self) -> SaleInvoiceState {
        self.invoice_state
    }

    pub fn lines(&self) -> &[SaleLine] {
        &self.lines
    }

    pub fn line(&self, id: SaleLineId) -> Option<&SaleLine> {
        self.lines.iter().find(|l| l.id == id)
    }

    pub fn invoices(&self) -> &[InvoiceId] {
        &self.invoices
    }

    pub fn invoices_ignored(&self) -> &[InvoiceId] {
        &self.invoices_ignored
    }

    pub fn invoices_recreated(&self) -> &[InvoiceId] {
        &self.invoices_recreated
    }

    pub fn has_invoice(&self, invoice: InvoiceId) -> bool {
        self.invoices.contains(&invoice)
    }

    pub fn is_modifiable(&self) -> bool {
        matches!(self.state, SaleState::Draft)
    }

    /// Invoices can only be generated once the customer confirmed the order.
    pub fn is_invoice_allowed(&self) -> bool {
        matches!(
            self.state,
            SaleState::Confirmed | SaleState::Processing | SaleState::Done
        )
    }

    pub fn add_line(
        &mut self,
        description: impl Into<String>,
        quantity: i64,
        unit_price: u64,
    ) -> DomainResult<SaleLineId> {
        if !self.is_modifiable() {
            return Err(DomainError::invariant(
                "cannot modify sale once it is quoted or confirmed",
            ));
        }
        if quantity <= 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }

        let id = SaleLineId::new();
        self.lines.push(SaleLine {
            id,
            sale: self.id,
            description: description.into(),
            quantity,
            unit_price,
        });
        Ok(id)
    }

    pub fn quote(&mut self) -> DomainResult<()> {
        if self.state != SaleState::Draft {
            return Err(DomainError::invariant("only draft sales can be quoted"));
        }
        if self.lines.is_empty() {
            return Err(DomainError::validation("cannot quote sale without lines"));
        }
        self.state = SaleState::Quotation;
        Ok(())
    }

    pub fn confirm(&mut self) -> DomainResult<()> {
        if self.state != SaleState::Quotation {
            return Err(DomainError::invariant("only quoted sales can be confirmed"));
        }
        self.state = SaleState::Confirmed;
        Ok(())
    }

    pub fn cancel(&mut self) -> DomainResult<()> {
        if !matches!(self.state, SaleState::Draft | SaleState::Quotation) {
            return Err(DomainError::invariant(
                "only draft or quoted sales can be cancelled",
            ));
        }
        self.state = SaleState::Cancel;
        Ok(())
    }

    pub fn attach_invoice(&mut self, invoice: InvoiceId) -> DomainResult<()> {
        if !self.is_invoice_allowed() {
            return Err(DomainError::invariant(
                "cannot invoice sale that is not confirmed",
            ));
        }
        if !self.invoices.contains(&invoice) {
            self.invoices.push(invoice);
        }
        Ok(())
    }

    /// Record that an invoice in exception was deliberately skipped.
    pub fn ignore_invoice(&mut self, invoice: InvoiceId) -> DomainResult<()> {
        self.ensure_attached(invoice)?;
        if !self.invoices_ignored.contains(&invoice) {
            self.invoices_ignored.push(invoice);
        }
        Ok(())
    }

    /// Record that an invoice in exception was superseded by a new one.
    pub fn recreate_invoice(&mut self, invoice: InvoiceId) -> DomainResult<()> {
        self.ensure_attached(invoice)?;
        if !self.invoices_recreated.contains(&invoice) {
            self.invoices_recreated.push(invoice);
        }
        Ok(())
    }

    /// Invoice state derived from the invoices that still count.
    ///
    /// Ignored and recreated invoices are left out; unknown invoices too.
    pub fn derive_invoice_state(&self, lookup: &dyn InvoiceStateLookup) -> SaleInvoiceState {
        let states: Vec<LinkedInvoiceState> = self
            .invoices
            .iter()
            .filter(|i| !self.invoices_ignored.contains(i) && !self.invoices_recreated.contains(i))
            .filter_map(|i| lookup.invoice_state(*i))
            .collect();

        if states.is_empty() {
            SaleInvoiceState::None
        } else if states.contains(&LinkedInvoiceState::Cancelled) {
            SaleInvoiceState::Exception
        } else if states.iter().all(|s| *s == LinkedInvoiceState::Paid) {
            SaleInvoiceState::Paid
        } else {
            SaleInvoiceState::Waiting
        }
    }

    /// Re-derive this sale from its invoices. Returns whether anything changed.
    pub fn reconcile(&mut self, lookup: &dyn InvoiceStateLookup) -> bool {
        let before = self.clone();

        let exists = |i: &InvoiceId| lookup.invoice_state(*i).is_some();
        self.invoices.retain(exists);
        self.invoices_ignored.retain(exists);
        self.invoices_recreated.retain(exists);

        if matches!(
            self.state,
            SaleState::Draft | SaleState::Quotation | SaleState::Cancel
        ) {
            return *self != before;
        }

        self.invoice_state = self.derive_invoice_state(lookup);
        self.state = if self.invoice_state == SaleInvoiceState::Paid {
            SaleState::Done
        } else {
            SaleState::Processing
        };

        *self != before
    }

    fn ensure_attached(&self, invoice: InvoiceId) -> DomainResult<()> {
        if !self.invoices.contains(&invoice) {
            return Err(DomainError::invariant(format!(
                "invoice {invoice} does not belong to sale {}",
                self.number
            )));
        }
        Ok(())
    }
}

impl Entity for SaleOrder {
    type Id = SaleId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn rec_name(&self) -> String {
        self.number.clone()
    }
}
