use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use forgeerp_core::{DomainError, DomainResult, Entity, InvoiceId, InvoiceLineId};

use crate::Origin;

/// Invoice status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceState {
    Draft,
    Validated,
    Posted,
    Paid,
    Cancel,
}

impl InvoiceState {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceState::Draft => "draft",
            InvoiceState::Validated => "validated",
            InvoiceState::Posted => "posted",
            InvoiceState::Paid => "paid",
            InvoiceState::Cancel => "cancel",
        }
    }
}

impl core::fmt::Display for InvoiceState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State-changing operations on a batch of invoices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceOperation {
    Validate,
    Post,
    Paid,
    Cancel,
    Draft,
    Delete,
}

impl InvoiceOperation {
    /// State reached by the operation; `None` for deletion.
    pub fn target(&self) -> Option<InvoiceState> {
        match self {
            InvoiceOperation::Validate => Some(InvoiceState::Validated),
            InvoiceOperation::Post => Some(InvoiceState::Posted),
            InvoiceOperation::Paid => Some(InvoiceState::Paid),
            InvoiceOperation::Cancel => Some(InvoiceState::Cancel),
            InvoiceOperation::Draft => Some(InvoiceState::Draft),
            InvoiceOperation::Delete => None,
        }
    }

    /// Whether an invoice in state `from` may undergo this operation.
    pub fn allows(&self, from: InvoiceState) -> bool {
        use InvoiceState::*;
        match self {
            InvoiceOperation::Validate => from == Draft,
            InvoiceOperation::Post => matches!(from, Draft | Validated),
            InvoiceOperation::Paid => from == Posted,
            InvoiceOperation::Cancel => matches!(from, Draft | Validated | Posted),
            InvoiceOperation::Draft => matches!(from, Validated | Cancel),
            InvoiceOperation::Delete => matches!(from, Draft | Cancel),
        }
    }
}

/// A billed line; may record the record it was generated from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceLine {
    pub id: InvoiceLineId,
    pub description: String,
    /// Negative on credit notes.
    pub quantity: i64,
    /// Price in smallest currency unit (e.g., cents).
    pub unit_price: u64,
    pub origin: Option<Origin>,
}

impl InvoiceLine {
    pub fn new(description: impl Into<String>, quantity: i64, unit_price: u64) -> Self {
        Self {
            id: InvoiceLineId::new(),
            description: description.into(),
            quantity,
            unit_price,
            origin: None,
        }
    }

    pub fn with_origin(mut self, origin: Origin) -> Self {
        self.origin = Some(origin);
        self
    }

    pub fn amount(&self) -> i128 {
        self.quantity as i128 * self.unit_price as i128
    }
}

/// Accounting document requesting payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    id: InvoiceId,
    state: InvoiceState,
    description: Option<String>,
    lines: Vec<InvoiceLine>,
    posted_at: Option<DateTime<Utc>>,
}

impl Invoice {
    /// New draft invoice. Lines keep their order.
    pub fn draft(
        id: InvoiceId,
        description: Option<String>,
        lines: Vec<InvoiceLine>,
    ) -> DomainResult<Self> {
        let invoice = Self {
            id,
            state: InvoiceState::Draft,
            description,
            lines,
            posted_at: None,
        };
        invoice.total_amount()?;

        let mut seen = std::collections::HashSet::new();
        if !invoice.lines.iter().all(|l| seen.insert(l.id)) {
            return Err(DomainError::invariant("duplicate invoice line id"));
        }
        Ok(invoice)
    }

    pub fn id_typed(&self) -> InvoiceId {
        self.id
    }

    pub fn state(&self) -> InvoiceState {
        self.state
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn lines(&self) -> &[InvoiceLine] {
        &self.lines
    }

    pub fn line(&self, id: InvoiceLineId) -> Option<&InvoiceLine> {
        self.lines.iter().find(|l| l.id == id)
    }

    pub fn posted_at(&self) -> Option<DateTime<Utc>> {
        self.posted_at
    }

    pub fn total_amount(&self) -> DomainResult<i128> {
        self.lines.iter().try_fold(0i128, |total, line| {
            total
                .checked_add(line.amount())
                .ok_or_else(|| DomainError::invariant("invoice total overflow"))
        })
    }

    pub fn can(&self, operation: InvoiceOperation) -> bool {
        operation.allows(self.state)
    }

    /// Move to the operation's target state. Returns `false` (and changes
    /// nothing) when the current state does not allow it.
    pub fn transition(&mut self, operation: InvoiceOperation, at: DateTime<Utc>) -> bool {
        let Some(target) = operation.target() else {
            return false;
        };
        if !self.can(operation) {
            return false;
        }

        if target == InvoiceState::Posted && self.posted_at.is_none() {
            self.posted_at = Some(at);
        }
        if target == InvoiceState::Draft {
            self.posted_at = None;
        }
        self.state = target;
        true
    }

    /// Set the origin of one line. Returns `false` if the line is not on this invoice.
    pub fn set_line_origin(&mut self, line: InvoiceLineId, origin: Option<Origin>) -> bool {
        match self.lines.iter_mut().find(|l| l.id == line) {
            Some(l) => {
                l.origin = origin;
                true
            }
            None => false,
        }
    }

    /// Drop line origins for which `keep` returns `false`.
    pub fn retain_origins(&mut self, keep: impl Fn(&Origin) -> bool) {
        for line in &mut self.lines {
            if line.origin.as_ref().is_some_and(|o| !keep(o)) {
                line.origin = None;
            }
        }
    }

    /// Fresh draft copy: new identities, same lines.
    pub fn duplicate(&self, id: InvoiceId) -> Self {
        Self {
            id,
            state: InvoiceState::Draft,
            description: self.description.clone(),
            lines: self
                .lines
                .iter()
                .map(|l| InvoiceLine {
                    id: InvoiceLineId::new(),
                    ..l.clone()
                })
                .collect(),
            posted_at: None,
        }
    }

    pub(crate) fn clear_description(&mut self) {
        self.description = None;
    }
}

impl Entity for Invoice {
    type Id = InvoiceId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn rec_name(&self) -> String {
        match &self.description {
            Some(d) => format!("{} ({})", d, self.id),
            None => self.id.to_string(),
        }
    }
}
