//! Polymorphic origin of an invoice line.
//!
//! Persisted as a typed reference `"<model>,<id>"`, e.g. `"sale.line,0190…"`.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use forgeerp_core::{DomainError, DomainResult, InvoiceLineId, SaleLineId};

/// The record that caused an invoice line to be created.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "model", content = "id")]
pub enum Origin {
    #[serde(rename = "sale.line")]
    SaleLine(SaleLineId),
    /// Source line of a credit note.
    #[serde(rename = "account.invoice.line")]
    InvoiceLine(InvoiceLineId),
}

impl Origin {
    pub const SALE_LINE_MODEL: &'static str = "sale.line";
    pub const INVOICE_LINE_MODEL: &'static str = "account.invoice.line";

    pub fn model(&self) -> &'static str {
        match self {
            Origin::SaleLine(_) => Self::SALE_LINE_MODEL,
            Origin::InvoiceLine(_) => Self::INVOICE_LINE_MODEL,
        }
    }

    pub fn uuid(&self) -> uuid::Uuid {
        match self {
            Origin::SaleLine(id) => *id.as_uuid(),
            Origin::InvoiceLine(id) => *id.as_uuid(),
        }
    }

    pub fn to_reference(&self) -> String {
        format!("{},{}", self.model(), self.uuid())
    }

    pub fn from_reference(reference: &str) -> DomainResult<Self> {
        let (model, id) = reference
            .split_once(',')
            .ok_or_else(|| DomainError::invalid_id(format!("malformed reference '{reference}'")))?;

        match model {
            Self::SALE_LINE_MODEL => Ok(Origin::SaleLine(id.parse()?)),
            Self::INVOICE_LINE_MODEL => Ok(Origin::InvoiceLine(id.parse()?)),
            other => Err(DomainError::invalid_id(format!(
                "unknown origin model '{other}'"
            ))),
        }
    }
}

impl core::fmt::Display for Origin {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{},{}", self.model(), self.uuid())
    }
}

impl FromStr for Origin {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_reference(s)
    }
}
