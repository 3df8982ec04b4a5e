//! Links invoices to the sales orders they were generated from.
//!
//! [`SaleInvoiceExtension`] plugs into the invoice entity through
//! [`forgeerp_invoicing::InvoiceExtension`]: it lets invoice lines reference
//! sale lines, computes the `sales` and `sale_exception_state` fields, and
//! keeps the originating sales reconciled as invoices move through their
//! lifecycle.

pub mod exception;
pub mod extension;
pub mod lookup;
pub mod search;

#[cfg(test)]
mod fixtures;

pub use exception::SaleExceptionState;
pub use extension::SaleInvoiceExtension;

/// Computed field: sales the invoice was generated from.
pub const SALES_FIELD: &str = "sales";

/// Computed field: whether a sale ignored or recreated the invoice.
pub const EXCEPTION_STATE_FIELD: &str = "sale_exception_state";
