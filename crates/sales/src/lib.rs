//! Sales Orders domain module.
//!
//! Sales orders own the invoices generated from them and reconcile their own
//! state from those invoices (`SaleService::process`).

pub mod permissions;
pub mod repository;
pub mod sale;
pub mod service;

pub use repository::SaleRepository;
pub use sale::{
    InvoiceStateLookup, LinkedInvoiceState, SaleInvoiceState, SaleLine, SaleOrder, SaleState,
};
pub use service::SaleService;
