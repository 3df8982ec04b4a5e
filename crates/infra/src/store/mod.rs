//! In-memory repositories for tests/dev.

pub mod invoices;
pub mod sales;

pub use invoices::InMemoryInvoiceRepository;
pub use sales::InMemorySaleRepository;
