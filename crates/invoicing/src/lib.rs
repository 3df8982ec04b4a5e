//! Invoicing domain module.
//!
//! The base invoice entity: workflow, lines with polymorphic origins, search
//! domains and the [`InvoiceExtension`] point other modules hook into.

pub mod copy;
pub mod extension;
pub mod field;
pub mod invoice;
pub mod origin;
pub mod permissions;
pub mod repository;
pub mod search;
pub mod service;

pub use copy::{CopyDefaults, CopyValue};
pub use extension::InvoiceExtension;
pub use field::FieldValue;
pub use invoice::{Invoice, InvoiceLine, InvoiceOperation, InvoiceState};
pub use origin::Origin;
pub use repository::InvoiceRepository;
pub use search::{Clause, Domain, NoResolver, Operand, Operator, OriginResolver, SearchValue};
pub use service::InvoiceService;
