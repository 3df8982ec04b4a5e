//! Schema handle over the in-memory invoice store.

use std::collections::HashMap;

use async_trait::async_trait;

use forgeerp_core::{InvoiceLineId, SaleLineId};
use forgeerp_invoicing::{InvoiceRepository, Origin};

use super::{MigrationError, SchemaHandle};

/// Legacy relation tables held in memory; origins are written to `invoices`.
pub struct InMemorySchema<R> {
    tables: HashMap<String, Vec<(SaleLineId, InvoiceLineId)>>,
    invoices: R,
}

impl<R: InvoiceRepository> InMemorySchema<R> {
    pub fn new(invoices: R) -> Self {
        Self {
            tables: HashMap::new(),
            invoices,
        }
    }

    pub fn with_table(
        mut self,
        name: impl Into<String>,
        rows: Vec<(SaleLineId, InvoiceLineId)>,
    ) -> Self {
        self.tables.insert(name.into(), rows);
        self
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }
}

#[async_trait]
impl<R: InvoiceRepository> SchemaHandle for InMemorySchema<R> {
    async fn table_exists(&mut self, table: &str) -> Result<bool, MigrationError> {
        Ok(self.has_table(table))
    }

    async fn sale_line_links(
        &mut self,
        table: &str,
    ) -> Result<Vec<(SaleLineId, InvoiceLineId)>, MigrationError> {
        Ok(self.tables.get(table).cloned().unwrap_or_default())
    }

    async fn set_invoice_line_origin(
        &mut self,
        line: InvoiceLineId,
        reference: &str,
    ) -> Result<u64, MigrationError> {
        let origin = Origin::from_reference(reference)?;
        let updated = self.invoices.set_line_origin(line, Some(origin))?;
        Ok(u64::from(updated))
    }

    async fn drop_table(&mut self, table: &str) -> Result<(), MigrationError> {
        self.tables.remove(table);
        Ok(())
    }
}
