//! Moves the legacy sale line ⇄ invoice line relation into `origin`.
//!
//! Schemas created before 2.6 linked invoice lines to sale lines through the
//! `sale_line_invoice_lines_rel` table. Each row becomes the `origin` reference
//! of its invoice line, then the table is dropped.

use async_trait::async_trait;
use tracing::{debug, info, warn};

use forgeerp_invoicing::Origin;

use super::{Migration, MigrationError, MigrationOutcome, SchemaHandle};

pub const LEGACY_TABLE: &str = "sale_line_invoice_lines_rel";

#[derive(Debug, Clone, Copy, Default)]
pub struct SaleLineOriginMigration;

#[async_trait]
impl Migration for SaleLineOriginMigration {
    fn id(&self) -> &'static str {
        "sale_line_invoice_lines_rel_to_origin"
    }

    async fn run(&self, schema: &mut dyn SchemaHandle) -> Result<MigrationOutcome, MigrationError> {
        if !schema.table_exists(LEGACY_TABLE).await? {
            debug!(table = LEGACY_TABLE, "legacy table absent, nothing to migrate");
            return Ok(MigrationOutcome::Skipped);
        }

        let links = schema.sale_line_links(LEGACY_TABLE).await?;
        for (sale_line, invoice_line) in &links {
            let reference = Origin::SaleLine(*sale_line).to_reference();
            let updated = schema
                .set_invoice_line_origin(*invoice_line, &reference)
                .await?;
            if updated == 0 {
                warn!(invoice_line = %invoice_line, "legacy link to missing invoice line");
            }
        }

        schema.drop_table(LEGACY_TABLE).await?;
        info!(table = LEGACY_TABLE, rows = links.len(), "legacy sale line links migrated");
        Ok(MigrationOutcome::Applied { rows: links.len() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use forgeerp_core::{InvoiceId, InvoiceLineId, SaleLineId};
    use forgeerp_invoicing::{Invoice, InvoiceLine, InvoiceRepository};

    use crate::migration::{InMemorySchema, Migrator};
    use crate::store::InMemoryInvoiceRepository;

    fn stored_invoice(
        repo: &InMemoryInvoiceRepository,
        lines: Vec<InvoiceLine>,
    ) -> InvoiceId {
        let invoice = Invoice::draft(InvoiceId::new(), None, lines).unwrap();
        let id = invoice.id_typed();
        repo.save(vec![invoice]).unwrap();
        id
    }

    #[tokio::test]
    async fn legacy_rows_become_origins_and_table_is_dropped() {
        let repo = Arc::new(InMemoryInvoiceRepository::new());
        let first = InvoiceLine::new("A", 1, 10);
        let second = InvoiceLine::new("B", 2, 10);
        let (first_id, second_id) = (first.id, second.id);
        let invoice = stored_invoice(&repo, vec![first, second]);

        let (sl1, sl2) = (SaleLineId::new(), SaleLineId::new());
        let mut schema = InMemorySchema::new(repo.clone())
            .with_table(LEGACY_TABLE, vec![(sl1, first_id), (sl2, second_id)]);

        let outcome = SaleLineOriginMigration.run(&mut schema).await.unwrap();
        assert_eq!(outcome, MigrationOutcome::Applied { rows: 2 });
        assert!(!schema.has_table(LEGACY_TABLE));

        let stored = &repo.get(&[invoice]).unwrap()[0];
        assert_eq!(stored.lines()[0].origin, Some(Origin::SaleLine(sl1)));
        assert_eq!(stored.lines()[1].origin, Some(Origin::SaleLine(sl2)));
    }

    #[tokio::test]
    async fn absent_table_is_a_no_op() {
        let repo = Arc::new(InMemoryInvoiceRepository::new());
        let invoice = stored_invoice(&repo, vec![InvoiceLine::new("A", 1, 10)]);
        let mut schema = InMemorySchema::new(repo.clone());

        let outcome = SaleLineOriginMigration.run(&mut schema).await.unwrap();
        assert_eq!(outcome, MigrationOutcome::Skipped);
        assert_eq!(repo.get(&[invoice]).unwrap()[0].lines()[0].origin, None);
    }

    #[tokio::test]
    async fn rows_for_missing_lines_are_skipped() {
        let repo = Arc::new(InMemoryInvoiceRepository::new());
        let mut schema = InMemorySchema::new(repo.clone())
            .with_table(LEGACY_TABLE, vec![(SaleLineId::new(), InvoiceLineId::new())]);

        let outcome = SaleLineOriginMigration.run(&mut schema).await.unwrap();
        assert_eq!(outcome, MigrationOutcome::Applied { rows: 1 });
        assert!(!schema.has_table(LEGACY_TABLE));
    }

    #[tokio::test]
    async fn second_run_finds_nothing_to_do() {
        let repo = Arc::new(InMemoryInvoiceRepository::new());
        let mut schema = InMemorySchema::new(repo).with_table(LEGACY_TABLE, vec![]);

        let migrator = Migrator::standard();
        let first = migrator.run(&mut schema).await.unwrap();
        assert_eq!(
            first,
            vec![(
                "sale_line_invoice_lines_rel_to_origin",
                MigrationOutcome::Applied { rows: 0 }
            )]
        );
        let second = migrator.run(&mut schema).await.unwrap();
        assert_eq!(second[0].1, MigrationOutcome::Skipped);
    }
}
